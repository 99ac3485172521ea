//! Dense matrices and matrix banks.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use bon::bon;
use frx_dtype::{HasDType, ScalarDType};
use snafu::ensure;

use crate::allocator::Allocator;
use crate::buffer::RawBuffer;
use crate::error::{
    BankTraitMismatchSnafu, DTypeMismatchSnafu, EmptyShapeSnafu, IndexOutOfBoundsSnafu, InvalidLayoutSnafu, Result,
    SizeMismatchSnafu,
};

/// Density class of a matrix.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum Density {
    #[default]
    Dense,
    Sparse,
}

/// Compatibility signature of a matrix operand.
///
/// Two operands may take part in the same element-wise operation only when
/// their traits compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MatrixTraits {
    pub dtype: ScalarDType,
    pub nrow: usize,
    pub ncol: usize,
    /// Elements between the starts of consecutive rows.
    pub leaddim: usize,
    /// Stride exposed to kernels that declare a two-slot matrix argument.
    pub leadsubdim: usize,
    pub density: Density,
}

impl MatrixTraits {
    /// Number of elements in the allocation, padding included.
    pub fn elements(&self) -> usize {
        self.leaddim * self.nrow
    }

    pub fn nbytes(&self) -> usize {
        self.elements() * self.dtype.bytes()
    }
}

/// A dense, row-major 2-D buffer.
///
/// Cloning a matrix clones the handle, not the data.
#[derive(Debug, Clone)]
pub struct Matrix {
    storage: Arc<RawBuffer>,
    traits: MatrixTraits,
}

#[bon]
impl Matrix {
    #[builder]
    pub fn new(
        allocator: &dyn Allocator,
        dtype: ScalarDType,
        nrow: usize,
        ncol: usize,
        leaddim: Option<usize>,
        leadsubdim: Option<usize>,
        #[builder(default)] density: Density,
    ) -> Result<Self> {
        ensure!(nrow > 0 && ncol > 0, EmptyShapeSnafu { what: "matrix", shape: vec![nrow, ncol] });

        let leaddim = leaddim.unwrap_or(ncol);
        ensure!(
            leaddim >= ncol,
            InvalidLayoutSnafu { reason: format!("leading dimension {leaddim} is smaller than {ncol} columns") }
        );
        let leadsubdim = leadsubdim.unwrap_or(leaddim);
        ensure!(
            leadsubdim > 0 && leadsubdim <= leaddim,
            InvalidLayoutSnafu { reason: format!("leading sub-dimension {leadsubdim} outside 1..={leaddim}") }
        );

        let traits = MatrixTraits { dtype, nrow, ncol, leaddim, leadsubdim, density };
        let storage = Arc::new(allocator.alloc(traits.nbytes())?);

        Ok(Self { storage, traits })
    }
}

impl Matrix {
    /// Dense zero matrix with `leaddim == ncol`.
    pub fn zeros(allocator: &dyn Allocator, dtype: ScalarDType, nrow: usize, ncol: usize) -> Result<Self> {
        Self::builder().allocator(allocator).dtype(dtype).nrow(nrow).ncol(ncol).build()
    }

    /// Dense matrix initialised from row-major `data`.
    pub fn from_rows<T: HasDType>(allocator: &dyn Allocator, nrow: usize, ncol: usize, data: &[T]) -> Result<Self> {
        let matrix = Self::zeros(allocator, T::DTYPE, nrow, ncol)?;
        matrix.set(data)?;
        Ok(matrix)
    }

    pub fn traits(&self) -> &MatrixTraits {
        &self.traits
    }

    pub fn dtype(&self) -> ScalarDType {
        self.traits.dtype
    }

    pub fn nrow(&self) -> usize {
        self.traits.nrow
    }

    pub fn ncol(&self) -> usize {
        self.traits.ncol
    }

    pub fn leaddim(&self) -> usize {
        self.traits.leaddim
    }

    pub fn leadsubdim(&self) -> usize {
        self.traits.leadsubdim
    }

    pub fn density(&self) -> Density {
        self.traits.density
    }

    pub fn itemsize(&self) -> usize {
        self.traits.dtype.bytes()
    }

    pub fn storage(&self) -> &Arc<RawBuffer> {
        &self.storage
    }

    /// Address of element (0, 0).
    pub fn address(&self) -> u64 {
        self.storage.address()
    }

    /// Whether both handles refer to the same allocation.
    pub fn same_storage(&self, other: &Matrix) -> bool {
        Arc::ptr_eq(&self.storage, &other.storage)
    }

    /// Overwrite the matrix with row-major `data` of `nrow * ncol` elements.
    pub fn set<T: HasDType>(&self, data: &[T]) -> Result<()> {
        self.check_dtype::<T>()?;
        let (nrow, ncol, leaddim) = (self.nrow(), self.ncol(), self.leaddim());
        ensure!(data.len() == nrow * ncol, SizeMismatchSnafu { expected: nrow * ncol, actual: data.len() });

        let mut padded = vec![T::zeroed(); nrow * leaddim];
        for (dst, src) in padded.chunks_exact_mut(leaddim).zip(data.chunks_exact(ncol)) {
            dst[..ncol].copy_from_slice(src);
        }

        self.storage.copyin(0, bytemuck::cast_slice(&padded))
    }

    /// Set every element to `value`.
    pub fn fill<T: HasDType>(&self, value: T) -> Result<()> {
        self.set(&vec![value; self.nrow() * self.ncol()])
    }

    /// Read the matrix back as row-major `nrow * ncol` elements.
    pub fn get<T: HasDType>(&self) -> Result<Vec<T>> {
        self.check_dtype::<T>()?;
        let (ncol, leaddim) = (self.ncol(), self.leaddim());

        let mut padded = vec![T::zeroed(); self.traits.elements()];
        self.storage.copyout(0, bytemuck::cast_slice_mut(&mut padded))?;

        Ok(padded.chunks_exact(leaddim).flat_map(|row| row[..ncol].iter().copied()).collect())
    }

    fn check_dtype<T: HasDType>(&self) -> Result<()> {
        ensure!(T::DTYPE == self.dtype(), DTypeMismatchSnafu { expected: self.dtype(), actual: T::DTYPE });
        Ok(())
    }
}

/// A set of interchangeable matrices, one of which is active.
///
/// Kernels bound to a bank follow the active member at launch time, so the
/// solver can rotate storage (e.g. time-stepping registers) without rebuilding
/// kernels. Clones share the active index.
#[derive(Debug, Clone)]
pub struct MatrixBank {
    members: Arc<[Matrix]>,
    active: Arc<AtomicUsize>,
}

impl MatrixBank {
    pub fn new(members: Vec<Matrix>, initial: usize) -> Result<Self> {
        ensure!(!members.is_empty(), EmptyShapeSnafu { what: "matrix bank", shape: vec![0usize] });
        ensure!(initial < members.len(), IndexOutOfBoundsSnafu { index: initial, len: members.len() });

        let first = members[0].traits();
        if let Some(index) = members.iter().position(|m| m.traits() != first) {
            return BankTraitMismatchSnafu { index }.fail();
        }

        Ok(Self { members: members.into(), active: Arc::new(AtomicUsize::new(initial)) })
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn active_index(&self) -> usize {
        self.active.load(Ordering::Acquire)
    }

    pub fn set_active(&self, index: usize) -> Result<()> {
        ensure!(index < self.members.len(), IndexOutOfBoundsSnafu { index, len: self.members.len() });
        self.active.store(index, Ordering::Release);
        Ok(())
    }

    pub fn active(&self) -> &Matrix {
        &self.members[self.active_index()]
    }

    pub fn member(&self, index: usize) -> Option<&Matrix> {
        self.members.get(index)
    }

    pub fn traits(&self) -> &MatrixTraits {
        self.members[0].traits()
    }
}
