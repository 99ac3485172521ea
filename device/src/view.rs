//! Indirect (gathered) operands.
//!
//! A view addresses `n` small blocks of `nvrow x nvcol` elements scattered
//! over one or more matrices. Kernels receive two buffers:
//! - the mapping: one element address per block (`fpdtype_t*` on the kernel side),
//! - the strides: one `i32` row stride per block, in elements.
//!
//! Element `(r, c)` of block `i` lives at `mapping[i][r * strides[i] + c]`.

use std::sync::Arc;

use frx_dtype::ScalarDType;
use snafu::{OptionExt, ensure};

use crate::allocator::Allocator;
use crate::buffer::RawBuffer;
use crate::error::{EmptyShapeSnafu, InvalidViewSnafu, Result};
use crate::matrix::Matrix;

#[derive(Debug, Clone)]
pub struct View {
    mapping: Arc<RawBuffer>,
    strides: Arc<RawBuffer>,
    /// Keeps every mapped allocation alive while the view exists.
    backing: Arc<[Matrix]>,
    n: usize,
    nvrow: usize,
    nvcol: usize,
    dtype: ScalarDType,
}

impl View {
    /// Build a view of blocks starting at `(rmap[i], cmap[i])` of `matmap[i]`.
    ///
    /// `rstridemap` overrides the per-block row stride, which otherwise
    /// defaults to the leading dimension of the mapped matrix.
    pub fn new(
        allocator: &dyn Allocator,
        matmap: &[&Matrix],
        rmap: &[usize],
        cmap: &[usize],
        rstridemap: Option<&[usize]>,
        vshape: [usize; 2],
    ) -> Result<Self> {
        let n = matmap.len();
        let [nvrow, nvcol] = vshape;
        ensure!(n > 0 && nvrow > 0 && nvcol > 0, EmptyShapeSnafu { what: "view", shape: vec![n, nvrow, nvcol] });
        ensure!(
            rmap.len() == n && cmap.len() == n && rstridemap.is_none_or(|s| s.len() == n),
            InvalidViewSnafu { reason: format!("index maps must all have {n} entries") }
        );

        let dtype = matmap[0].dtype();
        ensure!(
            matmap.iter().all(|m| m.dtype() == dtype),
            InvalidViewSnafu { reason: "mapped matrices have differing dtypes" }
        );

        let mut addresses = Vec::with_capacity(n);
        let mut strides = Vec::with_capacity(n);
        for i in 0..n {
            let mat = matmap[i];
            let stride = rstridemap.map_or(mat.leaddim(), |s| s[i]);
            let exceeds =
                || InvalidViewSnafu { reason: format!("block {i} at ({}, {}) exceeds its matrix", rmap[i], cmap[i]) };

            let start = rmap[i].checked_mul(mat.leaddim()).and_then(|r| r.checked_add(cmap[i])).context(exceeds())?;
            let end = (nvrow - 1)
                .checked_mul(stride)
                .and_then(|span| span.checked_add(start))
                .and_then(|span| span.checked_add(nvcol))
                .context(exceeds())?;

            ensure!(
                cmap[i].checked_add(nvcol).is_some_and(|c| c <= mat.ncol()) && end <= mat.traits().elements(),
                exceeds()
            );
            let stride = i32::try_from(stride)
                .map_err(|_| InvalidViewSnafu { reason: format!("row stride {stride} overflows i32") }.build())?;

            addresses.push(mat.address() + (start * mat.itemsize()) as u64);
            strides.push(stride);
        }

        let mapping = allocator.alloc(n * size_of::<u64>())?;
        mapping.copyin(0, bytemuck::cast_slice(&addresses))?;
        let stride_buf = allocator.alloc(n * size_of::<i32>())?;
        stride_buf.copyin(0, bytemuck::cast_slice(&strides))?;

        let mut backing: Vec<Matrix> = Vec::new();
        for mat in matmap {
            if !backing.iter().any(|b| b.same_storage(mat)) {
                backing.push((*mat).clone());
            }
        }

        Ok(Self {
            mapping: Arc::new(mapping),
            strides: Arc::new(stride_buf),
            backing: backing.into(),
            n,
            nvrow,
            nvcol,
            dtype,
        })
    }

    pub fn n(&self) -> usize {
        self.n
    }

    pub fn nvrow(&self) -> usize {
        self.nvrow
    }

    pub fn nvcol(&self) -> usize {
        self.nvcol
    }

    pub fn dtype(&self) -> ScalarDType {
        self.dtype
    }

    pub fn mapping(&self) -> &Arc<RawBuffer> {
        &self.mapping
    }

    pub fn strides(&self) -> &Arc<RawBuffer> {
        &self.strides
    }

    pub fn backing(&self) -> &[Matrix] {
        &self.backing
    }
}

/// A view whose blocks are exchanged with another partition.
///
/// The exchange matrix has `nvrow * nvcol` rows and `n` columns: column `i`
/// holds block `i` flattened row by row.
#[derive(Debug, Clone)]
pub struct MpiView {
    view: View,
    mpimat: Matrix,
}

impl MpiView {
    pub fn new(
        allocator: &dyn Allocator,
        matmap: &[&Matrix],
        rmap: &[usize],
        cmap: &[usize],
        rstridemap: Option<&[usize]>,
        vshape: [usize; 2],
    ) -> Result<Self> {
        let view = View::new(allocator, matmap, rmap, cmap, rstridemap, vshape)?;
        let mpimat = Matrix::zeros(allocator, view.dtype(), view.nvrow() * view.nvcol(), view.n())?;
        Ok(Self { view, mpimat })
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn mpimat(&self) -> &Matrix {
        &self.mpimat
    }

    pub fn n(&self) -> usize {
        self.view.n()
    }
}
