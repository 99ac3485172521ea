//! Kernel argument declarations and the argument contract extracted at render time.

use frx_dtype::{NativeType, ScalarDType};
use smallvec::{SmallVec, smallvec};

/// Native slot types of one declared argument.
pub type Slots = SmallVec<[NativeType; 2]>;

/// Data-flow direction of a pointer argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Intent {
    In,
    Out,
    InOut,
}

impl Intent {
    pub fn is_const(&self) -> bool {
        matches!(self, Self::In)
    }
}

/// What a kernel argument is declared as.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ArgType {
    /// Contiguous matrix. With `stride`, the kernel also receives the
    /// leading sub-dimension as `ld<name>`.
    Matrix { dtype: ScalarDType, stride: bool },
    /// Indirect operand: `<name>_vix` (element addresses) and `<name>_vstri` (row strides).
    View(ScalarDType),
    /// Same kernel-side layout as [`ArgType::View`].
    MpiView(ScalarDType),
    Scalar(ScalarDType),
    /// Opaque address, e.g. a function pointer.
    Pointer,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KernelArg {
    pub name: String,
    pub intent: Intent,
    pub ty: ArgType,
}

impl KernelArg {
    pub fn matrix(name: impl Into<String>, intent: Intent, dtype: ScalarDType) -> Self {
        Self { name: name.into(), intent, ty: ArgType::Matrix { dtype, stride: false } }
    }

    /// Matrix that also passes its leading sub-dimension.
    pub fn strided_matrix(name: impl Into<String>, intent: Intent, dtype: ScalarDType) -> Self {
        Self { name: name.into(), intent, ty: ArgType::Matrix { dtype, stride: true } }
    }

    pub fn view(name: impl Into<String>, intent: Intent, dtype: ScalarDType) -> Self {
        Self { name: name.into(), intent, ty: ArgType::View(dtype) }
    }

    pub fn mpi_view(name: impl Into<String>, intent: Intent, dtype: ScalarDType) -> Self {
        Self { name: name.into(), intent, ty: ArgType::MpiView(dtype) }
    }

    pub fn scalar(name: impl Into<String>, dtype: ScalarDType) -> Self {
        Self { name: name.into(), intent: Intent::In, ty: ArgType::Scalar(dtype) }
    }

    pub fn pointer(name: impl Into<String>) -> Self {
        Self { name: name.into(), intent: Intent::In, ty: ArgType::Pointer }
    }

    /// Native slots this argument occupies in the calling convention.
    pub fn slots(&self) -> Slots {
        match self.ty {
            ArgType::Matrix { stride: false, .. } | ArgType::Pointer => smallvec![NativeType::Ptr],
            ArgType::Matrix { stride: true, .. } => smallvec![NativeType::Ptr, NativeType::INT32],
            ArgType::View(_) | ArgType::MpiView(_) => smallvec![NativeType::Ptr, NativeType::Ptr],
            ArgType::Scalar(dtype) => smallvec![NativeType::Scalar(dtype)],
        }
    }
}

/// Names of the implicit dimension arguments, outermost first.
pub fn dim_names(ndim: usize) -> &'static [&'static str] {
    match ndim {
        0 => &[],
        1 => &["_nx"],
        _ => &["_ny", "_nx"],
    }
}

/// Argument contract of one rendered kernel.
///
/// `names` and `types` cover the dimension arguments first, then every
/// declared argument in order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArgSpec {
    pub ndim: usize,
    pub names: Vec<String>,
    pub types: Vec<Slots>,
}

impl ArgSpec {
    pub fn new(ndim: usize, args: &[KernelArg]) -> Self {
        let dims = dim_names(ndim);
        let names = dims.iter().map(|d| d.to_string()).chain(args.iter().map(|a| a.name.clone())).collect();
        let types = dims.iter().map(|_| smallvec![NativeType::INT32]).chain(args.iter().map(KernelArg::slots)).collect();

        Self { ndim, names, types }
    }

    /// Flattened native argument types, as the compiled function sees them.
    pub fn argtypes(&self) -> Vec<NativeType> {
        self.types.iter().flatten().copied().collect()
    }

    /// Declared (non-dimension) arguments with their slots.
    pub fn args(&self) -> impl Iterator<Item = (&str, &Slots)> {
        self.names.iter().zip(&self.types).skip(self.ndim).map(|(n, t)| (n.as_str(), t))
    }
}
