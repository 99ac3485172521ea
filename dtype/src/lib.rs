//! Element types and native calling-convention slots for frx kernels.
//!
//! Two families of types live here:
//! - [`ScalarDType`]: the element type of operands (matrix storage, scalars).
//! - [`NativeType`]: the type of one slot in a compiled kernel's native
//!   argument list (a scalar, or an address).

pub mod cast;
pub mod ext;


pub use cast::ScalarValue;
pub use ext::HasDType;

/// Scalar element types understood by the kernel runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[derive(strum::EnumIter, strum::VariantArray, strum::AsRefStr, strum::Display)]
pub enum ScalarDType {
    Int32,
    Int64,
    Float32,
    Float64,
}

impl ScalarDType {
    pub const fn bytes(&self) -> usize {
        match self {
            Self::Int32 | Self::Float32 => 4,
            Self::Int64 | Self::Float64 => 8,
        }
    }

    pub const fn is_float(&self) -> bool {
        matches!(self, Self::Float32 | Self::Float64)
    }

    pub const fn is_int(&self) -> bool {
        matches!(self, Self::Int32 | Self::Int64)
    }

    /// C spelling shared by the host and CUDA generators.
    pub const fn c_style(&self) -> &'static str {
        match self {
            Self::Int32 => "int",
            Self::Int64 => "long long",
            Self::Float32 => "float",
            Self::Float64 => "double",
        }
    }
}

/// Floating-point precision of a backend.
///
/// Every rendered template receives the matching element type as `fpdtype`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[derive(strum::EnumString, strum::AsRefStr, strum::Display)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Precision {
    Single,
    #[default]
    Double,
}

impl Precision {
    pub const fn dtype(&self) -> ScalarDType {
        match self {
            Self::Single => ScalarDType::Float32,
            Self::Double => ScalarDType::Float64,
        }
    }
}

/// One slot of a compiled function's native argument list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NativeType {
    /// A scalar passed by value.
    Scalar(ScalarDType),
    /// An address: host pointer or device pointer, always 64 bits wide.
    Ptr,
}

impl NativeType {
    pub const INT32: Self = Self::Scalar(ScalarDType::Int32);

    pub const fn bytes(&self) -> usize {
        match self {
            Self::Scalar(s) => s.bytes(),
            Self::Ptr => 8,
        }
    }

    pub fn scalar(&self) -> Option<ScalarDType> {
        match self {
            Self::Scalar(s) => Some(*s),
            Self::Ptr => None,
        }
    }
}

impl From<ScalarDType> for NativeType {
    fn from(scalar: ScalarDType) -> Self {
        Self::Scalar(scalar)
    }
}

impl std::fmt::Display for NativeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Scalar(s) => write!(f, "{s}"),
            Self::Ptr => write!(f, "ptr"),
        }
    }
}
