use super::*;

/// A scalar value tagged with its element type.
///
/// Scalars cross the kernel boundary by value: template parameters, run-time
/// coefficients (`alpha`, `beta`) and return values all use this type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScalarValue {
    Int32(i32),
    Int64(i64),
    Float32(f32),
    Float64(f64),
}

impl ScalarValue {
    pub const fn dtype(&self) -> ScalarDType {
        match self {
            Self::Int32(_) => ScalarDType::Int32,
            Self::Int64(_) => ScalarDType::Int64,
            Self::Float32(_) => ScalarDType::Float32,
            Self::Float64(_) => ScalarDType::Float64,
        }
    }

    /// Convert to `to`, with `as` semantics (floats truncate toward zero).
    pub fn cast(self, to: ScalarDType) -> Self {
        if self.dtype() == to {
            return self;
        }

        match to {
            ScalarDType::Int32 => Self::Int32(match self {
                Self::Int32(v) => v,
                Self::Int64(v) => v as i32,
                Self::Float32(v) => v as i32,
                Self::Float64(v) => v as i32,
            }),
            ScalarDType::Int64 => Self::Int64(match self {
                Self::Int32(v) => v as i64,
                Self::Int64(v) => v,
                Self::Float32(v) => v as i64,
                Self::Float64(v) => v as i64,
            }),
            ScalarDType::Float32 => Self::Float32(self.as_f64() as f32),
            ScalarDType::Float64 => Self::Float64(self.as_f64()),
        }
    }

    pub fn as_f64(&self) -> f64 {
        match *self {
            Self::Int32(v) => v as f64,
            Self::Int64(v) => v as f64,
            Self::Float32(v) => v as f64,
            Self::Float64(v) => v,
        }
    }
}

macro_rules! impl_from_scalar {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(impl From<$ty> for ScalarValue {
            fn from(value: $ty) -> Self {
                Self::$variant(value)
            }
        })*
    };
}

impl_from_scalar! {
    i32 => Int32, i64 => Int64, f32 => Float32, f64 => Float64,
}
