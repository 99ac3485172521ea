//! The closed set of operand kinds a kernel argument can bind to.

use std::collections::BTreeMap;

use frx_dtype::ScalarValue;

use crate::matrix::{Matrix, MatrixBank, MatrixTraits};
use crate::view::{MpiView, View};

#[derive(Debug, Clone, strum::IntoStaticStr)]
pub enum Operand {
    Matrix(Matrix),
    MatrixBank(MatrixBank),
    View(View),
    MpiView(MpiView),
    Scalar(ScalarValue),
    /// Opaque address passed through untouched (e.g. a function pointer).
    Pointer(u64),
}

impl Operand {
    pub fn kind(&self) -> &'static str {
        self.into()
    }

    /// Matrix traits for matrix-like operands.
    pub fn traits(&self) -> Option<&MatrixTraits> {
        match self {
            Operand::Matrix(m) => Some(m.traits()),
            Operand::MatrixBank(b) => Some(b.traits()),
            Operand::View(_) | Operand::MpiView(_) | Operand::Scalar(_) | Operand::Pointer(_) => None,
        }
    }
}

/// Operands keyed by the kernel argument name they bind to.
pub type OperandMap = BTreeMap<String, Operand>;

macro_rules! impl_from_operand {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(impl From<$ty> for Operand {
            fn from(value: $ty) -> Self {
                Operand::$variant(value)
            }
        })*
    };
}

impl_from_operand! {
    Matrix => Matrix, MatrixBank => MatrixBank, View => View, MpiView => MpiView, ScalarValue => Scalar,
}

impl From<&Matrix> for Operand {
    fn from(value: &Matrix) -> Self {
        Operand::Matrix(value.clone())
    }
}

impl From<f64> for Operand {
    fn from(value: f64) -> Self {
        Operand::Scalar(value.into())
    }
}

impl From<f32> for Operand {
    fn from(value: f32) -> Self {
        Operand::Scalar(value.into())
    }
}

impl From<i32> for Operand {
    fn from(value: i32) -> Self {
        Operand::Scalar(value.into())
    }
}

/// Build an [`OperandMap`] from `name => operand` pairs.
///
/// ```ignore
/// let ops = operands! { "y" => &y, "beta" => 1.0 };
/// ```
#[macro_export]
macro_rules! operands {
    ($($name:expr => $value:expr),* $(,)?) => {{
        let mut map = $crate::OperandMap::new();
        $(map.insert(::std::string::String::from($name), $crate::Operand::from($value));)*
        map
    }};
}
