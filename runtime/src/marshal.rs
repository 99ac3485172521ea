//! Argument marshaling.
//!
//! Expands operands into the flat native argument list of a compiled kernel.
//! The first `ndim` slots are the dimensions; each declared argument then
//! takes the slots its [`ArgSpec`] entry lists:
//!
//! | Operand | Slots |
//! |---|---|
//! | `Matrix` / `MatrixBank` | address, plus `leadsubdim` when two slots are declared |
//! | `View` / `MpiView` | mapping address, stride address |
//! | `Scalar` | value, cast to the declared type |
//! | `Pointer` | address |

use std::ffi::c_void;

use frx_codegen::ArgSpec;
use frx_device::{MatrixBank, Operand, OperandMap, View};
use frx_dtype::{NativeType, ScalarDType, ScalarValue};
use snafu::{OptionExt, ensure};

use crate::error::{ArgumentMismatchSnafu, Result};

/// One value of a native argument list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NativeArg {
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    /// Host or device address.
    Ptr(u64),
}

impl NativeArg {
    pub fn native_type(&self) -> NativeType {
        match self {
            Self::I32(_) => NativeType::Scalar(ScalarDType::Int32),
            Self::I64(_) => NativeType::Scalar(ScalarDType::Int64),
            Self::F32(_) => NativeType::Scalar(ScalarDType::Float32),
            Self::F64(_) => NativeType::Scalar(ScalarDType::Float64),
            Self::Ptr(_) => NativeType::Ptr,
        }
    }

    /// Pointer to the stored value, for `void**` calling conventions.
    pub fn as_void_ptr(&self) -> *mut c_void {
        match self {
            Self::I32(v) => v as *const i32 as *mut c_void,
            Self::I64(v) => v as *const i64 as *mut c_void,
            Self::F32(v) => v as *const f32 as *mut c_void,
            Self::F64(v) => v as *const f64 as *mut c_void,
            Self::Ptr(v) => v as *const u64 as *mut c_void,
        }
    }
}

impl From<ScalarValue> for NativeArg {
    fn from(value: ScalarValue) -> Self {
        match value {
            ScalarValue::Int32(v) => Self::I32(v),
            ScalarValue::Int64(v) => Self::I64(v),
            ScalarValue::Float32(v) => Self::F32(v),
            ScalarValue::Float64(v) => Self::F64(v),
        }
    }
}

/// A marshaled argument that may still depend on launch-time state.
#[derive(Debug, Clone)]
pub enum BoundArg {
    Native(NativeArg),
    /// Address of whichever bank member is active at launch.
    Bank(MatrixBank),
}

impl BoundArg {
    pub fn native_type(&self) -> NativeType {
        match self {
            Self::Native(arg) => arg.native_type(),
            Self::Bank(_) => NativeType::Ptr,
        }
    }

    pub fn resolve(&self) -> NativeArg {
        match self {
            Self::Native(arg) => *arg,
            Self::Bank(bank) => NativeArg::Ptr(bank.active().address()),
        }
    }
}

/// Resolve bound arguments to their values at this instant.
pub fn resolve_args(args: &[BoundArg]) -> Vec<NativeArg> {
    args.iter().map(BoundArg::resolve).collect()
}

fn to_i32(what: &str, value: usize) -> Result<i32> {
    i32::try_from(value).ok().context(ArgumentMismatchSnafu { reason: format!("{what} {value} overflows i32") })
}

fn view_slots(view: &View) -> [BoundArg; 2] {
    [
        BoundArg::Native(NativeArg::Ptr(view.mapping().address())),
        BoundArg::Native(NativeArg::Ptr(view.strides().address())),
    ]
}

/// Build the native argument list for a kernel with contract `argspec`.
pub fn build_arglist(dims: &[usize], argspec: &ArgSpec, operands: &OperandMap) -> Result<Vec<BoundArg>> {
    ensure!(
        dims.len() == argspec.ndim,
        ArgumentMismatchSnafu { reason: format!("{} dimensions given, kernel has {}", dims.len(), argspec.ndim) }
    );

    let mut arglst = Vec::with_capacity(argspec.types.iter().map(|t| t.len()).sum());
    for &dim in dims {
        arglst.push(BoundArg::Native(NativeArg::I32(to_i32("dimension", dim)?)));
    }

    for (name, slots) in argspec.args() {
        let operand = operands
            .get(name)
            .context(ArgumentMismatchSnafu { reason: format!("no operand supplied for argument {name}") })?;
        let mismatch = || {
            ArgumentMismatchSnafu { reason: format!("{} operand cannot fill {name}: {slots:?}", operand.kind()) }.build()
        };

        match (operand, slots.as_slice()) {
            (Operand::Matrix(m), [NativeType::Ptr]) => arglst.push(BoundArg::Native(NativeArg::Ptr(m.address()))),
            (Operand::Matrix(m), [NativeType::Ptr, _]) => {
                arglst.push(BoundArg::Native(NativeArg::Ptr(m.address())));
                arglst.push(BoundArg::Native(NativeArg::I32(to_i32("leadsubdim", m.leadsubdim())?)));
            }
            (Operand::MatrixBank(b), [NativeType::Ptr]) => arglst.push(BoundArg::Bank(b.clone())),
            (Operand::MatrixBank(b), [NativeType::Ptr, _]) => {
                arglst.push(BoundArg::Bank(b.clone()));
                arglst.push(BoundArg::Native(NativeArg::I32(to_i32("leadsubdim", b.traits().leadsubdim)?)));
            }
            (Operand::MpiView(mv), [NativeType::Ptr, NativeType::Ptr]) => arglst.extend(view_slots(mv.view())),
            (Operand::View(v), [NativeType::Ptr, NativeType::Ptr]) => arglst.extend(view_slots(v)),
            (Operand::Scalar(s), [NativeType::Scalar(dtype)]) => {
                arglst.push(BoundArg::Native(s.cast(*dtype).into()));
            }
            (Operand::Pointer(p), [NativeType::Ptr]) => arglst.push(BoundArg::Native(NativeArg::Ptr(*p))),
            _ => return Err(mismatch()),
        }
    }

    let expected = argspec.argtypes();
    ensure!(
        arglst.len() == expected.len() && arglst.iter().zip(&expected).all(|(a, t)| a.native_type() == *t),
        ArgumentMismatchSnafu {
            reason: format!(
                "marshaled {:?}, kernel expects {expected:?}",
                arglst.iter().map(BoundArg::native_type).collect::<Vec<_>>()
            )
        }
    );

    Ok(arglst)
}
