//! Backend-specific generator strategies and the template interface.

use frx_dtype::ScalarDType;

use crate::render::RenderContext;
use crate::{KernelArg, Result, TemplateParams};

/// Backend a piece of source is generated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum BackendKind {
    Host,
    Cuda,
}

/// Emits the boilerplate around a pointwise kernel body.
///
/// The body is plain C that may use `fpdtype_t`, the element indices `_x`
/// (and `_y` when `ndim == 2`), and the parameters implied by `args`.
pub trait KernelGenerator: Send + Sync {
    fn backend(&self) -> BackendKind;

    /// Source emitted once at the top of every module.
    fn prelude(&self, fpdtype: ScalarDType) -> String;

    fn render(&self, name: &str, ndim: usize, args: &[KernelArg], body: &str) -> String;
}

/// Emits helper functions callable from kernel bodies.
pub trait FunctionGenerator: Send + Sync {
    /// `params` is a C parameter list, e.g. `"int n, fpdtype_t x"`.
    fn render(&self, rettype: &str, name: &str, params: &str, body: &str) -> String;
}

/// A backend-neutral kernel definition.
///
/// Templates add kernels and helper functions to the [`RenderContext`]; the
/// context takes care of the backend specifics.
pub trait KernelTemplate: Send + Sync {
    fn render(&self, ctx: &mut RenderContext<'_>, params: &TemplateParams) -> Result<()>;
}
