//! The contract every execution backend implements.

use std::sync::Arc;

use frx_codegen::{ArgSpec, Renderer, TemplateParams};
use frx_device::{Allocator, OperandMap};
use frx_dtype::{NativeType, ScalarValue};
use snafu::{ResultExt, ensure};

use crate::error::{ArgumentMismatchSnafu, CodegenSnafu, EmptyLaunchSnafu, Result};
use crate::kernel::ComputeKernel;
use crate::marshal::{self, BoundArg, NativeArg};

/// Render, build, marshal and instantiate kernels for one backend.
///
/// A [`KernelProvider`](crate::KernelProvider) drives these steps and caches
/// the first two.
pub trait KernelBackend: Send + Sync + Sized + 'static {
    /// A compiled, invocable kernel.
    type Function: Send + Sync + 'static;

    fn renderer(&self) -> &Renderer;

    /// Allocator for operands this backend's kernels can address.
    fn allocator(&self) -> Arc<dyn Allocator>;

    fn render_kernel(&self, name: &str, module: &str, params: &TemplateParams) -> Result<(String, ArgSpec)> {
        self.renderer().render_kernel(name, module, params).context(CodegenSnafu)
    }

    fn build_kernel(&self, name: &str, src: &str, argtypes: &[NativeType]) -> Result<Self::Function>;

    fn build_arglist(&self, dims: &[usize], argspec: &ArgSpec, operands: &OperandMap) -> Result<Vec<BoundArg>> {
        marshal::build_arglist(dims, argspec, operands)
    }

    /// Wrap a compiled function and its bound arguments in a kernel.
    fn instantiate_kernel(
        self: &Arc<Self>,
        dims: Vec<usize>,
        fun: Arc<Self::Function>,
        args: Vec<BoundArg>,
    ) -> Result<Box<dyn ComputeKernel>> {
        Ok(Box::new(PointwiseKernel::new(Arc::clone(self), dims, fun, args)?))
    }

    /// Execute `fun` over `dims` with fully resolved arguments.
    fn launch(&self, fun: &Self::Function, dims: &[usize], args: &[NativeArg]) -> Result<()>;
}

/// A compiled function bound to fixed operands.
pub struct PointwiseKernel<B: KernelBackend> {
    backend: Arc<B>,
    dims: Vec<usize>,
    fun: Arc<B::Function>,
    args: Vec<BoundArg>,
}

impl<B: KernelBackend> PointwiseKernel<B> {
    /// Every dimension must be non-zero.
    pub fn new(backend: Arc<B>, dims: Vec<usize>, fun: Arc<B::Function>, args: Vec<BoundArg>) -> Result<Self> {
        ensure!(dims.iter().all(|&d| d > 0), EmptyLaunchSnafu { what: format!("dimensions {dims:?}") });
        Ok(Self { backend, dims, fun, args })
    }
}

impl<B: KernelBackend> ComputeKernel for PointwiseKernel<B> {
    fn run(&mut self, args: &[ScalarValue]) -> Result<()> {
        ensure!(
            args.is_empty(),
            ArgumentMismatchSnafu { reason: format!("pointwise kernels take no run arguments, got {}", args.len()) }
        );
        self.backend.launch(&self.fun, &self.dims, &marshal::resolve_args(&self.args))
    }
}
