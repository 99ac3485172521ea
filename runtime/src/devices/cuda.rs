//! CUDA backend: NVRTC-compiled kernels launched on one stream.

use std::sync::Arc;

use cudarc::driver::{CudaContext, CudaFunction, CudaModule, CudaStream, LaunchConfig, PushKernelArg};
use frx_codegen::{Renderer, TemplateLookup};
use frx_device::{Allocator, CudaAllocator};
use frx_dtype::{NativeType, Precision};
use snafu::{ResultExt, ensure};

use crate::backend::KernelBackend;
use crate::config::{BackendConfig, CudaConfig};
use crate::error::{ArgumentMismatchSnafu, CompilationSnafu, CudaSnafu, Result};
use crate::launch::LaunchGrid;
use crate::marshal::NativeArg;

/// A kernel loaded from a PTX module.
pub struct CudaKernelFunction {
    name: String,
    argtypes: Vec<NativeType>,
    function: CudaFunction,
    _module: Arc<CudaModule>,
}

impl std::fmt::Debug for CudaKernelFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CudaKernelFunction").field("name", &self.name).field("argtypes", &self.argtypes).finish()
    }
}

impl CudaKernelFunction {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn argtypes(&self) -> &[NativeType] {
        &self.argtypes
    }
}

pub struct CudaBackend {
    renderer: Renderer,
    context: Arc<CudaContext>,
    stream: Arc<CudaStream>,
    allocator: Arc<dyn Allocator>,
    block_size: u32,
}

impl std::fmt::Debug for CudaBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CudaBackend")
            .field("renderer", &self.renderer)
            .field("device", &self.context.ordinal())
            .field("block_size", &self.block_size)
            .finish()
    }
}

impl CudaBackend {
    /// CUDA backend with the built-in templates.
    pub fn new(config: &BackendConfig) -> Result<Self> {
        Self::with_lookup(Arc::new(TemplateLookup::with_builtins()), config.precision, config.cuda)
    }

    pub fn with_lookup(lookup: Arc<TemplateLookup>, precision: Precision, config: CudaConfig) -> Result<Self> {
        let context = CudaContext::new(config.device_id).context(CudaSnafu)?;
        let stream = context.default_stream();
        let allocator: Arc<dyn Allocator> = Arc::new(CudaAllocator::with_stream(Arc::clone(&stream)));

        tracing::debug!(device = config.device_id, block_size = config.block_size, "CUDA backend initialized");

        Ok(Self {
            renderer: Renderer::cuda(lookup, precision),
            context,
            stream,
            allocator,
            block_size: config.block_size,
        })
    }

    pub fn stream(&self) -> &Arc<CudaStream> {
        &self.stream
    }

    /// Wait for every kernel enqueued so far.
    pub fn synchronize(&self) -> Result<()> {
        self.stream.synchronize().context(CudaSnafu)
    }
}

impl KernelBackend for CudaBackend {
    type Function = CudaKernelFunction;

    fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    fn allocator(&self) -> Arc<dyn Allocator> {
        Arc::clone(&self.allocator)
    }

    fn build_kernel(&self, name: &str, src: &str, argtypes: &[NativeType]) -> Result<CudaKernelFunction> {
        let ptx = cudarc::nvrtc::compile_ptx(src)
            .map_err(|e| CompilationSnafu { reason: format!("NVRTC: {e:?}\nSource:\n{src}") }.build())?;
        let module = self.context.load_module(ptx).context(CudaSnafu)?;
        let function = module.load_function(name).context(CudaSnafu)?;

        tracing::debug!(kernel.name = %name, "CUDA kernel compiled and loaded");

        Ok(CudaKernelFunction { name: name.to_string(), argtypes: argtypes.to_vec(), function, _module: module })
    }

    /// Enqueue `fun` with one thread per `_x`; returns before completion.
    fn launch(&self, fun: &CudaKernelFunction, dims: &[usize], args: &[NativeArg]) -> Result<()> {
        ensure!(
            args.iter().map(NativeArg::native_type).eq(fun.argtypes.iter().copied()),
            ArgumentMismatchSnafu { reason: format!("{} called with mismatched arguments", fun.name) }
        );

        // Threads span the innermost dimension; zero-dimensional kernels use one.
        let count = dims.last().copied().unwrap_or(1);
        let grid = LaunchGrid::for_elements(count, self.block_size)?;

        let mut builder = self.stream.launch_builder(&fun.function);
        for arg in args {
            match arg {
                NativeArg::I32(v) => builder.arg(v),
                NativeArg::I64(v) => builder.arg(v),
                NativeArg::F32(v) => builder.arg(v),
                NativeArg::F64(v) => builder.arg(v),
                NativeArg::Ptr(v) => builder.arg(v),
            };
        }

        tracing::trace!(kernel.name = %fun.name, grid = grid.grid, block = grid.block, "launching CUDA kernel");

        // SAFETY: argument types were checked against the kernel signature and
        // every address comes from this backend's allocator.
        unsafe { builder.launch(LaunchConfig::from(grid)) }.context(CudaSnafu)?;
        Ok(())
    }
}
