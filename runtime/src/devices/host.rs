//! Host backend: C/OpenMP kernels compiled into shared libraries.

use std::sync::Arc;

use frx_codegen::{Renderer, TemplateLookup};
use frx_device::{Allocator, HostAllocator};
use frx_dtype::{NativeType, Precision};

use crate::backend::KernelBackend;
use crate::config::{BackendConfig, HostConfig};
use crate::marshal::NativeArg;
use crate::source_module::{HostFunction, SourceModule};
use crate::Result;

#[derive(Debug)]
pub struct HostBackend {
    renderer: Renderer,
    config: HostConfig,
    allocator: Arc<dyn Allocator>,
}

impl HostBackend {
    /// Host backend with the built-in templates.
    pub fn new(config: &BackendConfig) -> Self {
        Self::with_lookup(Arc::new(TemplateLookup::with_builtins()), config.precision, config.host.clone())
    }

    pub fn with_lookup(lookup: Arc<TemplateLookup>, precision: Precision, config: HostConfig) -> Self {
        Self { renderer: Renderer::host(lookup, precision), config, allocator: HostAllocator::shared() }
    }

    pub fn config(&self) -> &HostConfig {
        &self.config
    }
}

impl KernelBackend for HostBackend {
    type Function = HostFunction;

    fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    fn allocator(&self) -> Arc<dyn Allocator> {
        Arc::clone(&self.allocator)
    }

    fn build_kernel(&self, name: &str, src: &str, argtypes: &[NativeType]) -> Result<HostFunction> {
        let module = Arc::new(SourceModule::compile(src, &self.config)?);
        module.function(name, argtypes)
    }

    fn launch(&self, fun: &HostFunction, _dims: &[usize], args: &[NativeArg]) -> Result<()> {
        fun.call(args)
    }
}
