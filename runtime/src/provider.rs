//! The kernel provider.
//!
//! Kernels are registered by template module identifier and invoked by
//! name. The first request for a (name, parameters) pair renders and compiles
//! the kernel; later requests only marshal operands and instantiate.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;

use frx_codegen::{ArgSpec, TemplateParams};
use frx_device::OperandMap;
use frx_dtype::NativeType;
use parking_lot::RwLock;
use snafu::OptionExt;

use crate::backend::KernelBackend;
use crate::cache::KernelCache;
use crate::error::{RegistrationConflictSnafu, Result, UnknownKernelSnafu};
use crate::kernel::ComputeKernel;

/// Render cache key: kernel name, module identifier, parameters.
type RenderKey = (String, String, TemplateParams);

/// Build cache key: kernel name, rendered source, native argument types.
type BuildKey = (String, String, Vec<NativeType>);

/// A rendered module and the argspec of one of its kernels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedKernel {
    pub source: String,
    pub argspec: ArgSpec,
}

/// Public kernel name of a module identifier: its final `.` segment.
pub fn kernel_name(module: &str) -> &str {
    module.rsplit('.').next().unwrap_or(module)
}

pub struct KernelProvider<B: KernelBackend> {
    backend: Arc<B>,
    registry: RwLock<HashMap<String, String>>,
    renders: KernelCache<RenderKey, RenderedKernel>,
    builds: KernelCache<BuildKey, B::Function>,
}

impl<B: KernelBackend + std::fmt::Debug> std::fmt::Debug for KernelProvider<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KernelProvider")
            .field("backend", &self.backend)
            .field("registry", &*self.registry.read())
            .field("renders", &self.renders)
            .field("builds", &self.builds)
            .finish()
    }
}

impl<B: KernelBackend> KernelProvider<B> {
    pub fn new(backend: B) -> Self {
        Self::with_backend(Arc::new(backend))
    }

    pub fn with_backend(backend: Arc<B>) -> Self {
        Self {
            backend,
            registry: RwLock::new(HashMap::new()),
            renders: KernelCache::new("render"),
            builds: KernelCache::new("build"),
        }
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    /// Bind the kernel named by the final segment of `module`.
    ///
    /// Registering the same module again is a no-op; binding the name to a
    /// different module is an error.
    pub fn register(&self, module: &str) -> Result<String> {
        let name = kernel_name(module).to_string();

        match self.registry.write().entry(name.clone()) {
            Entry::Occupied(entry) if entry.get() == module => {
                tracing::trace!(kernel.name = %name, module, "kernel already registered");
            }
            Entry::Occupied(entry) => {
                return RegistrationConflictSnafu { name, existing: entry.get().clone(), module }.fail();
            }
            Entry::Vacant(entry) => {
                tracing::debug!(kernel.name = %name, module, "registered kernel");
                entry.insert(module.to_string());
            }
        }

        Ok(name)
    }

    /// Module a kernel name is bound to.
    pub fn module_of(&self, name: &str) -> Option<String> {
        self.registry.read().get(name).cloned()
    }

    /// Instantiate registered kernel `name` over `dims` with `operands`.
    pub fn kernel(
        &self,
        name: &str,
        params: &TemplateParams,
        dims: &[usize],
        operands: &OperandMap,
    ) -> Result<Box<dyn ComputeKernel>> {
        let module = self.module_of(name).context(UnknownKernelSnafu { name })?;

        let (fun, argspec) = self.function(name, &module, params)?;
        let args = self.backend.build_arglist(dims, &argspec, operands)?;
        self.backend.instantiate_kernel(dims.to_vec(), fun, args)
    }

    /// Render and build kernel `name` of `module`, through both caches.
    pub fn function(&self, name: &str, module: &str, params: &TemplateParams) -> Result<(Arc<B::Function>, ArgSpec)> {
        let render_key = (name.to_string(), module.to_string(), params.clone());
        let rendered = self.renders.get_or_try_build(&render_key, || {
            let (source, argspec) = self.backend.render_kernel(name, module, params)?;
            Ok(RenderedKernel { source, argspec })
        })?;

        let argtypes = rendered.argspec.argtypes();
        let build_key = (name.to_string(), rendered.source.clone(), argtypes);
        let fun = self.builds.get_or_try_build(&build_key, || {
            tracing::debug!(kernel.name = %name, module, "compiling kernel");
            self.backend.build_kernel(name, &rendered.source, &build_key.2)
        })?;

        Ok((fun, rendered.argspec.clone()))
    }

    pub fn render_cache(&self) -> &KernelCache<RenderKey, RenderedKernel> {
        &self.renders
    }

    pub fn build_cache(&self) -> &KernelCache<BuildKey, B::Function> {
        &self.builds
    }
}
