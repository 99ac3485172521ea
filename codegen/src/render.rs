//! Template rendering.
//!
//! A [`Renderer`] binds a [`TemplateLookup`] to one backend's generator
//! strategies and floating-point precision. Rendering a module runs its
//! template against a fresh [`RenderContext`], which accumulates source text
//! and records the [`ArgSpec`] of every kernel the template declares.

use std::collections::HashMap;
use std::sync::Arc;

use frx_dtype::{Precision, ScalarDType};
use snafu::{OptionExt, ensure};

use crate::error::{DuplicateKernelSnafu, InvalidKernelSnafu, KernelNotDefinedSnafu, Result, UnknownTemplateSnafu};
use crate::params::FPDTYPE;
use crate::{ArgSpec, BackendKind, FunctionGenerator, KernelArg, KernelGenerator, KernelTemplate, TemplateParams};

/// Accumulates the source of one module.
pub struct RenderContext<'a> {
    module: &'a str,
    fpdtype: ScalarDType,
    kernel_gen: &'a dyn KernelGenerator,
    function_gen: &'a dyn FunctionGenerator,
    source: String,
    argspecs: HashMap<String, ArgSpec>,
}

impl<'a> RenderContext<'a> {
    pub fn new(
        module: &'a str,
        fpdtype: ScalarDType,
        kernel_gen: &'a dyn KernelGenerator,
        function_gen: &'a dyn FunctionGenerator,
    ) -> Self {
        let source = kernel_gen.prelude(fpdtype);
        Self { module, fpdtype, kernel_gen, function_gen, source, argspecs: HashMap::new() }
    }

    pub fn module(&self) -> &str {
        self.module
    }

    pub fn backend(&self) -> BackendKind {
        self.kernel_gen.backend()
    }

    pub fn fpdtype(&self) -> ScalarDType {
        self.fpdtype
    }

    /// Append raw source (typedefs, constants).
    pub fn emit(&mut self, text: &str) {
        self.source.push('\n');
        self.source.push_str(text);
        if !text.ends_with('\n') {
            self.source.push('\n');
        }
    }

    /// Add a helper function.
    pub fn function(&mut self, rettype: &str, name: &str, params: &str, body: &str) {
        let text = self.function_gen.render(rettype, name, params, body);
        self.emit(&text);
    }

    /// Add a pointwise kernel over `ndim` (0, 1 or 2) dimensions.
    pub fn kernel(&mut self, name: &str, ndim: usize, args: &[KernelArg], body: &str) -> Result<()> {
        ensure!(ndim <= 2, InvalidKernelSnafu { name, reason: format!("{ndim} dimensions, at most 2 supported") });
        ensure!(!self.argspecs.contains_key(name), DuplicateKernelSnafu { name });

        let text = self.kernel_gen.render(name, ndim, args, body);
        self.emit(&text);
        self.argspecs.insert(name.to_string(), ArgSpec::new(ndim, args));
        Ok(())
    }

    /// Source text and argspecs by kernel name.
    pub fn finish(self) -> (String, HashMap<String, ArgSpec>) {
        (self.source, self.argspecs)
    }
}

/// Templates by module identifier.
#[derive(Clone, Default)]
pub struct TemplateLookup {
    templates: HashMap<String, Arc<dyn KernelTemplate>>,
}

impl std::fmt::Debug for TemplateLookup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut modules: Vec<_> = self.templates.keys().collect();
        modules.sort();
        f.debug_struct("TemplateLookup").field("modules", &modules).finish()
    }
}

impl TemplateLookup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lookup pre-populated with the built-in kernels.
    pub fn with_builtins() -> Self {
        let mut lookup = Self::new();
        crate::templates::register_builtins(&mut lookup);
        lookup
    }

    /// Add or replace the template for `module`.
    pub fn register(&mut self, module: impl Into<String>, template: impl KernelTemplate + 'static) {
        self.templates.insert(module.into(), Arc::new(template));
    }

    pub fn get(&self, module: &str) -> Result<Arc<dyn KernelTemplate>> {
        self.templates.get(module).cloned().context(UnknownTemplateSnafu { module })
    }

    pub fn contains(&self, module: &str) -> bool {
        self.templates.contains_key(module)
    }
}

/// Renders templates for one backend.
#[derive(Clone)]
pub struct Renderer {
    lookup: Arc<TemplateLookup>,
    kernel_gen: Arc<dyn KernelGenerator>,
    function_gen: Arc<dyn FunctionGenerator>,
    precision: Precision,
}

impl std::fmt::Debug for Renderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Renderer")
            .field("backend", &self.kernel_gen.backend())
            .field("precision", &self.precision)
            .field("lookup", &self.lookup)
            .finish()
    }
}

impl Renderer {
    pub fn new(
        lookup: Arc<TemplateLookup>,
        kernel_gen: Arc<dyn KernelGenerator>,
        function_gen: Arc<dyn FunctionGenerator>,
        precision: Precision,
    ) -> Self {
        Self { lookup, kernel_gen, function_gen, precision }
    }

    pub fn host(lookup: Arc<TemplateLookup>, precision: Precision) -> Self {
        Self::new(lookup, Arc::new(crate::c::HostKernelGenerator), Arc::new(crate::c::HostFunctionGenerator), precision)
    }

    pub fn cuda(lookup: Arc<TemplateLookup>, precision: Precision) -> Self {
        Self::new(
            lookup,
            Arc::new(crate::cuda::CudaKernelGenerator),
            Arc::new(crate::cuda::CudaFunctionGenerator),
            precision,
        )
    }

    pub fn backend(&self) -> BackendKind {
        self.kernel_gen.backend()
    }

    pub fn precision(&self) -> Precision {
        self.precision
    }

    pub fn lookup(&self) -> &TemplateLookup {
        &self.lookup
    }

    /// Render every kernel of `module`.
    ///
    /// `fpdtype` is injected from the backend precision unless the caller
    /// already set it.
    pub fn render_module(&self, module: &str, params: &TemplateParams) -> Result<(String, HashMap<String, ArgSpec>)> {
        let template = self.lookup.get(module)?;

        let mut params = params.clone();
        if !params.contains(FPDTYPE) {
            params.insert(FPDTYPE, self.precision.dtype());
        }
        let fpdtype = params.fpdtype()?;

        let mut ctx = RenderContext::new(module, fpdtype, self.kernel_gen.as_ref(), self.function_gen.as_ref());
        template.render(&mut ctx, &params)?;

        tracing::debug!(module, backend = %self.backend(), %fpdtype, "rendered template");
        Ok(ctx.finish())
    }

    /// Render `module` and return the source together with the argspec of kernel `name`.
    pub fn render_kernel(&self, name: &str, module: &str, params: &TemplateParams) -> Result<(String, ArgSpec)> {
        let (source, mut argspecs) = self.render_module(module, params)?;
        let argspec = argspecs.remove(name).context(KernelNotDefinedSnafu { name, module })?;
        Ok((source, argspec))
    }
}
