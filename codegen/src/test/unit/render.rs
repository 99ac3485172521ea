use std::sync::Arc;

use frx_dtype::{NativeType, Precision, ScalarDType};

use crate::render::RenderContext;
use crate::{
    ArgSpec, BackendKind, Error, Intent, KernelArg, KernelTemplate, Renderer, Result, TemplateLookup, TemplateParams,
};

/// Declares two kernels, one of them strided, plus a helper.
struct TwoKernels;

impl KernelTemplate for TwoKernels {
    fn render(&self, ctx: &mut RenderContext<'_>, params: &TemplateParams) -> Result<()> {
        let fpdtype = ctx.fpdtype();
        let scale = params.int("scale")?;

        ctx.function("fpdtype_t", "twice", "fpdtype_t v", "return 2*v;");
        ctx.kernel("first", 1, &[KernelArg::matrix("y", Intent::Out, fpdtype)], &format!("y[_x] = {scale};"))?;
        ctx.kernel(
            "second",
            2,
            &[KernelArg::strided_matrix("m", Intent::InOut, fpdtype), KernelArg::view("v", Intent::In, fpdtype)],
            "m[_y*ldm + _x] = twice(v_vix[_x][0]);",
        )
    }
}

struct Duplicate;

impl KernelTemplate for Duplicate {
    fn render(&self, ctx: &mut RenderContext<'_>, _params: &TemplateParams) -> Result<()> {
        ctx.kernel("k", 1, &[], "")?;
        ctx.kernel("k", 1, &[], "")
    }
}

fn lookup() -> Arc<TemplateLookup> {
    let mut lookup = TemplateLookup::new();
    lookup.register("test.two", TwoKernels);
    lookup.register("test.dup", Duplicate);
    Arc::new(lookup)
}

#[test]
fn test_argspec_back_channel() {
    let renderer = Renderer::host(lookup(), Precision::Double);
    let (src, argspec) = renderer.render_kernel("second", "test.two", &TemplateParams::new().with("scale", 3)).unwrap();

    assert_eq!(argspec.ndim, 2);
    assert_eq!(argspec.names, vec!["_ny", "_nx", "m", "v"]);
    assert_eq!(
        argspec.argtypes(),
        vec![NativeType::INT32, NativeType::INT32, NativeType::Ptr, NativeType::INT32, NativeType::Ptr, NativeType::Ptr]
    );
    assert_eq!(argspec.args().map(|(n, t)| (n, t.len())).collect::<Vec<_>>(), vec![("m", 2), ("v", 2)]);

    assert!(src.contains("typedef double fpdtype_t;"));
    assert!(src.contains("static inline fpdtype_t twice(fpdtype_t v)"));
    assert!(src.contains("y[_x] = 3;"));
}

#[test]
fn test_precision_injected() {
    let renderer = Renderer::host(lookup(), Precision::Single);
    let (src, _) = renderer.render_kernel("first", "test.two", &TemplateParams::new().with("scale", 1)).unwrap();

    assert!(src.contains("typedef float fpdtype_t;"));
    assert!(src.contains("float* restrict y"));
}

#[test]
fn test_caller_fpdtype_wins() {
    let renderer = Renderer::host(lookup(), Precision::Single);
    let params = TemplateParams::new().with("scale", 1).with("fpdtype", ScalarDType::Float64);
    let (src, _) = renderer.render_kernel("first", "test.two", &params).unwrap();

    assert!(src.contains("typedef double fpdtype_t;"));
}

#[test]
fn test_render_is_pure() {
    let renderer = Renderer::host(lookup(), Precision::Double);
    let params = TemplateParams::new().with("scale", 5);

    assert_eq!(
        renderer.render_kernel("first", "test.two", &params).unwrap(),
        renderer.render_kernel("first", "test.two", &params).unwrap()
    );
}

#[test]
fn test_kernel_not_defined() {
    let renderer = Renderer::host(lookup(), Precision::Double);
    let result = renderer.render_kernel("third", "test.two", &TemplateParams::new().with("scale", 1));

    assert!(matches!(result, Err(Error::KernelNotDefined { name, .. }) if name == "third"));
}

#[test]
fn test_unknown_module_and_missing_param() {
    let renderer = Renderer::host(lookup(), Precision::Double);

    assert!(matches!(
        renderer.render_kernel("x", "test.none", &TemplateParams::new()),
        Err(Error::UnknownTemplate { .. })
    ));
    assert!(matches!(
        renderer.render_kernel("first", "test.two", &TemplateParams::new()),
        Err(Error::MissingParam { name }) if name == "scale"
    ));
}

#[test]
fn test_duplicate_kernel() {
    let renderer = Renderer::host(lookup(), Precision::Double);
    assert!(matches!(
        renderer.render_kernel("k", "test.dup", &TemplateParams::new()),
        Err(Error::DuplicateKernel { .. })
    ));
}

#[test]
fn test_cuda_renderer() {
    let renderer = Renderer::cuda(lookup(), Precision::Double);
    let (src, argspec) = renderer.render_kernel("first", "test.two", &TemplateParams::new().with("scale", 1)).unwrap();

    assert_eq!(renderer.backend(), BackendKind::Cuda);
    assert!(src.contains("__device__ __forceinline__ fpdtype_t twice"));
    assert!(src.contains("extern \"C\" __global__ void first"));
    assert_eq!(argspec, ArgSpec::new(1, &[KernelArg::matrix("y", Intent::Out, ScalarDType::Float64)]));
}
