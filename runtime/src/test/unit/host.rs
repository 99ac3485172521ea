use std::sync::Arc;

use frx_codegen::TemplateParams;
use frx_device::{HostAllocator, Matrix};
use frx_dtype::{NativeType, ScalarDType};

use super::support::{host_config, host_provider};
use crate::backend::KernelBackend;
use crate::marshal::NativeArg;
use crate::source_module::SourceModule;
use crate::Error;

const ADD: &str = r#"
#include <stdint.h>

static void add(int n, double* x, double v)
{
    for (int i = 0; i < n; i++)
        x[i] += v;
}

void add_entry(void** _args)
{
    add(*(const int*)_args[0], (double*)(uintptr_t)*(const uint64_t*)_args[1], *(const double*)_args[2]);
}
"#;

const ADD_ARGS: [NativeType; 3] = [NativeType::INT32, NativeType::Ptr, NativeType::Scalar(ScalarDType::Float64)];

#[test]
fn test_compile_and_call() {
    let module = Arc::new(SourceModule::compile(ADD, &host_config()).unwrap());
    assert!(module.path().exists());

    let fun = module.function("add", &ADD_ARGS).unwrap();
    assert_eq!(fun.name(), "add");

    let x = Matrix::from_rows(&HostAllocator, 1, 4, &[1.0f64, 2.0, 3.0, 4.0]).unwrap();
    fun.call(&[NativeArg::I32(3), NativeArg::Ptr(x.address()), NativeArg::F64(0.5)]).unwrap();

    assert_eq!(x.get::<f64>().unwrap(), vec![1.5, 2.5, 3.5, 4.0]);
}

#[test]
fn test_call_checks_types() {
    let module = Arc::new(SourceModule::compile(ADD, &host_config()).unwrap());
    let fun = module.function("add", &ADD_ARGS).unwrap();

    let wrong_type = fun.call(&[NativeArg::I32(1), NativeArg::Ptr(0), NativeArg::F32(0.5)]);
    assert!(matches!(wrong_type, Err(Error::ArgumentMismatch { .. })));

    let too_few = fun.call(&[NativeArg::I32(1)]);
    assert!(matches!(too_few, Err(Error::ArgumentMismatch { .. })));
}

#[test]
fn test_missing_symbol() {
    let module = Arc::new(SourceModule::compile(ADD, &host_config()).unwrap());
    assert!(matches!(module.function("sub", &ADD_ARGS), Err(Error::SymbolNotFound { .. })));
}

#[test]
fn test_compile_failure() {
    let result = SourceModule::compile("void broken(void) { return 1 }", &host_config());
    assert!(matches!(result, Err(Error::Compilation { .. })));
}

#[test]
fn test_function_outlives_module_handle() {
    let fun = {
        let module = Arc::new(SourceModule::compile(ADD, &host_config()).unwrap());
        module.function("add", &ADD_ARGS).unwrap()
    };

    let x = Matrix::from_rows(&HostAllocator, 1, 2, &[0.0f64, 0.0]).unwrap();
    fun.call(&[NativeArg::I32(2), NativeArg::Ptr(x.address()), NativeArg::F64(1.0)]).unwrap();
    assert_eq!(x.get::<f64>().unwrap(), vec![1.0, 1.0]);
}

#[test]
fn test_host_backend_builds_rendered_kernel() {
    let provider = host_provider();
    let backend = provider.backend();

    let params = TemplateParams::new().with("n", 1);
    let (src, argspec) = backend.render_kernel("axnpby", frx_codegen::templates::AXNPBY, &params).unwrap();
    let fun = backend.build_kernel("axnpby", &src, &argspec.argtypes()).unwrap();

    let y = Matrix::from_rows(&HostAllocator, 1, 3, &[1.0f64, 1.0, 1.0]).unwrap();
    let x = Matrix::from_rows(&HostAllocator, 1, 3, &[1.0f64, 2.0, 3.0]).unwrap();
    let args = [
        NativeArg::I32(3),
        NativeArg::Ptr(y.address()),
        NativeArg::F64(2.0),
        NativeArg::Ptr(x.address()),
        NativeArg::F64(10.0),
    ];
    backend.launch(&fun, &[3], &args).unwrap();

    assert_eq!(y.get::<f64>().unwrap(), vec![12.0, 22.0, 32.0]);
}
