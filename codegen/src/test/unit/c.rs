//! Host generator output checks.

use frx_dtype::ScalarDType;
use test_case::test_case;

use crate::c::{HostFunctionGenerator, HostKernelGenerator, kernel_params};
use crate::{FunctionGenerator, Intent, KernelArg, KernelGenerator};

const F64: ScalarDType = ScalarDType::Float64;

#[test]
fn test_prelude() {
    let prelude = HostKernelGenerator.prelude(ScalarDType::Float32);

    assert!(prelude.contains("#include <stdint.h>"));
    assert!(prelude.contains("#ifdef _OPENMP"));
    assert!(prelude.contains("omp_get_thread_num(void) { return 0; }"));
    assert!(prelude.contains("typedef float fpdtype_t;"));
}

#[test]
fn test_params_per_slot() {
    let args = [
        KernelArg::matrix("y", Intent::InOut, F64),
        KernelArg::strided_matrix("m", Intent::In, F64),
        KernelArg::view("v", Intent::In, F64),
        KernelArg::scalar("beta", F64),
        KernelArg::pointer("fn"),
    ];
    let decls: Vec<_> = kernel_params(1, &args).iter().map(|p| p.decl("restrict")).collect();

    assert_eq!(
        decls,
        vec![
            "int _nx",
            "double* restrict y",
            "const double* restrict m",
            "int ldm",
            "const double* const* restrict v_vix",
            "const int* restrict v_vstri",
            "double beta",
            "void* fn",
        ]
    );
}

#[test_case(0, "    {\n        y[0] = 1;\n    }" ; "scalar")]
#[test_case(1, "#pragma omp parallel for\n    for (int _x = 0; _x < _nx; _x++)" ; "one dimension")]
#[test_case(2, "for (int _y = 0; _y < _ny; _y++)" ; "two dimensions")]
fn test_loop_structure(ndim: usize, expected: &str) {
    let body = if ndim == 0 { "y[0] = 1;" } else { "y[_x] = 1;" };
    let src = HostKernelGenerator.render("k", ndim, &[KernelArg::matrix("y", Intent::Out, F64)], body);

    assert!(src.contains(expected), "missing {expected:?} in:\n{src}");
}

#[test]
fn test_two_dimensions_signature() {
    let src = HostKernelGenerator.render("k", 2, &[KernelArg::matrix("y", Intent::Out, F64)], "y[_y*_nx + _x] = 0;");

    assert!(src.starts_with("void k(int _ny, int _nx, double* restrict y)"), "{src}");
    assert!(src.contains("for (int _x = 0; _x < _nx; _x++)"));
}

#[test]
fn test_entry_thunk() {
    let args = [KernelArg::matrix("y", Intent::Out, F64), KernelArg::scalar("beta", F64)];
    let src = HostKernelGenerator.render("k", 1, &args, "y[_x] = beta;");

    assert!(src.contains("void k_entry(void** _args)"), "{src}");
    assert!(src.contains("*(const int*)_args[0]"));
    assert!(src.contains("(double*)(uintptr_t)*(const uint64_t*)_args[1]"));
    assert!(src.contains("*(const double*)_args[2]"));
}

#[test]
fn test_entry_without_arguments() {
    let src = HostKernelGenerator.render("noop", 0, &[], "");

    assert!(src.contains("void noop(void)"), "{src}");
    assert!(src.contains("noop();"));
}

#[test]
fn test_helper_function() {
    let src = HostFunctionGenerator.render("fpdtype_t", "sq", "fpdtype_t x", "return x*x;");
    assert_eq!(src, "static inline fpdtype_t sq(fpdtype_t x)\n{\n    return x*x;\n}\n");
}
