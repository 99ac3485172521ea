//! Column-partitioned GEMM for single-threaded vendor libraries.
//!
//! The vendor `cblas_?gemm` is passed in as an opaque pointer. Each OpenMP
//! thread multiplies a contiguous block of columns of `b` and `c`; the
//! operands are very wide, so this balances far better than splitting rows.

use frx_dtype::ScalarDType;
use snafu::ensure;

use crate::error::UnsupportedBackendSnafu;
use crate::render::RenderContext;
use crate::{BackendKind, Intent, KernelArg, KernelTemplate, Result, TemplateParams};

/// CBLAS enumerators.
const ROW_MAJOR: i32 = 101;
const NO_TRANS: i32 = 111;

#[derive(Debug, Clone, Copy, Default)]
pub struct ParGemm;

impl KernelTemplate for ParGemm {
    fn render(&self, ctx: &mut RenderContext<'_>, _params: &TemplateParams) -> Result<()> {
        ensure!(
            ctx.backend() == BackendKind::Host,
            UnsupportedBackendSnafu { module: ctx.module(), backend: ctx.backend() }
        );
        let fpdtype = ctx.fpdtype();
        let int = ScalarDType::Int32;

        ctx.emit(
            "typedef void (*gemm_t)(int, int, int, int, int, int,\n                       \
             fpdtype_t, const fpdtype_t*, int, const fpdtype_t*, int,\n                       \
             fpdtype_t, fpdtype_t*, int);",
        );
        ctx.function(
            "void",
            "frx_partition",
            "int n, int* begin, int* end",
            "int nth = omp_get_num_threads(), tid = omp_get_thread_num();\n\
             int chunk = (n + nth - 1) / nth;\n\
             *begin = tid*chunk < n ? tid*chunk : n;\n\
             *end = *begin + chunk < n ? *begin + chunk : n;",
        );

        let args = [
            KernelArg::pointer("gemm"),
            KernelArg::scalar("M", int),
            KernelArg::scalar("N", int),
            KernelArg::scalar("K", int),
            KernelArg::scalar("alpha", fpdtype),
            KernelArg::matrix("a", Intent::In, fpdtype),
            KernelArg::scalar("lda", int),
            KernelArg::matrix("b", Intent::In, fpdtype),
            KernelArg::scalar("ldb", int),
            KernelArg::scalar("beta", fpdtype),
            KernelArg::matrix("c", Intent::InOut, fpdtype),
            KernelArg::scalar("ldc", int),
        ];
        let body = format!(
            "gemm_t fn = (gemm_t)gemm;\n\
             #pragma omp parallel\n\
             {{\n    \
                 int begin, end;\n    \
                 frx_partition(N, &begin, &end);\n    \
                 if (begin < end)\n        \
                     fn({ROW_MAJOR}, {NO_TRANS}, {NO_TRANS}, M, end - begin, K,\n           \
                        alpha, a, lda, b + begin, ldb, beta, c + begin, ldc);\n\
             }}"
        );

        ctx.kernel("par_gemm", 0, &args, &body)
    }
}
