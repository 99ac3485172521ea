//! CUDA C source generation.
//!
//! Kernels are `extern "C" __global__` functions with one thread per `_x`.
//! Two-dimensional kernels loop over `_y` inside each thread.

use frx_dtype::ScalarDType;

use crate::c::{indent, kernel_params};
use crate::{BackendKind, FunctionGenerator, KernelArg, KernelGenerator};

#[derive(Debug, Clone, Copy, Default)]
pub struct CudaKernelGenerator;

impl KernelGenerator for CudaKernelGenerator {
    fn backend(&self) -> BackendKind {
        BackendKind::Cuda
    }

    fn prelude(&self, fpdtype: ScalarDType) -> String {
        format!("typedef {} fpdtype_t;\n", fpdtype.c_style())
    }

    fn render(&self, name: &str, ndim: usize, args: &[KernelArg], body: &str) -> String {
        let params = kernel_params(ndim, args).iter().map(|p| p.decl("__restrict__")).collect::<Vec<_>>().join(", ");

        let guarded = match ndim {
            0 => format!("    if (blockIdx.x == 0 && threadIdx.x == 0)\n    {{\n{}\n    }}", indent(body, 2)),
            1 => format!(
                "    int _x = blockIdx.x*blockDim.x + threadIdx.x;\n    if (_x < _nx)\n    {{\n{}\n    }}",
                indent(body, 2)
            ),
            _ => format!(
                "    int _x = blockIdx.x*blockDim.x + threadIdx.x;\n    if (_x < _nx)\n    {{\n        \
                 for (int _y = 0; _y < _ny; _y++)\n        {{\n{}\n        }}\n    }}",
                indent(body, 3)
            ),
        };

        format!("extern \"C\" __global__ void {name}({params})\n{{\n{guarded}\n}}\n")
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CudaFunctionGenerator;

impl FunctionGenerator for CudaFunctionGenerator {
    fn render(&self, rettype: &str, name: &str, params: &str, body: &str) -> String {
        format!("__device__ __forceinline__ {rettype} {name}({params})\n{{\n{}\n}}\n", indent(body, 1))
    }
}
