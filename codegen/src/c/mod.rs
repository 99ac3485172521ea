//! C/OpenMP source generation for the host backend.
//!
//! Kernels compile to plain C functions. Each one is paired with a thunk
//!
//! ```c
//! void <name>_entry(void** args);
//! ```
//!
//! where `args[i]` points at the value of native slot `i`. Address slots are
//! always 64-bit integers and are cast back to the typed pointer.

use frx_dtype::ScalarDType;

use crate::{ArgType, BackendKind, FunctionGenerator, KernelArg, KernelGenerator, dim_names};

/// One C parameter derived from a native slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CParam {
    pub ty: String,
    pub name: String,
    /// Passed as a 64-bit address.
    pub address: bool,
    /// Declared with the backend's restrict keyword.
    pub restrict: bool,
}

impl CParam {
    fn value(ty: impl Into<String>, name: impl Into<String>) -> Self {
        Self { ty: ty.into(), name: name.into(), address: false, restrict: false }
    }

    fn pointer(ty: impl Into<String>, name: impl Into<String>) -> Self {
        Self { ty: ty.into(), name: name.into(), address: true, restrict: true }
    }

    fn opaque(name: impl Into<String>) -> Self {
        Self { ty: "void*".into(), name: name.into(), address: true, restrict: false }
    }

    /// Declaration with the given restrict keyword applied to pointers.
    pub fn decl(&self, restrict: &str) -> String {
        if self.restrict { format!("{} {restrict} {}", self.ty, self.name) } else { format!("{} {}", self.ty, self.name) }
    }
}

fn elem(dtype: ScalarDType, arg: &KernelArg) -> String {
    let ctype = dtype.c_style();
    if arg.intent.is_const() { format!("const {ctype}") } else { ctype.to_string() }
}

/// C parameters for the dimensions and declared arguments of a kernel.
pub fn kernel_params(ndim: usize, args: &[KernelArg]) -> Vec<CParam> {
    let mut params: Vec<CParam> = dim_names(ndim).iter().map(|d| CParam::value("int", *d)).collect();

    for arg in args {
        let name = &arg.name;
        match arg.ty {
            ArgType::Matrix { dtype, stride } => {
                params.push(CParam::pointer(format!("{}*", elem(dtype, arg)), name));
                if stride {
                    params.push(CParam::value("int", format!("ld{name}")));
                }
            }
            ArgType::View(dtype) | ArgType::MpiView(dtype) => {
                params.push(CParam::pointer(format!("{}* const*", elem(dtype, arg)), format!("{name}_vix")));
                params.push(CParam::pointer("const int*", format!("{name}_vstri")));
            }
            ArgType::Scalar(dtype) => params.push(CParam::value(dtype.c_style(), name)),
            ArgType::Pointer => params.push(CParam::opaque(name)),
        }
    }

    params
}

fn param_list(params: &[CParam], restrict: &str) -> String {
    if params.is_empty() {
        return "void".into();
    }
    params.iter().map(|p| p.decl(restrict)).collect::<Vec<_>>().join(", ")
}

pub(crate) fn indent(body: &str, depth: usize) -> String {
    let pad = "    ".repeat(depth);
    body.lines()
        .map(|line| if line.trim().is_empty() { String::new() } else { format!("{pad}{}", line.trim_end()) })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Host kernel generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostKernelGenerator;

impl HostKernelGenerator {
    fn entry(name: &str, params: &[CParam]) -> String {
        let unpacked = params
            .iter()
            .enumerate()
            .map(|(i, p)| {
                if p.address {
                    format!("({})(uintptr_t)*(const uint64_t*)_args[{i}]", p.ty)
                } else {
                    format!("*(const {}*)_args[{i}]", p.ty)
                }
            })
            .collect::<Vec<_>>()
            .join(",\n        ");

        if unpacked.is_empty() {
            format!("void {name}_entry(void** _args)\n{{\n    (void)_args;\n    {name}();\n}}\n")
        } else {
            format!("void {name}_entry(void** _args)\n{{\n    {name}(\n        {unpacked}\n    );\n}}\n")
        }
    }
}

impl KernelGenerator for HostKernelGenerator {
    fn backend(&self) -> BackendKind {
        BackendKind::Host
    }

    fn prelude(&self, fpdtype: ScalarDType) -> String {
        format!(
            "#include <stdint.h>\n\
             #include <math.h>\n\
             \n\
             #ifdef _OPENMP\n\
             #include <omp.h>\n\
             #else\n\
             static inline int omp_get_num_threads(void) {{ return 1; }}\n\
             static inline int omp_get_thread_num(void) {{ return 0; }}\n\
             #endif\n\
             \n\
             typedef {} fpdtype_t;\n",
            fpdtype.c_style()
        )
    }

    fn render(&self, name: &str, ndim: usize, args: &[KernelArg], body: &str) -> String {
        let params = kernel_params(ndim, args);

        let looped = match ndim {
            0 => format!("    {{\n{}\n    }}", indent(body, 2)),
            1 => format!(
                "    #pragma omp parallel for\n    for (int _x = 0; _x < _nx; _x++)\n    {{\n{}\n    }}",
                indent(body, 2)
            ),
            _ => format!(
                "    #pragma omp parallel for\n    for (int _y = 0; _y < _ny; _y++)\n    {{\n        \
                 for (int _x = 0; _x < _nx; _x++)\n        {{\n{}\n        }}\n    }}",
                indent(body, 3)
            ),
        };

        format!(
            "void {name}({})\n{{\n{looped}\n}}\n\n{}",
            param_list(&params, "restrict"),
            Self::entry(name, &params)
        )
    }
}

/// Host helper function generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostFunctionGenerator;

impl FunctionGenerator for HostFunctionGenerator {
    fn render(&self, rettype: &str, name: &str, params: &str, body: &str) -> String {
        format!("static inline {rettype} {name}({params})\n{{\n{}\n}}\n", indent(body, 1))
    }
}
