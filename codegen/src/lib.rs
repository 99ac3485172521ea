//! Source generation for frx kernels.
//!
//! Kernels are written once as backend-neutral [`KernelTemplate`]s and
//! rendered for a backend by a [`Renderer`], which supplies the backend's
//! generator strategies and floating-point type.
//!
//! # Architecture
//!
//! - **Params**: canonical, hashable template parameters ([`TemplateParams`])
//! - **Types**: kernel argument declarations and the [`ArgSpec`] contract
//! - **C**: host C/OpenMP generators
//! - **CUDA**: CUDA C generators
//! - **Templates**: built-in kernels (`axnpby`, `copy`, `pack`, `unpack`, `par_gemm`)
//!
//! # Usage
//!
//! ```ignore
//! use frx_codegen::{Renderer, TemplateLookup, TemplateParams, templates};
//!
//! let renderer = Renderer::host(Arc::new(TemplateLookup::with_builtins()), Precision::Double);
//! let (src, argspec) = renderer.render_kernel("axnpby", templates::AXNPBY, &TemplateParams::new().with("n", 2))?;
//! ```

pub mod c;
pub mod cuda;
pub mod error;
pub mod params;
pub mod render;
pub mod templates;
pub mod traits;
pub mod types;


pub use error::*;
pub use params::{FPDTYPE, ParamValue, TemplateParams};
pub use render::{RenderContext, Renderer, TemplateLookup};
pub use traits::*;
pub use types::*;
