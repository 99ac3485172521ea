//! Built-in kernel templates.

mod axnpby;
mod copy;
mod pack;
mod par_gemm;

pub use axnpby::Axnpby;
pub use copy::Copy;
pub use pack::{Pack, Unpack};
pub use par_gemm::ParGemm;

use crate::TemplateLookup;

pub const AXNPBY: &str = "frx.kernels.axnpby";
pub const COPY: &str = "frx.kernels.copy";
pub const PACK: &str = "frx.kernels.pack";
pub const UNPACK: &str = "frx.kernels.unpack";
pub const PAR_GEMM: &str = "frx.kernels.par_gemm";

pub fn register_builtins(lookup: &mut TemplateLookup) {
    lookup.register(AXNPBY, Axnpby);
    lookup.register(COPY, Copy);
    lookup.register(PACK, Pack);
    lookup.register(UNPACK, Unpack);
    lookup.register(PAR_GEMM, ParGemm);
}
