//! Gather/scatter between exchange views and their packed matrices.

use std::sync::Arc;

use frx_codegen::{FPDTYPE, TemplateParams, templates};
use frx_device::{MpiView, Operand, OperandMap};

use crate::backend::KernelBackend;
use crate::error::Result;
use crate::kernel::ComputeKernel;
use crate::provider::KernelProvider;

pub struct PackingKernels<B: KernelBackend> {
    provider: Arc<KernelProvider<B>>,
    pack: String,
    unpack: String,
}

impl<B: KernelBackend> PackingKernels<B> {
    pub fn new(provider: Arc<KernelProvider<B>>) -> Result<Self> {
        let pack = provider.register(templates::PACK)?;
        let unpack = provider.register(templates::UNPACK)?;
        Ok(Self { provider, pack, unpack })
    }

    /// Copy the view's elements into its exchange matrix.
    pub fn pack(&self, mv: &MpiView) -> Result<Box<dyn ComputeKernel>> {
        self.build(&self.pack, mv)
    }

    /// Copy the exchange matrix back out through the view.
    pub fn unpack(&self, mv: &MpiView) -> Result<Box<dyn ComputeKernel>> {
        self.build(&self.unpack, mv)
    }

    fn build(&self, name: &str, mv: &MpiView) -> Result<Box<dyn ComputeKernel>> {
        let view = mv.view();
        let params =
            TemplateParams::new().with("nrv", view.nvrow()).with("ncv", view.nvcol()).with(FPDTYPE, view.dtype());
        let operands = OperandMap::from([
            ("v".to_string(), Operand::from(mv.clone())),
            ("m".to_string(), Operand::from(mv.mpimat())),
        ]);

        self.provider.kernel(name, &params, &[mv.n()], &operands)
    }
}
