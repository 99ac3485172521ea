//! Gather and scatter between a view and its exchange matrix.
//!
//! Both kernels run over the `n` view blocks. Block `_x` element `(r, c)`
//! maps to row `r*ncv + c`, column `_x` of the exchange matrix.
//!
//! Parameters: `nrv`, `ncv` (block rows and columns).

use crate::render::RenderContext;
use crate::{Intent, KernelArg, KernelTemplate, Result, TemplateParams};

fn block_loop(params: &TemplateParams, stmt: &str) -> Result<String> {
    let nrv = params.count("nrv")?;
    let ncv = params.count("ncv")?;

    Ok(format!(
        "for (int r = 0; r < {nrv}; r++)\n    for (int c = 0; c < {ncv}; c++)\n        {stmt}"
    ))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Pack;

impl KernelTemplate for Pack {
    fn render(&self, ctx: &mut RenderContext<'_>, params: &TemplateParams) -> Result<()> {
        let fpdtype = ctx.fpdtype();
        let ncv = params.count("ncv")?;
        let args =
            [KernelArg::mpi_view("v", Intent::In, fpdtype), KernelArg::strided_matrix("m", Intent::Out, fpdtype)];
        let body = block_loop(params, &format!("m[(r*{ncv} + c)*ldm + _x] = v_vix[_x][r*v_vstri[_x] + c];"))?;

        ctx.kernel("pack", 1, &args, &body)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Unpack;

impl KernelTemplate for Unpack {
    fn render(&self, ctx: &mut RenderContext<'_>, params: &TemplateParams) -> Result<()> {
        let fpdtype = ctx.fpdtype();
        let ncv = params.count("ncv")?;
        let args =
            [KernelArg::mpi_view("v", Intent::Out, fpdtype), KernelArg::strided_matrix("m", Intent::In, fpdtype)];
        let body = block_loop(params, &format!("v_vix[_x][r*v_vstri[_x] + c] = m[(r*{ncv} + c)*ldm + _x];"))?;

        ctx.kernel("unpack", 1, &args, &body)
    }
}
