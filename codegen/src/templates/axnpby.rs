use crate::render::RenderContext;
use crate::{Intent, KernelArg, KernelTemplate, Result, TemplateParams};

/// `y = beta*y + a0*x0 + ... + a{n-1}*x{n-1}` over every element.
///
/// Parameters: `n`, the number of `x` operands. When `beta == 0` the old
/// contents of `y` are not read, so uninitialised storage cannot leak NaNs.
#[derive(Debug, Clone, Copy, Default)]
pub struct Axnpby;

impl KernelTemplate for Axnpby {
    fn render(&self, ctx: &mut RenderContext<'_>, params: &TemplateParams) -> Result<()> {
        let n = params.count("n")?;
        let fpdtype = ctx.fpdtype();

        let mut args = vec![KernelArg::matrix("y", Intent::InOut, fpdtype), KernelArg::scalar("beta", fpdtype)];
        for i in 0..n {
            args.push(KernelArg::matrix(format!("x{i}"), Intent::In, fpdtype));
            args.push(KernelArg::scalar(format!("a{i}"), fpdtype));
        }

        let sum = (0..n).map(|i| format!(" + a{i}*x{i}[_x]")).collect::<String>();
        let body = format!("fpdtype_t axn = 0{sum};\ny[_x] = (beta == 0) ? axn : beta*y[_x] + axn;");

        ctx.kernel("axnpby", 1, &args, &body)
    }
}
