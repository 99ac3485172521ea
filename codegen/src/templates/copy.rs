use crate::render::RenderContext;
use crate::{Intent, KernelArg, KernelTemplate, Result, TemplateParams};

/// Element-wise `dst = src`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Copy;

impl KernelTemplate for Copy {
    fn render(&self, ctx: &mut RenderContext<'_>, _params: &TemplateParams) -> Result<()> {
        let fpdtype = ctx.fpdtype();
        let args = [KernelArg::matrix("dst", Intent::Out, fpdtype), KernelArg::matrix("src", Intent::In, fpdtype)];

        ctx.kernel("copy", 1, &args, "dst[_x] = src[_x];")
    }
}
