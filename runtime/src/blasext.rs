//! Element-wise BLAS extensions built from generated kernels.

use std::sync::Arc;

use frx_codegen::{FPDTYPE, TemplateParams, templates};
use frx_device::{MatrixTraits, Operand, OperandMap};
use frx_dtype::{ScalarDType, ScalarValue};
use snafu::{OptionExt, ensure};

use crate::backend::KernelBackend;
use crate::error::{ArgumentMismatchSnafu, IncompatibleTraitsSnafu, Result};
use crate::kernel::ComputeKernel;
use crate::marshal;
use crate::provider::KernelProvider;

fn matrix_traits(operand: &Operand) -> Result<&MatrixTraits> {
    operand.traits().context(IncompatibleTraitsSnafu { reason: format!("{} is not a matrix", operand.kind()) })
}

fn check_float(dtype: ScalarDType) -> Result<()> {
    ensure!(dtype.is_float(), IncompatibleTraitsSnafu { reason: format!("{dtype} is not a floating-point type") });
    Ok(())
}

pub struct BlasExtKernels<B: KernelBackend> {
    provider: Arc<KernelProvider<B>>,
}

impl<B: KernelBackend> BlasExtKernels<B> {
    pub fn new(provider: Arc<KernelProvider<B>>) -> Self {
        Self { provider }
    }

    /// `y = beta*y + Σ alpha_i x_i`; run with `[beta, alpha_1, .., alpha_n]`.
    ///
    /// Every `x` must have exactly the traits of `y`.
    pub fn axnpby<Y, X>(&self, y: Y, xs: impl IntoIterator<Item = X>) -> Result<AxnpbyKernel<B>>
    where
        Y: Into<Operand>,
        X: Into<Operand>,
    {
        let y = y.into();
        let xs: Vec<Operand> = xs.into_iter().map(Into::into).collect();

        let traits = matrix_traits(&y)?.clone();
        for (i, x) in xs.iter().enumerate() {
            ensure!(
                matrix_traits(x)? == &traits,
                IncompatibleTraitsSnafu { reason: format!("x{i} differs from y ({traits:?})") }
            );
        }
        check_float(traits.dtype)?;

        let params = TemplateParams::new().with("n", xs.len()).with(FPDTYPE, traits.dtype);
        let (fun, argspec) = self.provider.function("axnpby", templates::AXNPBY, &params)?;

        Ok(AxnpbyKernel {
            backend: Arc::clone(self.provider.backend()),
            fun,
            argspec,
            count: traits.leaddim * traits.nrow,
            dtype: traits.dtype,
            y,
            xs,
        })
    }

    /// Element-wise `dst = src`; both must share one set of traits.
    pub fn copy(&self, dst: impl Into<Operand>, src: impl Into<Operand>) -> Result<Box<dyn ComputeKernel>> {
        let (dst, src) = (dst.into(), src.into());

        let traits = matrix_traits(&dst)?.clone();
        ensure!(
            matrix_traits(&src)? == &traits,
            IncompatibleTraitsSnafu { reason: format!("src differs from dst ({traits:?})") }
        );
        check_float(traits.dtype)?;

        let params = TemplateParams::new().with(FPDTYPE, traits.dtype);
        let (fun, argspec) = self.provider.function("copy", templates::COPY, &params)?;

        let dims = vec![traits.leaddim * traits.nrow];
        let operands = OperandMap::from([("dst".to_string(), dst), ("src".to_string(), src)]);
        let backend = self.provider.backend();
        let args = backend.build_arglist(&dims, &argspec, &operands)?;
        backend.instantiate_kernel(dims, fun, args)
    }
}

/// Linear combination kernel; coefficients are supplied to each `run`.
pub struct AxnpbyKernel<B: KernelBackend> {
    backend: Arc<B>,
    fun: Arc<B::Function>,
    argspec: frx_codegen::ArgSpec,
    count: usize,
    dtype: ScalarDType,
    y: Operand,
    xs: Vec<Operand>,
}

impl<B: KernelBackend> ComputeKernel for AxnpbyKernel<B> {
    fn run(&mut self, args: &[ScalarValue]) -> Result<()> {
        ensure!(
            args.len() == 1 + self.xs.len(),
            ArgumentMismatchSnafu {
                reason: format!("axnpby expects {} coefficients, got {}", 1 + self.xs.len(), args.len())
            }
        );

        let mut operands = OperandMap::new();
        operands.insert("y".into(), self.y.clone());
        operands.insert("beta".into(), Operand::Scalar(args[0].cast(self.dtype)));
        for (i, (x, alpha)) in self.xs.iter().zip(&args[1..]).enumerate() {
            operands.insert(format!("x{i}"), x.clone());
            operands.insert(format!("a{i}"), Operand::Scalar(alpha.cast(self.dtype)));
        }

        let dims = [self.count];
        let bound = self.backend.build_arglist(&dims, &self.argspec, &operands)?;
        self.backend.launch(&self.fun, &dims, &marshal::resolve_args(&bound))
    }
}
