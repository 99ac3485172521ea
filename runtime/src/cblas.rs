//! Dense linear algebra through a vendor CBLAS library (host only).
//!
//! With a single-threaded library, GEMM goes through the generated
//! `par_gemm` kernel, which splits the columns of `b` and `out` across
//! OpenMP threads. A multi-threaded library is called directly.

use std::path::Path;
use std::sync::Arc;

use frx_codegen::{FPDTYPE, TemplateParams, templates};
use frx_device::{Density, Matrix, Operand, OperandMap};
use frx_dtype::{ScalarDType, ScalarValue};
use snafu::{ResultExt, ensure};

use crate::backend::KernelBackend;
use crate::config::{CblasLibrary, HostConfig};
use crate::devices::host::HostBackend;
use crate::error::{
    ArgumentMismatchSnafu, IncompatibleShapeSnafu, IncompatibleTraitsSnafu, LibraryLoadSnafu, Result,
    SymbolNotFoundSnafu,
};
use crate::kernel::ComputeKernel;
use crate::provider::KernelProvider;

const CBLAS_ROW_MAJOR: i32 = 101;
const CBLAS_NO_TRANS: i32 = 111;

type DGemmFn =
    unsafe extern "C" fn(i32, i32, i32, i32, i32, i32, f64, *const f64, i32, *const f64, i32, f64, *mut f64, i32);
type SGemmFn =
    unsafe extern "C" fn(i32, i32, i32, i32, i32, i32, f32, *const f32, i32, *const f32, i32, f32, *mut f32, i32);
type DNrm2Fn = unsafe extern "C" fn(i32, *const f64, i32) -> f64;
type SNrm2Fn = unsafe extern "C" fn(i32, *const f32, i32) -> f32;

/// Symbols resolved from a CBLAS shared library.
struct VendorLibrary {
    dgemm: DGemmFn,
    sgemm: SGemmFn,
    dnrm2: DNrm2Fn,
    snrm2: SNrm2Fn,
    /// Keep the library alive (prevents dlclose).
    _lib: libloading::Library,
}

impl VendorLibrary {
    fn open(path: &Path) -> Result<Self> {
        // SAFETY: loading a CBLAS implementation runs only its own initialisers.
        let lib = unsafe { libloading::Library::new(path) }
            .context(LibraryLoadSnafu { path: path.display().to_string() })?;

        fn symbol<T: Copy>(lib: &libloading::Library, name: &str) -> Result<T> {
            // SAFETY: the CBLAS ABI fixes the signature of every symbol we resolve.
            unsafe { lib.get::<T>(name.as_bytes()).map(|sym| *sym).context(SymbolNotFoundSnafu { name }) }
        }

        tracing::debug!(path = %path.display(), "CBLAS library loaded");

        Ok(Self {
            dgemm: symbol(&lib, "cblas_dgemm")?,
            sgemm: symbol(&lib, "cblas_sgemm")?,
            dnrm2: symbol(&lib, "cblas_dnrm2")?,
            snrm2: symbol(&lib, "cblas_snrm2")?,
            _lib: lib,
        })
    }

    fn gemm_address(&self, dtype: ScalarDType) -> u64 {
        match dtype {
            ScalarDType::Float32 => self.sgemm as usize as u64,
            _ => self.dgemm as usize as u64,
        }
    }
}

/// GEMM strategy, fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GemmStrategy {
    /// Generated kernel partitioning columns over OpenMP threads.
    Partitioned,
    /// Vendor routine called directly.
    Vendor,
}

pub struct CblasKernels {
    provider: Arc<KernelProvider<HostBackend>>,
    library: Arc<VendorLibrary>,
    strategy: GemmStrategy,
}

impl std::fmt::Debug for CblasKernels {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CblasKernels").field("strategy", &self.strategy).finish()
    }
}

fn to_i32(what: &str, value: usize) -> Result<i32> {
    i32::try_from(value).map_err(|_| IncompatibleShapeSnafu { reason: format!("{what} {value} overflows i32") }.build())
}

/// GEMM dimensions and leading dimensions as CBLAS ints.
#[derive(Debug, Clone, Copy)]
struct GemmShape {
    m: i32,
    n: i32,
    k: i32,
    lda: i32,
    ldb: i32,
    ldc: i32,
}

impl CblasKernels {
    /// Exactly one of `cblas_st` and `cblas_mt` must be configured.
    pub fn new(provider: Arc<KernelProvider<HostBackend>>, config: &HostConfig) -> Result<Self> {
        let (path, strategy) = match config.cblas()? {
            CblasLibrary::SingleThreaded(path) => (path, GemmStrategy::Partitioned),
            CblasLibrary::MultiThreaded(path) => (path, GemmStrategy::Vendor),
        };
        let library = Arc::new(VendorLibrary::open(&path)?);

        Ok(Self { provider, library, strategy })
    }

    pub fn strategy(&self) -> GemmStrategy {
        self.strategy
    }

    /// `out = alpha*a*b + beta*out`.
    pub fn mul(&self, a: &Matrix, b: &Matrix, out: &Matrix, alpha: f64, beta: f64) -> Result<Box<dyn ComputeKernel>> {
        ensure!(
            a.density() == Density::Dense,
            IncompatibleTraitsSnafu { reason: format!("a must be dense, got {}", a.density()) }
        );
        let dtype = a.dtype();
        ensure!(
            dtype.is_float() && b.dtype() == dtype && out.dtype() == dtype,
            IncompatibleTraitsSnafu {
                reason: format!("dtypes a={dtype}, b={}, out={} must be one floating-point type", b.dtype(), out.dtype())
            }
        );
        ensure!(
            [a, b, out].iter().all(|m| m.storage().is_host()),
            IncompatibleTraitsSnafu { reason: "CBLAS operands must live in host memory" }
        );
        ensure!(
            a.nrow() == out.nrow() && a.ncol() == b.nrow() && b.ncol() == out.ncol(),
            IncompatibleShapeSnafu {
                reason: format!(
                    "{}x{} * {}x{} -> {}x{}",
                    a.nrow(),
                    a.ncol(),
                    b.nrow(),
                    b.ncol(),
                    out.nrow(),
                    out.ncol()
                )
            }
        );

        let shape = GemmShape {
            m: to_i32("rows", a.nrow())?,
            n: to_i32("columns", b.ncol())?,
            k: to_i32("inner dimension", a.ncol())?,
            lda: to_i32("lda", a.leaddim())?,
            ldb: to_i32("ldb", b.leaddim())?,
            ldc: to_i32("ldc", out.leaddim())?,
        };

        match self.strategy {
            GemmStrategy::Partitioned => self.partitioned_gemm(a, b, out, alpha, beta, shape),
            GemmStrategy::Vendor => Ok(Box::new(VendorGemm {
                library: Arc::clone(&self.library),
                operands: [a.clone(), b.clone(), out.clone()],
                alpha,
                beta,
                shape,
            })),
        }
    }

    fn partitioned_gemm(
        &self,
        a: &Matrix,
        b: &Matrix,
        out: &Matrix,
        alpha: f64,
        beta: f64,
        shape: GemmShape,
    ) -> Result<Box<dyn ComputeKernel>> {
        let dtype = a.dtype();
        let params = TemplateParams::new().with(FPDTYPE, dtype);
        let (fun, argspec) = self.provider.function("par_gemm", templates::PAR_GEMM, &params)?;

        let int = |v: i32| Operand::Scalar(ScalarValue::Int32(v));
        let float = |v: f64| Operand::Scalar(ScalarValue::Float64(v).cast(dtype));
        let operands = OperandMap::from([
            ("gemm".to_string(), Operand::Pointer(self.library.gemm_address(dtype))),
            ("M".to_string(), int(shape.m)),
            ("N".to_string(), int(shape.n)),
            ("K".to_string(), int(shape.k)),
            ("alpha".to_string(), float(alpha)),
            ("a".to_string(), Operand::from(a)),
            ("lda".to_string(), int(shape.lda)),
            ("b".to_string(), Operand::from(b)),
            ("ldb".to_string(), int(shape.ldb)),
            ("beta".to_string(), float(beta)),
            ("c".to_string(), Operand::from(out)),
            ("ldc".to_string(), int(shape.ldc)),
        ]);

        let backend = self.provider.backend();
        let args = backend.build_arglist(&[], &argspec, &operands)?;
        backend.instantiate_kernel(Vec::new(), fun, args)
    }

    /// Euclidean norm of every element of `x` (padding included); read via `retval`.
    pub fn nrm2(&self, x: &Matrix) -> Result<Box<dyn ComputeKernel>> {
        ensure!(
            x.dtype().is_float(),
            IncompatibleTraitsSnafu { reason: format!("{} is not a floating-point type", x.dtype()) }
        );
        ensure!(x.storage().is_host(), IncompatibleTraitsSnafu { reason: "CBLAS operands must live in host memory" });

        let count = to_i32("element count", x.leaddim() * x.nrow())?;
        Ok(Box::new(Nrm2 { library: Arc::clone(&self.library), x: x.clone(), count, retval: None }))
    }
}

fn check_no_args(name: &str, args: &[ScalarValue]) -> Result<()> {
    ensure!(
        args.is_empty(),
        ArgumentMismatchSnafu { reason: format!("{name} takes no run arguments, got {}", args.len()) }
    );
    Ok(())
}

struct VendorGemm {
    library: Arc<VendorLibrary>,
    /// `a`, `b`, `out`.
    operands: [Matrix; 3],
    alpha: f64,
    beta: f64,
    shape: GemmShape,
}

impl ComputeKernel for VendorGemm {
    fn run(&mut self, args: &[ScalarValue]) -> Result<()> {
        check_no_args("mul", args)?;
        let [a, b, out] = &self.operands;
        let GemmShape { m, n, k, lda, ldb, ldc } = self.shape;
        let (trans, layout) = (CBLAS_NO_TRANS, CBLAS_ROW_MAJOR);

        // SAFETY: shapes and leading dimensions were validated against the
        // host allocations, which the cloned handles keep alive.
        unsafe {
            match a.dtype() {
                ScalarDType::Float32 => (self.library.sgemm)(
                    layout,
                    trans,
                    trans,
                    m,
                    n,
                    k,
                    self.alpha as f32,
                    a.address() as *const f32,
                    lda,
                    b.address() as *const f32,
                    ldb,
                    self.beta as f32,
                    out.address() as *mut f32,
                    ldc,
                ),
                _ => (self.library.dgemm)(
                    layout,
                    trans,
                    trans,
                    m,
                    n,
                    k,
                    self.alpha,
                    a.address() as *const f64,
                    lda,
                    b.address() as *const f64,
                    ldb,
                    self.beta,
                    out.address() as *mut f64,
                    ldc,
                ),
            }
        }
        Ok(())
    }
}

struct Nrm2 {
    library: Arc<VendorLibrary>,
    x: Matrix,
    count: i32,
    retval: Option<ScalarValue>,
}

impl ComputeKernel for Nrm2 {
    fn run(&mut self, args: &[ScalarValue]) -> Result<()> {
        check_no_args("nrm2", args)?;

        // SAFETY: `count` elements fit the allocation held by `x`.
        let value = unsafe {
            match self.x.dtype() {
                ScalarDType::Float32 => {
                    ScalarValue::Float32((self.library.snrm2)(self.count, self.x.address() as *const f32, 1))
                }
                _ => ScalarValue::Float64((self.library.dnrm2)(self.count, self.x.address() as *const f64, 1)),
            }
        };
        self.retval = Some(value);
        Ok(())
    }

    fn retval(&self) -> Option<ScalarValue> {
        self.retval
    }
}
