//! Backend configuration.
//!
//! Provides typed configuration with bon builders. Values are supplied by
//! the caller or read from environment variables; nothing is parsed from files.

use std::path::PathBuf;

use bon::bon;
use frx_dtype::Precision;

use crate::error::{ConfigSnafu, Result};

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|s| s.parse().ok())
}

fn env_flag(name: &str) -> Option<bool> {
    std::env::var(name).ok().map(|s| !matches!(s.to_ascii_lowercase().as_str(), "0" | "false" | "no" | "off"))
}

// ============================================================================
// HOST
// ============================================================================

/// Vendor CBLAS library, by threading model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CblasLibrary {
    /// Single-threaded; GEMM is partitioned across OpenMP threads by a generated kernel.
    SingleThreaded(PathBuf),
    /// Multi-threaded; GEMM is called directly.
    MultiThreaded(PathBuf),
}

impl CblasLibrary {
    pub fn path(&self) -> &PathBuf {
        match self {
            Self::SingleThreaded(path) | Self::MultiThreaded(path) => path,
        }
    }
}

/// Host (C/OpenMP) backend configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostConfig {
    /// C compiler executable.
    pub cc: String,
    /// Extra compiler flags.
    pub cflags: Vec<String>,
    /// Compile with `-fopenmp`.
    pub openmp: bool,
    /// Path of a single-threaded CBLAS library.
    pub cblas_st: Option<PathBuf>,
    /// Path of a multi-threaded CBLAS library.
    pub cblas_mt: Option<PathBuf>,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self { cc: "cc".into(), cflags: Vec::new(), openmp: true, cblas_st: None, cblas_mt: None }
    }
}

#[bon]
impl HostConfig {
    #[builder]
    pub fn new(
        #[builder(default = "cc".to_string(), into)] cc: String,
        #[builder(default)] cflags: Vec<String>,
        #[builder(default = true)] openmp: bool,
        #[builder(into)] cblas_st: Option<PathBuf>,
        #[builder(into)] cblas_mt: Option<PathBuf>,
    ) -> Self {
        Self { cc, cflags, openmp, cblas_st, cblas_mt }
    }

    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// * `FRX_CC` - C compiler (default: `cc`)
    /// * `FRX_CFLAGS` - Whitespace-separated extra flags
    /// * `FRX_OPENMP` - `0`/`false` disables OpenMP (default: enabled)
    /// * `FRX_CBLAS_ST` - Single-threaded CBLAS library
    /// * `FRX_CBLAS_MT` - Multi-threaded CBLAS library
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            cc: std::env::var("FRX_CC").unwrap_or(defaults.cc),
            cflags: std::env::var("FRX_CFLAGS")
                .map(|s| s.split_whitespace().map(String::from).collect())
                .unwrap_or_default(),
            openmp: env_flag("FRX_OPENMP").unwrap_or(defaults.openmp),
            cblas_st: std::env::var_os("FRX_CBLAS_ST").map(PathBuf::from),
            cblas_mt: std::env::var_os("FRX_CBLAS_MT").map(PathBuf::from),
        }
    }

    /// The configured CBLAS library; exactly one variant must be set.
    pub fn cblas(&self) -> Result<CblasLibrary> {
        match (&self.cblas_st, &self.cblas_mt) {
            (Some(st), None) => Ok(CblasLibrary::SingleThreaded(st.clone())),
            (None, Some(mt)) => Ok(CblasLibrary::MultiThreaded(mt.clone())),
            (Some(_), Some(_)) => ConfigSnafu { reason: "cblas_st and cblas_mt cannot both be set" }.fail(),
            (None, None) => ConfigSnafu { reason: "must specify one of cblas_st or cblas_mt" }.fail(),
        }
    }
}

// ============================================================================
// CUDA
// ============================================================================

/// CUDA backend configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CudaConfig {
    /// Ordinal of the device to run on.
    pub device_id: usize,
    /// Threads per block for pointwise kernels.
    pub block_size: u32,
}

impl Default for CudaConfig {
    fn default() -> Self {
        Self { device_id: 0, block_size: 128 }
    }
}

#[bon]
impl CudaConfig {
    #[builder]
    pub fn new(#[builder(default = 0)] device_id: usize, #[builder(default = 128)] block_size: u32) -> Self {
        Self { device_id, block_size }
    }

    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// * `FRX_CUDA_DEVICE` - Device ordinal (default: 0)
    /// * `FRX_CUDA_BLOCK_SIZE` - Threads per block (default: 128)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            device_id: env_parse("FRX_CUDA_DEVICE").unwrap_or(defaults.device_id),
            block_size: env_parse("FRX_CUDA_BLOCK_SIZE").unwrap_or(defaults.block_size),
        }
    }
}

// ============================================================================
// BACKEND
// ============================================================================

/// Complete backend configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackendConfig {
    /// Floating-point precision of rendered kernels.
    pub precision: Precision,
    pub host: HostConfig,
    pub cuda: CudaConfig,
}

#[bon]
impl BackendConfig {
    #[builder]
    pub fn new(
        #[builder(default)] precision: Precision,
        #[builder(default)] host: HostConfig,
        #[builder(default)] cuda: CudaConfig,
    ) -> Self {
        Self { precision, host, cuda }
    }

    /// Create configuration from environment variables.
    ///
    /// `FRX_PRECISION` selects `single` or `double` (default: double); see
    /// [`HostConfig::from_env`] and [`CudaConfig::from_env`] for the rest.
    pub fn from_env() -> Self {
        Self {
            precision: env_parse("FRX_PRECISION").unwrap_or_default(),
            host: HostConfig::from_env(),
            cuda: CudaConfig::from_env(),
        }
    }
}
