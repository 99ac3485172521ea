//! Kernel execution runtime for frx.
//!
//! Turns backend-neutral kernel templates into callable compute kernels:
//! render (through `frx-codegen`), compile, marshal operands, instantiate.
//!
//! # Backends
//!
//! - **Host**: C/OpenMP source compiled into a shared library by the
//!   configured C compiler and loaded with `libloading`.
//! - **CUDA** (feature `cuda`): CUDA C compiled with NVRTC and launched on a
//!   stream through `cudarc`.
//!
//! # Usage
//!
//! ```ignore
//! let provider = Arc::new(KernelProvider::new(HostBackend::new(&BackendConfig::from_env())));
//! let blas = BlasExtKernels::new(Arc::clone(&provider));
//!
//! let mut k = blas.axnpby(&y, [&x])?;
//! k.run(&[1.0.into(), 2.0.into()])?;
//! ```

pub mod backend;
pub mod blasext;
pub mod cache;
pub mod cblas;
pub mod config;
pub mod devices;
pub mod error;
pub mod kernel;
pub mod launch;
pub mod marshal;
pub mod packing;
pub mod provider;
pub mod source_module;

#[cfg(test)]
pub mod test;

pub use backend::{KernelBackend, PointwiseKernel};
pub use blasext::{AxnpbyKernel, BlasExtKernels};
pub use cache::KernelCache;
pub use cblas::{CblasKernels, GemmStrategy};
pub use config::{BackendConfig, CblasLibrary, CudaConfig, HostConfig};
pub use devices::host::HostBackend;
pub use error::*;
pub use kernel::{ComputeKernel, KernelKind, MetaKernel};
pub use launch::LaunchGrid;
pub use marshal::{BoundArg, NativeArg, build_arglist};
pub use packing::PackingKernels;
pub use provider::{KernelProvider, RenderedKernel, kernel_name};
pub use source_module::{HostFunction, SourceModule};

#[cfg(feature = "cuda")]
pub use devices::cuda::{CudaBackend, CudaKernelFunction};
