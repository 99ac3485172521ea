//! Device memory and operand descriptors for frx kernels.
//!
//! - **Allocators** hand out [`RawBuffer`]s for one backend (host or CUDA).
//! - **Descriptors** ([`Matrix`], [`MatrixBank`], [`View`], [`MpiView`]) wrap
//!   buffers with the layout information kernels need.
//! - **[`Operand`]** is the closed variant the argument marshaler matches on.

pub mod allocator;
pub mod buffer;
pub mod error;
pub mod matrix;
pub mod operand;
pub mod view;

#[cfg(test)]
pub mod test;

pub use allocator::{Allocator, HostAllocator};
pub use buffer::{HostBuffer, RawBuffer};
pub use error::*;
pub use matrix::{Density, Matrix, MatrixBank, MatrixTraits};
pub use operand::{Operand, OperandMap};
pub use view::{MpiView, View};

#[cfg(feature = "cuda")]
pub use allocator::CudaAllocator;
