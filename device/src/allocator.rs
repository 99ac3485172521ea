use std::sync::Arc;

#[cfg(feature = "cuda")]
use cudarc::driver::{CudaContext, CudaStream};
#[cfg(feature = "cuda")]
use snafu::ResultExt;

use crate::buffer::{HostBuffer, RawBuffer};
use crate::error::Result;

#[cfg(feature = "cuda")]
use crate::error::CudaSnafu;

/// Source of [`RawBuffer`]s for one backend.
///
/// Every operand that a kernel touches must come from the allocator of the
/// backend that compiled it: host kernels dereference host addresses, CUDA
/// kernels dereference device addresses.
pub trait Allocator: Send + Sync + std::fmt::Debug {
    /// Allocate `size` zero-initialised bytes.
    fn alloc(&self, size: usize) -> Result<RawBuffer>;

    /// Wait for all outstanding work touching this allocator's memory.
    fn synchronize(&self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str;
}

/// Host allocator using system memory.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostAllocator;

impl HostAllocator {
    pub fn shared() -> Arc<dyn Allocator> {
        Arc::new(Self)
    }
}

impl Allocator for HostAllocator {
    fn alloc(&self, size: usize) -> Result<RawBuffer> {
        tracing::trace!(size, "host alloc");
        Ok(RawBuffer::Host(HostBuffer::zeroed(size)?))
    }

    fn name(&self) -> &str {
        "HOST"
    }
}

/// CUDA allocator using GPU memory on one stream.
#[cfg(feature = "cuda")]
#[derive(Debug, Clone)]
pub struct CudaAllocator {
    stream: Arc<CudaStream>,
}

#[cfg(feature = "cuda")]
impl CudaAllocator {
    pub fn new(context: &Arc<CudaContext>) -> Self {
        Self { stream: context.default_stream() }
    }

    pub fn with_stream(stream: Arc<CudaStream>) -> Self {
        Self { stream }
    }

    pub fn stream(&self) -> &Arc<CudaStream> {
        &self.stream
    }
}

#[cfg(feature = "cuda")]
impl Allocator for CudaAllocator {
    fn alloc(&self, size: usize) -> Result<RawBuffer> {
        snafu::ensure!(size > 0, crate::error::EmptyShapeSnafu { what: "device buffer", shape: vec![size] });
        let data = self.stream.alloc_zeros::<u8>(size).context(CudaSnafu)?;
        Ok(RawBuffer::Cuda { data: parking_lot::Mutex::new(data), stream: Arc::clone(&self.stream) })
    }

    fn synchronize(&self) -> Result<()> {
        self.stream.synchronize().context(CudaSnafu)
    }

    fn name(&self) -> &str {
        "CUDA"
    }
}
