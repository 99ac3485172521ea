//! Raw device memory.
//!
//! A [`RawBuffer`] is a fixed-size allocation that kernels address through a
//! 64-bit value (host pointer or CUDA device pointer). Operand descriptors hold
//! buffers behind an `Arc`, so every kernel that captured an address also keeps
//! the allocation alive.

use std::alloc::Layout;
use std::ptr::NonNull;

#[cfg(feature = "cuda")]
use std::sync::Arc;

#[cfg(feature = "cuda")]
use cudarc::driver::{CudaSlice, CudaStream};
use snafu::{OptionExt, ensure};

#[cfg(feature = "cuda")]
use snafu::ResultExt;

use crate::error::{AllocationSnafu, CopyFailedSnafu, EmptyShapeSnafu, Result};

#[cfg(feature = "cuda")]
use crate::error::CudaSnafu;

/// Alignment of host allocations, wide enough for any vector ISA the C compiler may target.
pub const HOST_ALIGNMENT: usize = 64;

/// Zero-initialised, 64-byte aligned host allocation.
#[derive(Debug)]
pub struct HostBuffer {
    ptr: NonNull<u8>,
    layout: Layout,
}

// SAFETY: the allocation is uniquely owned by this value; concurrent access goes
// through raw pointers whose synchronization is the kernel scheduler's concern.
unsafe impl Send for HostBuffer {}
unsafe impl Sync for HostBuffer {}

impl HostBuffer {
    pub fn zeroed(size: usize) -> Result<Self> {
        ensure!(size > 0, EmptyShapeSnafu { what: "host buffer", shape: vec![size] });

        let layout =
            Layout::from_size_align(size, HOST_ALIGNMENT).map_err(|_| AllocationSnafu { size }.build())?;
        // SAFETY: layout has a non-zero size.
        let ptr = NonNull::new(unsafe { std::alloc::alloc_zeroed(layout) }).context(AllocationSnafu { size })?;

        Ok(Self { ptr, layout })
    }

    pub fn size(&self) -> usize {
        self.layout.size()
    }

    pub fn as_ptr(&self) -> *mut u8 {
        self.ptr.as_ptr()
    }
}

impl Drop for HostBuffer {
    fn drop(&mut self) {
        // SAFETY: ptr was allocated with exactly this layout.
        unsafe { std::alloc::dealloc(self.ptr.as_ptr(), self.layout) }
    }
}

/// Opaque handle to device memory.
#[derive(Debug)]
pub enum RawBuffer {
    Host(HostBuffer),
    #[cfg(feature = "cuda")]
    Cuda { data: parking_lot::Mutex<CudaSlice<u8>>, stream: Arc<CudaStream> },
}

impl RawBuffer {
    /// Get the size of the buffer in bytes.
    pub fn size(&self) -> usize {
        match self {
            RawBuffer::Host(host) => host.size(),
            #[cfg(feature = "cuda")]
            RawBuffer::Cuda { data, .. } => data.lock().len(),
        }
    }

    /// Address of the first byte as seen by kernels of the owning backend.
    pub fn address(&self) -> u64 {
        match self {
            RawBuffer::Host(host) => host.as_ptr() as u64,
            #[cfg(feature = "cuda")]
            RawBuffer::Cuda { data, stream } => {
                use cudarc::driver::DevicePtr;

                let data = data.lock();
                let (ptr, _sync) = data.device_ptr(stream);
                ptr
            }
        }
    }

    pub fn is_host(&self) -> bool {
        matches!(self, RawBuffer::Host(_))
    }

    /// Copy `src` into the buffer starting at byte `offset`.
    pub fn copyin(&self, offset: usize, src: &[u8]) -> Result<()> {
        self.check_range(offset, src.len())?;

        match self {
            RawBuffer::Host(host) => {
                // SAFETY: range checked above; src cannot alias a buffer we own.
                unsafe { std::ptr::copy_nonoverlapping(src.as_ptr(), host.as_ptr().add(offset), src.len()) };
                Ok(())
            }
            #[cfg(feature = "cuda")]
            RawBuffer::Cuda { data, stream } => {
                let mut data = data.lock();
                let mut view = data.slice_mut(offset..offset + src.len());
                stream.memcpy_htod(src, &mut view).context(CudaSnafu)
            }
        }
    }

    /// Copy from the buffer starting at byte `offset` into `dst`.
    ///
    /// For CUDA buffers this synchronizes the stream first.
    pub fn copyout(&self, offset: usize, dst: &mut [u8]) -> Result<()> {
        self.check_range(offset, dst.len())?;

        match self {
            RawBuffer::Host(host) => {
                // SAFETY: range checked above.
                unsafe { std::ptr::copy_nonoverlapping(host.as_ptr().add(offset), dst.as_mut_ptr(), dst.len()) };
                Ok(())
            }
            #[cfg(feature = "cuda")]
            RawBuffer::Cuda { data, stream } => {
                stream.synchronize().context(CudaSnafu)?;
                let data = data.lock();
                let view = data.slice(offset..offset + dst.len());
                stream.memcpy_dtoh(&view, dst).context(CudaSnafu)
            }
        }
    }

    fn check_range(&self, offset: usize, len: usize) -> Result<()> {
        let size = self.size();
        ensure!(
            offset.checked_add(len).is_some_and(|end| end <= size),
            CopyFailedSnafu {
                reason: format!("range {offset}..{} exceeds buffer of {size} bytes", offset.saturating_add(len))
            }
        );
        Ok(())
    }
}
