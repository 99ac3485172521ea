//! Compute kernel abstraction.

use frx_dtype::ScalarValue;

use crate::Result;

/// Scheduling class of a kernel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum KernelKind {
    /// Purely computational.
    #[default]
    Compute,
    /// Interacts with inter-partition messaging.
    Mpi,
}

/// One invocable unit of work.
///
/// Host kernels complete before `run` returns. Device kernels are enqueued on
/// their backend's stream; callers synchronize before reading results.
pub trait ComputeKernel: Send {
    /// Execute with run-time arguments (e.g. the coefficients of `axnpby`).
    /// Kernels without run-time arguments expect an empty slice.
    fn run(&mut self, args: &[ScalarValue]) -> Result<()>;

    /// Scalar produced by the last `run`, if the kernel has one.
    fn retval(&self) -> Option<ScalarValue> {
        None
    }

    fn kind(&self) -> KernelKind {
        KernelKind::Compute
    }
}

/// An ordered collection of kernels run as one.
///
/// `run` forwards the same arguments to every member in order and stops at
/// the first error. Return values are not aggregated; read them from the
/// members directly.
pub struct MetaKernel {
    kind: KernelKind,
    members: Vec<Box<dyn ComputeKernel>>,
}

impl std::fmt::Debug for MetaKernel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetaKernel").field("kind", &self.kind).field("members", &self.members.len()).finish()
    }
}

impl MetaKernel {
    pub fn compute(members: Vec<Box<dyn ComputeKernel>>) -> Self {
        Self { kind: KernelKind::Compute, members }
    }

    pub fn mpi(members: Vec<Box<dyn ComputeKernel>>) -> Self {
        Self { kind: KernelKind::Mpi, members }
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn members(&self) -> &[Box<dyn ComputeKernel>] {
        &self.members
    }
}

impl ComputeKernel for MetaKernel {
    fn run(&mut self, args: &[ScalarValue]) -> Result<()> {
        for member in &mut self.members {
            member.run(args)?;
        }
        Ok(())
    }

    fn kind(&self) -> KernelKind {
        self.kind
    }
}
