//! Error types for kernel construction and execution.

use snafu::Snafu;

/// Result type for runtime operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    #[snafu(display("Codegen error: {source}"))]
    Codegen { source: frx_codegen::Error },

    #[snafu(display("Device error: {source}"))]
    Device { source: frx_device::Error },

    /// A kernel name is already bound to another module.
    #[snafu(display("Kernel \"{name}\" is already registered from {existing}, cannot rebind to {module}"))]
    RegistrationConflict { name: String, existing: String, module: String },

    #[snafu(display("Kernel \"{name}\" is not registered"))]
    UnknownKernel { name: String },

    /// Operands of one operation disagree on dtype, layout or density.
    #[snafu(display("Incompatible matrix types: {reason}"))]
    IncompatibleTraits { reason: String },

    #[snafu(display("Incompatible shapes: {reason}"))]
    IncompatibleShape { reason: String },

    #[snafu(display("Invalid configuration: {reason}"))]
    Config { reason: String },

    #[snafu(display("Compilation failed: {reason}"))]
    Compilation { reason: String },

    #[snafu(display("I/O error while {what}: {source}"))]
    Io { what: String, source: std::io::Error },

    #[snafu(display("Failed to load library {path}: {source}"))]
    LibraryLoad { path: String, source: libloading::Error },

    #[snafu(display("Symbol '{name}' not found: {source}"))]
    SymbolNotFound { name: String, source: libloading::Error },

    #[cfg(feature = "cuda")]
    #[snafu(display("CUDA error: {source}"))]
    Cuda { source: cudarc::driver::DriverError },

    /// Native arguments disagree with the kernel's argspec.
    #[snafu(display("Argument mismatch: {reason}"))]
    ArgumentMismatch { reason: String },

    /// A build requested its own key while in progress.
    #[snafu(display("Reentrant build in the {cache} cache"))]
    ReentrantBuild { cache: String },

    #[snafu(display("Empty launch: {what}"))]
    EmptyLaunch { what: String },

    #[snafu(display("Launch of {count} elements in blocks of {block} overflows the grid"))]
    LaunchOverflow { count: usize, block: u32 },
}

impl From<frx_codegen::Error> for Error {
    fn from(source: frx_codegen::Error) -> Self {
        Self::Codegen { source }
    }
}

impl From<frx_device::Error> for Error {
    fn from(source: frx_device::Error) -> Self {
        Self::Device { source }
    }
}
