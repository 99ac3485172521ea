//! Error types for kernel rendering.

use snafu::Snafu;

use crate::BackendKind;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    /// The rendered template did not declare the requested kernel.
    #[snafu(display("Kernel \"{name}\" not defined by template {module}"))]
    KernelNotDefined { name: String, module: String },

    #[snafu(display("Unknown template module: {module}"))]
    UnknownTemplate { module: String },

    #[snafu(display("Missing template parameter: {name}"))]
    MissingParam { name: String },

    #[snafu(display("Invalid template parameter {name}: {reason}"))]
    InvalidParam { name: String, reason: String },

    /// A template was rendered for a backend it has no source for.
    #[snafu(display("Template {module} is not available on the {backend} backend"))]
    UnsupportedBackend { module: String, backend: BackendKind },

    #[snafu(display("Kernel \"{name}\" declared twice in one template"))]
    DuplicateKernel { name: String },

    #[snafu(display("Invalid kernel {name}: {reason}"))]
    InvalidKernel { name: String, reason: String },
}
