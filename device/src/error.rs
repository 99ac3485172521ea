use frx_dtype::ScalarDType;
use snafu::Snafu;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    /// Operands must have at least one element along every dimension.
    #[snafu(display("{what} has an empty shape: {shape:?}"))]
    EmptyShape { what: String, shape: Vec<usize> },

    #[snafu(display("size mismatch: expected {expected}, got {actual}"))]
    SizeMismatch { expected: usize, actual: usize },

    #[snafu(display("dtype mismatch: expected {expected}, got {actual}"))]
    DTypeMismatch { expected: ScalarDType, actual: ScalarDType },

    /// Matrix layout is inconsistent (e.g. leading dimension smaller than the column count).
    #[snafu(display("invalid layout: {reason}"))]
    InvalidLayout { reason: String },

    /// Members of a matrix bank must share one set of traits.
    #[snafu(display("matrix bank member {index} has traits that differ from the first member"))]
    BankTraitMismatch { index: usize },

    #[snafu(display("index {index} out of bounds for length {len}"))]
    IndexOutOfBounds { index: usize, len: usize },

    /// Invalid view parameters.
    #[snafu(display("invalid view: {reason}"))]
    InvalidView { reason: String },

    /// Failed to copy data between host and device.
    #[snafu(display("copy operation failed: {reason}"))]
    CopyFailed { reason: String },

    #[snafu(display("allocation of {size} bytes failed"))]
    Allocation { size: usize },

    #[cfg(feature = "cuda")]
    /// CUDA-specific errors.
    #[snafu(display("CUDA error: {source}"))]
    Cuda { source: cudarc::driver::DriverError },
}
