//! Backend implementations.

pub mod host;

#[cfg(feature = "cuda")]
pub mod cuda;
