//! Error types for compressed array operations.

use plane_codec::CodecError;
use thiserror::Error;

/// Error type for compressed array operations.
#[derive(Debug, Error)]
pub enum ArrayError {
    /// Coordinate outside the declared dimensions.
    #[error("coordinate {coord:?} out of range for dimensions {dims:?}")]
    OutOfRange { coord: Vec<usize>, dims: Vec<usize> },

    /// Dimensions are empty, zero-sized along an axis, or of unsupported rank.
    #[error("invalid dimensions {dims:?}: rank must be 1..=4 and every extent at least 1")]
    InvalidDimensions { dims: Vec<usize> },

    /// The codec could not reconstruct a block from its compressed bytes.
    #[error("block decode failed: {0}")]
    DecodeFailure(#[from] CodecError),

    /// The allocator refused a storage or cache buffer.
    #[error("allocation of {requested} bytes refused")]
    AllocationFailure { requested: usize },

    /// Rate policy misuse (invalid parameter, or an encoded block that
    /// does not fit its fixed-size storage slot).
    #[error("rate policy violation: {0}")]
    PolicyViolation(String),
}

/// Result type for compressed array operations.
pub type Result<T> = std::result::Result<T, ArrayError>;
