//! Error types for block codec operations.

use thiserror::Error;

/// Error type for encode/decode failures.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Compressed input ended before the block was fully reconstructed.
    #[error("compressed block truncated after {have} bytes")]
    Truncated { have: usize },

    /// Compressed input length does not match the expected encoded size.
    #[error("compressed length {actual} does not match expected {expected}")]
    LengthMismatch { expected: usize, actual: usize },

    /// Compressed input violates the encoding format.
    #[error("corrupt compressed block: {0}")]
    Corrupt(&'static str),

    /// Rate parameter is outside its valid range.
    #[error("invalid rate parameter: {0}")]
    InvalidParameter(String),

    /// A value is too large in magnitude (or not a number) to quantize
    /// under the requested tolerance.
    #[error("value {value} exceeds the quantization range for tolerance {tolerance}")]
    QuantRangeExceeded { value: f64, tolerance: f64 },
}

/// Result type for codec operations.
pub type Result<T> = std::result::Result<T, CodecError>;
