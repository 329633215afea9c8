//! Block codec for compressed multidimensional arrays.
//!
//! This crate defines the boundary between a compressed-array runtime and
//! the entropy codec that turns dense element blocks into compressed bytes:
//!
//! - [`CodecElement`]: element types the codec understands (`f32`, `f64`,
//!   `i32`, `i64`), each with a monotone mapping to an unsigned bit pattern
//! - [`RateConfig`]: the rate-control parameter set (fixed-rate,
//!   fixed-precision, fixed-accuracy)
//! - [`BlockCodec`]: the stateless encode/decode pair consumed by the runtime
//! - [`PlaneCodec`]: the reference implementation based on bit-plane
//!   truncation and uniform quantization
//!
//! # Example
//!
//! ```
//! use plane_codec::{BlockCodec, PlaneCodec, RateConfig};
//!
//! let codec = PlaneCodec::new();
//! let config = RateConfig::FixedPrecision { planes: 64 };
//! let block = vec![1.0f64, -2.5, 0.0, 3.25];
//!
//! let bytes = codec.encode(&block, &config).unwrap();
//! let back: Vec<f64> = codec.decode(&bytes, &config, block.len()).unwrap();
//! assert_eq!(back, block); // full-width precision is lossless
//! ```

mod bits;
mod codec;
mod config;
mod element;
mod error;

pub use bits::{BitReader, BitWriter};
pub use codec::{BlockCodec, PlaneCodec};
pub use config::RateConfig;
pub use element::CodecElement;
pub use error::{CodecError, Result};
