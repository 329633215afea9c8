//! Compressed 1-4 dimensional arrays with dense random access.
//!
//! This crate stores numeric arrays in a lossy or lossless block-compressed
//! representation while exposing ordinary element-level `get`/`set` access.
//! Arrays are tiled into 4^rank-element blocks; a bounded LRU cache holds a
//! working set of decompressed blocks and recompresses dirty blocks on
//! eviction or flush, so memory use stays bounded and the codec runs per
//! block fault rather than per element access.
//!
//! # Core Types
//!
//! - [`PackedArray`]: the array façade (`get`/`set`/`flush`/`resize`/iteration)
//! - [`RatePolicy`]: fixed-rate, fixed-precision or fixed-accuracy compression
//! - [`BlockCache`]: the LRU cache mediating between elements and storage
//! - [`CompressedStorage`]: the slot-per-block compressed byte store
//! - [`Allocator`]: injectable allocation capability
//!
//! The block codec itself lives in the `plane-codec` crate and is consumed
//! through its [`BlockCodec`] trait; any stateless encode/decode pair can
//! be substituted via [`PackedArray::with_codec`].
//!
//! # Example
//!
//! ```
//! use packed_mdarray::{PackedArray, RatePolicy};
//!
//! // 8x8 f64 array, lossless, at most two decompressed blocks resident.
//! let policy = RatePolicy::fixed_precision(64).unwrap();
//! let mut a = PackedArray::<f64>::new(&[8, 8], policy, 2).unwrap();
//!
//! for i in 0..8 {
//!     a.set(&[i, i], i as f64).unwrap();
//! }
//! a.flush().unwrap();
//! assert_eq!(a.get(&[5, 5]).unwrap(), 5.0);
//! ```

mod alloc;
mod array;
mod cache;
mod error;
mod layout;
mod policy;
mod storage;

pub use alloc::{default_allocator, AllocRef, Allocator, HeapAllocator, QuotaAllocator};
pub use array::{ElemIter, PackedArray};
pub use cache::{AccessMode, BlockCache};
pub use error::{ArrayError, Result};
pub use layout::{Layout, BLOCK_EXTENT, MAX_RANK};
pub use policy::RatePolicy;
pub use storage::CompressedStorage;

pub use plane_codec::{BlockCodec, CodecElement, CodecError, PlaneCodec, RateConfig};
