//! Element trait for generic block codec operations.
//!
//! This module defines the `CodecElement` trait that abstracts over the
//! numeric types a compressed array can hold (f32, f64, i32, i64).
//!
//! The central requirement is a *monotone* mapping between an element and an
//! unsigned bit pattern: if `a < b` then `a.to_pattern() < b.to_pattern()`.
//! Bit-plane truncation operates on these patterns, so monotonicity is what
//! keeps truncation an order-preserving rounding step. Floats use the
//! sign-magnitude to biased-integer trick; signed integers use offset binary.

use std::fmt::Debug;

use num_traits::Zero;

/// Trait for element types stored in compressed blocks.
pub trait CodecElement:
    Copy + Clone + Debug + Default + PartialEq + PartialOrd + Zero + Send + Sync + 'static
{
    /// Bit width of the element type.
    const BITS: u32;

    /// Map to a monotone unsigned bit pattern (left-aligned in the low
    /// `Self::BITS` bits of the u64).
    fn to_pattern(self) -> u64;

    /// Inverse of [`to_pattern`](Self::to_pattern).
    fn from_pattern(pattern: u64) -> Self;

    /// Value as f64, for quantization in fixed-accuracy mode.
    fn to_f64(self) -> f64;

    /// Value from f64, rounding and saturating as needed.
    fn from_f64(value: f64) -> Self;
}

impl CodecElement for f64 {
    const BITS: u32 = 64;

    fn to_pattern(self) -> u64 {
        let bits = self.to_bits();
        if bits >> 63 == 1 {
            !bits
        } else {
            bits ^ (1 << 63)
        }
    }

    fn from_pattern(pattern: u64) -> Self {
        let bits = if pattern >> 63 == 1 {
            pattern ^ (1 << 63)
        } else {
            !pattern
        };
        f64::from_bits(bits)
    }

    fn to_f64(self) -> f64 {
        self
    }

    fn from_f64(value: f64) -> Self {
        value
    }
}

impl CodecElement for f32 {
    const BITS: u32 = 32;

    fn to_pattern(self) -> u64 {
        let bits = self.to_bits();
        let mapped = if bits >> 31 == 1 {
            !bits
        } else {
            bits ^ (1 << 31)
        };
        mapped as u64
    }

    fn from_pattern(pattern: u64) -> Self {
        let mapped = pattern as u32;
        let bits = if mapped >> 31 == 1 {
            mapped ^ (1 << 31)
        } else {
            !mapped
        };
        f32::from_bits(bits)
    }

    fn to_f64(self) -> f64 {
        self as f64
    }

    fn from_f64(value: f64) -> Self {
        value as f32
    }
}

impl CodecElement for i64 {
    const BITS: u32 = 64;

    fn to_pattern(self) -> u64 {
        (self as u64) ^ (1 << 63)
    }

    fn from_pattern(pattern: u64) -> Self {
        (pattern ^ (1 << 63)) as i64
    }

    fn to_f64(self) -> f64 {
        self as f64
    }

    fn from_f64(value: f64) -> Self {
        value.round() as i64
    }
}

impl CodecElement for i32 {
    const BITS: u32 = 32;

    fn to_pattern(self) -> u64 {
        ((self as u32) ^ (1 << 31)) as u64
    }

    fn from_pattern(pattern: u64) -> Self {
        ((pattern as u32) ^ (1 << 31)) as i32
    }

    fn to_f64(self) -> f64 {
        self as f64
    }

    fn from_f64(value: f64) -> Self {
        value.round() as i32
    }
}
