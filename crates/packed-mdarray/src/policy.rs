//! Rate-control policy: how aggressively blocks are compressed.

use plane_codec::RateConfig;

use crate::error::{ArrayError, Result};

/// Validated rate-control policy for one array.
///
/// Wraps a [`RateConfig`] and derives the worst-case compressed size used
/// to pre-allocate storage slots. The policy is immutable for the lifetime
/// of a compressed representation; swapping it requires
/// [`PackedArray::recompress`](crate::PackedArray::recompress).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatePolicy {
    config: RateConfig,
}

impl RatePolicy {
    /// Validate parameters and build a policy.
    pub fn new(config: RateConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| ArrayError::PolicyViolation(e.to_string()))?;
        Ok(Self { config })
    }

    /// Fixed-rate policy targeting `bits_per_value` compressed bits per value.
    pub fn fixed_rate(bits_per_value: u32) -> Result<Self> {
        Self::new(RateConfig::FixedRate { bits_per_value })
    }

    /// Fixed-precision policy retaining the `planes` most significant bit planes.
    pub fn fixed_precision(planes: u32) -> Result<Self> {
        Self::new(RateConfig::FixedPrecision { planes })
    }

    /// Fixed-accuracy policy bounding the absolute error by `tolerance`.
    pub fn fixed_accuracy(tolerance: f64) -> Result<Self> {
        Self::new(RateConfig::FixedAccuracy { tolerance })
    }

    /// The underlying rate configuration, as passed to the codec.
    pub fn config(&self) -> &RateConfig {
        &self.config
    }

    /// Mode tag for introspection.
    pub fn mode_name(&self) -> &'static str {
        self.config.mode_name()
    }

    /// Worst-case compressed bits for a block of `elems` elements of
    /// `elem_bits` width; `None` for the variable-length accuracy mode.
    pub fn max_compressed_bits(&self, elems: usize, elem_bits: u32) -> Option<usize> {
        match self.config {
            RateConfig::FixedRate { bits_per_value } => Some(elems * bits_per_value as usize),
            RateConfig::FixedPrecision { planes } => {
                Some(elems * planes.min(elem_bits) as usize)
            }
            RateConfig::FixedAccuracy { .. } => None,
        }
    }

    /// Storage slot size in bytes (bits rounded up to whole bytes);
    /// `None` for variable-length slots.
    pub fn slot_bytes(&self, elems: usize, elem_bits: u32) -> Option<usize> {
        self.max_compressed_bits(elems, elem_bits)
            .map(|bits| bits.div_ceil(8))
    }
}
