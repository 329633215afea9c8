//! Rate-control parameter set.

use crate::error::{CodecError, Result};

/// Compression mode and its numeric parameter.
///
/// Exactly one mode is active per array. The mode and parameter are fixed
/// for the lifetime of a compressed representation; changing them
/// invalidates every previously compressed block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RateConfig {
    /// Target a constant number of compressed bits per value (1..=64).
    FixedRate { bits_per_value: u32 },
    /// Retain a constant number of most significant bit planes (1..=64).
    /// Retaining the full element width is lossless.
    FixedPrecision { planes: u32 },
    /// Bound the absolute reconstruction error; compressed size varies
    /// per block. The tolerance must be positive and finite.
    FixedAccuracy { tolerance: f64 },
}

impl RateConfig {
    /// Check the parameter range for the active mode.
    pub fn validate(&self) -> Result<()> {
        match *self {
            RateConfig::FixedRate { bits_per_value } => {
                if bits_per_value == 0 || bits_per_value > 64 {
                    return Err(CodecError::InvalidParameter(format!(
                        "bits per value must be in 1..=64, got {bits_per_value}"
                    )));
                }
            }
            RateConfig::FixedPrecision { planes } => {
                if planes == 0 || planes > 64 {
                    return Err(CodecError::InvalidParameter(format!(
                        "bit planes must be in 1..=64, got {planes}"
                    )));
                }
            }
            RateConfig::FixedAccuracy { tolerance } => {
                if !(tolerance.is_finite() && tolerance > 0.0) {
                    return Err(CodecError::InvalidParameter(format!(
                        "tolerance must be positive and finite, got {tolerance}"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Short mode tag for diagnostics.
    pub fn mode_name(&self) -> &'static str {
        match self {
            RateConfig::FixedRate { .. } => "fixed-rate",
            RateConfig::FixedPrecision { .. } => "fixed-precision",
            RateConfig::FixedAccuracy { .. } => "fixed-accuracy",
        }
    }

    /// Whether the encoded size of a block is bounded a priori.
    pub fn is_bounded(&self) -> bool {
        !matches!(self, RateConfig::FixedAccuracy { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_accepts_sane_parameters() {
        assert!(RateConfig::FixedRate { bits_per_value: 8 }.validate().is_ok());
        assert!(RateConfig::FixedPrecision { planes: 64 }.validate().is_ok());
        assert!(RateConfig::FixedAccuracy { tolerance: 1e-3 }.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        assert!(RateConfig::FixedRate { bits_per_value: 0 }.validate().is_err());
        assert!(RateConfig::FixedRate { bits_per_value: 65 }.validate().is_err());
        assert!(RateConfig::FixedPrecision { planes: 0 }.validate().is_err());
        assert!(RateConfig::FixedAccuracy { tolerance: 0.0 }.validate().is_err());
        assert!(RateConfig::FixedAccuracy { tolerance: -1.0 }.validate().is_err());
        assert!(RateConfig::FixedAccuracy { tolerance: f64::NAN }.validate().is_err());
        assert!(RateConfig::FixedAccuracy { tolerance: f64::INFINITY }.validate().is_err());
    }

    #[test]
    fn test_boundedness() {
        assert!(RateConfig::FixedRate { bits_per_value: 4 }.is_bounded());
        assert!(RateConfig::FixedPrecision { planes: 12 }.is_bounded());
        assert!(!RateConfig::FixedAccuracy { tolerance: 0.5 }.is_bounded());
    }
}
