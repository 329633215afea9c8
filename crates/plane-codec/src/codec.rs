//! The block codec boundary and its bit-plane reference implementation.

use crate::bits::{BitReader, BitWriter};
use crate::config::RateConfig;
use crate::element::CodecElement;
use crate::error::{CodecError, Result};

/// Stateless encode/decode pair for dense element blocks.
///
/// Implementations must be pure functions of their inputs: no hidden state,
/// freely shareable across arrays. `decode(encode(x))` reconstructs `x`
/// within the tolerance implied by the rate configuration (exactly, for
/// full-width fixed-precision).
pub trait BlockCodec: Clone {
    /// Compress a dense block under the given rate configuration.
    fn encode<T: CodecElement>(&self, block: &[T], config: &RateConfig) -> Result<Vec<u8>>;

    /// Reconstruct a dense block of `len` elements.
    fn decode<T: CodecElement>(&self, bytes: &[u8], config: &RateConfig, len: usize)
        -> Result<Vec<T>>;
}

/// Reference codec based on bit-plane truncation.
///
/// Fixed-rate and fixed-precision keep the top bit planes of each element's
/// monotone pattern, packed MSB-first; the encoded size is exactly
/// `ceil(n * width / 8)` bytes, independent of the values. Fixed-accuracy
/// quantizes each value with step `2 * tolerance` and emits zigzag LEB128
/// varints, so the size varies with the data.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaneCodec;

impl PlaneCodec {
    pub fn new() -> Self {
        Self
    }

    /// Bit planes stored per element for the bounded modes.
    fn plane_width<T: CodecElement>(config: &RateConfig) -> u32 {
        match *config {
            RateConfig::FixedRate { bits_per_value } => bits_per_value,
            RateConfig::FixedPrecision { planes } => planes.min(T::BITS),
            RateConfig::FixedAccuracy { .. } => unreachable!("accuracy mode has no fixed width"),
        }
    }

    /// Encoded byte length for `len` elements at `width` bits each.
    pub fn packed_len(len: usize, width: u32) -> usize {
        (len * width as usize).div_ceil(8)
    }
}

impl BlockCodec for PlaneCodec {
    fn encode<T: CodecElement>(&self, block: &[T], config: &RateConfig) -> Result<Vec<u8>> {
        config.validate()?;
        match *config {
            RateConfig::FixedRate { .. } | RateConfig::FixedPrecision { .. } => {
                let width = Self::plane_width::<T>(config);
                let mut writer = BitWriter::new();
                for &value in block {
                    let pattern = value.to_pattern();
                    let stored = if width <= T::BITS {
                        pattern >> (T::BITS - width)
                    } else {
                        pattern << (width - T::BITS)
                    };
                    writer.write(stored, width);
                }
                Ok(writer.finish())
            }
            RateConfig::FixedAccuracy { tolerance } => {
                let step = 2.0 * tolerance;
                let mut out = Vec::with_capacity(block.len());
                for &value in block {
                    let scaled = (value.to_f64() / step).round();
                    // The cast below saturates; a quantum index outside
                    // i64 would silently break the error bound.
                    if !(scaled.abs() < i64::MAX as f64) {
                        return Err(CodecError::QuantRangeExceeded {
                            value: value.to_f64(),
                            tolerance,
                        });
                    }
                    put_uvarint(&mut out, zigzag_encode(scaled as i64));
                }
                Ok(out)
            }
        }
    }

    fn decode<T: CodecElement>(
        &self,
        bytes: &[u8],
        config: &RateConfig,
        len: usize,
    ) -> Result<Vec<T>> {
        config.validate()?;
        match *config {
            RateConfig::FixedRate { .. } | RateConfig::FixedPrecision { .. } => {
                let width = Self::plane_width::<T>(config);
                let expected = Self::packed_len(len, width);
                if bytes.len() != expected {
                    return Err(CodecError::LengthMismatch {
                        expected,
                        actual: bytes.len(),
                    });
                }
                let mut reader = BitReader::new(bytes);
                let mut out = Vec::with_capacity(len);
                for _ in 0..len {
                    let stored = reader
                        .read(width)
                        .ok_or(CodecError::Truncated { have: bytes.len() })?;
                    let pattern = if width <= T::BITS {
                        stored << (T::BITS - width)
                    } else {
                        stored >> (width - T::BITS)
                    };
                    out.push(T::from_pattern(pattern));
                }
                Ok(out)
            }
            RateConfig::FixedAccuracy { tolerance } => {
                let step = 2.0 * tolerance;
                let mut pos = 0usize;
                let mut out = Vec::with_capacity(len);
                for _ in 0..len {
                    let q = zigzag_decode(get_uvarint(bytes, &mut pos)?);
                    out.push(T::from_f64(q as f64 * step));
                }
                if pos != bytes.len() {
                    return Err(CodecError::LengthMismatch {
                        expected: pos,
                        actual: bytes.len(),
                    });
                }
                Ok(out)
            }
        }
    }
}

fn zigzag_encode(v: i64) -> u64 {
    ((v as u64) << 1) ^ ((v >> 63) as u64)
}

fn zigzag_decode(v: u64) -> i64 {
    ((v >> 1) as i64) ^ -((v & 1) as i64)
}

fn put_uvarint(out: &mut Vec<u8>, mut v: u64) {
    loop {
        let byte = (v & 0x7F) as u8;
        v >>= 7;
        if v == 0 {
            out.push(byte);
            return;
        }
        out.push(byte | 0x80);
    }
}

fn get_uvarint(bytes: &[u8], pos: &mut usize) -> Result<u64> {
    let mut value = 0u64;
    let mut shift = 0u32;
    loop {
        let byte = *bytes
            .get(*pos)
            .ok_or(CodecError::Truncated { have: bytes.len() })?;
        *pos += 1;
        if shift == 63 && byte > 1 {
            return Err(CodecError::Corrupt("varint overflows 64 bits"));
        }
        value |= u64::from(byte & 0x7F) << shift;
        if byte & 0x80 == 0 {
            return Ok(value);
        }
        shift += 7;
        if shift > 63 {
            return Err(CodecError::Corrupt("varint longer than 10 bytes"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_full_precision_is_lossless_f64() {
        let codec = PlaneCodec::new();
        let config = RateConfig::FixedPrecision { planes: 64 };
        let block = vec![0.0f64, -0.0, 1.5, -3.25e-200, 7.0e250, f64::MIN_POSITIVE];
        let bytes = codec.encode(&block, &config).unwrap();
        let back: Vec<f64> = codec.decode(&bytes, &config, block.len()).unwrap();
        for (a, b) in block.iter().zip(&back) {
            assert_eq!(a.to_bits(), b.to_bits());
        }
    }

    #[test]
    fn test_full_precision_is_lossless_ints() {
        let codec = PlaneCodec::new();
        let config = RateConfig::FixedPrecision { planes: 64 };
        let block = vec![0i64, -1, i64::MIN, i64::MAX, 42];
        let bytes = codec.encode(&block, &config).unwrap();
        let back: Vec<i64> = codec.decode(&bytes, &config, block.len()).unwrap();
        assert_eq!(back, block);

        let config = RateConfig::FixedPrecision { planes: 32 };
        let block = vec![0i32, -1, i32::MIN, i32::MAX];
        let bytes = codec.encode(&block, &config).unwrap();
        let back: Vec<i32> = codec.decode(&bytes, &config, block.len()).unwrap();
        assert_eq!(back, block);
    }

    #[test]
    fn test_fixed_rate_size_is_value_independent() {
        let codec = PlaneCodec::new();
        let config = RateConfig::FixedRate { bits_per_value: 8 };
        let zeros = vec![0.0f64; 16];
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let noise: Vec<f64> = (0..16).map(|_| rng.random_range(-1.0e6..1.0e6)).collect();

        let a = codec.encode(&zeros, &config).unwrap();
        let b = codec.encode(&noise, &config).unwrap();
        assert_eq!(a.len(), 16); // 8 bits/value * 16 values = 16 bytes
        assert_eq!(b.len(), 16);
    }

    #[test]
    fn test_fixed_rate_rounds_bits_up_to_bytes() {
        let codec = PlaneCodec::new();
        let config = RateConfig::FixedRate { bits_per_value: 3 };
        let block = vec![1.0f32; 5]; // 15 bits -> 2 bytes
        assert_eq!(codec.encode(&block, &config).unwrap().len(), 2);
    }

    #[test]
    fn test_truncation_preserves_zero() {
        let codec = PlaneCodec::new();
        let config = RateConfig::FixedRate { bits_per_value: 1 };
        let block = vec![0.0f64; 4];
        let bytes = codec.encode(&block, &config).unwrap();
        let back: Vec<f64> = codec.decode(&bytes, &config, 4).unwrap();
        assert!(back.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_truncation_is_idempotent() {
        // Re-encoding a decoded block must reproduce the same bytes, so a
        // second flush with no intervening writes stores identical data.
        let codec = PlaneCodec::new();
        let config = RateConfig::FixedRate { bits_per_value: 12 };
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let block: Vec<f64> = (0..64).map(|_| rng.random_range(-100.0..100.0)).collect();

        let first = codec.encode(&block, &config).unwrap();
        let decoded: Vec<f64> = codec.decode(&first, &config, 64).unwrap();
        let second = codec.encode(&decoded, &config).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_accuracy_mode_error_bound() {
        let codec = PlaneCodec::new();
        let tolerance = 1e-3;
        let config = RateConfig::FixedAccuracy { tolerance };
        let mut rng = ChaCha8Rng::seed_from_u64(23);
        let block: Vec<f64> = (0..256).map(|_| rng.random_range(-50.0..50.0)).collect();

        let bytes = codec.encode(&block, &config).unwrap();
        let back: Vec<f64> = codec.decode(&bytes, &config, block.len()).unwrap();
        for (a, b) in block.iter().zip(&back) {
            assert!((a - b).abs() <= tolerance, "error {} > {}", (a - b).abs(), tolerance);
        }
    }

    #[test]
    fn test_accuracy_mode_size_varies_with_data() {
        let codec = PlaneCodec::new();
        let config = RateConfig::FixedAccuracy { tolerance: 0.5 };
        let zeros = codec.encode(&vec![0.0f64; 64], &config).unwrap();
        let large = codec.encode(&vec![1.0e6f64; 64], &config).unwrap();
        assert!(zeros.len() < large.len());
    }

    #[test]
    fn test_accuracy_mode_rejects_unquantizable_magnitudes() {
        // 1e30 / (2 * 1e-3) has no i64 quantum index; encoding must fail
        // instead of saturating and silently breaking the error bound.
        let codec = PlaneCodec::new();
        let tolerance = 1e-3;
        let config = RateConfig::FixedAccuracy { tolerance };
        let err = codec.encode(&[1.0e30f64], &config);
        assert!(matches!(err, Err(CodecError::QuantRangeExceeded { .. })));
        let err = codec.encode(&[-1.0e30f64], &config);
        assert!(matches!(err, Err(CodecError::QuantRangeExceeded { .. })));
        let err = codec.encode(&[f64::NAN], &config);
        assert!(matches!(err, Err(CodecError::QuantRangeExceeded { .. })));

        // Large but representable magnitudes still encode within bound.
        let block = [1.0e12f64];
        let bytes = codec.encode(&block, &config).unwrap();
        let back: Vec<f64> = codec.decode(&bytes, &config, 1).unwrap();
        assert!((back[0] - block[0]).abs() <= tolerance * (1.0 + 1e-9));
    }

    #[test]
    fn test_decode_rejects_wrong_length() {
        let codec = PlaneCodec::new();
        let config = RateConfig::FixedPrecision { planes: 64 };
        let bytes = codec.encode(&[1.0f64, 2.0], &config).unwrap();
        let err = codec.decode::<f64>(&bytes[..bytes.len() - 1], &config, 2);
        assert!(matches!(err, Err(CodecError::LengthMismatch { .. })));
    }

    #[test]
    fn test_decode_rejects_truncated_varints() {
        let codec = PlaneCodec::new();
        let config = RateConfig::FixedAccuracy { tolerance: 0.1 };
        let bytes = codec.encode(&[123.0f64, -456.0], &config).unwrap();
        let err = codec.decode::<f64>(&bytes[..1], &config, 2);
        assert!(matches!(err, Err(CodecError::Truncated { .. })));
    }

    #[test]
    fn test_invalid_parameter_is_rejected() {
        let codec = PlaneCodec::new();
        let config = RateConfig::FixedRate { bits_per_value: 0 };
        assert!(matches!(
            codec.encode(&[1.0f64], &config),
            Err(CodecError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_zigzag_roundtrip() {
        for v in [0i64, 1, -1, 63, -64, i64::MIN, i64::MAX] {
            assert_eq!(zigzag_decode(zigzag_encode(v)), v);
        }
    }

    #[test]
    fn test_uvarint_roundtrip() {
        let mut out = Vec::new();
        let values = [0u64, 1, 127, 128, 300, u64::MAX];
        for &v in &values {
            put_uvarint(&mut out, v);
        }
        let mut pos = 0;
        for &v in &values {
            assert_eq!(get_uvarint(&out, &mut pos).unwrap(), v);
        }
        assert_eq!(pos, out.len());
    }
}
