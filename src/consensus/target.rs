// Difficulty target and compact "bits" encoding

use crate::core::Hash256;
use crate::error::{Error, Result};
use std::fmt;

const SIGN_BIT: u32 = 0x0080_0000;
const MANTISSA_MASK: u32 = 0x007f_ffff;

/// Difficulty target: a 256-bit unsigned integer stored big-endian.
///
/// A header satisfies the target when its hash, read as an integer with the
/// digest bytes reversed, is less than or equal to the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Target([u8; 32]);

impl Target {
    /// Target that no hash other than all zeros can meet
    pub const ZERO: Target = Target([0u8; 32]);
    /// Largest representable target
    pub const MAX: Target = Target([0xff; 32]);

    pub fn from_be_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn to_be_bytes(&self) -> [u8; 32] {
        self.0
    }

    /// Decode compact bits into the full target.
    ///
    /// The low 23 bits are the mantissa, bit 23 is the sign and the top
    /// byte is the exponent: `target = mantissa * 256^(exponent - 3)`.
    pub fn from_compact(bits: u32) -> Result<Self> {
        let exponent = (bits >> 24) as usize;
        let mantissa = bits & MANTISSA_MASK;

        if mantissa != 0 && bits & SIGN_BIT != 0 {
            return Err(Error::NegativeTarget(bits));
        }
        if mantissa != 0
            && (exponent > 34
                || (mantissa > 0xff && exponent > 33)
                || (mantissa > 0xffff && exponent > 32))
        {
            return Err(Error::TargetOverflow(bits));
        }

        let mut target = [0u8; 32];
        if exponent <= 3 {
            let value = mantissa >> (8 * (3 - exponent));
            target[28..].copy_from_slice(&value.to_be_bytes());
        } else {
            // Most significant mantissa byte lands at index 32 - exponent.
            // Bytes shifted past the top are zero after the overflow check.
            for (i, byte) in mantissa.to_be_bytes()[1..].iter().enumerate() {
                if let Some(index) = (32 + i).checked_sub(exponent) {
                    target[index] = *byte;
                }
            }
        }

        Ok(Self(target))
    }

    /// Encode into compact bits, choosing the normalized form.
    pub fn to_compact(&self) -> u32 {
        let Some(first) = self.0.iter().position(|&b| b != 0) else {
            return 0;
        };

        let mut size = 32 - first;
        let mut mantissa = if size <= 3 {
            let mut buf = [0u8; 4];
            buf[4 - size..].copy_from_slice(&self.0[first..]);
            u32::from_be_bytes(buf) << (8 * (3 - size))
        } else {
            u32::from_be_bytes([0, self.0[first], self.0[first + 1], self.0[first + 2]])
        };

        // A set sign bit would read back as negative
        if mantissa & SIGN_BIT != 0 {
            mantissa >>= 8;
            size += 1;
        }

        ((size as u32) << 24) | mantissa
    }

    /// Check if a hash meets this target (hash as integer <= target)
    #[inline]
    pub fn is_met_by(&self, hash: &Hash256) -> bool {
        hash.to_be_bytes() <= self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// Count leading zero bits in target (difficulty indicator)
    pub fn leading_zeros(&self) -> u32 {
        let mut zeros = 0;
        for byte in &self.0 {
            if *byte == 0 {
                zeros += 8;
            } else {
                zeros += byte.leading_zeros();
                break;
            }
        }
        zeros
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mainnet_difficulty_one() {
        let target = Target::from_compact(0x1d00ffff).unwrap();
        assert_eq!(
            target.to_hex(),
            "00000000ffff0000000000000000000000000000000000000000000000000000"
        );
        assert_eq!(target.leading_zeros(), 32);
    }

    #[test]
    fn test_regtest_target() {
        let target = Target::from_compact(0x207fffff).unwrap();
        assert_eq!(
            target.to_hex(),
            "7fffff0000000000000000000000000000000000000000000000000000000000"
        );
        assert_eq!(target.leading_zeros(), 1);
    }

    #[test]
    fn test_small_exponents() {
        let target = Target::from_compact(0x01123456).unwrap();
        assert_eq!(target.to_be_bytes()[31], 0x12);
        assert_eq!(&target.to_be_bytes()[..31], &[0u8; 31]);

        let target = Target::from_compact(0x02123456).unwrap();
        assert_eq!(&target.to_be_bytes()[30..], &[0x12, 0x34]);

        let target = Target::from_compact(0x03123456).unwrap();
        assert_eq!(&target.to_be_bytes()[29..], &[0x12, 0x34, 0x56]);

        let target = Target::from_compact(0x04123456).unwrap();
        assert_eq!(&target.to_be_bytes()[28..], &[0x12, 0x34, 0x56, 0x00]);
    }

    #[test]
    fn test_zero_encodings() {
        assert!(Target::from_compact(0).unwrap().is_zero());
        assert!(Target::from_compact(0x01003456).unwrap().is_zero());
        // Sign bit with empty mantissa is zero, not negative
        assert!(Target::from_compact(0x04800000).unwrap().is_zero());
        assert_eq!(Target::ZERO.to_compact(), 0);
    }

    #[test]
    fn test_negative_and_overflow_rejected() {
        assert!(matches!(
            Target::from_compact(0x04923456),
            Err(Error::NegativeTarget(0x04923456))
        ));
        assert!(matches!(
            Target::from_compact(0x23000001),
            Err(Error::TargetOverflow(_))
        ));
        assert!(matches!(
            Target::from_compact(0x22000100),
            Err(Error::TargetOverflow(_))
        ));
        assert!(matches!(
            Target::from_compact(0x21010000),
            Err(Error::TargetOverflow(_))
        ));
        // Largest exponents that still fit
        assert_eq!(Target::from_compact(0x22000001).unwrap().to_be_bytes()[0], 0x01);
        assert_eq!(&Target::from_compact(0x2100ffff).unwrap().to_be_bytes()[..2], &[0xff, 0xff]);
    }

    #[test]
    fn test_compact_round_trip() {
        for bits in [
            0x1d00ffff, 0x207fffff, 0x1b0404cb, 0x1a05db8b, 0x17034219, 0x05009234,
            0x04123456, 0x03123456, 0x02008000, 0x01120000, 0x2100ffff,
        ] {
            let target = Target::from_compact(bits).unwrap();
            assert_eq!(target.to_compact(), bits, "round trip of {:#010x}", bits);
        }
    }

    #[test]
    fn test_encode_normalizes_sign_bit() {
        assert_eq!(Target::MAX.to_compact(), 0x2100ffff);

        let mut bytes = [0u8; 32];
        bytes[31] = 0x80;
        assert_eq!(Target::from_be_bytes(bytes).to_compact(), 0x02008000);
    }

    #[test]
    fn test_hash_comparison_uses_reversed_digest() {
        let target = Target::from_compact(0x1d00ffff).unwrap();

        // Zero bytes at the end of the digest are the high-order bytes
        let mut low = [0xffu8; 32];
        low[27..].copy_from_slice(&[0; 5]);
        assert!(target.is_met_by(&Hash256::new(low)));

        let mut high = [0u8; 32];
        high[0] = 0xff;
        high[31] = 0x01;
        assert!(!target.is_met_by(&Hash256::new(high)));

        assert!(target.is_met_by(&Hash256::zero()));
        assert!(!target.is_met_by(&Hash256::new([0xff; 32])));
    }

    #[test]
    fn test_equal_value_meets_target() {
        let target = Target::from_compact(0x207fffff).unwrap();
        let mut digest = target.to_be_bytes();
        digest.reverse();
        assert!(target.is_met_by(&Hash256::new(digest)));
        assert!(Target::ZERO.is_met_by(&Hash256::zero()));
        assert!(Target::MAX.is_met_by(&Hash256::new([0xff; 32])));
    }
}
