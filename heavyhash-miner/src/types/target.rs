//! Difficulty target decoded from a header's compact `bits` field.

use std::fmt;

use crate::u256::U256;

/// Proof-of-work target.
///
/// A hash is valid when, read as a 256-bit big-endian integer, it is strictly
/// less than the target. Larger targets are easier.
///
/// Headers carry the target in compact form: the top byte is a base-256
/// exponent and the low three bytes are the mantissa.
/// ```text
/// target = mantissa * 256^(exponent - 3)
/// ```
/// Exponents of three or less shift the mantissa right instead. The mantissa
/// is taken as a plain 24-bit unsigned value; there is no sign bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Target(U256);

impl Target {
    /// Decode a compact `bits` value.
    ///
    /// Exponents large enough to push mantissa bits past 256 bits saturate
    /// to [`U256::MAX`], so such a target accepts every hash.
    pub fn from_compact(bits: u32) -> Self {
        let exponent = bits >> 24;
        let mantissa = bits & 0x00ff_ffff;

        if exponent <= 3 {
            let value = mantissa >> (8 * (3 - exponent));
            return Self(U256::from(u64::from(value)));
        }

        let shift = 8 * (exponent as usize - 3);
        let value = U256::from(u64::from(mantissa))
            .checked_shl(shift)
            .unwrap_or(U256::MAX);
        Self(value)
    }

    /// Check whether a proof-of-work value satisfies this target.
    pub fn is_met_by(&self, pow: U256) -> bool {
        pow < self.0
    }

    #[cfg(test)]
    fn as_u256(&self) -> U256 {
        self.0
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
