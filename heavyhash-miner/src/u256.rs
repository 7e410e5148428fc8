//! 256-bit unsigned integer arithmetic.
//!
//! Wraps `ruint::aliases::U256` to provide a stable interface for the two
//! places the miner needs wide integers: difficulty targets and finished
//! proof-of-work hashes. Keeping the adapter small means the underlying
//! library can be swapped without touching callers.

use ruint::aliases::U256 as Ruint256;
use std::fmt;

/// A 256-bit unsigned integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct U256(Ruint256);

impl U256 {
    /// Zero constant.
    pub const ZERO: Self = Self(Ruint256::ZERO);

    /// Largest representable value.
    pub const MAX: Self = Self(Ruint256::MAX);

    /// Create from big-endian bytes.
    pub fn from_be_bytes(bytes: [u8; 32]) -> Self {
        Self(Ruint256::from_be_bytes(bytes))
    }

    /// Convert to big-endian bytes.
    pub fn to_be_bytes(self) -> [u8; 32] {
        self.0.to_be_bytes()
    }

    /// Shift left by `bits`, returning `None` if any set bit would be lost.
    pub fn checked_shl(self, bits: usize) -> Option<Self> {
        self.0.checked_shl(bits).map(Self)
    }
}

impl From<u64> for U256 {
    fn from(value: u64) -> Self {
        Self(Ruint256::from(value))
    }
}

/// Formats as 64 zero-padded lowercase hex digits, most significant first.
impl fmt::Display for U256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.to_be_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endianness_agrees() {
        let mut be = [0u8; 32];
        be[31] = 0x01;
        assert_eq!(U256::from_be_bytes(be), U256::from(1));
        assert_eq!(U256::from(1).to_be_bytes(), be);
    }

    #[test]
    fn test_checked_shl() {
        let one = U256::from(1);
        let top = one.checked_shl(255).unwrap();
        assert_eq!(top.to_be_bytes()[0], 0x80);

        // Bits shifted out of the top are reported, not silently dropped
        assert_eq!(one.checked_shl(256), None);
        assert_eq!(top.checked_shl(1), None);

        // Zero can be shifted arbitrarily far
        assert_eq!(U256::ZERO.checked_shl(1000), Some(U256::ZERO));
    }

    #[test]
    fn test_display_is_padded_hex() {
        assert_eq!(
            U256::from(0xabcd).to_string(),
            "000000000000000000000000000000000000000000000000000000000000abcd"
        );
        assert_eq!(U256::MAX.to_string(), "f".repeat(64));
    }
}
