//! Core types for heavyhash-miner.
//!
//! This module provides a unified location for small value types used
//! throughout the miner: 32-byte hashes as exchanged with the node, measured
//! hashrate, and the difficulty target.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

mod target;

pub use target::Target;

/// A 32-byte hash in the node's byte order.
///
/// The node transmits hashes as 64-character hex strings; the bytes are fed
/// to the header hasher exactly as decoded, with no reversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Hash(pub [u8; 32]);

impl Hash {
    /// View the raw bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl From<[u8; 32]> for Hash {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

/// Error parsing a [`Hash`] from hex.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum HashParseError {
    #[error("invalid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    #[error("hash must be 32 bytes, got {0}")]
    WrongLength(usize),
}

impl FromStr for Hash {
    type Err = HashParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s)?;
        let len = bytes.len();
        let bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|_| HashParseError::WrongLength(len))?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl Serialize for Hash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Hash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Hashrate measurement.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HashRate(pub f64); // hashes per second

impl HashRate {
    /// Rate achieved by computing `hashes` over `elapsed`.
    ///
    /// Returns `None` when `elapsed` is zero, since no rate can be derived
    /// from an empty interval.
    pub fn from_hashes(hashes: u64, elapsed: Duration) -> Option<Self> {
        if elapsed.is_zero() {
            return None;
        }
        Some(Self(hashes as f64 / elapsed.as_secs_f64()))
    }

    /// Get value as hashes per second
    pub fn as_hashes(&self) -> f64 {
        self.0
    }

    /// Format as human-readable string with appropriate units
    pub fn to_human_readable(&self) -> String {
        if self.0 >= 1e12 {
            format!("{:.2} TH/s", self.0 / 1e12)
        } else if self.0 >= 1e9 {
            format!("{:.2} GH/s", self.0 / 1e9)
        } else if self.0 >= 1e6 {
            format!("{:.2} MH/s", self.0 / 1e6)
        } else if self.0 >= 1e3 {
            format!("{:.2} kH/s", self.0 / 1e3)
        } else {
            format!("{:.2} H/s", self.0)
        }
    }
}

impl fmt::Display for HashRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_human_readable())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_hex_roundtrip() {
        let text = "0102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f20";
        let hash: Hash = text.parse().unwrap();
        assert_eq!(hash.0[0], 0x01);
        assert_eq!(hash.0[31], 0x20);
        assert_eq!(hash.to_string(), text);
    }

    #[test]
    fn test_hash_rejects_bad_input() {
        assert_eq!(
            "abcd".parse::<Hash>(),
            Err(HashParseError::WrongLength(2))
        );
        assert!(matches!(
            "zz".repeat(32).parse::<Hash>(),
            Err(HashParseError::InvalidHex(_))
        ));
    }

    #[test]
    fn test_hash_serde_as_string() {
        let hash = Hash([0xab; 32]);
        let json = serde_json::to_value(hash).unwrap();
        assert_eq!(json, serde_json::Value::String("ab".repeat(32)));
        let back: Hash = serde_json::from_value(json).unwrap();
        assert_eq!(back, hash);
    }

    #[test]
    fn test_hashrate_from_hashes() {
        let rate = HashRate::from_hashes(5_000, Duration::from_secs(10)).unwrap();
        assert_eq!(rate.as_hashes(), 500.0);

        assert_eq!(HashRate::from_hashes(5_000, Duration::ZERO), None);
    }

    #[test]
    fn test_hashrate_human_readable() {
        assert_eq!(HashRate(12.5).to_human_readable(), "12.50 H/s");
        assert_eq!(HashRate(250_000.0).to_string(), "250.00 kH/s");
        assert_eq!(HashRate(1_500_000.0).to_string(), "1.50 MH/s");
        assert_eq!(HashRate(3.2e12).to_string(), "3.20 TH/s");
    }
}
