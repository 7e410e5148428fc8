//! Block headers as delivered in node block templates.
//!
//! The header is the only part of a template the miner interprets. Everything
//! else in the block (transactions, verbose data) is carried opaquely and
//! returned verbatim on submission.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::types::{Hash, HashParseError, Target};

mod codec;

pub use codec::HashMode;

/// Errors decoding header fields.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum HeaderError {
    #[error("invalid hash: {0}")]
    Hash(#[from] HashParseError),

    #[error("invalid blue work: {0}")]
    BlueWork(hex::FromHexError),
}

/// Parents of a block at one level of the DAG.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockLevelParents {
    pub parent_hashes: Vec<Hash>,
}

/// Accumulated blue work, a variable-length big-endian magnitude.
///
/// The node sends it as a hex string without leading zero padding, so the
/// digit count may be odd. The original text is kept for resubmission; the
/// decoded bytes (left-padded to a whole byte) feed the header hash.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BlueWork {
    text: String,
    bytes: Vec<u8>,
}

impl BlueWork {
    /// Decoded magnitude, big-endian, `ceil(digits / 2)` bytes long.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl FromStr for BlueWork {
    type Err = HeaderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = if s.len() % 2 == 1 {
            hex::decode(format!("0{s}"))
        } else {
            hex::decode(s)
        }
        .map_err(HeaderError::BlueWork)?;

        Ok(Self {
            text: s.to_string(),
            bytes,
        })
    }
}

impl fmt::Display for BlueWork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl Serialize for BlueWork {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.text)
    }
}

impl<'de> Deserialize<'de> for BlueWork {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A block header.
///
/// Every field except `nonce` is fixed by the template; the nonce is stamped
/// once, when a solution is found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockHeader {
    pub version: u16,
    pub parents: Vec<BlockLevelParents>,
    pub hash_merkle_root: Hash,
    pub accepted_id_merkle_root: Hash,
    pub utxo_commitment: Hash,
    pub timestamp: u64,
    pub bits: u32,
    pub nonce: u64,
    pub daa_score: u64,
    pub blue_score: u64,
    pub blue_work: BlueWork,
    pub pruning_point: Hash,
}

impl BlockHeader {
    /// Digest of every field except nonce and timestamp.
    ///
    /// This seeds the matrix and prefixes every proof-of-work evaluation.
    pub fn pre_pow_hash(&self) -> [u8; 32] {
        self.digest(HashMode::Commitment)
    }

    /// Identifying hash over all fields.
    pub fn hash(&self) -> Hash {
        Hash(self.digest(HashMode::Full))
    }

    /// Difficulty target encoded in `bits`.
    pub fn target(&self) -> Target {
        Target::from_compact(self.bits)
    }
}

/// A block as exchanged with the node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcBlock {
    pub header: BlockHeader,

    /// Transactions, passed through untouched.
    #[serde(default)]
    pub transactions: Vec<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verbose_data: Option<serde_json::Value>,
}


#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_blue_work_pads_odd_length() {
        let odd: BlueWork = "abc".parse().unwrap();
        assert_eq!(odd.as_bytes(), &[0x0a, 0xbc]);
        assert_eq!(odd.to_string(), "abc");

        let even: BlueWork = "0abc".parse().unwrap();
        assert_eq!(even.as_bytes(), odd.as_bytes());

        let empty: BlueWork = "".parse().unwrap();
        assert!(empty.as_bytes().is_empty());

        assert!("xyz".parse::<BlueWork>().is_err());
    }

    #[test]
    fn test_header_json_field_names() {
        let header = test_data::header();
        let value = serde_json::to_value(&header).unwrap();

        assert_eq!(value["hashMerkleRoot"], json!("04".repeat(32)));
        assert_eq!(value["parents"][0]["parentHashes"][1], json!("02".repeat(32)));
        assert_eq!(value["blueWork"], json!("abc"));
        assert_eq!(value["daaScore"], json!(123456));

        let back: BlockHeader = serde_json::from_value(value).unwrap();
        assert_eq!(back, header);
    }

    #[test]
    fn test_block_keeps_opaque_fields() {
        let value = json!({
            "header": serde_json::to_value(test_data::header()).unwrap(),
            "transactions": [{ "version": 0, "payload": "00" }],
            "verboseData": { "hash": "ff" }
        });
        let block: RpcBlock = serde_json::from_value(value.clone()).unwrap();
        assert_eq!(serde_json::to_value(&block).unwrap(), value);
    }

    #[test]
    fn test_malformed_hash_is_rejected() {
        let mut value = serde_json::to_value(test_data::header()).unwrap();
        value["pruningPoint"] = json!("1234");
        assert!(serde_json::from_value::<BlockHeader>(value).is_err());
    }
}
