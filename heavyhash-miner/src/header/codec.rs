//! Canonical header serialization.
//!
//! The header hash is BLAKE2b-256 keyed with `"BlockHash"` over this layout
//! (integers little-endian):
//! ```text
//! version            u16
//! parent level count u64
//!   per level:       u64 count, then each 32-byte hash
//! hash merkle root   32
//! accepted id root   32
//! utxo commitment    32
//! timestamp          u64   (zero in commitment mode)
//! bits               u32
//! nonce              u64   (zero in commitment mode)
//! daa score          u64
//! blue score         u64
//! blue work          u64 length, then big-endian bytes
//! pruning point      32
//! ```
//! Any deviation yields a different digest than the node computes.

use blake2::digest::consts::U32;
use blake2::digest::Mac;
use blake2::Blake2bMac;

use super::BlockHeader;

const HEADER_HASH_KEY: &[u8] = b"BlockHash";

/// Which header fields the digest covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashMode {
    /// Nonce and timestamp written as zero. Used as the proof-of-work preimage.
    Commitment,
    /// All fields as they are. Used to identify the block.
    Full,
}

impl BlockHeader {
    /// Hash the header in the given mode.
    pub fn digest(&self, mode: HashMode) -> [u8; 32] {
        let mut hasher = Blake2bMac::<U32>::new_from_slice(HEADER_HASH_KEY)
            .expect("BLAKE2b accepts keys up to 64 bytes");

        let (timestamp, nonce) = match mode {
            HashMode::Commitment => (0, 0),
            HashMode::Full => (self.timestamp, self.nonce),
        };

        hasher.update(&self.version.to_le_bytes());
        hasher.update(&(self.parents.len() as u64).to_le_bytes());
        for level in &self.parents {
            hasher.update(&(level.parent_hashes.len() as u64).to_le_bytes());
            for parent in &level.parent_hashes {
                hasher.update(parent.as_bytes());
            }
        }

        hasher.update(self.hash_merkle_root.as_bytes());
        hasher.update(self.accepted_id_merkle_root.as_bytes());
        hasher.update(self.utxo_commitment.as_bytes());

        hasher.update(&timestamp.to_le_bytes());
        hasher.update(&self.bits.to_le_bytes());
        hasher.update(&nonce.to_le_bytes());
        hasher.update(&self.daa_score.to_le_bytes());
        hasher.update(&self.blue_score.to_le_bytes());

        let blue_work = self.blue_work.as_bytes();
        hasher.update(&(blue_work.len() as u64).to_le_bytes());
        hasher.update(blue_work);

        hasher.update(self.pruning_point.as_bytes());

        hasher.finalize().into_bytes().into()
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_data::{self, FULL_HASH, PRE_POW_HASH};
    use super::*;

    #[test]
    fn test_commitment_digest_reference() {
        let header = test_data::header();
        assert_eq!(hex::encode(header.pre_pow_hash()), PRE_POW_HASH);
    }

    #[test]
    fn test_full_digest_reference() {
        let header = test_data::header();
        assert_eq!(header.hash().to_string(), FULL_HASH);
    }

    #[test]
    fn test_commitment_ignores_nonce_and_timestamp() {
        let header = test_data::header();
        let mut moved = header.clone();
        moved.nonce = 42;
        moved.timestamp += 1000;
        assert_eq!(moved.pre_pow_hash(), header.pre_pow_hash());

        // With both zeroed, the full digest coincides with the commitment
        moved.nonce = 0;
        moved.timestamp = 0;
        assert_eq!(moved.digest(HashMode::Full), header.pre_pow_hash());
    }

    #[test]
    fn test_full_digest_tracks_nonce_and_timestamp() {
        let header = test_data::header();

        let mut renonced = header.clone();
        renonced.nonce += 1;
        assert_ne!(renonced.hash(), header.hash());

        let mut retimed = header.clone();
        retimed.timestamp += 1;
        assert_ne!(retimed.hash(), header.hash());

        assert_eq!(header.clone().hash(), header.hash());
    }

    #[test]
    fn test_blue_work_padding_is_canonical() {
        let header = test_data::header();
        let mut padded = header.clone();
        padded.blue_work = "0abc".parse().unwrap();
        assert_eq!(padded.pre_pow_hash(), header.pre_pow_hash());
    }

    #[test]
    fn test_every_committed_field_matters() {
        let base = test_data::header().pre_pow_hash();

        let mut h = test_data::header();
        h.bits += 1;
        assert_ne!(h.pre_pow_hash(), base);

        let mut h = test_data::header();
        h.parents.swap(0, 1);
        assert_ne!(h.pre_pow_hash(), base);

        let mut h = test_data::header();
        h.pruning_point = test_data::filled(8);
        assert_ne!(h.pre_pow_hash(), base);
    }
}
