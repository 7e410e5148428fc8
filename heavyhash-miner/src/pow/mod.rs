//! HeavyHash proof of work.
//!
//! Evaluating one nonce takes two cSHAKE256 calls with a 64×64 matrix
//! multiplication in between. The matrix and the header preimage depend only
//! on the template, so they are computed once per template and held in
//! [`PowState`]; per-nonce work is then just [`PowState::check`].

pub mod hasher;
pub mod matrix;
pub mod xoshiro;

pub use matrix::Matrix;
pub use xoshiro::Xoshiro256PlusPlus;

use crate::header::BlockHeader;
use crate::types::Target;
use crate::u256::U256;

/// Everything derived from a header that nonce evaluation needs.
#[derive(Debug, Clone)]
pub struct PowState {
    pre_pow_hash: [u8; 32],
    timestamp: u64,
    matrix: Matrix,
    target: Target,
}

impl PowState {
    /// Derive the evaluation state for a header.
    ///
    /// Dominated by matrix generation; call once per template.
    pub fn new(header: &BlockHeader) -> Self {
        let pre_pow_hash = header.pre_pow_hash();
        Self {
            pre_pow_hash,
            timestamp: header.timestamp,
            matrix: Matrix::generate(&pre_pow_hash),
            target: header.target(),
        }
    }

    /// Proof-of-work value for `nonce`.
    pub fn calculate_pow(&self, nonce: u64) -> U256 {
        U256::from_be_bytes(hasher::calculate_pow(
            &self.pre_pow_hash,
            &self.matrix,
            self.timestamp,
            nonce,
        ))
    }

    /// Evaluate `nonce`, returning whether it meets the target and its value.
    pub fn check(&self, nonce: u64) -> (bool, U256) {
        let pow = self.calculate_pow(nonce);
        (self.target.is_met_by(pow), pow)
    }

    pub fn target(&self) -> Target {
        self.target
    }

    pub fn pre_pow_hash(&self) -> &[u8; 32] {
        &self.pre_pow_hash
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::test_data;

    #[test]
    fn test_state_from_header() {
        let header = test_data::header();
        let state = PowState::new(&header);

        assert_eq!(hex::encode(state.pre_pow_hash()), test_data::PRE_POW_HASH);
        assert_eq!(state.target(), Target::from_compact(0x1e7fffff));

        // The header's own nonce is irrelevant; only the argument counts
        assert_eq!(
            state.calculate_pow(0x0123456789abcdef).to_string(),
            "720eed5755c3c8a7bf0a85847ccd65965b4e7d3b0587d42e4347d0fe1aea76ac"
        );
    }

    #[test]
    fn test_check_against_target_extremes() {
        let mut header = test_data::header();

        header.bits = 0x01000000; // target zero
        let (met, _) = PowState::new(&header).check(7);
        assert!(!met);

        header.bits = 0x21ffffff; // saturated target
        let (met, pow) = PowState::new(&header).check(7);
        assert!(met);
        assert!(pow < U256::MAX);
    }
}
