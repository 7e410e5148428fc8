//! The double sponge transform at the core of the proof of work.
//!
//! Both sponge calls are cSHAKE256 with an empty function name and a fixed
//! customization string. The customization is absorbed as a full 136-byte
//! block ahead of the data:
//! ```text
//! 01 88 | 01 00 | 01 78 "ProofOfWorkHash" | 00 .. 00     (light hash)
//! 01 88 | 01 00 | 01 48 "HeavyHash"       | 00 .. 00     (heavy hash)
//! ```

use sha3::digest::{ExtendableOutput, Update, XofReader};
use sha3::{CShake256, CShake256Core};

use super::matrix::{Matrix, MATRIX_SIZE};

const LIGHT_HASH_DOMAIN: &[u8] = b"ProofOfWorkHash";
const HEAVY_HASH_DOMAIN: &[u8] = b"HeavyHash";

/// Length of the block fed to the light hash.
pub const POW_BLOCK_LEN: usize = 80;

fn cshake256(domain: &[u8], data: &[u8]) -> [u8; 32] {
    let mut hasher = CShake256::from_core(CShake256Core::new(domain));
    hasher.update(data);
    let mut out = [0u8; 32];
    hasher.finalize_xof().read(&mut out);
    out
}

/// Assemble the light-hash input for one nonce.
///
/// Layout: preimage(32) | timestamp(8, LE) | zeros(32) | nonce(8, LE).
pub fn pow_block(pre_pow_hash: &[u8; 32], timestamp: u64, nonce: u64) -> [u8; POW_BLOCK_LEN] {
    let mut block = [0u8; POW_BLOCK_LEN];
    block[..32].copy_from_slice(pre_pow_hash);
    block[32..40].copy_from_slice(&timestamp.to_le_bytes());
    block[72..80].copy_from_slice(&nonce.to_le_bytes());
    block
}

/// First sponge call over the assembled block.
pub fn light_hash(block: &[u8; POW_BLOCK_LEN]) -> [u8; 32] {
    cshake256(LIGHT_HASH_DOMAIN, block)
}

/// Matrix step and second sponge call.
///
/// Returns the heavy hash in its native (little-endian) byte order.
pub fn heavy_hash(matrix: &Matrix, light: &[u8; 32]) -> [u8; 32] {
    let mut vector = [0u16; MATRIX_SIZE];
    for (i, byte) in light.iter().enumerate() {
        vector[2 * i] = u16::from(byte >> 4);
        vector[2 * i + 1] = u16::from(byte & 0x0f);
    }

    let product = matrix.mul_shifted(&vector);

    let mut xored = [0u8; 32];
    for (i, out) in xored.iter_mut().enumerate() {
        let packed = ((product[2 * i] << 4) | product[2 * i + 1]) as u8;
        *out = light[i] ^ packed;
    }

    cshake256(HEAVY_HASH_DOMAIN, &xored)
}

/// Evaluate the full proof of work for one nonce.
///
/// The result is the heavy hash with its bytes reversed, i.e. the big-endian
/// representation of the value compared against the target.
pub fn calculate_pow(pre_pow_hash: &[u8; 32], matrix: &Matrix, timestamp: u64, nonce: u64) -> [u8; 32] {
    let light = light_hash(&pow_block(pre_pow_hash, timestamp, nonce));
    let mut hash = heavy_hash(matrix, &light);
    hash.reverse();
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRE_POW_HASH: &str = "1f3cfff8bac670f7ddac03702c3dec9abf9e26a43c940f5fbd76ec7dab63ed56";
    const TIMESTAMP: u64 = 1_700_000_000_000;

    fn pre_pow_hash() -> [u8; 32] {
        hex::decode(PRE_POW_HASH).unwrap().try_into().unwrap()
    }

    #[test]
    fn test_cshake_matches_published_sample() {
        // cSHAKE256 sample with customization "Email Signature" over 00 01 02 03
        let mut hasher = CShake256::from_core(CShake256Core::new(b"Email Signature"));
        hasher.update(&[0, 1, 2, 3]);
        let mut out = [0u8; 64];
        hasher.finalize_xof().read(&mut out);
        assert_eq!(
            hex::encode(out),
            "d008828e2b80ac9d2218ffee1d070c48b8e4c87bff32c9699d5b6896eee0edd1\
             64020e2be0560858d9c00c037e34a96937c561a74c412bb4c746469527281c8c"
        );
    }

    #[test]
    fn test_pow_block_layout() {
        let block = pow_block(&[0xaa; 32], 0x0102030405060708, 0x1112131415161718);
        assert_eq!(block.len(), 80);
        assert_eq!(&block[..32], &[0xaa; 32]);
        assert_eq!(&block[32..40], &[8, 7, 6, 5, 4, 3, 2, 1]);
        assert_eq!(&block[40..72], &[0u8; 32]);
        assert_eq!(&block[72..80], &[0x18, 0x17, 0x16, 0x15, 0x14, 0x13, 0x12, 0x11]);
    }

    #[test]
    fn test_calculate_pow_reference() {
        let pre = pre_pow_hash();
        let matrix = Matrix::generate(&pre);

        let hash = calculate_pow(&pre, &matrix, TIMESTAMP, 0x0123456789abcdef);
        assert_eq!(
            hex::encode(hash),
            "720eed5755c3c8a7bf0a85847ccd65965b4e7d3b0587d42e4347d0fe1aea76ac"
        );

        let hash = calculate_pow(&pre, &matrix, TIMESTAMP, 0);
        assert_eq!(
            hex::encode(hash),
            "424b59659024adc1cc6f08c961b839485468b458266d7b9041e6621f9a2821d1"
        );
    }

    #[test]
    fn test_nonce_changes_output() {
        let pre = pre_pow_hash();
        let matrix = Matrix::generate(&pre);
        let a = calculate_pow(&pre, &matrix, TIMESTAMP, 1);
        let b = calculate_pow(&pre, &matrix, TIMESTAMP, 2);
        assert_ne!(a, b);
    }
}
