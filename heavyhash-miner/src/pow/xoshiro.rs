//! Xoshiro256++ pseudo-random generator.
//!
//! Used twice with very different roles: seeded from a header digest it
//! drives matrix generation, which is consensus-critical and must match the
//! network bit for bit; seeded from OS entropy it supplies candidate nonces.

use rand::RngCore;

/// Xoshiro256++ state.
///
/// Iterating yields an endless stream of `u64`. The output is a pure function
/// of the seed and the number of draws so far.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Xoshiro256PlusPlus {
    s: [u64; 4],
}

impl Xoshiro256PlusPlus {
    /// Create a generator from four state words.
    pub fn new(state: [u64; 4]) -> Self {
        Self { s: state }
    }

    /// Create a generator from 32 bytes read as four little-endian words.
    pub fn from_le_bytes(bytes: &[u8; 32]) -> Self {
        let mut s = [0u64; 4];
        for (word, chunk) in s.iter_mut().zip(bytes.chunks_exact(8)) {
            let mut buf = [0u8; 8];
            buf.copy_from_slice(chunk);
            *word = u64::from_le_bytes(buf);
        }
        Self::new(s)
    }

    /// Create a generator seeded from 32 bytes of OS randomness.
    pub fn from_entropy() -> Self {
        let mut seed = [0u8; 32];
        rand::rngs::OsRng.fill_bytes(&mut seed);
        Self::from_le_bytes(&seed)
    }

    /// Draw the next word.
    pub fn next_u64(&mut self) -> u64 {
        let s = &mut self.s;
        let result = s[0].wrapping_add(s[3]).rotate_left(23).wrapping_add(s[0]);

        let t = s[1] << 17;

        s[2] ^= s[0];
        s[3] ^= s[1];
        s[1] ^= s[2];
        s[0] ^= s[3];

        s[2] ^= t;
        s[3] = s[3].rotate_left(45);

        result
    }
}

impl Iterator for Xoshiro256PlusPlus {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        Some(self.next_u64())
    }
}
