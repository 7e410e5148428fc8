//! The 64×64 matrix of 4-bit coefficients used by the heavy hash.

use super::xoshiro::Xoshiro256PlusPlus;
use crate::tracing::prelude::*;

/// Matrix dimension.
pub const MATRIX_SIZE: usize = 64;

/// Words consumed from the generator per candidate matrix.
const WORDS_PER_MATRIX: usize = MATRIX_SIZE * MATRIX_SIZE / 16;

/// A full-rank 64×64 matrix of 4-bit values.
#[derive(Clone, PartialEq, Eq)]
pub struct Matrix([[u16; MATRIX_SIZE]; MATRIX_SIZE]);

impl Matrix {
    /// Generate the matrix for a header preimage digest.
    ///
    /// The digest seeds a dedicated generator as four little-endian words.
    /// Candidates are drawn from that generator until one has full rank.
    pub fn generate(pre_pow_hash: &[u8; 32]) -> Self {
        let mut rng = Xoshiro256PlusPlus::from_le_bytes(pre_pow_hash);
        Self::generate_from(|| rng.next_u64())
    }

    /// Draw candidate matrices from `next_word` until one has full rank.
    ///
    /// Rejected candidates are discarded; the next candidate continues from
    /// where the stream left off.
    pub fn generate_from(mut next_word: impl FnMut() -> u64) -> Self {
        let mut rejected = 0u32;
        loop {
            let candidate = Self::from_words(&mut next_word);
            if candidate.rank() == MATRIX_SIZE {
                if rejected > 0 {
                    trace!(rejected, "Regenerated rank-deficient matrix");
                }
                return candidate;
            }
            rejected += 1;
        }
    }

    /// Unpack 256 words into a candidate, 16 nibbles per word, low nibble first.
    fn from_words(next_word: &mut impl FnMut() -> u64) -> Self {
        let mut m = [[0u16; MATRIX_SIZE]; MATRIX_SIZE];
        for n in 0..WORDS_PER_MATRIX {
            let word = next_word();
            let row = n / 4;
            let col = (n % 4) * 16;
            for shift in 0..16 {
                m[row][col + shift] = ((word >> (4 * shift)) & 0x0f) as u16;
            }
        }
        Self(m)
    }

    /// Rank over the reals, by Gaussian elimination.
    pub fn rank(&self) -> usize {
        const EPS: f64 = 1e-9;

        let mut m = [[0f64; MATRIX_SIZE]; MATRIX_SIZE];
        for (dst, src) in m.iter_mut().zip(self.0.iter()) {
            for (d, s) in dst.iter_mut().zip(src.iter()) {
                *d = f64::from(*s);
            }
        }

        let mut rank = 0;
        let mut row_selected = [false; MATRIX_SIZE];
        for i in 0..MATRIX_SIZE {
            let pivot = (0..MATRIX_SIZE).find(|&j| !row_selected[j] && m[j][i].abs() > EPS);
            let Some(j) = pivot else {
                continue;
            };

            rank += 1;
            row_selected[j] = true;
            for p in (i + 1)..MATRIX_SIZE {
                m[j][p] /= m[j][i];
            }
            for k in 0..MATRIX_SIZE {
                if k != j && m[k][i].abs() > EPS {
                    for p in (i + 1)..MATRIX_SIZE {
                        m[k][p] -= m[j][p] * m[k][i];
                    }
                }
            }
        }
        rank
    }

    /// Multiply by a vector of 64 nibbles.
    ///
    /// Sums accumulate in wrapping 16-bit arithmetic and each result is
    /// shifted right by 10, leaving a 4-bit value per row.
    pub fn mul_shifted(&self, vector: &[u16; MATRIX_SIZE]) -> [u16; MATRIX_SIZE] {
        let mut product = [0u16; MATRIX_SIZE];
        for (out, row) in product.iter_mut().zip(self.0.iter()) {
            let sum = row
                .iter()
                .zip(vector.iter())
                .fold(0u16, |acc, (a, b)| acc.wrapping_add(a.wrapping_mul(*b)));
            *out = sum >> 10;
        }
        product
    }

    #[cfg(test)]
    fn get(&self, row: usize, col: usize) -> u16 {
        self.0[row][col]
    }
}

impl std::fmt::Debug for Matrix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Matrix")
            .field("first_row", &&self.0[0][..8])
            .finish_non_exhaustive()
    }
}
