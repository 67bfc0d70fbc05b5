//! 48-bit linear congruential generator.
//!
//! [`JavaRandom`] reproduces the classic `java.util.Random` sequence bit for
//! bit, which is what makes the generated reference dataset (and therefore
//! the known CDF values) reproducible. It also implements
//! [`rand::RngCore`] and [`rand::SeedableRng`], so it can drive any `rand`
//! distribution.
//!
//! ```rust
//! use cdfnet::JavaRandom;
//!
//! let mut rng = JavaRandom::new(0);
//! assert_eq!(rng.next_int(24), 0);
//! ```

use rand::{Error, RngCore, SeedableRng};

const MULTIPLIER: u64 = 0x5_DEEC_E66D;
const ADDEND: u64 = 0xB;
const MASK: u64 = (1 << 48) - 1;
const DOUBLE_UNIT: f64 = 1.0 / (1u64 << 53) as f64;

/// Seeded 48-bit LCG.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JavaRandom {
    seed: u64,
}

impl JavaRandom {
    /// Creates a generator from a 64-bit seed (the seed is scrambled first).
    pub fn new(seed: i64) -> Self {
        Self {
            seed: (seed as u64 ^ MULTIPLIER) & MASK,
        }
    }

    /// Advances the state and returns its top `bits` bits (`1..=32`).
    ///
    /// For `bits == 32` the result covers the whole `i32` range.
    #[inline]
    pub fn next_bits(&mut self, bits: u32) -> i32 {
        debug_assert!((1..=32).contains(&bits));
        self.seed = self.seed.wrapping_mul(MULTIPLIER).wrapping_add(ADDEND) & MASK;
        (self.seed >> (48 - bits)) as u32 as i32
    }

    /// Uniform `f64` in `[0, 1)` built from 53 random bits.
    #[inline]
    pub fn next_double(&mut self) -> f64 {
        let high = i64::from(self.next_bits(26)) << 27;
        let low = i64::from(self.next_bits(27));
        (high + low) as f64 * DOUBLE_UNIT
    }

    /// Uniform `i32` over its full range.
    #[inline]
    pub fn next_i32(&mut self) -> i32 {
        self.next_bits(32)
    }

    /// Uniform `i64` built from two 32-bit draws.
    #[inline]
    pub fn next_i64(&mut self) -> i64 {
        let high = i64::from(self.next_bits(32)) << 32;
        high.wrapping_add(i64::from(self.next_bits(32)))
    }

    /// Uniform integer in `[0, bound)`.
    ///
    /// Power-of-two bounds take the high bits of one draw; other bounds
    /// reject the draws that would bias the remainder.
    ///
    /// # Panics
    ///
    /// Panics if `bound <= 0`.
    pub fn next_int(&mut self, bound: i32) -> i32 {
        assert!(bound > 0, "bound must be positive, got {}", bound);

        let mut r = self.next_bits(31);
        let m = bound - 1;
        if bound & m == 0 {
            return ((i64::from(bound) * i64::from(r)) >> 31) as i32;
        }

        let mut u = r;
        loop {
            r = u % bound;
            // Overflow here marks a draw from the incomplete last bucket
            if u.wrapping_sub(r).wrapping_add(m) >= 0 {
                return r;
            }
            u = self.next_bits(31);
        }
    }
}

impl RngCore for JavaRandom {
    #[inline]
    fn next_u32(&mut self) -> u32 {
        self.next_i32() as u32
    }

    #[inline]
    fn next_u64(&mut self) -> u64 {
        self.next_i64() as u64
    }

    /// Fills `dest` four bytes per draw, least significant byte first.
    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(4) {
            let bytes = self.next_i32().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

impl SeedableRng for JavaRandom {
    type Seed = [u8; 8];

    /// Seeds from little-endian bytes of the `i64` seed.
    fn from_seed(seed: Self::Seed) -> Self {
        Self::new(i64::from_le_bytes(seed))
    }

    fn seed_from_u64(state: u64) -> Self {
        Self::new(state as i64)
    }
}
