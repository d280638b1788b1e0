// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! The 48-bit linear-congruential PRG.
//!
//! This is the classic `drand48` family generator: 48 bits of state
//! advanced as `X' = (a * X + c) mod 2^48` with `a = 0x5DEECE66D` and
//! `c = 0xB`, seeded from a three-word vector exactly as `seed48()` does,
//! producing the high 32 bits of each new state exactly as `mrand48()`
//! does. The seed file burned into external flash was generated against
//! this recurrence, so the constants are not negotiable.

/// The multiplier of the recurrence.
const A: u64 = 0x5DEE_CE66D;

/// The addend of the recurrence.
const C: u64 = 0xB;

/// The state mask; arithmetic is modulo 2^48.
const STATE_MASK: u64 = (1 << 48) - 1;

/// A 48-bit multiplicative PRG with the `drand48` recurrence.
#[derive(Clone, Debug)]
pub struct Rand48 {
    state: u64,
}

impl Rand48 {
    /// Seeds a generator from a three-word seed vector, low word first,
    /// with `seed48()` semantics.
    pub fn from_seed_vector(seed: [u16; 3]) -> Self {
        Self {
            state: seed[0] as u64
                | (seed[1] as u64) << 16
                | (seed[2] as u64) << 32,
        }
    }

    /// Advances the recurrence and returns the high 32 bits of the new
    /// state.
    ///
    /// `mrand48()` interprets these bits as a signed long; the sign is
    /// irrelevant here, since every consumer XORs the word into an
    /// entropy mix.
    pub fn next_u32(&mut self) -> u32 {
        self.state = A.wrapping_mul(self.state).wrapping_add(C) & STATE_MASK;
        (self.state >> 16) as u32
    }
}

#[cfg(test)]
mod test {
    use super::*;

    // Expected sequences computed with glibc's seed48()/mrand48().
    #[test]
    fn matches_drand48_null_seed() {
        let mut prg = Rand48::from_seed_vector([0x330e, 0, 0]);
        let expected = [
            0x2bbb62dc, 0xbff99381, 0x18abd015, 0xded6cf22, 0x93ca29a1,
            0xc92a23e5,
        ];
        for want in expected {
            assert_eq!(prg.next_u32(), want);
        }
    }

    #[test]
    fn matches_drand48_arbitrary_seed() {
        let mut prg = Rand48::from_seed_vector([0x1234, 0x5678, 0x9abc]);
        let expected = [
            0x495e916a, 0xef341fa3, 0x89067f2b, 0xe2a60d6f, 0x21c61f84,
            0x36cc3ce5,
        ];
        for want in expected {
            assert_eq!(prg.next_u32(), want);
        }
    }

    #[test]
    fn state_strictly_advances() {
        let mut prg = Rand48::from_seed_vector([1, 2, 3]);
        let a = prg.next_u32();
        let b = prg.next_u32();
        assert_ne!(a, b);
    }
}
