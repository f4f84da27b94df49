//! Seedable random source carried inside game states.
//!
//! Dice, fleet placement and AI jitter all draw from a [`GameRng`], so the same
//! seed replays the same game and a serialized state resumes the same sequence.

use rand::seq::{IndexedRandom, SliceRandom};
use rand::{Rng, RngCore, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};
use std::ops::Range;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRng {
    inner: Xoshiro256PlusPlus,
}

impl GameRng {
    /// Creates a generator from a 64-bit seed.
    pub fn new(seed: u64) -> Self {
        Self {
            inner: Xoshiro256PlusPlus::seed_from_u64(seed),
        }
    }

    /// Derives an independent generator, advancing this one.
    pub fn fork(&mut self) -> Self {
        Self::new(self.inner.next_u64())
    }

    pub fn next_u64(&mut self) -> u64 {
        self.inner.next_u64()
    }

    /// Uniform integer in `range`. `range` must be non-empty.
    pub fn gen_range(&mut self, range: Range<usize>) -> usize {
        self.inner.random_range(range)
    }

    /// Uniform float in `[lo, hi)`.
    pub fn gen_f64(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.inner.random::<f64>()
    }

    /// Rolls one six-sided die.
    pub fn roll_die(&mut self) -> u8 {
        self.inner.random_range(1..=6)
    }

    pub fn gen_bool(&mut self, p: f64) -> bool {
        self.inner.random_bool(p.clamp(0.0, 1.0))
    }

    pub fn choose<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        items.choose(&mut self.inner)
    }

    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        items.shuffle(&mut self.inner);
    }
}

impl Default for GameRng {
    fn default() -> Self {
        Self::new(0)
    }
}
