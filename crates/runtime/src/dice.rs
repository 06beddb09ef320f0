//! Random dice backed by `rand`.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use combat_core::Dice;

/// [`Dice`] drawing uniformly from a `rand` generator.
#[derive(Clone, Debug)]
pub struct RngDice<R> {
    rng: R,
}

impl<R: Rng> RngDice<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RngDice<StdRng> {
    /// Dice seeded from operating-system entropy.
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }

    /// Reproducible dice: the same seed always rolls the same sequence.
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> Dice for RngDice<R> {
    fn roll(&mut self, sides: u32) -> u32 {
        self.rng.gen_range(1..=sides.max(1))
    }
}
