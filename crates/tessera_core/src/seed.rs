use serde::{Deserialize, Serialize};

use crate::rng::SeededRandom;

/// Session seed from which every artifact's random stream is derived.
///
/// Each artifact kind gets its own sub-seed, so regenerating the terrain never
/// shifts the draws the floor plan sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorldSeed {
    pub value: u64,
}

/// Layer identifiers mixed into the session seed.
pub const LAYER_DUNGEON: u64 = 1;
pub const LAYER_TERRAIN: u64 = 2;
pub const LAYER_PLANT: u64 = 3;

impl WorldSeed {
    pub fn new(seed: u64) -> Self {
        Self { value: seed }
    }

    /// Boost-style hash combine, widened to 64 bits:
    /// `seed ^ (value + GOLDEN + (seed << 6) + (seed >> 2))`
    pub fn hash_combine(&self, value: u64) -> u64 {
        let seed = self.value;

        seed ^ (value
            .wrapping_add(0x9e37_79b9_7f4a_7c15)
            .wrapping_add(seed << 6)
            .wrapping_add(seed >> 2))
    }

    /// Combine this seed with a value to create a new derived seed
    pub fn combine(&self, value: u64) -> WorldSeed {
        WorldSeed::new(self.hash_combine(value))
    }

    /// Seed for one layer on one regeneration round.
    pub fn for_layer(&self, layer: u64, round: u64) -> WorldSeed {
        self.combine(layer).combine(round)
    }

    /// Random stream seeded from this value.
    pub fn rng(&self) -> SeededRandom {
        SeededRandom::new(self.value)
    }
}
