//! Shuffle order generation.
//!
//! The engine asks a [`Shuffler`] for a permutation of queue positions instead
//! of shuffling entries itself, so tests can pin the order with a seed or a
//! fixed permutation.

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Source of shuffle orders.
pub trait Shuffler: Send + Sync {
    /// A permutation of `0..len`.
    fn permute(&self, len: usize) -> Vec<usize>;
}

/// Uniform Fisher-Yates shuffles from a [`StdRng`].
pub struct RandomShuffler {
    rng: Mutex<StdRng>,
}

impl RandomShuffler {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Deterministic sequence of permutations for a given seed.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Default for RandomShuffler {
    fn default() -> Self {
        Self::new()
    }
}

impl Shuffler for RandomShuffler {
    fn permute(&self, len: usize) -> Vec<usize> {
        let mut order: Vec<usize> = (0..len).collect();
        order.shuffle(&mut *self.rng.lock());
        order
    }
}

impl std::fmt::Debug for RandomShuffler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RandomShuffler").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permutation_contains_every_index() {
        let shuffler = RandomShuffler::new();
        let mut order = shuffler.permute(50);
        order.sort_unstable();
        assert_eq!(order, (0..50).collect::<Vec<_>>());
        assert!(shuffler.permute(0).is_empty());
    }

    #[test]
    fn test_seeded_is_reproducible() {
        let a = RandomShuffler::seeded(7);
        let b = RandomShuffler::seeded(7);
        assert_eq!(a.permute(20), b.permute(20));
        assert_eq!(a.permute(20), b.permute(20));
    }
}
