// Deterministic, seedable pseudo-random number generator.
//
// A SplitMix64 stream (Steele, Lea & Flood, 2014). The game only needs a few
// random decisions per round (which shape a difficulty tier yields, and the
// bits for a fresh game id), so a single 64-bit state word is plenty. Each
// `GameArea` owns one `GameRng`; seeding it from a fixed value makes shape
// selection and game ids reproducible in tests.
//
// No external RNG crate and no OS entropy here. The relay binary picks the
// seed (from the clock or `--seed`) and hands it down.

use serde::{Deserialize, Serialize};

/// SplitMix64 generator. Cheap to clone; identical seeds yield identical
/// streams on every platform.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRng {
    state: u64,
}

impl GameRng {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Generate the next `u64` in the sequence.
    pub fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9e37_79b9_7f4a_7c15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
        z ^ (z >> 31)
    }

    /// Uniform integer in `[0, bound)`, without modulo bias.
    ///
    /// Panics if `bound == 0`.
    pub fn below(&mut self, bound: u64) -> u64 {
        assert!(bound > 0, "below: bound must be positive");
        if bound.is_power_of_two() {
            return self.next_u64() & (bound - 1);
        }
        // Reject the short tail of the u64 range that would favor low values.
        let threshold = bound.wrapping_neg() % bound;
        loop {
            let r = self.next_u64();
            if r >= threshold {
                return r % bound;
            }
        }
    }

    /// Pick one element uniformly. `None` for an empty slice.
    pub fn choose<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            return None;
        }
        let index = self.below(items.len() as u64) as usize;
        items.get(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_stream() {
        let mut a = GameRng::new(7);
        let mut b = GameRng::new(7);
        for _ in 0..500 {
            assert_eq!(a.next_u64(), b.next_u64());
        }
    }

    #[test]
    fn different_seeds_diverge() {
        let mut a = GameRng::new(7);
        let mut b = GameRng::new(8);
        assert_ne!(a.next_u64(), b.next_u64());
    }

    #[test]
    fn below_stays_in_bounds() {
        let mut rng = GameRng::new(99);
        for bound in [1u64, 2, 3, 7, 64, 1000] {
            for _ in 0..2_000 {
                assert!(rng.below(bound) < bound);
            }
        }
    }

    #[test]
    fn choose_empty_is_none() {
        let mut rng = GameRng::new(1);
        let empty: [u8; 0] = [];
        assert_eq!(rng.choose(&empty), None);
    }

    #[test]
    fn choose_reaches_every_element() {
        let mut rng = GameRng::new(2024);
        let items = ['a', 'b', 'c'];
        let mut seen = [false; 3];
        for _ in 0..300 {
            let picked = *rng.choose(&items).unwrap();
            seen[items.iter().position(|c| *c == picked).unwrap()] = true;
        }
        assert!(seen.iter().all(|s| *s), "every element should be picked");
    }
}
