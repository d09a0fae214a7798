//! Injected randomness for tile spawning.

use rand::Rng;
use std::collections::VecDeque;

/// Probability that a spawned tile is a 2 rather than a 4.
pub const TWO_PROBABILITY: f64 = 0.9;

/// A tile placed by [`crate::rules::spawn_tile`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Spawn {
    /// Row of the new tile.
    pub row: usize,
    /// Column of the new tile.
    pub col: usize,
    /// Value of the new tile (2 or 4).
    pub value: u32,
}

/// Source of the two random choices made when a tile spawns.
///
/// The board rules never touch ambient random state: callers hand in a
/// `TileSource`, which lets tests script exact spawn sequences.
pub trait TileSource {
    /// Picks an index in `0..empty_count`. `empty_count` is never zero.
    fn pick_cell(&mut self, empty_count: usize) -> usize;

    /// Picks the value of the new tile, 2 or 4.
    fn pick_value(&mut self) -> u32;
}

impl<T: TileSource + ?Sized> TileSource for &mut T {
    fn pick_cell(&mut self, empty_count: usize) -> usize {
        (**self).pick_cell(empty_count)
    }

    fn pick_value(&mut self) -> u32 {
        (**self).pick_value()
    }
}

/// Uniform cell choice, 2 with probability 0.9 and 4 otherwise.
#[derive(Debug, Clone)]
pub struct RandomTiles<R> {
    rng: R,
}

impl<R: Rng> RandomTiles<R> {
    /// Wraps a random number generator.
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RandomTiles<rand::rngs::ThreadRng> {
    /// Uses the thread-local generator.
    pub fn thread() -> Self {
        Self::new(rand::thread_rng())
    }
}

impl<R: Rng> TileSource for RandomTiles<R> {
    fn pick_cell(&mut self, empty_count: usize) -> usize {
        self.rng.gen_range(0..empty_count)
    }

    fn pick_value(&mut self) -> u32 {
        if self.rng.gen_bool(TWO_PROBABILITY) { 2 } else { 4 }
    }
}

/// Deterministic spawn sequence of `(cell index, value)` pairs.
///
/// Cell indices are taken modulo the number of empty cells. Once the
/// script runs out every spawn lands on the first empty cell as a 2.
#[derive(Debug, Clone, Default)]
pub struct ScriptedTiles {
    script: VecDeque<(usize, u32)>,
    pending_value: Option<u32>,
}

impl ScriptedTiles {
    /// Creates a scripted source.
    pub fn new(script: impl IntoIterator<Item = (usize, u32)>) -> Self {
        Self {
            script: script.into_iter().collect(),
            pending_value: None,
        }
    }

    /// Number of scripted spawns not yet consumed.
    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl TileSource for ScriptedTiles {
    fn pick_cell(&mut self, empty_count: usize) -> usize {
        match self.script.pop_front() {
            Some((index, value)) => {
                self.pending_value = Some(value);
                index % empty_count
            }
            None => {
                self.pending_value = None;
                0
            }
        }
    }

    fn pick_value(&mut self) -> u32 {
        match self.pending_value.take() {
            Some(4) => 4,
            _ => 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_random_tiles_only_twos_and_fours() {
        let mut tiles = RandomTiles::new(StdRng::seed_from_u64(7));
        let mut fours = 0;
        for _ in 0..1_000 {
            let value = tiles.pick_value();
            assert!(value == 2 || value == 4);
            if value == 4 {
                fours += 1;
            }
        }
        // Expected around 100; wide bounds keep the seed-dependent count stable.
        assert!((40..200).contains(&fours), "fours = {fours}");
    }

    #[test]
    fn test_random_tiles_cell_in_range() {
        let mut tiles = RandomTiles::new(StdRng::seed_from_u64(1));
        for n in 1..=16 {
            assert!(tiles.pick_cell(n) < n);
        }
    }

    #[test]
    fn test_scripted_tiles_wraps_index() {
        let mut tiles = ScriptedTiles::new([(5, 4)]);
        assert_eq!(tiles.pick_cell(3), 2);
        assert_eq!(tiles.pick_value(), 4);
        assert_eq!(tiles.remaining(), 0);
        assert_eq!(tiles.pick_cell(3), 0);
        assert_eq!(tiles.pick_value(), 2);
    }
}
