use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;
use std::ops::RangeInclusive;

/// Source of every random decision a spin makes.
pub trait SlotPicker {
    /// Index in `[0, len)`. `len` is never zero.
    fn select_index(&mut self, len: usize) -> usize;

    /// Full rotations for the next spin, inclusive on both ends.
    fn spin_count(&mut self, range: RangeInclusive<u32>) -> u32;

    fn select(&mut self, list: &[String]) -> usize {
        debug_assert!(!list.is_empty(), "select called with an empty list");
        self.select_index(list.len())
    }
}

/// Uniform picker used in production.
///
/// Not cryptographically secure; a seed makes a whole session replayable.
#[derive(Debug, Clone)]
pub struct Selector {
    rng: StdRng,
}

impl Selector {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for Selector {
    fn default() -> Self {
        Self::new()
    }
}

impl SlotPicker for Selector {
    fn select_index(&mut self, len: usize) -> usize {
        self.rng.gen_range(0..len)
    }

    fn spin_count(&mut self, range: RangeInclusive<u32>) -> u32 {
        self.rng.gen_range(range)
    }
}

/// Plays back a fixed list of indices, for tests and demos.
///
/// Indices wrap modulo the list length; once the script runs out it keeps
/// picking slot 0. Spin counts always take the low end of the range.
#[derive(Debug, Clone, Default)]
pub struct ScriptedSelector {
    picks: VecDeque<usize>,
}

impl ScriptedSelector {
    pub fn new<I: IntoIterator<Item = usize>>(picks: I) -> Self {
        Self {
            picks: picks.into_iter().collect(),
        }
    }
}

impl SlotPicker for ScriptedSelector {
    fn select_index(&mut self, len: usize) -> usize {
        self.picks.pop_front().unwrap_or(0) % len
    }

    fn spin_count(&mut self, range: RangeInclusive<u32>) -> u32 {
        *range.start()
    }
}
