//! Injected sources of uniform random draws.

use rand::{Rng, RngCore};
use std::collections::VecDeque;

/// Supplies independent uniform draws in `[0, 1)`.
///
/// The engine consumes draws in a fixed per-cell order, so any deterministic
/// implementation reproduces a run exactly.
pub trait DrawSource {
    fn draw(&mut self) -> f64;
}

impl<D: DrawSource + ?Sized> DrawSource for &mut D {
    fn draw(&mut self) -> f64 {
        (**self).draw()
    }
}

impl<D: DrawSource + ?Sized> DrawSource for Box<D> {
    fn draw(&mut self) -> f64 {
        (**self).draw()
    }
}

/// Adapts any `rand` generator into a [`DrawSource`].
#[derive(Debug, Clone)]
pub struct RngDraws<R> {
    rng: R,
}

impl<R: RngCore> RngDraws<R> {
    #[must_use]
    pub const fn new(rng: R) -> Self {
        Self { rng }
    }

    /// Borrow the wrapped generator.
    pub fn rng_mut(&mut self) -> &mut R {
        &mut self.rng
    }

    #[must_use]
    pub fn into_inner(self) -> R {
        self.rng
    }
}

impl<R: RngCore> DrawSource for RngDraws<R> {
    #[inline]
    fn draw(&mut self) -> f64 {
        self.rng.random::<f64>()
    }
}

/// Replays a fixed sequence of draws, then repeats a fallback value.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptedDraws {
    queue: VecDeque<f64>,
    fallback: f64,
    consumed: usize,
}

impl ScriptedDraws {
    /// Scripted values followed by an endless stream of `fallback`.
    #[must_use]
    pub fn new(values: impl IntoIterator<Item = f64>, fallback: f64) -> Self {
        Self {
            queue: values.into_iter().collect(),
            fallback,
            consumed: 0,
        }
    }

    /// A source that only ever yields `value`.
    #[must_use]
    pub fn constant(value: f64) -> Self {
        Self::new(std::iter::empty(), value)
    }

    /// Total number of draws handed out so far.
    #[must_use]
    pub const fn consumed(&self) -> usize {
        self.consumed
    }

    /// Scripted values not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.queue.len()
    }
}

impl DrawSource for ScriptedDraws {
    fn draw(&mut self) -> f64 {
        self.consumed += 1;
        self.queue.pop_front().unwrap_or(self.fallback)
    }
}

/// Derives the seed of one cell's private stream for one generation.
///
/// Mixing is a splitmix64 finaliser over the combined inputs, so neighboring
/// cells and consecutive generations get uncorrelated streams.
#[must_use]
pub fn cell_stream_seed(seed: u64, generation: u64, index: usize) -> u64 {
    let mut z = seed
        .wrapping_add(generation.wrapping_mul(0x9E37_79B9_7F4A_7C15))
        .wrapping_add((index as u64).wrapping_mul(0xD1B5_4A32_D192_ED03));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::SmallRng};

    #[test]
    fn rng_draws_stay_in_unit_interval() {
        let mut draws = RngDraws::new(SmallRng::seed_from_u64(5));
        for _ in 0..1_000 {
            let value = draws.draw();
            assert!((0.0..1.0).contains(&value));
        }
    }

    #[test]
    fn seeded_rng_draws_are_reproducible() {
        let mut a = RngDraws::new(SmallRng::seed_from_u64(99));
        let mut b = RngDraws::new(SmallRng::seed_from_u64(99));
        let left: Vec<f64> = (0..16).map(|_| a.draw()).collect();
        let right: Vec<f64> = (0..16).map(|_| b.draw()).collect();
        assert_eq!(left, right);
    }

    #[test]
    fn scripted_draws_fall_back_after_script() {
        let mut draws = ScriptedDraws::new([0.1, 0.9], 0.5);
        assert_eq!(draws.remaining(), 2);
        assert_eq!(draws.draw(), 0.1);
        assert_eq!(draws.draw(), 0.9);
        assert_eq!(draws.draw(), 0.5);
        assert_eq!(draws.draw(), 0.5);
        assert_eq!(draws.consumed(), 4);
        assert_eq!(draws.remaining(), 0);
    }

    #[test]
    fn borrowed_sources_share_state() {
        fn first<D: DrawSource>(mut source: D) -> f64 {
            source.draw()
        }

        let mut draws = ScriptedDraws::new([0.25], 0.75);
        assert_eq!(first(&mut draws), 0.25);
        assert_eq!(draws.draw(), 0.75);
        assert_eq!(draws.consumed(), 2);
    }

    #[test]
    fn cell_stream_seeds_differ_by_every_input() {
        let base = cell_stream_seed(1, 0, 0);
        assert_eq!(base, cell_stream_seed(1, 0, 0));
        assert_ne!(base, cell_stream_seed(2, 0, 0));
        assert_ne!(base, cell_stream_seed(1, 1, 0));
        assert_ne!(base, cell_stream_seed(1, 0, 1));
        assert_ne!(cell_stream_seed(1, 1, 0), cell_stream_seed(1, 0, 1));
    }
}
