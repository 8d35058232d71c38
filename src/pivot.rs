//! Pivot selection strategies for KwikSort.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Chooses the partitioning element among `vertices`.
///
/// Returns an index into `vertices`; callers never pass an empty slice.
pub trait PivotSelection<I, O>: Send {
    fn select_pivot(&mut self, input: &I, vertices: &[&O]) -> usize;
}

/// Uniformly random pivot from a seeded generator.
#[derive(Debug, Clone)]
pub struct RandomPivotSelection {
    rng: StdRng,
}

impl RandomPivotSelection {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomPivotSelection {
    fn default() -> Self {
        Self::new(0)
    }
}

impl<I, O> PivotSelection<I, O> for RandomPivotSelection {
    fn select_pivot(&mut self, _input: &I, vertices: &[&O]) -> usize {
        self.rng.gen_range(0..vertices.len())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FirstPivotSelection;

impl<I, O> PivotSelection<I, O> for FirstPivotSelection {
    fn select_pivot(&mut self, _input: &I, _vertices: &[&O]) -> usize {
        0
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LastPivotSelection;

impl<I, O> PivotSelection<I, O> for LastPivotSelection {
    fn select_pivot(&mut self, _input: &I, vertices: &[&O]) -> usize {
        vertices.len().saturating_sub(1)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MiddlePivotSelection;

impl<I, O> PivotSelection<I, O> for MiddlePivotSelection {
    fn select_pivot(&mut self, _input: &I, vertices: &[&O]) -> usize {
        vertices.len() / 2
    }
}

/// Serializable choice of pivot strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PivotSpec {
    Random {
        #[serde(default)]
        seed: u64,
    },
    First,
    Last,
    Middle,
}

impl Default for PivotSpec {
    fn default() -> Self {
        Self::Random { seed: 0 }
    }
}

impl PivotSpec {
    pub fn build<I, O>(&self) -> Box<dyn PivotSelection<I, O>> {
        match *self {
            Self::Random { seed } => Box::new(RandomPivotSelection::new(seed)),
            Self::First => Box::new(FirstPivotSelection),
            Self::Last => Box::new(LastPivotSelection),
            Self::Middle => Box::new(MiddlePivotSelection),
        }
    }
}
