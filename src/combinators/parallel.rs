//! Fork-join evaluation of all-pairs preferences.

use nalgebra::DMatrix;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::warn;

use crate::axiom::{Axiom, Composition, DynAxiom};
use crate::error::AxiomError;
use crate::preference::{MaskMatrix, Preference, PreferenceMatrix};

/// Upper bound on worker threads per parallel axiom.
pub const MAX_PARALLELISM: usize = 64;

/// Evaluates the `n²` pairs of [`Axiom::preferences`] on a bounded worker pool.
///
/// Results are reassembled in output order, so the matrix equals the
/// sequential expansion. Single-pair calls run on the caller's thread.
pub struct ParallelAxiom<I, O> {
    axiom: DynAxiom<I, O>,
    parallelism: usize,
    pool: Option<ThreadPool>,
}

impl<I, O> ParallelAxiom<I, O> {
    /// `None` uses all available parallelism.
    pub fn new(axiom: DynAxiom<I, O>, parallelism: Option<usize>) -> Self {
        let parallelism = resolve_parallelism(parallelism);
        let pool = match ThreadPoolBuilder::new().num_threads(parallelism).build() {
            Ok(pool) => Some(pool),
            Err(err) => {
                warn!(error = %err, parallelism, "Failed to build worker pool; using the global pool");
                None
            }
        };
        Self {
            axiom,
            parallelism,
            pool,
        }
    }

    pub fn parallelism(&self) -> usize {
        self.parallelism
    }
}

pub(crate) fn resolve_parallelism(requested: Option<usize>) -> usize {
    let available = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    requested
        .unwrap_or(available)
        .clamp(1, MAX_PARALLELISM)
}

impl<I, O> Axiom<I, O> for ParallelAxiom<I, O>
where
    I: Sync,
    O: Sync,
{
    fn preference(&self, input: &I, output1: &O, output2: &O) -> Result<Preference, AxiomError> {
        self.axiom.preference(input, output1, output2)
    }

    fn preferences(&self, input: &I, outputs: &[O]) -> Result<PreferenceMatrix, AxiomError> {
        let n = outputs.len();
        // A gated child is unwrapped so each pair runs its precondition once.
        let (axiom, precondition) = match self.axiom.composition() {
            Composition::Gated { axiom, precondition } => (axiom.clone(), Some(precondition.clone())),
            _ => (self.axiom.clone(), None),
        };
        let evaluate = || {
            (0..n * n)
                .into_par_iter()
                .map(|k| -> Result<(Preference, bool), AxiomError> {
                    let (a, b) = (&outputs[k / n], &outputs[k % n]);
                    if let Some(precondition) = &precondition {
                        if !precondition.precondition(input, a, b)? {
                            return Ok((0.0, false));
                        }
                    }
                    Ok((axiom.preference(input, a, b)?, true))
                })
                .collect::<Result<Vec<(Preference, bool)>, AxiomError>>()
        };
        let pairs = match &self.pool {
            Some(pool) => pool.install(evaluate)?,
            None => evaluate()?,
        };
        let values: Vec<Preference> = pairs.iter().map(|(value, _)| *value).collect();
        let matrix = PreferenceMatrix::from_values(DMatrix::from_row_slice(n, n, &values))?;
        if precondition.is_none() || !pairs.iter().any(|(_, applicable)| *applicable) {
            return Ok(matrix);
        }
        let mask: Vec<bool> = pairs.iter().map(|(_, applicable)| *applicable).collect();
        Ok(matrix.with_mask(MaskMatrix::from_row_slice(n, n, &mask)))
    }

    fn name(&self) -> String {
        self.axiom.name()
    }

    fn composition(&self) -> Composition<'_, I, O> {
        Composition::Parallel(&self.axiom)
    }
}
