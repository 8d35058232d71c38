//! Logical combinators: conjunction, cascade (fallback) and voting.

use crate::axiom::{Axiom, Composition, DynAxiom};
use crate::error::AxiomError;
use crate::preference::{Preference, PreferenceMatrix};

use super::join_names;

/// Absolute majority.
pub const DEFAULT_MINIMUM_VOTES: f64 = 0.5;

/// `+1` when every child prefers the first output, `-1` when every child
/// prefers the second, `0` otherwise.
pub struct Conjunction<I, O> {
    axioms: Vec<DynAxiom<I, O>>,
}

impl<I, O> Conjunction<I, O> {
    pub fn new(axioms: Vec<DynAxiom<I, O>>) -> Self {
        Self { axioms }
    }
}

impl<I, O> Axiom<I, O> for Conjunction<I, O> {
    fn preference(&self, input: &I, output1: &O, output2: &O) -> Result<Preference, AxiomError> {
        if self.axioms.is_empty() {
            return Ok(0.0);
        }
        let mut all_positive = true;
        let mut all_negative = true;
        for axiom in &self.axioms {
            let preference = axiom.preference(input, output1, output2)?;
            all_positive &= preference > 0.0;
            all_negative &= preference < 0.0;
            if !all_positive && !all_negative {
                return Ok(0.0);
            }
        }
        Ok(if all_positive { 1.0 } else { -1.0 })
    }

    fn name(&self) -> String {
        join_names(&self.axioms, " & ")
    }

    fn composition(&self) -> Composition<'_, I, O> {
        Composition::Conjunction(&self.axioms)
    }
}

/// First non-zero child preference, in declaration order.
pub struct Cascade<I, O> {
    axioms: Vec<DynAxiom<I, O>>,
}

impl<I, O> Cascade<I, O> {
    pub fn new(axioms: Vec<DynAxiom<I, O>>) -> Self {
        Self { axioms }
    }
}

impl<I, O> Axiom<I, O> for Cascade<I, O> {
    fn preference(&self, input: &I, output1: &O, output2: &O) -> Result<Preference, AxiomError> {
        for axiom in &self.axioms {
            let preference = axiom.preference(input, output1, output2)?;
            if preference != 0.0 {
                return Ok(preference);
            }
        }
        Ok(0.0)
    }

    fn preferences(&self, input: &I, outputs: &[O]) -> Result<PreferenceMatrix, AxiomError> {
        let n = outputs.len();
        let mut result = PreferenceMatrix::zeros(n).into_values();
        let mut undecided = n * n;
        for axiom in &self.axioms {
            if undecided == 0 {
                break;
            }
            let matrix = axiom.preferences(input, outputs)?;
            matrix.ensure_len(n)?;
            for i in 0..n {
                for j in 0..n {
                    if result[(i, j)] == 0.0 && matrix.get(i, j) != 0.0 {
                        result[(i, j)] = matrix.get(i, j);
                        undecided -= 1;
                    }
                }
            }
        }
        PreferenceMatrix::from_values(result)
    }

    fn name(&self) -> String {
        join_names(&self.axioms, " | ")
    }

    fn composition(&self) -> Composition<'_, I, O> {
        Composition::Cascade(&self.axioms)
    }
}

/// Vote among children.
///
/// `minimum_votes` is the fraction of children that must agree: `0.5` is an
/// absolute majority, `1.0` consensus, `0.0` a plurality.
pub struct Vote<I, O> {
    axioms: Vec<DynAxiom<I, O>>,
    minimum_votes: f64,
}

impl<I, O> Vote<I, O> {
    pub fn new(axioms: Vec<DynAxiom<I, O>>, minimum_votes: f64) -> Result<Self, AxiomError> {
        if !(0.0..=1.0).contains(&minimum_votes) {
            return Err(AxiomError::configuration(format!(
                "minimum_votes must be within [0, 1], got {minimum_votes}"
            )));
        }
        Ok(Self {
            axioms,
            minimum_votes,
        })
    }

    pub fn majority(axioms: Vec<DynAxiom<I, O>>) -> Self {
        Self {
            axioms,
            minimum_votes: DEFAULT_MINIMUM_VOTES,
        }
    }

    pub fn minimum_votes(&self) -> f64 {
        self.minimum_votes
    }

    fn required_votes(&self) -> usize {
        (self.minimum_votes * self.axioms.len() as f64).ceil() as usize
    }

    fn decide(&self, positive: usize, negative: usize) -> Preference {
        let required = self.required_votes();
        if positive > negative && positive >= required {
            1.0
        } else if negative > positive && negative >= required {
            -1.0
        } else {
            0.0
        }
    }
}

impl<I, O> Axiom<I, O> for Vote<I, O> {
    fn preference(&self, input: &I, output1: &O, output2: &O) -> Result<Preference, AxiomError> {
        let mut positive = 0usize;
        let mut negative = 0usize;
        for axiom in &self.axioms {
            let preference = axiom.preference(input, output1, output2)?;
            if preference > 0.0 {
                positive += 1;
            } else if preference < 0.0 {
                negative += 1;
            }
        }
        Ok(self.decide(positive, negative))
    }

    fn preferences(&self, input: &I, outputs: &[O]) -> Result<PreferenceMatrix, AxiomError> {
        let n = outputs.len();
        let mut positive = vec![0usize; n * n];
        let mut negative = vec![0usize; n * n];
        for axiom in &self.axioms {
            let matrix = axiom.preferences(input, outputs)?;
            matrix.ensure_len(n)?;
            for i in 0..n {
                for j in 0..n {
                    let preference = matrix.get(i, j);
                    if preference > 0.0 {
                        positive[i * n + j] += 1;
                    } else if preference < 0.0 {
                        negative[i * n + j] += 1;
                    }
                }
            }
        }
        Ok(PreferenceMatrix::from_fn(n, |i, j| {
            self.decide(positive[i * n + j], negative[i * n + j])
        }))
    }

    fn name(&self) -> String {
        let joined = join_names(&self.axioms, " % ");
        if self.minimum_votes == DEFAULT_MINIMUM_VOTES {
            joined
        } else {
            format!("vote[{}]{}", self.minimum_votes, joined)
        }
    }

    fn composition(&self) -> Composition<'_, I, O> {
        Composition::Vote {
            axioms: &self.axioms,
            minimum_votes: self.minimum_votes,
        }
    }
}
