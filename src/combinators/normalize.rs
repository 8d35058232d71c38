//! Sign normalization.

use crate::axiom::{Axiom, Composition, DynAxiom};
use crate::error::AxiomError;
use crate::preference::{sign, Preference, PreferenceMatrix};

/// Strips magnitude: positive ⇒ `1`, negative ⇒ `-1`, zero stays `0`.
pub struct Normalized<I, O> {
    axiom: DynAxiom<I, O>,
}

impl<I, O> Normalized<I, O> {
    pub fn new(axiom: DynAxiom<I, O>) -> Self {
        Self { axiom }
    }

    pub fn inner(&self) -> &DynAxiom<I, O> {
        &self.axiom
    }
}

impl<I, O> Axiom<I, O> for Normalized<I, O> {
    fn preference(&self, input: &I, output1: &O, output2: &O) -> Result<Preference, AxiomError> {
        Ok(sign(self.axiom.preference(input, output1, output2)?))
    }

    fn preferences(&self, input: &I, outputs: &[O]) -> Result<PreferenceMatrix, AxiomError> {
        Ok(self.axiom.preferences(input, outputs)?.map(sign))
    }

    fn name(&self) -> String {
        format!("+{}", self.axiom.name())
    }

    fn composition(&self) -> Composition<'_, I, O> {
        Composition::Normalized(&self.axiom)
    }
}
