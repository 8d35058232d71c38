//! Precondition gating.

use crate::axiom::{Axiom, Composition, DynAxiom};
use crate::error::AxiomError;
use crate::precondition::DynPrecondition;
use crate::preference::{Preference, PreferenceMatrix};

/// Delegates to the wrapped axiom only for pairs that satisfy the precondition.
///
/// Pairwise, a failed precondition abstains with `0`. Batched, failing pairs
/// are marked not applicable in the returned matrix; when no pair passes, a
/// plain zero matrix is returned and the wrapped axiom is not consulted.
pub struct PreconditionAxiom<I, O> {
    axiom: DynAxiom<I, O>,
    precondition: DynPrecondition<I, O>,
}

impl<I, O> PreconditionAxiom<I, O> {
    pub fn new(axiom: DynAxiom<I, O>, precondition: DynPrecondition<I, O>) -> Self {
        Self {
            axiom,
            precondition,
        }
    }

    pub fn precondition(&self) -> &DynPrecondition<I, O> {
        &self.precondition
    }

    /// First wrapped axiom that is not itself precondition-gated.
    pub fn strip_preconditions(&self) -> DynAxiom<I, O> {
        strip_preconditions(&self.axiom)
    }
}

impl<I, O> Axiom<I, O> for PreconditionAxiom<I, O> {
    fn preference(&self, input: &I, output1: &O, output2: &O) -> Result<Preference, AxiomError> {
        if !self.precondition.precondition(input, output1, output2)? {
            return Ok(0.0);
        }
        self.axiom.preference(input, output1, output2)
    }

    fn preferences(&self, input: &I, outputs: &[O]) -> Result<PreferenceMatrix, AxiomError> {
        let n = outputs.len();
        let mask = self.precondition.preconditions(input, outputs)?;
        if mask.nrows() != n || mask.ncols() != n {
            return Err(AxiomError::configuration(format!(
                "precondition {} produced a {}x{} mask for {n} outputs",
                self.precondition.name(),
                mask.nrows(),
                mask.ncols()
            )));
        }
        if !mask.iter().any(|applicable| *applicable) {
            return Ok(PreferenceMatrix::zeros(n));
        }
        let matrix = self.axiom.preferences(input, outputs)?;
        matrix.ensure_len(n)?;
        Ok(matrix.with_mask(mask))
    }

    fn name(&self) -> String {
        format!("{}_{}", self.precondition.name(), self.axiom.name())
    }

    fn composition(&self) -> Composition<'_, I, O> {
        Composition::Gated {
            axiom: &self.axiom,
            precondition: &self.precondition,
        }
    }
}

/// Walk nested precondition wrappers inward and return the first ungated axiom.
pub fn strip_preconditions<I, O>(axiom: &DynAxiom<I, O>) -> DynAxiom<I, O> {
    let mut current = axiom.clone();
    loop {
        let next = match current.composition() {
            Composition::Gated { axiom, .. } => Some(axiom.clone()),
            _ => None,
        };
        match next {
            Some(inner) => current = inner,
            None => return current,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::axiom::Compose;
    use crate::axioms::GreaterThan;
    use crate::precondition::{FnPrecondition, Precondition};
    use crate::preference::MaskMatrix;

    fn both_even() -> DynPrecondition<(), u32> {
        Arc::new(FnPrecondition::new("EVEN", |_: &(), a: &u32, b: &u32| {
            a % 2 == 0 && b % 2 == 0
        }))
    }

    #[test]
    fn test_gate_abstains_when_precondition_fails() {
        let gated = (Arc::new(GreaterThan) as DynAxiom<(), u32>).gated(both_even());
        assert_eq!(gated.preference(&(), &4, &2).unwrap(), 1.0);
        assert_eq!(gated.preference(&(), &3, &2).unwrap(), 0.0);
    }

    #[test]
    fn test_batched_gate_masks_failing_pairs() {
        let gated = (Arc::new(GreaterThan) as DynAxiom<(), u32>).gated(both_even());
        let outputs = [4u32, 2, 3];
        let matrix = gated.preferences(&(), &outputs).unwrap();

        assert!(matrix.is_masked());
        assert_eq!(matrix.value(0, 1), Some(1.0));
        assert_eq!(matrix.value(0, 2), None);
        for i in 0..3 {
            for j in 0..3 {
                let pairwise = gated.preference(&(), &outputs[i], &outputs[j]).unwrap();
                assert_eq!(matrix.get(i, j), pairwise);
            }
        }
    }

    #[test]
    fn test_batched_gate_without_applicable_pairs_is_zero() {
        let gated = (Arc::new(GreaterThan) as DynAxiom<(), u32>).gated(both_even());
        let matrix = gated.preferences(&(), &[1, 3, 5]).unwrap();
        assert!(!matrix.is_masked());
        assert!(matrix.values().iter().all(|v| *v == 0.0));
    }

    /// Returns a mask one row and column too large.
    struct OversizedMask;

    impl Precondition<(), u32> for OversizedMask {
        fn precondition(&self, _: &(), _: &u32, _: &u32) -> Result<bool, AxiomError> {
            Ok(true)
        }

        fn preconditions(&self, _: &(), outputs: &[u32]) -> Result<MaskMatrix, AxiomError> {
            let n = outputs.len() + 1;
            Ok(MaskMatrix::from_element(n, n, true))
        }
    }

    #[test]
    fn test_mis_shaped_mask_is_a_configuration_error() {
        let gated = (Arc::new(GreaterThan) as DynAxiom<(), u32>).gated(Arc::new(OversizedMask));
        let err = gated.preferences(&(), &[1, 2]).unwrap_err();
        assert!(matches!(err, AxiomError::Configuration(_)));
        assert_eq!(gated.preference(&(), &2, &1).unwrap(), 1.0);
    }

    #[test]
    fn test_strip_preconditions_unwraps_nested_gates() {
        let base: DynAxiom<(), u32> = Arc::new(GreaterThan);
        let gated = base.clone().gated(both_even()).gated(both_even());
        let stripped = strip_preconditions(&gated);
        assert!(Arc::ptr_eq(&stripped, &base));
    }
}
