//! Arithmetic combinators: sum, product, multiplicative inverse, constants.

use nalgebra::DMatrix;

use crate::axiom::{Axiom, Composition, DynAxiom};
use crate::error::AxiomError;
use crate::preference::{Preference, PreferenceMatrix};

use super::join_names;

/// Same preference for every pair. Used as a scalar factor (e.g. negation).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UniformAxiom {
    pub scalar: f64,
}

impl UniformAxiom {
    pub fn new(scalar: f64) -> Self {
        Self { scalar }
    }
}

impl<I, O> Axiom<I, O> for UniformAxiom {
    fn preference(&self, _input: &I, _output1: &O, _output2: &O) -> Result<Preference, AxiomError> {
        Ok(self.scalar)
    }

    fn preferences(&self, _input: &I, outputs: &[O]) -> Result<PreferenceMatrix, AxiomError> {
        Ok(PreferenceMatrix::from_fn(outputs.len(), |_, _| self.scalar))
    }

    fn name(&self) -> String {
        format!("{}", self.scalar)
    }

    fn composition(&self) -> Composition<'_, I, O> {
        Composition::Uniform(self.scalar)
    }
}

/// Sum of child preferences.
pub struct Sum<I, O> {
    axioms: Vec<DynAxiom<I, O>>,
}

impl<I, O> Sum<I, O> {
    pub fn new(axioms: Vec<DynAxiom<I, O>>) -> Self {
        Self { axioms }
    }

    pub fn axioms(&self) -> &[DynAxiom<I, O>] {
        &self.axioms
    }
}

impl<I, O> Axiom<I, O> for Sum<I, O> {
    fn preference(&self, input: &I, output1: &O, output2: &O) -> Result<Preference, AxiomError> {
        let mut total = 0.0;
        for axiom in &self.axioms {
            total += axiom.preference(input, output1, output2)?;
        }
        Ok(total)
    }

    fn preferences(&self, input: &I, outputs: &[O]) -> Result<PreferenceMatrix, AxiomError> {
        let n = outputs.len();
        let mut total = DMatrix::<f64>::zeros(n, n);
        for axiom in &self.axioms {
            let matrix = axiom.preferences(input, outputs)?;
            matrix.ensure_len(n)?;
            total += matrix.values();
        }
        PreferenceMatrix::from_values(total)
    }

    fn name(&self) -> String {
        join_names(&self.axioms, " + ")
    }

    fn composition(&self) -> Composition<'_, I, O> {
        Composition::Sum(&self.axioms)
    }
}

/// Product of child preferences.
pub struct Product<I, O> {
    axioms: Vec<DynAxiom<I, O>>,
}

impl<I, O> Product<I, O> {
    pub fn new(axioms: Vec<DynAxiom<I, O>>) -> Self {
        Self { axioms }
    }

    pub fn axioms(&self) -> &[DynAxiom<I, O>] {
        &self.axioms
    }
}

impl<I, O> Axiom<I, O> for Product<I, O> {
    fn preference(&self, input: &I, output1: &O, output2: &O) -> Result<Preference, AxiomError> {
        let mut total = 1.0;
        for axiom in &self.axioms {
            total *= axiom.preference(input, output1, output2)?;
        }
        Ok(total)
    }

    fn preferences(&self, input: &I, outputs: &[O]) -> Result<PreferenceMatrix, AxiomError> {
        let n = outputs.len();
        let mut total = DMatrix::from_element(n, n, 1.0);
        for axiom in &self.axioms {
            let matrix = axiom.preferences(input, outputs)?;
            matrix.ensure_len(n)?;
            total.component_mul_assign(matrix.values());
        }
        PreferenceMatrix::from_values(total)
    }

    fn name(&self) -> String {
        join_names(&self.axioms, " * ")
    }

    fn composition(&self) -> Composition<'_, I, O> {
        Composition::Product(&self.axioms)
    }
}

/// `1 / preference` of the wrapped axiom. A zero preference yields an infinity.
pub struct Inverse<I, O> {
    axiom: DynAxiom<I, O>,
}

impl<I, O> Inverse<I, O> {
    pub fn new(axiom: DynAxiom<I, O>) -> Self {
        Self { axiom }
    }
}

impl<I, O> Axiom<I, O> for Inverse<I, O> {
    fn preference(&self, input: &I, output1: &O, output2: &O) -> Result<Preference, AxiomError> {
        Ok(1.0 / self.axiom.preference(input, output1, output2)?)
    }

    fn preferences(&self, input: &I, outputs: &[O]) -> Result<PreferenceMatrix, AxiomError> {
        let matrix = self.axiom.preferences(input, outputs)?;
        PreferenceMatrix::from_values(matrix.values().map(|v| 1.0 / v))
    }

    fn name(&self) -> String {
        format!("1 / {}", self.axiom.name())
    }

    fn composition(&self) -> Composition<'_, I, O> {
        Composition::Inverse(&self.axiom)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::axiom::Compose;

    fn uniform(scalar: f64) -> DynAxiom<(), u32> {
        Arc::new(UniformAxiom::new(scalar))
    }

    #[test]
    fn test_sum_and_product_flatten() {
        let sum = uniform(1.0).plus(uniform(2.0)).plus(uniform(3.0));
        match sum.composition() {
            Composition::Sum(children) => assert_eq!(children.len(), 3),
            _ => panic!("expected sum"),
        }
        assert_eq!(sum.preference(&(), &1, &2).unwrap(), 6.0);

        let product = uniform(2.0).times(uniform(3.0)).times(uniform(4.0));
        match product.composition() {
            Composition::Product(children) => assert_eq!(children.len(), 3),
            _ => panic!("expected product"),
        }
        assert_eq!(product.preference(&(), &1, &2).unwrap(), 24.0);
    }

    #[test]
    fn test_divide_by_zero_is_infinite() {
        let quotient = uniform(1.0).divide(uniform(0.0));
        assert!(quotient.preference(&(), &1, &2).unwrap().is_infinite());
    }

    #[test]
    fn test_negate_and_minus() {
        assert_eq!(uniform(2.0).negate().preference(&(), &1, &2).unwrap(), -2.0);
        assert_eq!(
            uniform(5.0).minus(uniform(2.0)).preference(&(), &1, &2).unwrap(),
            3.0
        );
    }

    #[test]
    fn test_batched_sum_matches_pairwise() {
        let sum = uniform(1.5).plus(uniform(-0.5));
        let outputs = [1u32, 2, 3];
        let matrix = sum.preferences(&(), &outputs).unwrap();
        for i in 0..3 {
            for j in 0..3 {
                let pairwise = sum.preference(&(), &outputs[i], &outputs[j]).unwrap();
                assert_eq!(matrix.get(i, j), pairwise);
            }
        }
    }

    #[test]
    fn test_names_show_structure() {
        let sum = uniform(1.0).plus(uniform(2.0));
        assert_eq!(sum.name(), "(1 + 2)");
    }
}
