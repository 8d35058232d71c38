//! Trainable predictors behind the axiom contract.
//!
//! An [`EstimatorAxiom`] turns the preferences of a fixed list of feature
//! axioms into one feature row per ordered output pair and asks a fitted
//! [`Estimator`] for the preference. Training labels come from a target
//! axiom's preference matrix.

use nalgebra::linalg::Cholesky;
use nalgebra::{DMatrix, DVector};
use tracing::debug;

use crate::axiom::{Axiom, DynAxiom};
use crate::combinators::join_names;
use crate::error::AxiomError;
use crate::preference::{sign, Preference, PreferenceMatrix};

#[derive(Debug, thiserror::Error)]
pub enum EstimatorError {
    #[error("estimator has not been fitted")]
    NotFitted,
    #[error("no training rows")]
    EmptyTrainingSet,
    #[error("dimension mismatch: expected {expected} columns, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("normal equations are singular")]
    Singular,
}

/// Opaque fit/predict model.
///
/// Feature matrices have one row per sample and one column per feature.
pub trait Estimator: Send + Sync {
    /// Classifiers are trained on labels in `{-1, 0, 1}`.
    fn is_classifier(&self) -> bool {
        false
    }

    fn fit(&mut self, features: &DMatrix<f64>, labels: &DVector<f64>) -> Result<(), EstimatorError>;

    fn predict(&self, features: &DMatrix<f64>) -> Result<DVector<f64>, EstimatorError>;
}

// =============================================================================
// Linear models
// =============================================================================

/// Ridge regression without intercept, solved through the normal equations.
///
/// Without an intercept, antisymmetric features give antisymmetric predictions.
#[derive(Debug, Clone)]
pub struct RidgeRegression {
    lambda: f64,
    weights: Option<DVector<f64>>,
}

impl RidgeRegression {
    pub fn new(lambda: f64) -> Self {
        Self {
            lambda,
            weights: None,
        }
    }

    pub fn weights(&self) -> Option<&DVector<f64>> {
        self.weights.as_ref()
    }
}

impl Default for RidgeRegression {
    fn default() -> Self {
        Self::new(1e-3)
    }
}

impl Estimator for RidgeRegression {
    fn fit(&mut self, features: &DMatrix<f64>, labels: &DVector<f64>) -> Result<(), EstimatorError> {
        if features.nrows() == 0 {
            return Err(EstimatorError::EmptyTrainingSet);
        }
        if features.nrows() != labels.len() {
            return Err(EstimatorError::DimensionMismatch {
                expected: features.nrows(),
                actual: labels.len(),
            });
        }
        let k = features.ncols();
        let transposed = features.transpose();
        let mut gram = &transposed * features;
        for d in 0..k {
            gram[(d, d)] += self.lambda;
        }
        let rhs = &transposed * labels;
        let chol = Cholesky::new(gram).ok_or(EstimatorError::Singular)?;
        self.weights = Some(chol.solve(&rhs));
        Ok(())
    }

    fn predict(&self, features: &DMatrix<f64>) -> Result<DVector<f64>, EstimatorError> {
        let weights = self.weights.as_ref().ok_or(EstimatorError::NotFitted)?;
        if features.ncols() != weights.len() {
            return Err(EstimatorError::DimensionMismatch {
                expected: weights.len(),
                actual: features.ncols(),
            });
        }
        Ok(features * weights)
    }
}

/// Sign of a ridge fit on sign-normalized labels.
#[derive(Debug, Clone, Default)]
pub struct LinearClassifier {
    regression: RidgeRegression,
}

impl LinearClassifier {
    pub fn new(lambda: f64) -> Self {
        Self {
            regression: RidgeRegression::new(lambda),
        }
    }
}

impl Estimator for LinearClassifier {
    fn is_classifier(&self) -> bool {
        true
    }

    fn fit(&mut self, features: &DMatrix<f64>, labels: &DVector<f64>) -> Result<(), EstimatorError> {
        self.regression.fit(features, labels)
    }

    fn predict(&self, features: &DMatrix<f64>) -> Result<DVector<f64>, EstimatorError> {
        Ok(self.regression.predict(features)?.map(sign))
    }
}

// =============================================================================
// Adapter
// =============================================================================

pub struct EstimatorAxiom<I, O> {
    axioms: Vec<DynAxiom<I, O>>,
    estimator: Box<dyn Estimator>,
}

impl<I, O> EstimatorAxiom<I, O> {
    /// Fails when `axioms` is empty.
    pub fn new(axioms: Vec<DynAxiom<I, O>>, estimator: Box<dyn Estimator>) -> Result<Self, AxiomError> {
        if axioms.is_empty() {
            return Err(AxiomError::configuration(
                "estimator axiom needs at least one feature axiom",
            ));
        }
        Ok(Self { axioms, estimator })
    }

    pub fn feature_axioms(&self) -> &[DynAxiom<I, O>] {
        &self.axioms
    }

    /// One row per ordered pair `(i, j)` in row-major order, one column per feature axiom.
    pub fn features(&self, input: &I, outputs: &[O]) -> Result<DMatrix<f64>, AxiomError> {
        let n = outputs.len();
        let mut features = DMatrix::<f64>::zeros(n * n, self.axioms.len());
        for (column, axiom) in self.axioms.iter().enumerate() {
            let matrix = axiom.preferences(input, outputs)?;
            if matrix.len() != n {
                return Err(AxiomError::configuration(format!(
                    "feature axiom {} produced a {}x{} matrix for {n} outputs",
                    axiom.name(),
                    matrix.len(),
                    matrix.len()
                )));
            }
            for i in 0..n {
                for j in 0..n {
                    features[(i * n + j, column)] = matrix.get(i, j);
                }
            }
        }
        Ok(features)
    }

    fn labels(&self, target: &dyn Axiom<I, O>, input: &I, outputs: &[O]) -> Result<Vec<f64>, AxiomError> {
        let n = outputs.len();
        let matrix = target.preferences(input, outputs)?;
        matrix.ensure_len(n)?;
        let classifier = self.estimator.is_classifier();
        let mut labels = Vec::with_capacity(n * n);
        for i in 0..n {
            for j in 0..n {
                let label = matrix.get(i, j);
                labels.push(if classifier { sign(label) } else { label });
            }
        }
        Ok(labels)
    }

    /// Train on the target axiom's preferences over one batch of outputs.
    pub fn fit(&mut self, target: &dyn Axiom<I, O>, input: &I, outputs: &[O]) -> Result<(), AxiomError> {
        self.fit_many(target, [(input, outputs)])
    }

    /// Train on several `(input, outputs)` batches stacked into one training set.
    pub fn fit_many<'a>(
        &mut self,
        target: &dyn Axiom<I, O>,
        batches: impl IntoIterator<Item = (&'a I, &'a [O])>,
    ) -> Result<(), AxiomError>
    where
        I: 'a,
        O: 'a,
    {
        let k = self.axioms.len();
        let mut rows: Vec<f64> = Vec::new();
        let mut labels: Vec<f64> = Vec::new();
        for (input, outputs) in batches {
            let features = self.features(input, outputs)?;
            for r in 0..features.nrows() {
                rows.extend(features.row(r).iter().copied());
            }
            labels.extend(self.labels(target, input, outputs)?);
        }
        let samples = labels.len();
        let features = DMatrix::from_row_slice(samples, k, &rows);
        debug!(samples, features = k, "fitting estimator axiom");
        self.estimator.fit(&features, &DVector::from_vec(labels))?;
        Ok(())
    }
}

impl<I, O> Axiom<I, O> for EstimatorAxiom<I, O> {
    fn preference(&self, input: &I, output1: &O, output2: &O) -> Result<Preference, AxiomError> {
        let row = self
            .axioms
            .iter()
            .map(|axiom| axiom.preference(input, output1, output2))
            .collect::<Result<Vec<_>, _>>()?;
        let features = DMatrix::from_row_slice(1, row.len(), &row);
        let prediction = self.estimator.predict(&features)?;
        let value = prediction.as_slice().first().copied().ok_or(EstimatorError::DimensionMismatch {
            expected: 1,
            actual: prediction.len(),
        })?;
        Ok(value)
    }

    fn preferences(&self, input: &I, outputs: &[O]) -> Result<PreferenceMatrix, AxiomError> {
        let n = outputs.len();
        let features = self.features(input, outputs)?;
        let predictions = self.estimator.predict(&features)?;
        if predictions.len() != n * n {
            return Err(EstimatorError::DimensionMismatch {
                expected: n * n,
                actual: predictions.len(),
            }
            .into());
        }
        PreferenceMatrix::from_values(DMatrix::from_fn(n, n, |i, j| predictions[i * n + j]))
    }

    fn name(&self) -> String {
        format!("ESTIMATOR{}", join_names(&self.axioms, ", "))
    }
}
