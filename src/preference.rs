//! Pairwise preference values and all-pairs preference matrices.
//!
//! A preference is a signed real number: positive favours the first output,
//! negative favours the second, zero abstains. Only the sign is authoritative.

use nalgebra::DMatrix;

use crate::error::AxiomError;

/// Signed pairwise judgement.
pub type Preference = f64;

/// Boolean companion of a [`PreferenceMatrix`]; `true` marks an applicable pair.
pub type MaskMatrix = DMatrix<bool>;

/// All-pairs judgement matrix for `n` outputs.
///
/// Entry `(i, j)` holds `preference(input, outputs[i], outputs[j])`. Entries
/// whose precondition failed are "not applicable": they are stored as `0.0`
/// and reported as `None` by [`PreferenceMatrix::value`].
#[derive(Debug, Clone, PartialEq)]
pub struct PreferenceMatrix {
    values: DMatrix<f64>,
    applicable: Option<MaskMatrix>,
}

impl PreferenceMatrix {
    pub fn zeros(n: usize) -> Self {
        Self {
            values: DMatrix::zeros(n, n),
            applicable: None,
        }
    }

    pub fn from_fn(n: usize, mut f: impl FnMut(usize, usize) -> Preference) -> Self {
        Self {
            values: DMatrix::from_fn(n, n, |i, j| f(i, j)),
            applicable: None,
        }
    }

    /// Build a matrix from a fallible per-pair function, stopping at the first error.
    pub fn try_from_fn<E>(
        n: usize,
        mut f: impl FnMut(usize, usize) -> Result<Preference, E>,
    ) -> Result<Self, E> {
        let mut values = DMatrix::zeros(n, n);
        for i in 0..n {
            for j in 0..n {
                values[(i, j)] = f(i, j)?;
            }
        }
        Ok(Self {
            values,
            applicable: None,
        })
    }

    pub fn from_values(values: DMatrix<f64>) -> Result<Self, AxiomError> {
        if values.nrows() != values.ncols() {
            return Err(AxiomError::configuration(format!(
                "preference matrix must be square, got {}x{}",
                values.nrows(),
                values.ncols()
            )));
        }
        Ok(Self {
            values,
            applicable: None,
        })
    }

    /// Build an `n x n` matrix from per-output scores, comparing them with `compare`.
    pub fn from_scores(scores: &[f64], compare: impl Fn(f64, f64) -> Preference) -> Self {
        Self::from_fn(scores.len(), |i, j| compare(scores[i], scores[j]))
    }

    /// Number of outputs (rows).
    pub fn len(&self) -> usize {
        self.values.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Preference at `(i, j)`; not-applicable entries read as `0.0`.
    pub fn get(&self, i: usize, j: usize) -> Preference {
        self.values[(i, j)]
    }

    /// Preference at `(i, j)`, or `None` when the pair is not applicable.
    pub fn value(&self, i: usize, j: usize) -> Option<Preference> {
        self.is_applicable(i, j).then(|| self.values[(i, j)])
    }

    pub fn is_applicable(&self, i: usize, j: usize) -> bool {
        self.applicable.as_ref().map_or(true, |mask| mask[(i, j)])
    }

    pub fn is_masked(&self) -> bool {
        self.applicable.is_some()
    }

    pub fn mask(&self) -> Option<&MaskMatrix> {
        self.applicable.as_ref()
    }

    /// Values with not-applicable entries filled with zero.
    pub fn values(&self) -> &DMatrix<f64> {
        &self.values
    }

    pub fn into_values(self) -> DMatrix<f64> {
        self.values
    }

    /// Mark every pair where `applicable` is `false` as not applicable.
    ///
    /// Existing masks are intersected.
    pub fn with_mask(mut self, applicable: MaskMatrix) -> Self {
        let combined = match self.applicable.take() {
            Some(existing) => existing.zip_map(&applicable, |a, b| a && b),
            None => applicable,
        };
        for i in 0..self.len() {
            for j in 0..self.len() {
                if !combined[(i, j)] {
                    self.values[(i, j)] = 0.0;
                }
            }
        }
        self.applicable = Some(combined);
        self
    }

    /// Apply `f` to every applicable entry; the mask is preserved.
    pub fn map(&self, f: impl Fn(Preference) -> Preference) -> Self {
        let mut values = self.values.map(&f);
        if let Some(mask) = &self.applicable {
            values.zip_apply(mask, |v, ok| {
                if !ok {
                    *v = 0.0;
                }
            });
        }
        Self {
            values,
            applicable: self.applicable.clone(),
        }
    }

    /// Fail unless the matrix is `n x n`.
    pub fn ensure_len(&self, n: usize) -> Result<(), AxiomError> {
        if self.len() != n || self.values.ncols() != n {
            return Err(AxiomError::configuration(format!(
                "expected {n}x{n} preference matrix, got {}x{}",
                self.values.nrows(),
                self.values.ncols()
            )));
        }
        Ok(())
    }

    /// True when `M[i][j] == -M[j][i]` for all pairs, within `tolerance`.
    pub fn is_antisymmetric(&self, tolerance: f64) -> bool {
        let n = self.len();
        for i in 0..n {
            for j in i..n {
                let a = self.values[(i, j)];
                let b = self.values[(j, i)];
                if (a + b).abs() > tolerance {
                    return false;
                }
            }
        }
        true
    }

    /// Nested row layout, indexed in output order.
    pub fn to_rows(&self) -> Vec<Vec<Preference>> {
        (0..self.len())
            .map(|i| (0..self.len()).map(|j| self.values[(i, j)]).collect())
            .collect()
    }
}

/// `1` if `a > b`, `-1` if `a < b`, else `0` (also for NaN operands).
pub fn strictly_greater(a: f64, b: f64) -> Preference {
    if a > b {
        1.0
    } else if b > a {
        -1.0
    } else {
        0.0
    }
}

/// `1` if `a < b`, `-1` if `a > b`, else `0` (also for NaN operands).
pub fn strictly_less(a: f64, b: f64) -> Preference {
    strictly_greater(b, a)
}

/// Whether `a` and `b` lie within `margin_fraction` of the larger magnitude.
///
/// Returns `false` if either operand is NaN.
pub fn approximately_equal(a: f64, b: f64, margin_fraction: f64) -> bool {
    if a.is_nan() || b.is_nan() {
        return false;
    }
    let abs_max = a.abs().max(b.abs());
    if abs_max == 0.0 {
        return true;
    }
    let lower = abs_max * (1.0 - margin_fraction);
    let upper = abs_max * (1.0 + margin_fraction);
    [a, b]
        .iter()
        .all(|v| (lower..=upper).contains(&v.abs()))
}

/// Map a preference to `{-1, 0, 1}`.
pub fn sign(preference: Preference) -> Preference {
    if preference > 0.0 {
        1.0
    } else if preference < 0.0 {
        -1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strict_comparisons() {
        assert_eq!(strictly_greater(2.0, 1.0), 1.0);
        assert_eq!(strictly_greater(1.0, 2.0), -1.0);
        assert_eq!(strictly_greater(1.0, 1.0), 0.0);
        assert_eq!(strictly_less(1.0, 2.0), 1.0);
        assert_eq!(strictly_greater(f64::NAN, 1.0), 0.0);
    }

    #[test]
    fn test_approximately_equal() {
        assert!(approximately_equal(100.0, 95.0, 0.1));
        assert!(!approximately_equal(100.0, 80.0, 0.1));
        assert!(approximately_equal(0.0, 0.0, 0.1));
        assert!(!approximately_equal(f64::NAN, 1.0, 0.1));
        assert!(!approximately_equal(f64::NAN, f64::NAN, 0.1));
    }

    #[test]
    fn test_mask_zeroes_not_applicable_entries() {
        let matrix = PreferenceMatrix::from_fn(2, |i, j| if i == j { 0.0 } else { 3.0 });
        let mask = MaskMatrix::from_fn(2, 2, |i, j| !(i == 0 && j == 1));
        let masked = matrix.with_mask(mask);

        assert!(masked.is_masked());
        assert_eq!(masked.value(0, 1), None);
        assert_eq!(masked.get(0, 1), 0.0);
        assert_eq!(masked.value(1, 0), Some(3.0));

        let doubled = masked.map(|v| v * 2.0);
        assert_eq!(doubled.value(1, 0), Some(6.0));
        assert_eq!(doubled.get(0, 1), 0.0);
    }

    #[test]
    fn test_from_values_rejects_non_square() {
        assert!(PreferenceMatrix::from_values(DMatrix::zeros(2, 3)).is_err());
    }

    #[test]
    fn test_antisymmetry_check() {
        let scores = [3.0, 1.0, 2.0];
        let matrix = PreferenceMatrix::from_scores(&scores, strictly_greater);
        assert!(matrix.is_antisymmetric(0.0));
        assert_eq!(matrix.to_rows()[0], vec![0.0, 1.0, 1.0]);
    }
}
