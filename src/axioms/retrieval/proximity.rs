//! Term proximity constraints.

use std::sync::Arc;

use crate::error::AxiomError;
use crate::preference::{strictly_less, Preference};
use crate::text::TextToolkit;

use super::{term_feature_axiom, DocumentTerms, QueryTerms, TermFeature};

/// PROX1: prefer documents where query-term pairs sit closer together.
///
/// The feature is the mean, over query-term pairs that both occur, of the
/// smallest positional gap between the two terms. Abstains when either
/// document has no such pair.
pub struct Prox1 {
    toolkit: Arc<TextToolkit>,
}

impl Prox1 {
    pub fn new(toolkit: Arc<TextToolkit>) -> Self {
        Self { toolkit }
    }
}

fn min_gap(a: &[usize], b: &[usize]) -> Option<usize> {
    a.iter()
        .flat_map(|x| b.iter().map(move |y| x.abs_diff(*y)))
        .min()
}

impl TermFeature for Prox1 {
    type Features = f64;

    fn features(&self, query: &QueryTerms, document: &DocumentTerms) -> Result<f64, AxiomError> {
        let positions: Vec<Vec<usize>> = query
            .terms
            .iter()
            .map(|term| document.positions(term))
            .collect();
        let mut total = 0usize;
        let mut pairs = 0usize;
        for i in 0..positions.len() {
            for j in (i + 1)..positions.len() {
                if let Some(gap) = min_gap(&positions[i], &positions[j]) {
                    total += gap;
                    pairs += 1;
                }
            }
        }
        if pairs == 0 {
            return Ok(f64::NAN);
        }
        Ok(total as f64 / pairs as f64)
    }

    fn compare(&self, _query: &QueryTerms, f1: &f64, f2: &f64) -> Preference {
        strictly_less(*f1, *f2)
    }
}

term_feature_axiom!(Prox1, "PROX1");

/// PROX2: prefer documents whose query terms first appear earlier.
///
/// A missing term counts as occurring at the end of the document.
pub struct Prox2 {
    toolkit: Arc<TextToolkit>,
}

impl Prox2 {
    pub fn new(toolkit: Arc<TextToolkit>) -> Self {
        Self { toolkit }
    }
}

impl TermFeature for Prox2 {
    type Features = f64;

    fn features(&self, query: &QueryTerms, document: &DocumentTerms) -> Result<f64, AxiomError> {
        let end = document.terms.len();
        Ok(query
            .terms
            .iter()
            .map(|term| {
                document
                    .terms
                    .iter()
                    .position(|t| t == term)
                    .unwrap_or(end) as f64
            })
            .sum())
    }

    fn compare(&self, _query: &QueryTerms, f1: &f64, f2: &f64) -> Preference {
        strictly_less(*f1, *f2)
    }
}

term_feature_axiom!(Prox2, "PROX2");

/// PROX3: prefer documents where the whole query occurs as a phrase earlier.
///
/// Documents without the phrase tie with each other and lose to any that
/// contain it.
pub struct Prox3 {
    toolkit: Arc<TextToolkit>,
}

impl Prox3 {
    pub fn new(toolkit: Arc<TextToolkit>) -> Self {
        Self { toolkit }
    }
}

impl TermFeature for Prox3 {
    type Features = f64;

    fn features(&self, query: &QueryTerms, document: &DocumentTerms) -> Result<f64, AxiomError> {
        let phrase = &query.sequence;
        if phrase.is_empty() {
            return Ok(f64::NAN);
        }
        Ok(document
            .terms
            .windows(phrase.len())
            .position(|window| window == phrase.as_slice())
            .map(|idx| idx as f64)
            .unwrap_or(f64::INFINITY))
    }

    fn compare(&self, _query: &QueryTerms, f1: &f64, f2: &f64) -> Preference {
        strictly_less(*f1, *f2)
    }
}

term_feature_axiom!(Prox3, "PROX3");
