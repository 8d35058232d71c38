//! Term-frequency and length-normalization constraints.

use std::sync::Arc;

use crate::error::AxiomError;
use crate::preference::{approximately_equal, sign, strictly_greater, strictly_less, Preference};
use crate::text::TextToolkit;

use super::{term_feature_axiom, DocumentTerms, QueryTerms, TermFeature};

/// Document length plus per-query-term counts.
pub struct LengthAndCounts {
    length: f64,
    counts: Vec<f64>,
}

fn length_and_counts(query: &QueryTerms, document: &DocumentTerms) -> LengthAndCounts {
    LengthAndCounts {
        length: document.len(),
        counts: document.query_counts(query),
    }
}

/// TFC1: among documents of similar length, prefer more query-term occurrences.
pub struct Tfc1 {
    toolkit: Arc<TextToolkit>,
}

impl Tfc1 {
    pub fn new(toolkit: Arc<TextToolkit>) -> Self {
        Self { toolkit }
    }
}

impl TermFeature for Tfc1 {
    type Features = LengthAndCounts;

    fn features(&self, query: &QueryTerms, document: &DocumentTerms) -> Result<LengthAndCounts, AxiomError> {
        Ok(length_and_counts(query, document))
    }

    fn compare(&self, _query: &QueryTerms, f1: &LengthAndCounts, f2: &LengthAndCounts) -> Preference {
        let margin = self.toolkit.margin_fraction;
        if !approximately_equal(f1.length, f2.length, margin) {
            return 0.0;
        }
        let tf1: f64 = f1.counts.iter().sum();
        let tf2: f64 = f2.counts.iter().sum();
        if approximately_equal(tf1, tf2, margin) {
            return 0.0;
        }
        strictly_greater(tf1, tf2)
    }
}

term_feature_axiom!(Tfc1, "TFC1");

/// TFC3: for two query terms of similar discriminative power and equal
/// combined frequency, prefer the document containing both.
///
/// Without index statistics every pair of query terms is considered.
pub struct Tfc3 {
    toolkit: Arc<TextToolkit>,
}

impl Tfc3 {
    pub fn new(toolkit: Arc<TextToolkit>) -> Self {
        Self { toolkit }
    }

    fn comparable_terms(&self, query: &QueryTerms, i: usize, j: usize) -> bool {
        match &query.idf {
            Some(idf) => approximately_equal(idf[i], idf[j], self.toolkit.margin_fraction),
            None => true,
        }
    }
}

impl TermFeature for Tfc3 {
    type Features = LengthAndCounts;

    fn features(&self, query: &QueryTerms, document: &DocumentTerms) -> Result<LengthAndCounts, AxiomError> {
        Ok(length_and_counts(query, document))
    }

    fn compare(&self, query: &QueryTerms, f1: &LengthAndCounts, f2: &LengthAndCounts) -> Preference {
        if !approximately_equal(f1.length, f2.length, self.toolkit.margin_fraction) {
            return 0.0;
        }
        let mut score = 0.0;
        let n = query.terms.len();
        for i in 0..n {
            for j in (i + 1)..n {
                if !self.comparable_terms(query, i, j) {
                    continue;
                }
                if f1.counts[i] + f1.counts[j] != f2.counts[i] + f2.counts[j] {
                    continue;
                }
                let both1 = f1.counts[i] > 0.0 && f1.counts[j] > 0.0;
                let both2 = f2.counts[i] > 0.0 && f2.counts[j] > 0.0;
                score += strictly_greater(both1 as u8 as f64, both2 as u8 as f64);
            }
        }
        sign(score)
    }
}

term_feature_axiom!(Tfc3, "TFC3");

/// LNC1: when every query term occurs about equally often, prefer the shorter document.
pub struct Lnc1 {
    toolkit: Arc<TextToolkit>,
}

impl Lnc1 {
    pub fn new(toolkit: Arc<TextToolkit>) -> Self {
        Self { toolkit }
    }
}

impl TermFeature for Lnc1 {
    type Features = LengthAndCounts;

    fn features(&self, query: &QueryTerms, document: &DocumentTerms) -> Result<LengthAndCounts, AxiomError> {
        Ok(length_and_counts(query, document))
    }

    fn compare(&self, _query: &QueryTerms, f1: &LengthAndCounts, f2: &LengthAndCounts) -> Preference {
        let margin = self.toolkit.margin_fraction;
        let same_counts = f1
            .counts
            .iter()
            .zip(&f2.counts)
            .all(|(c1, c2)| approximately_equal(*c1, *c2, margin));
        if !same_counts {
            return 0.0;
        }
        strictly_less(f1.length, f2.length)
    }
}

term_feature_axiom!(Lnc1, "LNC1");

/// TF-LNC: per query term, if the documents are about equally long once that
/// term is removed, prefer the one with more occurrences of it.
pub struct TfLnc {
    toolkit: Arc<TextToolkit>,
}

impl TfLnc {
    pub fn new(toolkit: Arc<TextToolkit>) -> Self {
        Self { toolkit }
    }
}

impl TermFeature for TfLnc {
    type Features = LengthAndCounts;

    fn features(&self, query: &QueryTerms, document: &DocumentTerms) -> Result<LengthAndCounts, AxiomError> {
        Ok(length_and_counts(query, document))
    }

    fn compare(&self, _query: &QueryTerms, f1: &LengthAndCounts, f2: &LengthAndCounts) -> Preference {
        let margin = self.toolkit.margin_fraction;
        let mut score = 0.0;
        for (c1, c2) in f1.counts.iter().zip(&f2.counts) {
            let rest1 = f1.length - c1;
            let rest2 = f2.length - c2;
            if approximately_equal(rest1, rest2, margin) {
                score += strictly_greater(*c1, *c2);
            }
        }
        sign(score)
    }
}

term_feature_axiom!(TfLnc, "TF_LNC");

/// REG: prefer more occurrences of the query term most similar to the rest of
/// the query.
pub struct Reg {
    toolkit: Arc<TextToolkit>,
}

impl Reg {
    pub fn new(toolkit: Arc<TextToolkit>) -> Self {
        Self { toolkit }
    }

    /// Index of the query term with the highest summed similarity to the others.
    fn anchor_term(&self, query: &QueryTerms) -> Option<usize> {
        let similarity = &self.toolkit.term_similarity;
        let mut best: Option<(usize, f64)> = None;
        for (i, term) in query.terms.iter().enumerate() {
            let total: f64 = query
                .terms
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != i)
                .map(|(_, other)| similarity.similarity(term, other))
                .sum();
            match best {
                Some((_, score)) if score >= total => {}
                _ => best = Some((i, total)),
            }
        }
        best.map(|(idx, _)| idx)
    }
}

impl TermFeature for Reg {
    type Features = Option<f64>;

    fn features(&self, query: &QueryTerms, document: &DocumentTerms) -> Result<Option<f64>, AxiomError> {
        Ok(self
            .anchor_term(query)
            .map(|idx| document.count(&query.terms[idx]) as f64))
    }

    fn compare(&self, _query: &QueryTerms, f1: &Option<f64>, f2: &Option<f64>) -> Preference {
        match (f1, f2) {
            (Some(c1), Some(c2)) => strictly_greater(*c1, *c2),
            _ => 0.0,
        }
    }
}

term_feature_axiom!(Reg, "REG");
