//! Query-term coverage and lower-bound constraints.

use std::collections::HashSet;
use std::sync::Arc;

use crate::axiom::DynAxiom;
use crate::combinators::PreconditionAxiom;
use crate::error::AxiomError;
use crate::precondition::LengthEqual;
use crate::preference::{strictly_greater, strictly_less, Preference};
use crate::text::{jaccard, TextContents, TextToolkit};

use super::{term_feature_axiom, DocumentTerms, QueryTerms, TermFeature};

/// AND: prefer the document that contains every query term.
pub struct AllQueryTerms {
    toolkit: Arc<TextToolkit>,
}

impl AllQueryTerms {
    pub fn new(toolkit: Arc<TextToolkit>) -> Self {
        Self { toolkit }
    }
}

impl TermFeature for AllQueryTerms {
    type Features = bool;

    fn features(&self, query: &QueryTerms, document: &DocumentTerms) -> Result<bool, AxiomError> {
        Ok(query.terms.iter().all(|term| document.count(term) > 0))
    }

    fn compare(&self, _query: &QueryTerms, f1: &bool, f2: &bool) -> Preference {
        strictly_greater(*f1 as u8 as f64, *f2 as u8 as f64)
    }
}

term_feature_axiom!(AllQueryTerms, "AND");

/// M-AND: prefer the document that contains more distinct query terms.
pub struct QueryTermCount {
    toolkit: Arc<TextToolkit>,
}

impl QueryTermCount {
    pub fn new(toolkit: Arc<TextToolkit>) -> Self {
        Self { toolkit }
    }
}

impl TermFeature for QueryTermCount {
    type Features = usize;

    fn features(&self, query: &QueryTerms, document: &DocumentTerms) -> Result<usize, AxiomError> {
        Ok(query
            .terms
            .iter()
            .filter(|term| document.count(term) > 0)
            .count())
    }

    fn compare(&self, _query: &QueryTerms, f1: &usize, f2: &usize) -> Preference {
        strictly_greater(*f1 as f64, *f2 as f64)
    }
}

term_feature_axiom!(QueryTermCount, "M_AND");

/// DIV: prefer the document whose vocabulary overlaps less with the query.
///
/// Abstains when either Jaccard coefficient is undefined.
pub struct Diversity {
    toolkit: Arc<TextToolkit>,
}

impl Diversity {
    pub fn new(toolkit: Arc<TextToolkit>) -> Self {
        Self { toolkit }
    }
}

impl TermFeature for Diversity {
    type Features = f64;

    fn features(&self, query: &QueryTerms, document: &DocumentTerms) -> Result<f64, AxiomError> {
        let query_terms: HashSet<String> = query.terms.iter().cloned().collect();
        let document_terms: HashSet<String> = document.counts.keys().cloned().collect();
        Ok(jaccard(&query_terms, &document_terms))
    }

    fn compare(&self, _query: &QueryTerms, f1: &f64, f2: &f64) -> Preference {
        strictly_less(*f1, *f2)
    }
}

term_feature_axiom!(Diversity, "DIV");

fn length_gated<I, O>(toolkit: &Arc<TextToolkit>, axiom: DynAxiom<I, O>) -> DynAxiom<I, O>
where
    I: 'static,
    O: TextContents + 'static,
{
    Arc::new(PreconditionAxiom::new(
        axiom,
        Arc::new(LengthEqual::from_toolkit(toolkit)),
    ))
}

/// LEN-AND: [`AllQueryTerms`] restricted to documents of similar length.
pub fn len_and<I, O>(toolkit: Arc<TextToolkit>) -> DynAxiom<I, O>
where
    I: TextContents + 'static,
    O: TextContents + 'static,
{
    length_gated(&toolkit, Arc::new(AllQueryTerms::new(toolkit.clone())))
}

/// LEN-M-AND: [`QueryTermCount`] restricted to documents of similar length.
pub fn len_m_and<I, O>(toolkit: Arc<TextToolkit>) -> DynAxiom<I, O>
where
    I: TextContents + 'static,
    O: TextContents + 'static,
{
    length_gated(&toolkit, Arc::new(QueryTermCount::new(toolkit.clone())))
}

/// LEN-DIV: [`Diversity`] restricted to documents of similar length.
pub fn len_div<I, O>(toolkit: Arc<TextToolkit>) -> DynAxiom<I, O>
where
    I: TextContents + 'static,
    O: TextContents + 'static,
{
    length_gated(&toolkit, Arc::new(Diversity::new(toolkit.clone())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::axiom::Axiom;
    use crate::axioms::retrieval::test_support::{assert_consistent, docs, toolkit};
    use crate::model::{Document, Query};

    #[test]
    fn test_and_prefers_full_coverage() {
        let axiom = AllQueryTerms::new(toolkit());
        let query = Query::new("q", "rust memory safety");
        let d = docs(&["rust gives memory safety", "rust is fast", "memory safety"]);
        assert_eq!(axiom.preference(&query, &d[0], &d[1]).unwrap(), 1.0);
        assert_eq!(axiom.preference(&query, &d[1], &d[2]).unwrap(), 0.0);
        assert_consistent(&axiom, &query, &d);
    }

    #[test]
    fn test_m_and_counts_distinct_terms() {
        let axiom = QueryTermCount::new(toolkit());
        let query = Query::new("q", "rust memory safety");
        let d = docs(&["rust rust rust", "memory safety"]);
        assert_eq!(axiom.preference(&query, &d[1], &d[0]).unwrap(), 1.0);
        assert_consistent(&axiom, &query, &d);
    }

    #[test]
    fn test_div_prefers_lower_overlap() {
        let axiom = Diversity::new(toolkit());
        let query = Query::new("q", "rust");
        let d = docs(&["rust", "rust and more words"]);
        assert_eq!(axiom.preference(&query, &d[1], &d[0]).unwrap(), 1.0);
        let empty = Document::new("e", "");
        assert_eq!(axiom.preference(&Query::new("q", ""), &empty, &d[0]).unwrap(), 0.0);
    }

    #[test]
    fn test_len_and_abstains_on_length_mismatch() {
        let axiom: DynAxiom<Query, Document> = len_and(toolkit());
        let query = Query::new("q", "rust safety");
        let d = docs(&[
            "rust safety",
            "rust only",
            "rust safety with a very long tail of extra words",
        ]);
        assert_eq!(axiom.name(), "LEN_AND");
        assert_eq!(axiom.preference(&query, &d[0], &d[1]).unwrap(), 1.0);
        assert_eq!(axiom.preference(&query, &d[1], &d[2]).unwrap(), 0.0);

        let matrix = axiom.preferences(&query, &d).unwrap();
        assert!(matrix.is_masked());
        assert!(!matrix.is_applicable(1, 2));
        assert_eq!(matrix.get(0, 1), 1.0);
    }
}
