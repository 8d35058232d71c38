//! Retrieval axioms over a query and candidate documents.
//!
//! Each axiom reduces every document to a small feature value once and then
//! compares features pairwise, so the batched matrix costs `n` tokenizations
//! instead of `n²`.

mod coverage;
mod proximity;
mod score;
mod term_frequency;

use std::collections::HashMap;

pub use coverage::{len_and, len_div, len_m_and, AllQueryTerms, Diversity, QueryTermCount};
pub use proximity::{Prox1, Prox2, Prox3};
pub use score::{OriginalScore, RetrievalScore, ScoreModel};
pub use term_frequency::{Lnc1, Reg, TfLnc, Tfc1, Tfc3};

use crate::error::AxiomError;
use crate::preference::Preference;
use crate::text::{TextContents, TextToolkit};

/// Distinct query terms in order of first appearance, with optional IDF.
pub(crate) struct QueryTerms {
    pub terms: Vec<String>,
    /// Query terms as written, duplicates included.
    pub sequence: Vec<String>,
    pub idf: Option<Vec<f64>>,
}

impl QueryTerms {
    pub fn new<I: TextContents + ?Sized>(toolkit: &TextToolkit, input: &I) -> Self {
        let sequence = toolkit.terms(input);
        let mut terms: Vec<String> = Vec::new();
        for term in &sequence {
            if !terms.contains(term) {
                terms.push(term.clone());
            }
        }
        let idf = toolkit.index.as_ref().map(|index| {
            terms
                .iter()
                .map(|term| index.inverse_document_frequency(term))
                .collect()
        });
        Self {
            terms,
            sequence,
            idf,
        }
    }

    pub fn require_idf(&self) -> Result<&[f64], AxiomError> {
        self.idf.as_deref().ok_or_else(|| {
            AxiomError::configuration("axiom requires index statistics in the text toolkit")
        })
    }
}

/// A document's term sequence and counts.
pub(crate) struct DocumentTerms {
    pub terms: Vec<String>,
    pub counts: HashMap<String, usize>,
}

impl DocumentTerms {
    pub fn new<O: TextContents + ?Sized>(toolkit: &TextToolkit, output: &O) -> Self {
        let terms = toolkit.terms(output);
        let mut counts = HashMap::new();
        for term in &terms {
            *counts.entry(term.clone()).or_insert(0) += 1;
        }
        Self { terms, counts }
    }

    pub fn len(&self) -> f64 {
        self.terms.len() as f64
    }

    pub fn count(&self, term: &str) -> usize {
        self.counts.get(term).copied().unwrap_or(0)
    }

    /// Counts of each query term, aligned with `query.terms`.
    pub fn query_counts(&self, query: &QueryTerms) -> Vec<f64> {
        query.terms.iter().map(|t| self.count(t) as f64).collect()
    }

    pub fn positions(&self, term: &str) -> Vec<usize> {
        self.terms
            .iter()
            .enumerate()
            .filter(|(_, t)| t.as_str() == term)
            .map(|(idx, _)| idx)
            .collect()
    }
}

/// Per-document feature extraction followed by a pairwise comparison.
pub(crate) trait TermFeature {
    type Features;

    fn features(
        &self,
        query: &QueryTerms,
        document: &DocumentTerms,
    ) -> Result<Self::Features, AxiomError>;

    fn compare(&self, query: &QueryTerms, f1: &Self::Features, f2: &Self::Features)
        -> Preference;
}

/// Implements [`crate::axiom::Axiom`] for a [`TermFeature`] holding a `toolkit` field.
macro_rules! term_feature_axiom {
    ($ty:ty, |$axiom:ident| $name:expr) => {
        impl<I, O> $crate::axiom::Axiom<I, O> for $ty
        where
            I: $crate::text::TextContents,
            O: $crate::text::TextContents,
        {
            fn preference(
                &self,
                input: &I,
                output1: &O,
                output2: &O,
            ) -> Result<$crate::preference::Preference, $crate::error::AxiomError> {
                use $crate::axioms::retrieval::{DocumentTerms, QueryTerms, TermFeature};
                let query = QueryTerms::new(&self.toolkit, input);
                let f1 = self.features(&query, &DocumentTerms::new(&self.toolkit, output1))?;
                let f2 = self.features(&query, &DocumentTerms::new(&self.toolkit, output2))?;
                Ok(self.compare(&query, &f1, &f2))
            }

            fn preferences(
                &self,
                input: &I,
                outputs: &[O],
            ) -> Result<$crate::preference::PreferenceMatrix, $crate::error::AxiomError> {
                use $crate::axioms::retrieval::{DocumentTerms, QueryTerms, TermFeature};
                let query = QueryTerms::new(&self.toolkit, input);
                let features = outputs
                    .iter()
                    .map(|output| self.features(&query, &DocumentTerms::new(&self.toolkit, output)))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok($crate::preference::PreferenceMatrix::from_fn(
                    outputs.len(),
                    |i, j| self.compare(&query, &features[i], &features[j]),
                ))
            }

            fn name(&self) -> String {
                let $axiom = self;
                ($name).to_string()
            }
        }
    };
    ($ty:ty, $name:expr) => {
        $crate::axioms::retrieval::term_feature_axiom!($ty, |_axiom| $name);
    };
}

pub(crate) use term_feature_axiom;

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use crate::axiom::Axiom;
    use crate::index::InMemoryIndex;
    use crate::model::{Document, Query};
    use crate::text::{TextToolkit, WordTokenizer};

    pub fn toolkit() -> Arc<TextToolkit> {
        Arc::new(TextToolkit::default())
    }

    pub fn toolkit_with_index(documents: &[Document]) -> Arc<TextToolkit> {
        let index = InMemoryIndex::build(&WordTokenizer::default(), documents);
        Arc::new(TextToolkit::default().with_index(Arc::new(index)))
    }

    pub fn docs(texts: &[&str]) -> Vec<Document> {
        texts
            .iter()
            .enumerate()
            .map(|(idx, text)| Document::new(format!("d{idx}"), *text))
            .collect()
    }

    /// Batched matrix must equal the pairwise expansion and be antisymmetric.
    pub fn assert_consistent<A: Axiom<Query, Document>>(axiom: &A, query: &Query, docs: &[Document]) {
        let matrix = axiom.preferences(query, docs).unwrap();
        for i in 0..docs.len() {
            for j in 0..docs.len() {
                let pairwise = axiom.preference(query, &docs[i], &docs[j]).unwrap();
                assert_eq!(matrix.get(i, j), pairwise, "entry ({i}, {j})");
                let reverse = axiom.preference(query, &docs[j], &docs[i]).unwrap();
                assert_eq!(pairwise, -reverse, "antisymmetry ({i}, {j})");
            }
        }
    }
}
