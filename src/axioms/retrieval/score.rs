//! Retrieval-score axioms: prefer the document a scoring model rates higher.

use std::sync::Arc;

use crate::axiom::Axiom;
use crate::config::Bm25Params;
use crate::error::AxiomError;
use crate::model::RankedDocument;
use crate::preference::{strictly_greater, Preference, PreferenceMatrix};
use crate::text::TextToolkit;

use super::{term_feature_axiom, DocumentTerms, QueryTerms, TermFeature};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScoreModel {
    /// Summed raw query-term counts.
    Tf,
    TfIdf,
    Bm25(Bm25Params),
}

/// RS-TF, RS-TF-IDF and RS-BM25.
///
/// IDF-based models need index statistics in the toolkit; without them every
/// evaluation fails with a configuration error.
pub struct RetrievalScore {
    toolkit: Arc<TextToolkit>,
    model: ScoreModel,
}

impl RetrievalScore {
    pub fn new(toolkit: Arc<TextToolkit>, model: ScoreModel) -> Self {
        Self { toolkit, model }
    }

    pub fn tf(toolkit: Arc<TextToolkit>) -> Self {
        Self::new(toolkit, ScoreModel::Tf)
    }

    pub fn tf_idf(toolkit: Arc<TextToolkit>) -> Self {
        Self::new(toolkit, ScoreModel::TfIdf)
    }

    pub fn bm25(toolkit: Arc<TextToolkit>, params: Bm25Params) -> Self {
        Self::new(toolkit, ScoreModel::Bm25(params))
    }

    pub fn model(&self) -> ScoreModel {
        self.model
    }

    fn label(&self) -> &'static str {
        match self.model {
            ScoreModel::Tf => "RS_TF",
            ScoreModel::TfIdf => "RS_TF_IDF",
            ScoreModel::Bm25(_) => "RS_BM25",
        }
    }

    fn bm25_score(
        &self,
        params: Bm25Params,
        query: &QueryTerms,
        document: &DocumentTerms,
    ) -> Result<f64, AxiomError> {
        let idf = query.require_idf()?;
        let avg_len = self
            .toolkit
            .index
            .as_ref()
            .map(|index| index.average_document_length())
            .unwrap_or(0.0);
        let length_ratio = if avg_len > 0.0 {
            document.len() / avg_len
        } else {
            1.0
        };
        let norm = params.k1 * (1.0 - params.b + params.b * length_ratio);
        Ok(document
            .query_counts(query)
            .iter()
            .zip(idf)
            .map(|(tf, idf)| idf * tf * (params.k1 + 1.0) / (tf + norm))
            .sum())
    }
}

impl TermFeature for RetrievalScore {
    type Features = f64;

    fn features(&self, query: &QueryTerms, document: &DocumentTerms) -> Result<f64, AxiomError> {
        let counts = document.query_counts(query);
        match self.model {
            ScoreModel::Tf => Ok(counts.iter().sum()),
            ScoreModel::TfIdf => {
                let idf = query.require_idf()?;
                Ok(counts.iter().zip(idf).map(|(tf, idf)| tf * idf).sum())
            }
            ScoreModel::Bm25(params) => self.bm25_score(params, query, document),
        }
    }

    fn compare(&self, _query: &QueryTerms, f1: &f64, f2: &f64) -> Preference {
        strictly_greater(*f1, *f2)
    }
}

term_feature_axiom!(RetrievalScore, |axiom| axiom.label());

/// ORIG: prefer the document the first-stage retriever scored higher.
#[derive(Debug, Clone, Copy, Default)]
pub struct OriginalScore;

impl<I> Axiom<I, RankedDocument> for OriginalScore {
    fn preference(
        &self,
        _input: &I,
        output1: &RankedDocument,
        output2: &RankedDocument,
    ) -> Result<Preference, AxiomError> {
        Ok(strictly_greater(output1.score, output2.score))
    }

    fn preferences(&self, _input: &I, outputs: &[RankedDocument]) -> Result<PreferenceMatrix, AxiomError> {
        let scores: Vec<f64> = outputs.iter().map(|doc| doc.score).collect();
        Ok(PreferenceMatrix::from_scores(&scores, strictly_greater))
    }

    fn name(&self) -> String {
        "ORIG".to_string()
    }
}
