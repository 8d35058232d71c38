//! Collection statistics for IDF-style retrieval axioms.

use std::collections::{HashMap, HashSet};

use crate::text::{TermTokenizer, TextContents};

pub trait IndexStatistics: Send + Sync {
    /// Number of documents containing `term`.
    fn document_frequency(&self, term: &str) -> u64;

    /// Occurrences of `term` across the collection. Backends without
    /// collection counts fall back to the document frequency, a lower bound.
    fn term_frequency(&self, term: &str) -> u64 {
        self.document_frequency(term)
    }

    fn document_count(&self) -> u64;

    /// Mean document length in terms; `0.0` for an empty collection.
    fn average_document_length(&self) -> f64;

    /// Smoothed inverse document frequency, `ln(1 + (N - df + 0.5) / (df + 0.5))`.
    fn inverse_document_frequency(&self, term: &str) -> f64 {
        let n = self.document_count() as f64;
        let df = self.document_frequency(term) as f64;
        (1.0 + (n - df + 0.5) / (df + 0.5)).ln()
    }
}

/// Statistics gathered from a small in-process collection.
#[derive(Debug, Clone, Default)]
pub struct InMemoryIndex {
    document_frequencies: HashMap<String, u64>,
    term_frequencies: HashMap<String, u64>,
    document_count: u64,
    total_length: u64,
}

impl InMemoryIndex {
    pub fn build<T: TextContents>(tokenizer: &dyn TermTokenizer, documents: &[T]) -> Self {
        let mut index = Self::default();
        for document in documents {
            index.add(tokenizer, document);
        }
        index
    }

    pub fn add<T: TextContents + ?Sized>(&mut self, tokenizer: &dyn TermTokenizer, document: &T) {
        let terms = tokenizer.terms(&document.contents());
        self.total_length += terms.len() as u64;
        self.document_count += 1;
        for term in &terms {
            *self.term_frequencies.entry(term.clone()).or_insert(0) += 1;
        }
        let unique: HashSet<String> = terms.into_iter().collect();
        for term in unique {
            *self.document_frequencies.entry(term).or_insert(0) += 1;
        }
    }
}

impl IndexStatistics for InMemoryIndex {
    fn document_frequency(&self, term: &str) -> u64 {
        self.document_frequencies.get(term).copied().unwrap_or(0)
    }

    fn term_frequency(&self, term: &str) -> u64 {
        self.term_frequencies.get(term).copied().unwrap_or(0)
    }

    fn document_count(&self) -> u64 {
        self.document_count
    }

    fn average_document_length(&self) -> f64 {
        if self.document_count == 0 {
            return 0.0;
        }
        self.total_length as f64 / self.document_count as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::WordTokenizer;

    #[test]
    fn test_statistics() {
        let docs = vec![
            "rust is fast".to_string(),
            "rust is safe and fast".to_string(),
            "python".to_string(),
        ];
        let index = InMemoryIndex::build(&WordTokenizer::default(), &docs);
        assert_eq!(index.document_count(), 3);
        assert_eq!(index.document_frequency("rust"), 2);
        assert_eq!(index.document_frequency("java"), 0);
        assert_eq!(index.term_frequency("fast"), 2);
        assert_eq!(index.term_frequency("java"), 0);
        assert!((index.average_document_length() - 3.0).abs() < 1e-12);
        assert!(index.inverse_document_frequency("python") > index.inverse_document_frequency("rust"));
    }

    #[test]
    fn test_term_frequency_counts_repeats() {
        let docs = vec!["rust rust rust".to_string(), "rust and c".to_string()];
        let index = InMemoryIndex::build(&WordTokenizer::default(), &docs);
        assert_eq!(index.document_frequency("rust"), 2);
        assert_eq!(index.term_frequency("rust"), 4);
    }

    #[test]
    fn test_term_frequency_defaults_to_document_frequency() {
        struct DocumentCounts;

        impl IndexStatistics for DocumentCounts {
            fn document_frequency(&self, _: &str) -> u64 {
                3
            }

            fn document_count(&self) -> u64 {
                10
            }

            fn average_document_length(&self) -> f64 {
                5.0
            }
        }

        assert_eq!(DocumentCounts.term_frequency("any"), 3);
    }
}
