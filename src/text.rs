//! Text collaborators used by leaf axioms.
//!
//! Combinators never touch text; only leaf axioms call through these
//! interfaces. The regex-based defaults can be replaced per [`TextToolkit`]
//! field at construction time.

use std::borrow::Cow;
use std::collections::HashSet;
use std::sync::Arc;

use fancy_regex::Regex as FancyRegex;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::index::IndexStatistics;

static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w+").expect("Invalid word regex"));

// Use fancy-regex for lookbehind support
static SENTENCE_SPLIT: Lazy<FancyRegex> =
    Lazy::new(|| FancyRegex::new(r"(?<=[.!?])\s+").expect("Invalid sentence split regex"));

/// Text accessor for inputs and outputs.
pub trait TextContents {
    fn contents(&self) -> Cow<'_, str>;
}

impl TextContents for String {
    fn contents(&self) -> Cow<'_, str> {
        Cow::Borrowed(self)
    }
}

impl TextContents for &str {
    fn contents(&self) -> Cow<'_, str> {
        Cow::Borrowed(self)
    }
}

pub trait TermTokenizer: Send + Sync {
    fn terms(&self, text: &str) -> Vec<String>;

    fn unique_terms(&self, text: &str) -> HashSet<String> {
        self.terms(text).into_iter().collect()
    }
}

pub trait SentenceTokenizer: Send + Sync {
    fn sentences(&self, text: &str) -> Vec<String>;
}

pub trait TermSimilarity: Send + Sync {
    fn similarity(&self, term1: &str, term2: &str) -> f64;
}

pub trait SentenceSimilarity: Send + Sync {
    fn similarity(&self, sentence1: &str, sentence2: &str) -> f64;
}

pub trait AspectExtractor: Send + Sync {
    fn aspects(&self, text: &str) -> HashSet<String>;
}

// =============================================================================
// Defaults
// =============================================================================

/// Lowercased `\w+` runs, minus stopwords.
#[derive(Debug, Clone, Default)]
pub struct WordTokenizer {
    stopwords: HashSet<String>,
}

impl WordTokenizer {
    pub fn with_stopwords<S: AsRef<str>>(stopwords: impl IntoIterator<Item = S>) -> Self {
        Self {
            stopwords: stopwords
                .into_iter()
                .map(|s| s.as_ref().to_lowercase())
                .collect(),
        }
    }
}

impl TermTokenizer for WordTokenizer {
    fn terms(&self, text: &str) -> Vec<String> {
        WORD.find_iter(text)
            .map(|m| m.as_str().to_lowercase())
            .filter(|term| !self.stopwords.contains(term))
            .collect()
    }
}

/// Splits after `.`, `!` or `?` followed by whitespace.
#[derive(Debug, Clone, Copy, Default)]
pub struct PunctuationSentenceTokenizer;

impl SentenceTokenizer for PunctuationSentenceTokenizer {
    fn sentences(&self, text: &str) -> Vec<String> {
        let mut result = Vec::new();
        let mut last_end = 0;

        let mut finder = SENTENCE_SPLIT.find_iter(text);
        while let Some(Ok(m)) = finder.next() {
            push_sentence(&mut result, &text[last_end..m.start()]);
            last_end = m.end();
        }
        push_sentence(&mut result, &text[last_end..]);

        result
    }
}

fn push_sentence(result: &mut Vec<String>, sentence: &str) {
    let sentence = sentence.trim();
    if !sentence.is_empty() {
        result.push(sentence.to_string());
    }
}

/// `1.0` for identical terms, `0.0` otherwise.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactTermSimilarity;

impl TermSimilarity for ExactTermSimilarity {
    fn similarity(&self, term1: &str, term2: &str) -> f64 {
        if term1 == term2 {
            1.0
        } else {
            0.0
        }
    }
}

/// Jaccard overlap of the sentences' term sets.
pub struct JaccardSentenceSimilarity {
    tokenizer: Arc<dyn TermTokenizer>,
}

impl JaccardSentenceSimilarity {
    pub fn new(tokenizer: Arc<dyn TermTokenizer>) -> Self {
        Self { tokenizer }
    }
}

impl SentenceSimilarity for JaccardSentenceSimilarity {
    fn similarity(&self, sentence1: &str, sentence2: &str) -> f64 {
        jaccard(
            &self.tokenizer.unique_terms(sentence1),
            &self.tokenizer.unique_terms(sentence2),
        )
    }
}

/// Aspects are the distinct terms of at least `min_length` characters.
pub struct TermAspectExtractor {
    tokenizer: Arc<dyn TermTokenizer>,
    min_length: usize,
}

impl TermAspectExtractor {
    pub fn new(tokenizer: Arc<dyn TermTokenizer>, min_length: usize) -> Self {
        Self {
            tokenizer,
            min_length,
        }
    }
}

impl AspectExtractor for TermAspectExtractor {
    fn aspects(&self, text: &str) -> HashSet<String> {
        self.tokenizer
            .unique_terms(text)
            .into_iter()
            .filter(|term| term.chars().count() >= self.min_length)
            .collect()
    }
}

/// `|a ∩ b| / |a ∪ b|`; NaN when both sets are empty.
pub fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return f64::NAN;
    }
    a.intersection(b).count() as f64 / union as f64
}

// =============================================================================
// Toolkit
// =============================================================================

/// Collaborators handed to leaf axioms at construction.
#[derive(Clone)]
pub struct TextToolkit {
    pub term_tokenizer: Arc<dyn TermTokenizer>,
    pub sentence_tokenizer: Arc<dyn SentenceTokenizer>,
    pub term_similarity: Arc<dyn TermSimilarity>,
    pub sentence_similarity: Arc<dyn SentenceSimilarity>,
    pub aspect_extractor: Arc<dyn AspectExtractor>,
    pub index: Option<Arc<dyn IndexStatistics>>,
    /// Relative margin for "approximately equal" comparisons.
    pub margin_fraction: f64,
}

impl Default for TextToolkit {
    fn default() -> Self {
        let term_tokenizer: Arc<dyn TermTokenizer> = Arc::new(WordTokenizer::default());
        Self {
            sentence_tokenizer: Arc::new(PunctuationSentenceTokenizer),
            term_similarity: Arc::new(ExactTermSimilarity),
            sentence_similarity: Arc::new(JaccardSentenceSimilarity::new(term_tokenizer.clone())),
            aspect_extractor: Arc::new(TermAspectExtractor::new(term_tokenizer.clone(), 4)),
            term_tokenizer,
            index: None,
            margin_fraction: crate::config::DEFAULT_MARGIN_FRACTION,
        }
    }
}

impl TextToolkit {
    pub fn with_index(mut self, index: Arc<dyn IndexStatistics>) -> Self {
        self.index = Some(index);
        self
    }

    pub fn with_margin_fraction(mut self, margin_fraction: f64) -> Self {
        self.margin_fraction = margin_fraction;
        self
    }

    pub fn terms<T: TextContents + ?Sized>(&self, entity: &T) -> Vec<String> {
        self.term_tokenizer.terms(&entity.contents())
    }

    pub fn unique_terms<T: TextContents + ?Sized>(&self, entity: &T) -> HashSet<String> {
        self.term_tokenizer.unique_terms(&entity.contents())
    }

    pub fn sentences<T: TextContents + ?Sized>(&self, entity: &T) -> Vec<String> {
        self.sentence_tokenizer.sentences(&entity.contents())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_tokenizer_lowercases_and_filters() {
        let tokenizer = WordTokenizer::with_stopwords(["the"]);
        assert_eq!(
            tokenizer.terms("The Quick, brown fox!"),
            vec!["quick", "brown", "fox"]
        );
    }

    #[test]
    fn test_sentence_splitting() {
        let sentences =
            PunctuationSentenceTokenizer.sentences("First one. Second one!  Third one? tail");
        assert_eq!(
            sentences,
            vec!["First one.", "Second one!", "Third one?", "tail"]
        );
    }

    #[test]
    fn test_empty_text_has_no_sentences() {
        assert!(PunctuationSentenceTokenizer.sentences("   ").is_empty());
    }

    #[test]
    fn test_jaccard() {
        let a: HashSet<String> = ["x", "y"].iter().map(|s| s.to_string()).collect();
        let b: HashSet<String> = ["y", "z"].iter().map(|s| s.to_string()).collect();
        assert!((jaccard(&a, &b) - 1.0 / 3.0).abs() < 1e-12);
        assert!(jaccard(&HashSet::new(), &HashSet::new()).is_nan());
    }
}
