//! Axioms over generated texts answering a prompt.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::error::AxiomError;
use crate::preference::{approximately_equal, strictly_greater, strictly_less, Preference};
use crate::text::TextToolkit;

/// Per-output feature with a pairwise comparison; `aspects` are the prompt's.
trait GenerationFeature {
    type Features;

    fn features(&self, aspects: &HashSet<String>, text: &str) -> Self::Features;

    fn compare(&self, f1: &Self::Features, f2: &Self::Features) -> Preference;
}

macro_rules! generation_axiom {
    ($ty:ty, $name:expr) => {
        impl<I, O> crate::axiom::Axiom<I, O> for $ty
        where
            I: crate::text::TextContents,
            O: crate::text::TextContents,
        {
            fn preference(&self, input: &I, output1: &O, output2: &O) -> Result<Preference, AxiomError> {
                let aspects = self.toolkit.aspect_extractor.aspects(&input.contents());
                let f1 = self.features(&aspects, &output1.contents());
                let f2 = self.features(&aspects, &output2.contents());
                Ok(self.compare(&f1, &f2))
            }

            fn preferences(
                &self,
                input: &I,
                outputs: &[O],
            ) -> Result<crate::preference::PreferenceMatrix, AxiomError> {
                let aspects = self.toolkit.aspect_extractor.aspects(&input.contents());
                let features: Vec<_> = outputs
                    .iter()
                    .map(|output| self.features(&aspects, &output.contents()))
                    .collect();
                Ok(crate::preference::PreferenceMatrix::from_fn(outputs.len(), |i, j| {
                    self.compare(&features[i], &features[j])
                }))
            }

            fn name(&self) -> String {
                $name.to_string()
            }
        }
    };
}

/// Prefer the text covering more of the prompt's aspects.
pub struct AspectCoverage {
    toolkit: Arc<TextToolkit>,
}

impl AspectCoverage {
    pub fn new(toolkit: Arc<TextToolkit>) -> Self {
        Self { toolkit }
    }
}

fn covered(toolkit: &TextToolkit, aspects: &HashSet<String>, text: &str) -> usize {
    toolkit
        .aspect_extractor
        .aspects(text)
        .intersection(aspects)
        .count()
}

impl GenerationFeature for AspectCoverage {
    type Features = usize;

    fn features(&self, aspects: &HashSet<String>, text: &str) -> usize {
        covered(&self.toolkit, aspects, text)
    }

    fn compare(&self, f1: &usize, f2: &usize) -> Preference {
        strictly_greater(*f1 as f64, *f2 as f64)
    }
}

generation_axiom!(AspectCoverage, "ASPECT_COVERAGE");

/// Prefer the text that repeats aspects across fewer sentences.
///
/// Redundancy counts every mention of an aspect beyond its first sentence.
pub struct AspectRedundancy {
    toolkit: Arc<TextToolkit>,
}

impl AspectRedundancy {
    pub fn new(toolkit: Arc<TextToolkit>) -> Self {
        Self { toolkit }
    }
}

impl GenerationFeature for AspectRedundancy {
    type Features = usize;

    fn features(&self, _aspects: &HashSet<String>, text: &str) -> usize {
        let mut mentions: HashMap<String, usize> = HashMap::new();
        for sentence in self.toolkit.sentence_tokenizer.sentences(text) {
            for aspect in self.toolkit.aspect_extractor.aspects(&sentence) {
                *mentions.entry(aspect).or_insert(0) += 1;
            }
        }
        mentions.values().map(|count| count - 1).sum()
    }

    fn compare(&self, f1: &usize, f2: &usize) -> Preference {
        strictly_less(*f1 as f64, *f2 as f64)
    }
}

generation_axiom!(AspectRedundancy, "ASPECT_REDUNDANCY");

/// Prefer the text whose consecutive sentences are more similar.
///
/// Texts with fewer than two sentences have no coherence score and abstain.
pub struct SentenceCoherence {
    toolkit: Arc<TextToolkit>,
}

impl SentenceCoherence {
    pub fn new(toolkit: Arc<TextToolkit>) -> Self {
        Self { toolkit }
    }
}

impl GenerationFeature for SentenceCoherence {
    type Features = f64;

    fn features(&self, _aspects: &HashSet<String>, text: &str) -> f64 {
        let sentences = self.toolkit.sentence_tokenizer.sentences(text);
        if sentences.len() < 2 {
            return f64::NAN;
        }
        let similarity = &self.toolkit.sentence_similarity;
        let total: f64 = sentences
            .windows(2)
            .map(|pair| similarity.similarity(&pair[0], &pair[1]))
            .sum();
        total / (sentences.len() - 1) as f64
    }

    fn compare(&self, f1: &f64, f2: &f64) -> Preference {
        strictly_greater(*f1, *f2)
    }
}

generation_axiom!(SentenceCoherence, "SENTENCE_COHERENCE");

/// Prefer the shorter text among those covering about as many aspects.
pub struct Conciseness {
    toolkit: Arc<TextToolkit>,
}

impl Conciseness {
    pub fn new(toolkit: Arc<TextToolkit>) -> Self {
        Self { toolkit }
    }
}

impl GenerationFeature for Conciseness {
    type Features = (f64, f64);

    fn features(&self, aspects: &HashSet<String>, text: &str) -> (f64, f64) {
        let coverage = covered(&self.toolkit, aspects, text) as f64;
        let length = self.toolkit.term_tokenizer.terms(text).len() as f64;
        (coverage, length)
    }

    fn compare(&self, f1: &(f64, f64), f2: &(f64, f64)) -> Preference {
        if !approximately_equal(f1.0, f2.0, self.toolkit.margin_fraction) {
            return 0.0;
        }
        strictly_less(f1.1, f2.1)
    }
}

generation_axiom!(Conciseness, "CONCISENESS");

#[cfg(test)]
mod tests {
    use super::*;
    use crate::axiom::Axiom;
    use crate::model::{GeneratedText, GenerationInput};

    fn toolkit() -> Arc<TextToolkit> {
        Arc::new(TextToolkit::default())
    }

    fn texts(items: &[&str]) -> Vec<GeneratedText> {
        items
            .iter()
            .enumerate()
            .map(|(idx, text)| GeneratedText::new(format!("g{idx}"), *text))
            .collect()
    }

    fn assert_consistent<A: Axiom<GenerationInput, GeneratedText>>(
        axiom: &A,
        input: &GenerationInput,
        outputs: &[GeneratedText],
    ) {
        let matrix = axiom.preferences(input, outputs).unwrap();
        for i in 0..outputs.len() {
            for j in 0..outputs.len() {
                let pairwise = axiom.preference(input, &outputs[i], &outputs[j]).unwrap();
                assert_eq!(matrix.get(i, j), pairwise);
                assert_eq!(pairwise, -axiom.preference(input, &outputs[j], &outputs[i]).unwrap());
            }
        }
    }

    #[test]
    fn test_aspect_coverage() {
        let axiom = AspectCoverage::new(toolkit());
        let input = GenerationInput::new("p", "explain ownership and borrowing");
        let out = texts(&[
            "Ownership moves values. Borrowing lends them.",
            "Ownership moves values.",
        ]);
        assert_eq!(axiom.preference(&input, &out[0], &out[1]).unwrap(), 1.0);
        assert_consistent(&axiom, &input, &out);
    }

    #[test]
    fn test_aspect_redundancy() {
        let axiom = AspectRedundancy::new(toolkit());
        let input = GenerationInput::new("p", "ownership");
        let out = texts(&[
            "Ownership matters. Ownership again. Ownership forever.",
            "Ownership matters. Lifetimes differ.",
        ]);
        assert_eq!(axiom.preference(&input, &out[1], &out[0]).unwrap(), 1.0);
        assert_consistent(&axiom, &input, &out);
    }

    #[test]
    fn test_sentence_coherence_abstains_on_single_sentence() {
        let axiom = SentenceCoherence::new(toolkit());
        let input = GenerationInput::new("p", "anything");
        let out = texts(&[
            "Rust is safe. Rust is fast.",
            "Rust is safe. Bananas grow on trees.",
            "One sentence only.",
        ]);
        assert_eq!(axiom.preference(&input, &out[0], &out[1]).unwrap(), 1.0);
        assert_eq!(axiom.preference(&input, &out[0], &out[2]).unwrap(), 0.0);
        assert_consistent(&axiom, &input, &out);
    }

    #[test]
    fn test_conciseness() {
        let axiom = Conciseness::new(toolkit());
        let input = GenerationInput::new("p", "explain ownership");
        let out = texts(&[
            "Ownership moves values.",
            "Ownership, in short, moves values between bindings when assigned.",
            "Unrelated.",
        ]);
        assert_eq!(axiom.preference(&input, &out[0], &out[1]).unwrap(), 1.0);
        assert_eq!(axiom.preference(&input, &out[0], &out[2]).unwrap(), 0.0);
        assert_consistent(&axiom, &input, &out);
    }
}
