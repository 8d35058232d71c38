//! Inputs and outputs judged by the bundled leaf axioms.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::text::TextContents;

/// Stable identifier of an entity, used for rating lookups.
pub trait Identified {
    fn id(&self) -> &str;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    pub id: String,
    pub text: String,
}

impl Query {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub text: String,
}

impl Document {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }
}

/// A document as returned by a first-stage retriever.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedDocument {
    pub id: String,
    pub text: String,
    pub score: f64,
    /// 1-based position in the original ranking.
    pub rank: usize,
}

impl RankedDocument {
    pub fn new(id: impl Into<String>, text: impl Into<String>, score: f64, rank: usize) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            score,
            rank,
        }
    }

    /// Documents in their given order, ranked `1..=n` with descending scores `n..=1`.
    pub fn from_documents(documents: impl IntoIterator<Item = Document>) -> Vec<Self> {
        let documents: Vec<Document> = documents.into_iter().collect();
        let n = documents.len();
        documents
            .into_iter()
            .enumerate()
            .map(|(idx, doc)| Self::new(doc.id, doc.text, (n - idx) as f64, idx + 1))
            .collect()
    }
}

/// The prompt a generated answer responds to, with optional grounding passages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationInput {
    pub id: String,
    pub prompt: String,
    #[serde(default)]
    pub context: Vec<Document>,
}

impl GenerationInput {
    pub fn new(id: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            prompt: prompt.into(),
            context: Vec::new(),
        }
    }

    pub fn with_context(mut self, context: Vec<Document>) -> Self {
        self.context = context;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedText {
    pub id: String,
    pub text: String,
}

impl GeneratedText {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }
}

macro_rules! text_entity {
    ($ty:ty, $field:ident) => {
        impl TextContents for $ty {
            fn contents(&self) -> Cow<'_, str> {
                Cow::Borrowed(&self.$field)
            }
        }

        impl Identified for $ty {
            fn id(&self) -> &str {
                &self.id
            }
        }
    };
}

text_entity!(Query, text);
text_entity!(Document, text);
text_entity!(RankedDocument, text);
text_entity!(GenerationInput, prompt);
text_entity!(GeneratedText, text);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_documents_assigns_descending_scores() {
        let ranked = RankedDocument::from_documents(vec![
            Document::new("a", "x"),
            Document::new("b", "y"),
        ]);
        assert_eq!(ranked[0].rank, 1);
        assert_eq!(ranked[0].score, 2.0);
        assert_eq!(ranked[1].id(), "b");
        assert_eq!(ranked[1].score, 1.0);
    }

    #[test]
    fn test_generation_input_context_is_optional() {
        let input: GenerationInput =
            serde_json::from_str(r#"{"id":"g1","prompt":"why is the sky blue"}"#).unwrap();
        assert!(input.context.is_empty());
        assert_eq!(input.contents(), "why is the sky blue");
    }
}
