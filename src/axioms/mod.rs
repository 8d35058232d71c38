//! Leaf axioms.
//!
//! Text-based axioms take an `Arc<TextToolkit>` at construction and read
//! inputs and outputs through [`crate::text::TextContents`].

pub mod basic;
pub mod generation;
pub mod retrieval;

pub use crate::combinators::UniformAxiom;
pub use basic::{GreaterThan, LessThan, OracleAxiom, RandomAxiom, RatingRecord};
pub use generation::{AspectCoverage, AspectRedundancy, Conciseness, SentenceCoherence};
pub use retrieval::{
    len_and, len_div, len_m_and, AllQueryTerms, Diversity, Lnc1, OriginalScore, Prox1, Prox2,
    Prox3, QueryTermCount, Reg, RetrievalScore, ScoreModel, TfLnc, Tfc1, Tfc3,
};
