#![forbid(unsafe_code)]

//! # axiom-harness
//!
//! Composable pairwise preference axioms and KwikSort reranking.
//!
//! An axiom answers one question: given an input, is output A better than
//! output B? Positive means yes, negative means no, zero abstains. Axioms
//! combine algebraically (sums, products, conjunction, fallback cascades,
//! votes, normalization, precondition gates, caching, parallel evaluation)
//! into trees that are themselves axioms, and any tree can rerank a list of
//! outputs with KwikSort.
//!
//! ```
//! use axiom_harness::axioms::{GreaterThan, LessThan};
//! use axiom_harness::{into_dyn, AxiomExt, Compose, DynAxiom, RerankOptions};
//!
//! let gt: DynAxiom<(), u32> = into_dyn(GreaterThan);
//! let lt: DynAxiom<(), u32> = into_dyn(LessThan);
//! let axiom = gt.scaled(2.0).plus(lt).normalize();
//! let ranked = axiom.rerank(&(), &[3, 1, 2], &RerankOptions::default()).unwrap();
//! assert_eq!(ranked, vec![3, 2, 1]);
//! ```

pub mod axiom;
pub mod axioms;
pub mod cache;
pub mod combinators;
pub mod config;
pub mod consistency;
pub mod error;
pub mod estimator;
pub mod index;
pub mod model;
pub mod pivot;
pub mod precondition;
pub mod preference;
pub mod rerank;
pub mod text;

pub use axiom::{into_dyn, Axiom, AxiomExt, Compose, Composition, DynAxiom};
pub use cache::{
    CacheError, InMemoryPreferenceStore, PreferenceCacheKey, PreferenceStore, SqlitePreferenceStore,
};
pub use config::{Bm25Params, ConfigError, HarnessConfig};
pub use error::AxiomError;
pub use estimator::{Estimator, EstimatorAxiom, EstimatorError};
pub use pivot::{PivotSelection, PivotSpec};
pub use precondition::{DynPrecondition, Precondition};
pub use preference::{Preference, PreferenceMatrix};
pub use rerank::{
    kwiksort, kwiksort_traced, ComparisonTrace, JsonlTraceSink, RerankOptions, TraceError,
    TraceSink, TraceWorker,
};
