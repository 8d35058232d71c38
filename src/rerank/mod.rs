//! KwikSort reranking.
//!
//! Turns an axiom's pairwise preferences over a list of outputs into a total
//! order by pivot partitioning. A tie between two distinct outputs is a hard
//! error: the axiom must decide every pair it is asked to rerank.

pub mod kwiksort;
pub mod options;
pub mod trace;

pub use kwiksort::{kwiksort, kwiksort_traced, kwiksort_with_options};
pub use options::RerankOptions;
pub use trace::{now_epoch_ms, ComparisonTrace, JsonlTraceSink, TraceError, TraceSink, TraceWorker};
