//! Combinators: axioms built from other axioms.
//!
//! Every combinator is itself an [`Axiom`](crate::Axiom), so trees nest
//! arbitrarily. Child errors propagate unchanged.

pub mod arithmetic;
pub mod cached;
pub mod gate;
pub mod logic;
pub mod normalize;
pub mod parallel;

pub use arithmetic::{Inverse, Product, Sum, UniformAxiom};
pub use cached::CachedAxiom;
pub use gate::{strip_preconditions, PreconditionAxiom};
pub use logic::{Cascade, Conjunction, Vote, DEFAULT_MINIMUM_VOTES};
pub use normalize::Normalized;
pub use parallel::{ParallelAxiom, MAX_PARALLELISM};

use crate::axiom::DynAxiom;

pub(crate) fn join_names<I, O>(axioms: &[DynAxiom<I, O>], operator: &str) -> String {
    let names: Vec<String> = axioms.iter().map(|a| a.name()).collect();
    format!("({})", names.join(operator))
}
