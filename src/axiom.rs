//! The axiom capability and its composition builders.
//!
//! An axiom judges which of two outputs better serves an input. Axioms are
//! immutable once built; combinators wrap already-built axioms into a tree of
//! shared [`DynAxiom`] handles, so cycles cannot occur.

use std::sync::Arc;

use serde::Serialize;

use crate::cache::PreferenceStore;
use crate::combinators::{
    Cascade, CachedAxiom, Conjunction, Inverse, Normalized, ParallelAxiom, PreconditionAxiom,
    Product, Sum, UniformAxiom, Vote, DEFAULT_MINIMUM_VOTES,
};
use crate::error::AxiomError;
use crate::pivot::PivotSelection;
use crate::precondition::DynPrecondition;
use crate::preference::{Preference, PreferenceMatrix};
use crate::rerank::{kwiksort, RerankOptions};

/// Shared handle to a type-erased axiom.
pub type DynAxiom<I, O> = Arc<dyn Axiom<I, O>>;

/// Pairwise preference judge over outputs of type `O` for inputs of type `I`.
///
/// Implementations must be antisymmetric:
/// `preference(x, a, b) == -preference(x, b, a)`.
pub trait Axiom<I, O>: Send + Sync {
    /// Signed preference of `output1` over `output2`; `0` abstains.
    fn preference(&self, input: &I, output1: &O, output2: &O) -> Result<Preference, AxiomError>;

    /// All-pairs matrix, `[i][j] == preference(input, outputs[i], outputs[j])`.
    ///
    /// The default issues `n²` pairwise calls. Overrides may share per-output
    /// work but must stay equivalent to the naive expansion.
    fn preferences(&self, input: &I, outputs: &[O]) -> Result<PreferenceMatrix, AxiomError> {
        PreferenceMatrix::try_from_fn(outputs.len(), |i, j| {
            self.preference(input, &outputs[i], &outputs[j])
        })
    }

    /// Human-readable label, used for tracing and default cache namespaces.
    fn name(&self) -> String {
        short_type_name::<Self>()
    }

    /// Structural view used by the flattening builders.
    fn composition(&self) -> Composition<'_, I, O> {
        Composition::Leaf
    }
}

impl<I, O, A> Axiom<I, O> for Arc<A>
where
    A: Axiom<I, O> + ?Sized,
{
    fn preference(&self, input: &I, output1: &O, output2: &O) -> Result<Preference, AxiomError> {
        (**self).preference(input, output1, output2)
    }

    fn preferences(&self, input: &I, outputs: &[O]) -> Result<PreferenceMatrix, AxiomError> {
        (**self).preferences(input, outputs)
    }

    fn name(&self) -> String {
        (**self).name()
    }

    fn composition(&self) -> Composition<'_, I, O> {
        (**self).composition()
    }
}

/// What a composite axiom is made of.
pub enum Composition<'a, I, O> {
    Leaf,
    Uniform(f64),
    Sum(&'a [DynAxiom<I, O>]),
    Product(&'a [DynAxiom<I, O>]),
    Inverse(&'a DynAxiom<I, O>),
    Conjunction(&'a [DynAxiom<I, O>]),
    Cascade(&'a [DynAxiom<I, O>]),
    Vote {
        axioms: &'a [DynAxiom<I, O>],
        minimum_votes: f64,
    },
    Normalized(&'a DynAxiom<I, O>),
    Gated {
        axiom: &'a DynAxiom<I, O>,
        precondition: &'a DynPrecondition<I, O>,
    },
    Cached(&'a DynAxiom<I, O>),
    Parallel(&'a DynAxiom<I, O>),
}

/// Erase a concrete axiom into a shared handle.
pub fn into_dyn<I, O, A>(axiom: A) -> DynAxiom<I, O>
where
    A: Axiom<I, O> + 'static,
{
    Arc::new(axiom)
}

pub(crate) fn short_type_name<T: ?Sized>() -> String {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base).to_string()
}

// =============================================================================
// Builders
// =============================================================================

/// Algebraic composition of shared axioms.
///
/// Every builder returns a new axiom and leaves its operands untouched.
/// `plus`, `times`, `or` and `and` flatten operands of the same kind into one
/// child list; `vote` flattens only default-threshold votes.
pub trait Compose<I, O>: Sized {
    fn plus(self, other: DynAxiom<I, O>) -> DynAxiom<I, O>;
    fn minus(self, other: DynAxiom<I, O>) -> DynAxiom<I, O>;
    fn times(self, other: DynAxiom<I, O>) -> DynAxiom<I, O>;
    fn divide(self, other: DynAxiom<I, O>) -> DynAxiom<I, O>;
    fn scaled(self, factor: f64) -> DynAxiom<I, O>;
    fn inverse(self) -> DynAxiom<I, O>;
    fn negate(self) -> DynAxiom<I, O>;
    fn and(self, other: DynAxiom<I, O>) -> DynAxiom<I, O>;
    fn or(self, other: DynAxiom<I, O>) -> DynAxiom<I, O>;
    fn vote(self, other: DynAxiom<I, O>) -> DynAxiom<I, O>;
    fn normalize(self) -> DynAxiom<I, O>;
    fn gated(self, precondition: DynPrecondition<I, O>) -> DynAxiom<I, O>;
    fn parallel(self, parallelism: Option<usize>) -> DynAxiom<I, O>
    where
        I: Sync,
        O: Sync;

    /// Memoize in `store`, namespaced by the axiom's name.
    fn cached(self, store: Arc<dyn PreferenceStore>) -> DynAxiom<I, O>
    where
        I: Serialize,
        O: Serialize;

    /// Memoize in `store` under an explicit namespace.
    fn cached_in(self, store: Arc<dyn PreferenceStore>, namespace: &str) -> DynAxiom<I, O>
    where
        I: Serialize,
        O: Serialize;
}

impl<I: 'static, O: 'static> Compose<I, O> for DynAxiom<I, O> {
    fn plus(self, other: DynAxiom<I, O>) -> DynAxiom<I, O> {
        Arc::new(Sum::new(flatten([self, other], sum_children)))
    }

    fn minus(self, other: DynAxiom<I, O>) -> DynAxiom<I, O> {
        self.plus(other.negate())
    }

    fn times(self, other: DynAxiom<I, O>) -> DynAxiom<I, O> {
        Arc::new(Product::new(flatten([self, other], product_children)))
    }

    fn divide(self, other: DynAxiom<I, O>) -> DynAxiom<I, O> {
        self.times(other.inverse())
    }

    fn scaled(self, factor: f64) -> DynAxiom<I, O> {
        self.times(Arc::new(UniformAxiom::new(factor)))
    }

    fn inverse(self) -> DynAxiom<I, O> {
        Arc::new(Inverse::new(self))
    }

    fn negate(self) -> DynAxiom<I, O> {
        self.scaled(-1.0)
    }

    fn and(self, other: DynAxiom<I, O>) -> DynAxiom<I, O> {
        Arc::new(Conjunction::new(flatten([self, other], conjunction_children)))
    }

    fn or(self, other: DynAxiom<I, O>) -> DynAxiom<I, O> {
        Arc::new(Cascade::new(flatten([self, other], cascade_children)))
    }

    fn vote(self, other: DynAxiom<I, O>) -> DynAxiom<I, O> {
        Arc::new(Vote::majority(flatten([self, other], majority_children)))
    }

    fn normalize(self) -> DynAxiom<I, O> {
        if matches!(self.composition(), Composition::Normalized(_)) {
            return self;
        }
        Arc::new(Normalized::new(self))
    }

    fn gated(self, precondition: DynPrecondition<I, O>) -> DynAxiom<I, O> {
        Arc::new(PreconditionAxiom::new(self, precondition))
    }

    fn parallel(self, parallelism: Option<usize>) -> DynAxiom<I, O>
    where
        I: Sync,
        O: Sync,
    {
        Arc::new(ParallelAxiom::new(self, parallelism))
    }

    fn cached(self, store: Arc<dyn PreferenceStore>) -> DynAxiom<I, O>
    where
        I: Serialize,
        O: Serialize,
    {
        let namespace = self.name();
        self.cached_in(store, &namespace)
    }

    fn cached_in(self, store: Arc<dyn PreferenceStore>, namespace: &str) -> DynAxiom<I, O>
    where
        I: Serialize,
        O: Serialize,
    {
        Arc::new(CachedAxiom::new(self, store, namespace))
    }
}

type ChildrenOf<I, O> = fn(&DynAxiom<I, O>) -> Option<Vec<DynAxiom<I, O>>>;

fn flatten<I, O>(operands: [DynAxiom<I, O>; 2], children: ChildrenOf<I, O>) -> Vec<DynAxiom<I, O>> {
    let mut flat = Vec::new();
    for operand in operands {
        match children(&operand) {
            Some(inner) => flat.extend(inner),
            None => flat.push(operand),
        }
    }
    flat
}

fn sum_children<I, O>(axiom: &DynAxiom<I, O>) -> Option<Vec<DynAxiom<I, O>>> {
    match axiom.composition() {
        Composition::Sum(children) => Some(children.to_vec()),
        _ => None,
    }
}

fn product_children<I, O>(axiom: &DynAxiom<I, O>) -> Option<Vec<DynAxiom<I, O>>> {
    match axiom.composition() {
        Composition::Product(children) => Some(children.to_vec()),
        _ => None,
    }
}

fn conjunction_children<I, O>(axiom: &DynAxiom<I, O>) -> Option<Vec<DynAxiom<I, O>>> {
    match axiom.composition() {
        Composition::Conjunction(children) => Some(children.to_vec()),
        _ => None,
    }
}

fn cascade_children<I, O>(axiom: &DynAxiom<I, O>) -> Option<Vec<DynAxiom<I, O>>> {
    match axiom.composition() {
        Composition::Cascade(children) => Some(children.to_vec()),
        _ => None,
    }
}

fn majority_children<I, O>(axiom: &DynAxiom<I, O>) -> Option<Vec<DynAxiom<I, O>>> {
    match axiom.composition() {
        Composition::Vote {
            axioms,
            minimum_votes,
        } if minimum_votes == DEFAULT_MINIMUM_VOTES => Some(axioms.to_vec()),
        _ => None,
    }
}

// =============================================================================
// Reranking
// =============================================================================

/// Reranking entry points available on every axiom.
pub trait AxiomExt<I, O>: Axiom<I, O> {
    /// Reorder `outputs` with KwikSort using the pivot strategy in `options`.
    fn rerank(&self, input: &I, outputs: &[O], options: &RerankOptions) -> Result<Vec<O>, AxiomError>
    where
        O: Clone,
    {
        let order = kwiksort::kwiksort_with_options(self, input, outputs, options, None)?;
        Ok(order.into_iter().map(|idx| outputs[idx].clone()).collect())
    }

    /// Reorder `outputs` with KwikSort and an explicit pivot strategy.
    fn rerank_with_pivot(
        &self,
        input: &I,
        outputs: &[O],
        pivot: &mut dyn PivotSelection<I, O>,
    ) -> Result<Vec<O>, AxiomError>
    where
        O: Clone,
    {
        let order = kwiksort::kwiksort(self, input, outputs, pivot)?;
        Ok(order.into_iter().map(|idx| outputs[idx].clone()).collect())
    }
}

impl<I, O, A> AxiomExt<I, O> for A where A: Axiom<I, O> + ?Sized {}
