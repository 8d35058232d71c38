use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axiom_harness::axioms::{len_and, GreaterThan, RandomAxiom, Tfc1};
use axiom_harness::combinators::ParallelAxiom;
use axiom_harness::model::{Document, Query};
use axiom_harness::precondition::FnPrecondition;
use axiom_harness::text::TextToolkit;
use axiom_harness::{into_dyn, Axiom, AxiomError, Compose, DynAxiom, Preference};

#[test]
fn parallel_matrix_equals_sequential_matrix() {
    let axiom: DynAxiom<(), u32> = into_dyn(GreaterThan).plus(into_dyn(RandomAxiom::new(9)));
    let outputs: Vec<u32> = (0..25).map(|i| (i * 7) % 25).collect();

    let sequential = axiom.preferences(&(), &outputs).unwrap();
    for parallelism in [Some(1), Some(4), None] {
        let parallel = axiom.clone().parallel(parallelism);
        assert_eq!(parallel.preferences(&(), &outputs).unwrap(), sequential);
    }
}

#[test]
fn parallel_keeps_not_applicable_entries() {
    let toolkit = Arc::new(TextToolkit::default());
    let axiom: DynAxiom<Query, Document> = len_and(toolkit);
    let query = Query::new("q", "rust borrow checker");
    let docs = vec![
        Document::new("a", "rust borrow checker rules"),
        Document::new("b", "a much longer document about rust and many other things entirely"),
        Document::new("c", "borrow checker in rust"),
    ];

    let sequential = axiom.preferences(&query, &docs).unwrap();
    let parallel = axiom.parallel(Some(3)).preferences(&query, &docs).unwrap();
    for i in 0..docs.len() {
        for j in 0..docs.len() {
            assert_eq!(parallel.value(i, j), sequential.value(i, j), "({i}, {j})");
        }
    }
    assert!(!parallel.is_applicable(0, 1));
}

#[test]
fn parallel_visits_every_pair_once() {
    struct Counting(AtomicUsize);

    impl Axiom<(), u32> for Counting {
        fn preference(&self, _: &(), a: &u32, b: &u32) -> Result<Preference, AxiomError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(*a as f64 - *b as f64)
        }
    }

    let counting = Arc::new(Counting(AtomicUsize::new(0)));
    let parallel = ParallelAxiom::<(), u32>::new(counting.clone(), Some(4));
    assert_eq!(parallel.parallelism(), 4);
    let outputs: Vec<u32> = (0..10).collect();
    let matrix = parallel.preferences(&(), &outputs).unwrap();
    assert_eq!(counting.0.load(Ordering::SeqCst), 100);
    assert_eq!(matrix.get(9, 0), 9.0);
    assert_eq!(matrix.get(0, 9), -9.0);
}

#[test]
fn parallel_gate_checks_each_pair_once() {
    let checks = Arc::new(AtomicUsize::new(0));
    let counter = checks.clone();
    let both_even = FnPrecondition::new("EVEN", move |_: &(), a: &u32, b: &u32| {
        counter.fetch_add(1, Ordering::SeqCst);
        a % 2 == 0 && b % 2 == 0
    });
    let gated: DynAxiom<(), u32> = into_dyn(GreaterThan).gated(Arc::new(both_even));
    let outputs = vec![4u32, 2, 3];

    let matrix = gated.parallel(Some(2)).preferences(&(), &outputs).unwrap();
    assert_eq!(checks.load(Ordering::SeqCst), 9);
    assert_eq!(matrix.value(0, 1), Some(1.0));
    assert_eq!(matrix.value(0, 2), None);
    assert_eq!(matrix.value(2, 2), None);
}

#[test]
fn parallel_propagates_child_errors() {
    let toolkit = Arc::new(TextToolkit::default());
    // Without an index, IDF-dependent scoring is a configuration error.
    let axiom: DynAxiom<Query, Document> =
        into_dyn(Tfc1::new(toolkit.clone())).plus(into_dyn(axiom_harness::axioms::RetrievalScore::tf_idf(toolkit)));
    let docs = vec![Document::new("a", "x"), Document::new("b", "y")];
    let err = axiom
        .parallel(Some(2))
        .preferences(&Query::new("q", "x"), &docs)
        .unwrap_err();
    assert!(matches!(err, AxiomError::Configuration(_)));
}

#[test]
fn oversized_parallelism_is_clamped() {
    let parallel = ParallelAxiom::<(), u32>::new(into_dyn(GreaterThan), Some(10_000));
    assert_eq!(parallel.parallelism(), axiom_harness::combinators::MAX_PARALLELISM);
}
