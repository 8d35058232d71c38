use std::sync::Arc;

use axiom_harness::axioms::{
    len_and, AllQueryTerms, OriginalScore, Prox2, RandomAxiom, RetrievalScore, Tfc1,
};
use axiom_harness::combinators::Vote;
use axiom_harness::consistency::{kwiksort_consistency, ranking_agreement};
use axiom_harness::index::InMemoryIndex;
use axiom_harness::model::{Document, Query, RankedDocument};
use axiom_harness::text::WordTokenizer;
use axiom_harness::{
    into_dyn, Axiom, AxiomExt, Compose, DynAxiom, HarnessConfig, PreferenceCacheKey, PreferenceStore,
    SqlitePreferenceStore,
};
use tempfile::tempdir;

fn corpus() -> Vec<Document> {
    vec![
        Document::new("b", "python uses a garbage collector for memory management"),
        Document::new("d", "cooking pasta at home"),
        Document::new("a", "rust guarantees memory safety without a garbage collector"),
        Document::new("e", "memory safety bugs in c programs"),
        Document::new("c", "the rust compiler enforces ownership"),
    ]
}

fn query() -> Query {
    Query::new("q1", "rust memory safety")
}

fn config() -> HarnessConfig {
    HarnessConfig::from_json(
        r#"{
            "margin_fraction": 0.1,
            "pivot": {"type": "random", "seed": 17},
            "vote": "majority",
            "bm25": {"k1": 1.2, "b": 0.75}
        }"#,
    )
    .unwrap()
}

fn ids<T: AsRef<str>>(ranked: impl IntoIterator<Item = T>) -> Vec<String> {
    ranked.into_iter().map(|id| id.as_ref().to_string()).collect()
}

#[test]
fn bm25_with_random_fallback_orders_the_corpus() {
    let config = config();
    let docs = corpus();
    let index = InMemoryIndex::build(&WordTokenizer::default(), &docs);
    let toolkit = Arc::new(config.text_toolkit().with_index(Arc::new(index)));

    let axiom: DynAxiom<Query, Document> = into_dyn(RetrievalScore::bm25(toolkit, config.bm25))
        .or(into_dyn(RandomAxiom::new(1)));
    assert_eq!(axiom.name(), "(RS_BM25 | RANDOM(1))");

    let ranked = axiom.rerank(&query(), &docs, &config.rerank_options()).unwrap();
    assert_eq!(
        ids(ranked.iter().map(|doc| doc.id.as_str())),
        ids(["a", "e", "c", "b", "d"])
    );

    let agreement = ranking_agreement(&*axiom, &query(), &ranked).unwrap();
    assert_eq!(agreement, Some(1.0));
}

#[test]
fn cached_pipeline_reuses_sqlite_judgments() {
    let config = config();
    let dir = tempdir().unwrap();
    let store = Arc::new(SqlitePreferenceStore::new(dir.path().join("cache.sqlite")).unwrap());
    let toolkit = Arc::new(config.text_toolkit());
    let docs = corpus();

    let axiom: DynAxiom<Query, Document> = into_dyn(AllQueryTerms::new(toolkit.clone()))
        .or(into_dyn(RetrievalScore::tf(toolkit.clone())))
        .or(into_dyn(Prox2::new(toolkit)))
        .or(into_dyn(RandomAxiom::new(2)))
        .cached(store.clone());

    let options = config.rerank_options().precomputed();
    let first = axiom.rerank(&query(), &docs, &options).unwrap();
    let second = axiom.rerank(&query(), &docs, &options).unwrap();
    assert_eq!(first, second);
    assert_eq!(first[0].id, "a");

    let key = PreferenceCacheKey::new(&axiom.name(), &query(), &docs[2], &docs[0]).unwrap();
    assert_eq!(store.get(&key).unwrap(), Some(1.0));
}

#[test]
fn length_gated_axioms_vote_with_a_configured_threshold() {
    let config = HarnessConfig::from_json(r#"{"vote": "consensus"}"#).unwrap();
    let toolkit = Arc::new(config.text_toolkit());
    let query = Query::new("q", "borrow checker");
    let docs = vec![
        Document::new("x", "borrow checker errors explained"),
        Document::new("y", "borrow errors explained here"),
    ];

    let gated: DynAxiom<Query, Document> = len_and(toolkit.clone());
    assert_eq!(gated.name(), "LEN_AND");
    let vote = Vote::new(
        vec![gated, into_dyn(Tfc1::new(toolkit.clone())), into_dyn(RetrievalScore::tf(toolkit))],
        config.minimum_votes().unwrap(),
    )
    .unwrap();
    let matrix = vote.preferences(&query, &docs).unwrap();
    assert_eq!(matrix.get(0, 1), 1.0);
    assert_eq!(matrix.get(1, 0), -1.0);
}

#[test]
fn original_ranking_is_fully_consistent_with_its_scores() {
    let ranked = RankedDocument::from_documents(corpus());
    assert_eq!(ranked[0].rank, 1);

    let consistency = kwiksort_consistency(
        &OriginalScore,
        &query(),
        &ranked,
        &config().rerank_options(),
    )
    .unwrap();
    assert!((consistency - 1.0).abs() < 1e-12);
}
