use axiom_harness::cache::{fingerprint, PreferenceCacheKey};
use axiom_harness::model::{Document, Query};

fn query() -> Query {
    Query::new("q1", "memory safety without garbage collection")
}

#[test]
fn preference_cache_key_is_stable_and_sensitive_to_inputs() {
    let a = Document::new("a", "Entity A text");
    let b = Document::new("b", "Entity B text");
    let key1 = PreferenceCacheKey::new("TFC1", &query(), &a, &b).unwrap();
    let key2 = PreferenceCacheKey::new("TFC1", &query(), &a, &b).unwrap();

    assert_eq!(key1, key2);
    assert_eq!(key1.input_hash, fingerprint(&query()).unwrap());

    let changed = Document::new("a", "Entity A text (changed)");
    let key3 = PreferenceCacheKey::new("TFC1", &query(), &changed, &b).unwrap();
    assert_ne!(key1.key_hash, key3.key_hash);
    assert_ne!(key1.output1_hash, key3.output1_hash);
    assert_eq!(key1.output2_hash, key3.output2_hash);

    let other_namespace = PreferenceCacheKey::new("LNC1", &query(), &a, &b).unwrap();
    assert_ne!(key1.key_hash, other_namespace.key_hash);
    assert_eq!(key1.input_hash, other_namespace.input_hash);
}

#[test]
fn preference_cache_key_depends_on_output_order() {
    let a = Document::new("a", "Entity A text");
    let b = Document::new("b", "Entity B text");
    let ab = PreferenceCacheKey::new("TFC1", &query(), &a, &b).unwrap();
    let ba = PreferenceCacheKey::new("TFC1", &query(), &b, &a).unwrap();
    assert_ne!(ab.key_hash, ba.key_hash);
}
