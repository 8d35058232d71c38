//! Per-pair memoization backed by a [`PreferenceStore`].

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use once_cell::sync::{Lazy, OnceCell};
use serde::Serialize;
use tracing::{debug, warn};

use crate::axiom::{Axiom, Composition, DynAxiom};
use crate::cache::{CacheError, PreferenceCacheKey, PreferenceStore};
use crate::error::AxiomError;
use crate::preference::Preference;

type Slot = Arc<OnceCell<Preference>>;

/// Pending computations keyed by store identity and key hash, shared by every
/// cached axiom in the process.
static IN_FLIGHT: Lazy<Mutex<HashMap<(usize, String), Slot>>> = Lazy::new(Default::default);

/// Memoizes the wrapped axiom per `(namespace, input, output1, output2)` key.
///
/// A key is computed at most once while the store retains it, across every
/// cached axiom sharing the store: later queries return the first stored value
/// even if the wrapped axiom would now answer differently. Batched calls expand
/// through the cached pairwise path.
pub struct CachedAxiom<I, O> {
    axiom: DynAxiom<I, O>,
    store: Arc<dyn PreferenceStore>,
    namespace: String,
}

impl<I, O> CachedAxiom<I, O> {
    pub fn new(axiom: DynAxiom<I, O>, store: Arc<dyn PreferenceStore>, namespace: &str) -> Self {
        Self {
            axiom,
            store,
            namespace: namespace.to_string(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    fn lookup(&self, key: &PreferenceCacheKey) -> Option<Preference> {
        match self.store.get(key) {
            Ok(hit) => hit,
            Err(err) => {
                warn!(error = %err, namespace = %self.namespace, "Cache read failed; computing preference");
                None
            }
        }
    }

    fn slot_key(&self, key: &PreferenceCacheKey) -> (usize, String) {
        let store = Arc::as_ptr(&self.store) as *const () as usize;
        (store, key.key_hash.clone())
    }

    fn slot(&self, key: &PreferenceCacheKey) -> Result<Slot, AxiomError> {
        let mut slots = IN_FLIGHT.lock().map_err(|_| CacheError::Poisoned)?;
        Ok(slots.entry(self.slot_key(key)).or_default().clone())
    }

    fn release(&self, key: &PreferenceCacheKey, slot: &Slot) {
        if let Ok(mut slots) = IN_FLIGHT.lock() {
            let slot_key = self.slot_key(key);
            if slots.get(&slot_key).is_some_and(|current| Arc::ptr_eq(current, slot)) {
                slots.remove(&slot_key);
            }
        }
    }
}

impl<I, O> Axiom<I, O> for CachedAxiom<I, O>
where
    I: Serialize,
    O: Serialize,
{
    fn preference(&self, input: &I, output1: &O, output2: &O) -> Result<Preference, AxiomError> {
        let key = PreferenceCacheKey::new(&self.namespace, input, output1, output2)?;
        if let Some(hit) = self.lookup(&key) {
            debug!(namespace = %self.namespace, key = %key.key_hash, "cache hit");
            return Ok(hit);
        }

        let slot = self.slot(&key)?;
        let result = slot
            .get_or_try_init(|| {
                // Another caller may have stored the value between lookup and slot.
                if let Some(hit) = self.lookup(&key) {
                    return Ok::<_, AxiomError>(hit);
                }
                debug!(namespace = %self.namespace, key = %key.key_hash, "cache miss");
                let computed = self.axiom.preference(input, output1, output2)?;
                // A writer in another process may have won; its value is the one kept.
                match self.store.put(&key, computed) {
                    Ok(stored) => Ok(stored),
                    Err(err) => {
                        warn!(error = %err, namespace = %self.namespace, "Cache write failed");
                        Ok(computed)
                    }
                }
            })
            .copied();
        self.release(&key, &slot);
        result
    }

    fn name(&self) -> String {
        self.axiom.name()
    }

    fn composition(&self) -> Composition<'_, I, O> {
        Composition::Cached(&self.axiom)
    }
}
