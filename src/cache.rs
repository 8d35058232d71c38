//! Preference memoization stores.
//!
//! Keys are BLAKE3 fingerprints of the canonical JSON encoding of the input
//! and both outputs, scoped by a namespace (usually the axiom name). Storage
//! lives outside any axiom so separate axiom instances can share entries.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use fs2::FileExt;
use rusqlite::{params, Connection};
use serde::Serialize;

use crate::preference::Preference;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreferenceCacheKey {
    pub namespace: String,
    pub input_hash: String,
    pub output1_hash: String,
    pub output2_hash: String,
    pub key_hash: String,
}

impl PreferenceCacheKey {
    pub fn new<I, O>(namespace: &str, input: &I, output1: &O, output2: &O) -> Result<Self, CacheError>
    where
        I: Serialize + ?Sized,
        O: Serialize + ?Sized,
    {
        Ok(Self::from_hashes(
            namespace,
            fingerprint(input)?,
            fingerprint(output1)?,
            fingerprint(output2)?,
        ))
    }

    pub fn from_hashes(
        namespace: &str,
        input_hash: String,
        output1_hash: String,
        output2_hash: String,
    ) -> Self {
        let key_hash = hash_fields(&[namespace, &input_hash, &output1_hash, &output2_hash]);
        Self {
            namespace: namespace.to_string(),
            input_hash,
            output1_hash,
            output2_hash,
            key_hash,
        }
    }
}

/// BLAKE3 hex digest of the canonical JSON encoding of `value`.
pub fn fingerprint<T: Serialize + ?Sized>(value: &T) -> Result<String, CacheError> {
    let bytes = serde_json::to_vec(value).map_err(|e| CacheError::Serde(e.to_string()))?;
    Ok(blake3::hash(&bytes).to_hex().to_string())
}

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("cache lock poisoned")]
    Poisoned,
    #[error("serialization error: {0}")]
    Serde(String),
}

/// Backing storage for memoized preferences.
pub trait PreferenceStore: Send + Sync {
    fn get(&self, key: &PreferenceCacheKey) -> Result<Option<Preference>, CacheError>;

    /// Stores `preference` unless the key already has a value, and returns the
    /// value held for the key afterwards. An existing entry is never replaced.
    fn put(&self, key: &PreferenceCacheKey, preference: Preference) -> Result<Preference, CacheError>;
}

/// Process-local store.
#[derive(Debug, Default)]
pub struct InMemoryPreferenceStore {
    entries: Mutex<HashMap<String, Preference>>,
}

impl InMemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl PreferenceStore for InMemoryPreferenceStore {
    fn get(&self, key: &PreferenceCacheKey) -> Result<Option<Preference>, CacheError> {
        let entries = self.entries.lock().map_err(|_| CacheError::Poisoned)?;
        Ok(entries.get(&key.key_hash).copied())
    }

    fn put(&self, key: &PreferenceCacheKey, preference: Preference) -> Result<Preference, CacheError> {
        let mut entries = self.entries.lock().map_err(|_| CacheError::Poisoned)?;
        Ok(*entries.entry(key.key_hash.clone()).or_insert(preference))
    }
}

// =============================================================================
// SQLite
// =============================================================================

/// SQLite-backed store shared across processes via the database file.
#[derive(Clone)]
pub struct SqlitePreferenceStore {
    path: PathBuf,
    conn: Arc<Mutex<Connection>>,
}

impl SqlitePreferenceStore {
    pub fn new(path: impl AsRef<Path>) -> Result<Self, CacheError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let conn = Connection::open(&path)?;
        conn.execute_batch(
            "PRAGMA journal_mode=WAL;\
             PRAGMA synchronous=NORMAL;\
             CREATE TABLE IF NOT EXISTS preference_cache (\
               key_hash TEXT PRIMARY KEY,\
               namespace TEXT NOT NULL,\
               input_hash TEXT NOT NULL,\
               output1_hash TEXT NOT NULL,\
               output2_hash TEXT NOT NULL,\
               preference REAL,\
               created_at INTEGER NOT NULL,\
               updated_at INTEGER NOT NULL,\
               hit_count INTEGER NOT NULL DEFAULT 0\
             );",
        )?;

        Ok(Self {
            path,
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn default_path() -> PathBuf {
        if let Ok(path) = std::env::var(crate::config::CACHE_PATH_ENV) {
            return PathBuf::from(path);
        }
        PathBuf::from(crate::config::DEFAULT_CACHE_FILE)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn lock_exclusive(&self) -> Result<CacheLock, CacheError> {
        CacheLock::new(&self.path)
    }

    fn with_conn<F, R>(&self, f: F) -> Result<R, CacheError>
    where
        F: FnOnce(&Connection) -> Result<R, CacheError>,
    {
        let guard = self.conn.lock().map_err(|_| CacheError::Poisoned)?;
        f(&guard)
    }
}

impl PreferenceStore for SqlitePreferenceStore {
    fn get(&self, key: &PreferenceCacheKey) -> Result<Option<Preference>, CacheError> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT preference FROM preference_cache WHERE key_hash = ?1")?;
            let mut rows = stmt.query(params![key.key_hash])?;
            if let Some(row) = rows.next()? {
                // SQLite stores NaN as NULL.
                let preference = row.get::<_, Option<f64>>(0)?.unwrap_or(f64::NAN);
                conn.execute(
                    "UPDATE preference_cache \
                     SET hit_count = hit_count + 1, updated_at = ?1 \
                     WHERE key_hash = ?2",
                    params![now_epoch(), key.key_hash],
                )?;
                Ok(Some(preference))
            } else {
                Ok(None)
            }
        })
    }

    fn put(&self, key: &PreferenceCacheKey, preference: Preference) -> Result<Preference, CacheError> {
        self.with_conn(|conn| {
            let now = now_epoch();
            conn.execute(
                "INSERT INTO preference_cache ( \
                    key_hash, namespace, input_hash, output1_hash, output2_hash, \
                    preference, created_at, updated_at \
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8) \
                 ON CONFLICT(key_hash) DO NOTHING",
                params![
                    key.key_hash,
                    key.namespace,
                    key.input_hash,
                    key.output1_hash,
                    key.output2_hash,
                    if preference.is_nan() { None } else { Some(preference) },
                    now,
                    now,
                ],
            )?;
            let stored: Option<f64> = conn.query_row(
                "SELECT preference FROM preference_cache WHERE key_hash = ?1",
                params![key.key_hash],
                |row| row.get(0),
            )?;
            Ok(stored.unwrap_or(f64::NAN))
        })
    }
}

/// Advisory lock next to the database file (`<db>.lock`).
#[derive(Debug)]
pub struct CacheLock {
    _file: std::fs::File,
}

impl CacheLock {
    fn new(db_path: &Path) -> Result<Self, CacheError> {
        let mut lock_path = db_path.to_path_buf();
        lock_path.set_extension("lock");
        let file = std::fs::OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(lock_path)?;
        file.lock_exclusive()?;
        Ok(Self { _file: file })
    }
}

#[derive(Debug, Serialize)]
pub struct CacheExportRow {
    pub key_hash: String,
    pub namespace: String,
    pub input_hash: String,
    pub output1_hash: String,
    pub output2_hash: String,
    pub preference: Option<f64>,
    pub created_at: i64,
    pub updated_at: i64,
    pub hit_count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CachePruneStats {
    pub deleted: usize,
    pub remaining: usize,
}

impl SqlitePreferenceStore {
    pub fn export_jsonl(&self, path: impl AsRef<Path>) -> Result<(), CacheError> {
        let path = path.as_ref().to_path_buf();
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT key_hash, namespace, input_hash, output1_hash, output2_hash,\n                        preference, created_at, updated_at, hit_count\n                 FROM preference_cache ORDER BY updated_at DESC",
            )?;
            let mut rows = stmt.query([])?;
            let mut file = std::fs::File::create(path)?;
            while let Some(row) = rows.next()? {
                let record = CacheExportRow {
                    key_hash: row.get(0)?,
                    namespace: row.get(1)?,
                    input_hash: row.get(2)?,
                    output1_hash: row.get(3)?,
                    output2_hash: row.get(4)?,
                    preference: row.get(5)?,
                    created_at: row.get(6)?,
                    updated_at: row.get(7)?,
                    hit_count: row.get(8)?,
                };
                let line =
                    serde_json::to_string(&record).map_err(|e| CacheError::Serde(e.to_string()))?;
                use std::io::Write;
                writeln!(file, "{line}")?;
            }
            Ok(())
        })
    }

    pub fn prune(
        &self,
        max_age_days: Option<u64>,
        max_rows: Option<usize>,
    ) -> Result<CachePruneStats, CacheError> {
        self.with_conn(|conn| {
            let mut deleted: usize = 0;
            if let Some(days) = max_age_days {
                let cutoff = now_epoch().saturating_sub((days as i64).saturating_mul(86_400));
                let removed = conn.execute(
                    "DELETE FROM preference_cache WHERE updated_at < ?1",
                    params![cutoff],
                )?;
                deleted = deleted.saturating_add(removed);
            }

            if let Some(max_rows) = max_rows {
                let count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM preference_cache", [], |row| row.get(0))?;
                let keep = max_rows as i64;
                if count > keep {
                    let removed = conn.execute(
                        "DELETE FROM preference_cache WHERE key_hash IN (\
                            SELECT key_hash FROM preference_cache \
                            ORDER BY updated_at DESC LIMIT -1 OFFSET ?1\
                         )",
                        params![keep],
                    )?;
                    deleted = deleted.saturating_add(removed);
                }
            }

            let remaining: i64 =
                conn.query_row("SELECT COUNT(*) FROM preference_cache", [], |row| row.get(0))?;
            Ok(CachePruneStats {
                deleted,
                remaining: remaining.max(0) as usize,
            })
        })
    }
}

fn hash_fields(fields: &[&str]) -> String {
    let mut hasher = blake3::Hasher::new();
    for (idx, field) in fields.iter().enumerate() {
        if idx > 0 {
            hasher.update(b"|");
        }
        hasher.update(field.as_bytes());
    }
    hasher.finalize().to_hex().to_string()
}

fn now_epoch() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_store_round_trip() {
        let store = InMemoryPreferenceStore::new();
        let key = PreferenceCacheKey::new("tfc1", "query", "doc-a", "doc-b").unwrap();
        assert_eq!(store.get(&key).unwrap(), None);
        assert_eq!(store.put(&key, -1.0).unwrap(), -1.0);
        assert_eq!(store.get(&key).unwrap(), Some(-1.0));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_in_memory_put_keeps_existing_entry() {
        let store = InMemoryPreferenceStore::new();
        let key = PreferenceCacheKey::new("tfc1", "query", "doc-a", "doc-b").unwrap();
        assert_eq!(store.put(&key, 1.0).unwrap(), 1.0);
        assert_eq!(store.put(&key, 2.0).unwrap(), 1.0);
        assert_eq!(store.get(&key).unwrap(), Some(1.0));
    }

    #[test]
    fn test_fingerprint_is_stable() {
        assert_eq!(fingerprint("abc").unwrap(), fingerprint("abc").unwrap());
        assert_ne!(fingerprint("abc").unwrap(), fingerprint("abd").unwrap());
    }
}
