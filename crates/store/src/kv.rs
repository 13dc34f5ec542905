//! Key-value adapter over the host's persistent byte storage.
//!
//! The adapter performs no validation: it moves bytes and surfaces
//! failures as [`StoreError`], nothing more. The document store, the backup
//! manager, and the import boundary all go through this trait, which is what
//! lets the whole consistency layer run against [`MemoryKv`] in tests.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use redb::{Database, ReadableTable, TableDefinition};

use crate::error::StoreError;

/// Persistent byte storage, keyed by string.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;
    fn set(&mut self, key: &str, value: &[u8]) -> Result<(), StoreError>;
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
    /// Keys starting with `prefix`, in unspecified order.
    fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StoreError>;
}

// ── in-memory implementation ──────────────────────────────────────────────────

/// Map-backed store for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryKv {
    entries: BTreeMap<String, Vec<u8>>,
    fail_writes: bool,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }

    /// Failure injection: when set, every `set`/`remove` fails the way a
    /// quota-exhausted backend would.
    pub fn set_fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryKv {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        if self.fail_writes {
            return Err(StoreError::Backend("simulated quota exceeded".to_string()));
        }
        self.entries.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        if self.fail_writes {
            return Err(StoreError::Backend("simulated quota exceeded".to_string()));
        }
        self.entries.remove(key);
        Ok(())
    }

    fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        Ok(self
            .entries
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }
}

// ── redb implementation ───────────────────────────────────────────────────────

const KV_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("kv");

/// Durable store backed by a single redb table.
pub struct RedbKv {
    db: Database,
    path: PathBuf,
}

impl RedbKv {
    /// Open or create the database file at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(StoreError::backend)?;
        }
        let db = Database::create(&path).map_err(StoreError::backend)?;

        // Ensure the table exists so reads never fail on a fresh file.
        let tx = db.begin_write().map_err(StoreError::backend)?;
        tx.open_table(KV_TABLE).map_err(StoreError::backend)?;
        tx.commit().map_err(StoreError::backend)?;

        Ok(Self { db, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl KeyValueStore for RedbKv {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let tx = self.db.begin_read().map_err(StoreError::backend)?;
        let table = tx.open_table(KV_TABLE).map_err(StoreError::backend)?;
        let value = table.get(key).map_err(StoreError::backend)?;
        Ok(value.map(|v| v.value().to_vec()))
    }

    fn set(&mut self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        let tx = self.db.begin_write().map_err(StoreError::backend)?;
        {
            let mut table = tx.open_table(KV_TABLE).map_err(StoreError::backend)?;
            table.insert(key, value).map_err(StoreError::backend)?;
        }
        tx.commit().map_err(StoreError::backend)
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        let tx = self.db.begin_write().map_err(StoreError::backend)?;
        {
            let mut table = tx.open_table(KV_TABLE).map_err(StoreError::backend)?;
            table.remove(key).map_err(StoreError::backend)?;
        }
        tx.commit().map_err(StoreError::backend)
    }

    fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let tx = self.db.begin_read().map_err(StoreError::backend)?;
        let table = tx.open_table(KV_TABLE).map_err(StoreError::backend)?;
        let mut keys = Vec::new();
        for entry in table.iter().map_err(StoreError::backend)? {
            let (key, _) = entry.map_err(StoreError::backend)?;
            if key.value().starts_with(prefix) {
                keys.push(key.value().to_string());
            }
        }
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exercise(kv: &mut dyn KeyValueStore) {
        assert_eq!(kv.get("missing").unwrap(), None);

        kv.set("alpha", b"one").unwrap();
        kv.set("alpha-2", b"two").unwrap();
        kv.set("beta", b"three").unwrap();
        assert_eq!(kv.get("alpha").unwrap().as_deref(), Some(b"one".as_slice()));

        let mut keys = kv.list_keys("alpha").unwrap();
        keys.sort();
        assert_eq!(keys, vec!["alpha", "alpha-2"]);

        kv.set("alpha", b"replaced").unwrap();
        assert_eq!(
            kv.get("alpha").unwrap().as_deref(),
            Some(b"replaced".as_slice())
        );

        kv.remove("alpha").unwrap();
        assert_eq!(kv.get("alpha").unwrap(), None);
        // Removing an absent key is not an error.
        kv.remove("alpha").unwrap();
    }

    #[test]
    fn memory_kv_contract() {
        let mut kv = MemoryKv::new();
        exercise(&mut kv);
        assert_eq!(kv.len(), 2);
    }

    #[test]
    fn memory_kv_write_failure_injection() {
        let mut kv = MemoryKv::new();
        kv.set("k", b"v").unwrap();
        kv.set_fail_writes(true);
        assert!(kv.set("k", b"other").is_err());
        assert!(kv.remove("k").is_err());
        // Reads keep working and the old value is intact.
        assert_eq!(kv.get("k").unwrap().as_deref(), Some(b"v".as_slice()));
    }

    #[test]
    fn redb_kv_contract() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut kv = RedbKv::open(dir.path().join("kv.redb")).unwrap();
        exercise(&mut kv);
    }

    #[test]
    fn redb_kv_persists_across_reopen() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("sub/kv.redb");
        {
            let mut kv = RedbKv::open(&path).unwrap();
            kv.set("durable", b"yes").unwrap();
        }
        let kv = RedbKv::open(&path).unwrap();
        assert_eq!(
            kv.get("durable").unwrap().as_deref(),
            Some(b"yes".as_slice())
        );
    }
}
