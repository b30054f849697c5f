//! RedbMetaStore — redb-backed metadata persistence.
//!
//! One table, cluster id → JSON-serialized [`ClusterMeta`]. The atomic
//! `update` runs the caller's closure inside a single write transaction,
//! which is what upholds the no-lost-updates contract.

use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::meta::{ClusterMeta, MetaStore};

/// Cluster metadata keyed by cluster id.
const CLUSTERS: TableDefinition<&str, &[u8]> = TableDefinition::new("cluster_meta");

/// Convert any `Display` error into a `StoreError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| StoreError::$variant(e.to_string())
    };
}

/// Thread-safe metadata store backed by redb.
#[derive(Clone)]
pub struct RedbMetaStore {
    db: Arc<Database>,
}

impl RedbMetaStore {
    /// Open (or create) a persistent store at the given path.
    pub fn open(path: &Path) -> StoreResult<Self> {
        let db = Database::create(path).map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!(?path, "metadata store opened");
        Ok(store)
    }

    /// Create an ephemeral in-memory store (for testing).
    pub fn open_in_memory() -> StoreResult<Self> {
        let backend = redb::backends::InMemoryBackend::new();
        let db = Database::builder()
            .create_with_backend(backend)
            .map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!("in-memory metadata store opened");
        Ok(store)
    }

    fn ensure_tables(&self) -> StoreResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        // Opening a table in a write transaction creates it if absent.
        txn.open_table(CLUSTERS).map_err(map_err!(Table))?;
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }
}

impl MetaStore for RedbMetaStore {
    fn create(&self, cluster_id: &str, meta: &ClusterMeta) -> StoreResult<()> {
        let value = serde_json::to_vec(meta).map_err(map_err!(Serialize))?;
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(CLUSTERS).map_err(map_err!(Table))?;
            if table.get(cluster_id).map_err(map_err!(Read))?.is_some() {
                return Err(StoreError::AlreadyExists(cluster_id.to_string()));
            }
            table
                .insert(cluster_id, value.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(cluster = %cluster_id, "cluster metadata stored");
        Ok(())
    }

    fn get(&self, cluster_id: &str) -> StoreResult<Option<ClusterMeta>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(CLUSTERS).map_err(map_err!(Table))?;
        match table.get(cluster_id).map_err(map_err!(Read))? {
            Some(guard) => {
                let meta: ClusterMeta =
                    serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?;
                Ok(Some(meta))
            }
            None => Ok(None),
        }
    }

    fn update(
        &self,
        cluster_id: &str,
        apply: &dyn Fn(ClusterMeta) -> ClusterMeta,
    ) -> StoreResult<ClusterMeta> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let updated;
        {
            let mut table = txn.open_table(CLUSTERS).map_err(map_err!(Table))?;
            let current: ClusterMeta = match table.get(cluster_id).map_err(map_err!(Read))? {
                Some(guard) => {
                    serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?
                }
                None => return Err(StoreError::NotFound(cluster_id.to_string())),
            };
            updated = apply(current);
            let value = serde_json::to_vec(&updated).map_err(map_err!(Serialize))?;
            table
                .insert(cluster_id, value.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(cluster = %cluster_id, "cluster metadata updated");
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(owner: &str, timeout: u64) -> ClusterMeta {
        ClusterMeta {
            owner: owner.to_string(),
            timeout,
        }
    }

    #[test]
    fn create_and_get() {
        let store = RedbMetaStore::open_in_memory().unwrap();
        store.create("3fa9c1d2", &meta("alice", 1000)).unwrap();

        let read = store.get("3fa9c1d2").unwrap();
        assert_eq!(read, Some(meta("alice", 1000)));
    }

    #[test]
    fn get_nonexistent_returns_none() {
        let store = RedbMetaStore::open_in_memory().unwrap();
        assert!(store.get("nope").unwrap().is_none());
    }

    #[test]
    fn duplicate_create_fails() {
        let store = RedbMetaStore::open_in_memory().unwrap();
        store.create("abc", &meta("alice", 1000)).unwrap();

        let err = store.create("abc", &meta("bob", 2000)).unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists(_)));
        // The original record is untouched.
        assert_eq!(store.get("abc").unwrap(), Some(meta("alice", 1000)));
    }

    #[test]
    fn update_applies_closure() {
        let store = RedbMetaStore::open_in_memory().unwrap();
        store.create("abc", &meta("alice", 1000)).unwrap();

        let updated = store
            .update("abc", &|mut m| {
                m.owner = "bob".to_string();
                m.timeout = 2000;
                m
            })
            .unwrap();
        assert_eq!(updated, meta("bob", 2000));
        assert_eq!(store.get("abc").unwrap(), Some(meta("bob", 2000)));
    }

    #[test]
    fn update_missing_record_fails() {
        let store = RedbMetaStore::open_in_memory().unwrap();
        let err = store.update("nope", &|m| m).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn monotonic_raise_through_update() {
        // The refresh path only ever raises the stored timeout; the store
        // must faithfully persist whichever branch the closure takes.
        let store = RedbMetaStore::open_in_memory().unwrap();
        store.create("abc", &meta("alice", 5000)).unwrap();

        let raise = |target: u64| {
            move |mut m: ClusterMeta| {
                if m.timeout < target {
                    m.timeout = target;
                }
                m
            }
        };

        store.update("abc", &raise(9000)).unwrap();
        assert_eq!(store.get("abc").unwrap().unwrap().timeout, 9000);

        store.update("abc", &raise(100)).unwrap();
        assert_eq!(store.get("abc").unwrap().unwrap().timeout, 9000);
    }

    #[test]
    fn persistence_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("meta.redb");

        {
            let store = RedbMetaStore::open(&db_path).unwrap();
            store.create("abc", &meta("alice", 1000)).unwrap();
        }

        let store = RedbMetaStore::open(&db_path).unwrap();
        assert_eq!(store.get("abc").unwrap(), Some(meta("alice", 1000)));
    }
}
