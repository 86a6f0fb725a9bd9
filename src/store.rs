//! Key-value persistence behind the ledger.
//!
//! `KvBackend` is the narrow seam the ledger store writes through. The
//! production backend is RocksDB; `MemoryStore` backs tests and ephemeral
//! deployments. Multi-key writes go through `batch_write`, which every
//! backend must apply atomically.

use crate::config::StorageConfig;
use crate::errors::StoreError;
use rocksdb::{Direction, IteratorMode, Options, WriteBatch, DB};
use std::collections::BTreeMap;
use std::sync::RwLock;
use tracing::info;

pub trait KvBackend: Send + Sync {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError>;

    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError>;

    fn delete(&self, key: &[u8]) -> Result<(), StoreError>;

    /// Apply all writes atomically: either every pair lands or none does.
    fn batch_write(&self, writes: Vec<(Vec<u8>, Vec<u8>)>) -> Result<(), StoreError>;

    /// Up to `limit` pairs whose keys start with `prefix`, in ascending key
    /// order, starting strictly after `after` when given.
    fn scan_prefix(
        &self,
        prefix: &[u8],
        after: Option<&[u8]>,
        limit: usize,
    ) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StoreError>;
}

/// RocksDB-backed store. One instance owns the database directory.
pub struct RocksStore {
    db: DB,
}

impl RocksStore {
    pub fn open(config: &StorageConfig) -> Result<Self, StoreError> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        opts.set_write_buffer_size(config.write_buffer_size_mb * 1024 * 1024);
        opts.set_max_write_buffer_number(config.max_write_buffer_number);
        opts.set_target_file_size_base(config.target_file_size_mb * 1024 * 1024);

        let db = DB::open(&opts, &config.data_directory)
            .map_err(|e| StoreError::OpenFailed(e.to_string()))?;
        info!(path = %config.data_directory, "Opened ledger database");
        Ok(Self { db })
    }
}

impl KvBackend for RocksStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.db.get(key)?)
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        Ok(self.db.put(key, value)?)
    }

    fn delete(&self, key: &[u8]) -> Result<(), StoreError> {
        Ok(self.db.delete(key)?)
    }

    fn batch_write(&self, writes: Vec<(Vec<u8>, Vec<u8>)>) -> Result<(), StoreError> {
        let mut batch = WriteBatch::default();
        for (key, value) in writes {
            batch.put(key, value);
        }
        Ok(self.db.write(batch)?)
    }

    fn scan_prefix(
        &self,
        prefix: &[u8],
        after: Option<&[u8]>,
        limit: usize,
    ) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StoreError> {
        let start: Vec<u8> = after.unwrap_or(prefix).to_vec();
        let mut iter = self
            .db
            .iterator(IteratorMode::From(&start, Direction::Forward));

        let mut out = Vec::new();
        while out.len() < limit {
            let Some(item) = iter.next() else { break };
            let (key, value) = item.map_err(|e| StoreError::ReadFailed(e.to_string()))?;
            if !key.starts_with(prefix) {
                break;
            }
            // The cursor key itself is excluded.
            if after.map_or(false, |a| &*key == a) {
                continue;
            }
            out.push((key.into_vec(), value.into_vec()));
        }
        Ok(out)
    }
}

/// In-memory backend with the same ordering semantics as RocksDB.
#[derive(Default)]
pub struct MemoryStore {
    map: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvBackend for MemoryStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        let map = self.map.read().map_err(|_| poisoned())?;
        Ok(map.get(key).cloned())
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        let mut map = self.map.write().map_err(|_| poisoned())?;
        map.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> Result<(), StoreError> {
        let mut map = self.map.write().map_err(|_| poisoned())?;
        map.remove(key);
        Ok(())
    }

    fn batch_write(&self, writes: Vec<(Vec<u8>, Vec<u8>)>) -> Result<(), StoreError> {
        let mut map = self.map.write().map_err(|_| poisoned())?;
        for (key, value) in writes {
            map.insert(key, value);
        }
        Ok(())
    }

    fn scan_prefix(
        &self,
        prefix: &[u8],
        after: Option<&[u8]>,
        limit: usize,
    ) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StoreError> {
        let map = self.map.read().map_err(|_| poisoned())?;
        let out = map
            .range(after.unwrap_or(prefix).to_vec()..)
            .filter(|(k, _)| after.map_or(true, |a| k.as_slice() != a))
            .take_while(|(k, _)| k.starts_with(prefix))
            .take(limit)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Ok(out)
    }
}

fn poisoned() -> StoreError {
    StoreError::ReadFailed("store lock poisoned".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled() -> MemoryStore {
        let store = MemoryStore::new();
        for (k, v) in [("a:1", "one"), ("a:2", "two"), ("a:3", "three"), ("b:1", "other")] {
            store.put(k.as_bytes(), v.as_bytes()).unwrap();
        }
        store
    }

    #[test]
    fn test_get_put_delete_roundtrip() {
        let store = MemoryStore::new();
        assert_eq!(store.get(b"k").unwrap(), None);
        store.put(b"k", b"v").unwrap();
        assert_eq!(store.get(b"k").unwrap(), Some(b"v".to_vec()));
        store.delete(b"k").unwrap();
        assert_eq!(store.get(b"k").unwrap(), None);
    }

    #[test]
    fn test_scan_respects_prefix_and_order() {
        let store = filled();
        let rows = store.scan_prefix(b"a:", None, 10).unwrap();
        let keys: Vec<_> = rows.iter().map(|(k, _)| k.as_slice()).collect();
        assert_eq!(keys, vec![&b"a:1"[..], b"a:2", b"a:3"]);
    }

    #[test]
    fn test_scan_cursor_is_exclusive() {
        let store = filled();
        let rows = store.scan_prefix(b"a:", Some(b"a:1"), 10).unwrap();
        let keys: Vec<_> = rows.iter().map(|(k, _)| k.as_slice()).collect();
        assert_eq!(keys, vec![&b"a:2"[..], b"a:3"]);
    }

    #[test]
    fn test_scan_limit() {
        let store = filled();
        let rows = store.scan_prefix(b"a:", None, 2).unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_batch_applies_all_pairs() {
        let store = MemoryStore::new();
        store
            .batch_write(vec![
                (b"x".to_vec(), b"1".to_vec()),
                (b"y".to_vec(), b"2".to_vec()),
            ])
            .unwrap();
        assert_eq!(store.get(b"x").unwrap(), Some(b"1".to_vec()));
        assert_eq!(store.get(b"y").unwrap(), Some(b"2".to_vec()));
    }
}
