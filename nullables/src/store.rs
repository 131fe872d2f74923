//! Nullable stores: thread-safe in-memory backends for testing.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use tonidx_store::{AnalyticalStore, IndexSpec, RelationalStore, RelationalTxn, Row, StoreError};

type Table = BTreeMap<Vec<u8>, Vec<u8>>;

fn scan(table: &Table, prefix: &[u8]) -> Vec<Row> {
    table
        .range(prefix.to_vec()..)
        .take_while(|(key, _)| key.starts_with(prefix))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

/// An in-memory analytical store. Inserts replace existing rows.
#[derive(Default)]
pub struct NullAnalyticalStore {
    tables: Mutex<HashMap<String, Table>>,
    inserts: AtomicUsize,
    fail_inserts: AtomicBool,
}

impl NullAnalyticalStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following `insert` fail with a backend error.
    pub fn fail_inserts(&self, fail: bool) {
        self.fail_inserts.store(fail, Ordering::SeqCst);
    }

    /// Number of `insert` calls made so far, failed ones included.
    pub fn insert_calls(&self) -> usize {
        self.inserts.load(Ordering::SeqCst)
    }

    pub fn row_count(&self, table: &str) -> usize {
        self.tables
            .lock()
            .unwrap()
            .get(table)
            .map_or(0, BTreeMap::len)
    }
}

impl AnalyticalStore for NullAnalyticalStore {
    fn create_table(&self, table: &str) -> Result<(), StoreError> {
        self.tables
            .lock()
            .unwrap()
            .entry(table.to_string())
            .or_default();
        Ok(())
    }

    fn insert(&self, table: &str, rows: &[Row]) -> Result<(), StoreError> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("analytical store unavailable".to_string()));
        }
        let mut tables = self.tables.lock().unwrap();
        let rows_table = tables
            .get_mut(table)
            .ok_or_else(|| StoreError::UnknownTable(table.to_string()))?;
        for (key, value) in rows {
            rows_table.insert(key.clone(), value.clone());
        }
        Ok(())
    }

    fn last_with_prefix(&self, table: &str, prefix: &[u8]) -> Result<Option<Row>, StoreError> {
        let tables = self.tables.lock().unwrap();
        let rows = tables
            .get(table)
            .ok_or_else(|| StoreError::UnknownTable(table.to_string()))?;
        Ok(scan(rows, prefix).pop())
    }

    fn scan_prefix(&self, table: &str, prefix: &[u8]) -> Result<Vec<Row>, StoreError> {
        let tables = self.tables.lock().unwrap();
        let rows = tables
            .get(table)
            .ok_or_else(|| StoreError::UnknownTable(table.to_string()))?;
        Ok(scan(rows, prefix))
    }
}

/// An in-memory relational store. Transactions stage their writes and apply
/// them on commit; a dropped transaction leaves no trace.
#[derive(Default)]
pub struct NullRelationalStore {
    tables: Mutex<HashMap<String, Table>>,
    begins: AtomicUsize,
    commits: AtomicUsize,
    inserts: AtomicUsize,
}

impl NullRelationalStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_calls(&self) -> usize {
        self.begins.load(Ordering::SeqCst)
    }

    pub fn commit_calls(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }

    /// Number of `insert` calls made through any transaction.
    pub fn insert_calls(&self) -> usize {
        self.inserts.load(Ordering::SeqCst)
    }

    pub fn row_count(&self, table: &str) -> usize {
        self.tables
            .lock()
            .unwrap()
            .get(table)
            .map_or(0, BTreeMap::len)
    }

    fn contains(&self, table: &str, key: &[u8]) -> Result<bool, StoreError> {
        let tables = self.tables.lock().unwrap();
        let rows = tables
            .get(table)
            .ok_or_else(|| StoreError::UnknownTable(table.to_string()))?;
        Ok(rows.contains_key(key))
    }
}

impl RelationalStore for NullRelationalStore {
    type Txn<'a>
        = NullRelationalTxn<'a>
    where
        Self: 'a;

    fn create_table(&self, table: &str) -> Result<(), StoreError> {
        self.tables
            .lock()
            .unwrap()
            .entry(table.to_string())
            .or_default();
        Ok(())
    }

    fn create_index(&self, index: &IndexSpec) -> Result<(), StoreError> {
        self.create_table(&index.table_name())
    }

    fn begin(&self) -> Result<Self::Txn<'_>, StoreError> {
        self.begins.fetch_add(1, Ordering::SeqCst);
        Ok(NullRelationalTxn {
            store: self,
            staged: Vec::new(),
        })
    }

    fn get(&self, table: &str, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        let tables = self.tables.lock().unwrap();
        let rows = tables
            .get(table)
            .ok_or_else(|| StoreError::UnknownTable(table.to_string()))?;
        Ok(rows.get(key).cloned())
    }

    fn scan_prefix(&self, table: &str, prefix: &[u8]) -> Result<Vec<Row>, StoreError> {
        let tables = self.tables.lock().unwrap();
        let rows = tables
            .get(table)
            .ok_or_else(|| StoreError::UnknownTable(table.to_string()))?;
        Ok(scan(rows, prefix))
    }
}

pub struct NullRelationalTxn<'a> {
    store: &'a NullRelationalStore,
    staged: Vec<(String, Vec<u8>, Vec<u8>)>,
}

impl RelationalTxn for NullRelationalTxn<'_> {
    fn insert(&mut self, table: &str, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        self.store.inserts.fetch_add(1, Ordering::SeqCst);
        let staged = self
            .staged
            .iter()
            .any(|(t, k, _)| t == table && k.as_slice() == key);
        if staged || self.store.contains(table, key)? {
            return Err(StoreError::Duplicate {
                table: table.to_string(),
                key: hex::encode(key),
            });
        }
        self.staged
            .push((table.to_string(), key.to_vec(), value.to_vec()));
        Ok(())
    }

    fn commit(self) -> Result<(), StoreError> {
        self.store.commits.fetch_add(1, Ordering::SeqCst);
        let mut tables = self.store.tables.lock().unwrap();
        for (table, key, value) in self.staged {
            tables.entry(table).or_default().insert(key, value);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dropped_transaction_leaves_no_rows() {
        let store = NullRelationalStore::new();
        store.create_table("t").unwrap();
        {
            let mut txn = store.begin().unwrap();
            txn.insert("t", b"k", b"v").unwrap();
        }
        assert_eq!(store.row_count("t"), 0);
        assert_eq!(store.begin_calls(), 1);
        assert_eq!(store.commit_calls(), 0);
    }

    #[test]
    fn duplicate_within_one_transaction_is_rejected() {
        let store = NullRelationalStore::new();
        store.create_table("t").unwrap();
        let mut txn = store.begin().unwrap();
        txn.insert("t", b"k", b"v").unwrap();
        let err = txn.insert("t", b"k", b"w").unwrap_err();
        assert!(matches!(err, StoreError::Duplicate { ref key, .. } if key == "6b"));
    }

    #[test]
    fn failing_analytical_store_still_counts_calls() {
        let store = NullAnalyticalStore::new();
        store.create_table("t").unwrap();
        store.fail_inserts(true);
        assert!(store.insert("t", &[(b"k".to_vec(), b"v".to_vec())]).is_err());
        assert_eq!(store.insert_calls(), 1);
        assert_eq!(store.row_count("t"), 0);
    }

    #[test]
    fn last_with_prefix_respects_prefix() {
        let store = NullAnalyticalStore::new();
        store.create_table("t").unwrap();
        store
            .insert(
                "t",
                &[
                    (vec![1, 1], b"a".to_vec()),
                    (vec![1, 9], b"b".to_vec()),
                    (vec![2, 0], b"c".to_vec()),
                ],
            )
            .unwrap();
        let (key, _) = store.last_with_prefix("t", &[1]).unwrap().unwrap();
        assert_eq!(key, vec![1, 9]);
    }
}
