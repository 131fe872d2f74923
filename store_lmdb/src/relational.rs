//! LMDB implementation of [`RelationalStore`].
//!
//! A relational transaction is a single LMDB write transaction spanning every
//! table of the environment. LMDB allows one writer per environment, so an
//! open [`LmdbRelationalTxn`] also serializes writers.

use std::path::Path;

use heed::RwTxn;

use tonidx_store::{IndexSpec, RelationalStore, RelationalTxn, Row, StoreError};

use crate::environment::collect_prefix;
use crate::{LmdbEnvironment, LmdbError};

const MAX_TABLES: u32 = 32;
const META_TABLE: &str = "meta";
const SCHEMA_VERSION_KEY: &[u8] = b"schema_version";

pub struct LmdbRelationalStore {
    env: LmdbEnvironment,
}

impl LmdbRelationalStore {
    pub fn open(path: &Path, map_size: usize) -> Result<Self, LmdbError> {
        let env = LmdbEnvironment::open(path, MAX_TABLES, map_size)?;
        Ok(Self { env })
    }

    pub fn environment(&self) -> &LmdbEnvironment {
        &self.env
    }

    /// Stored schema version, `0` for a fresh database.
    pub fn schema_version(&self) -> Result<u32, StoreError> {
        let db = match self.env.table(META_TABLE) {
            Ok(db) => db,
            Err(StoreError::UnknownTable(_)) => return Ok(0),
            Err(e) => return Err(e),
        };
        let rtxn = self.env.env().read_txn().map_err(LmdbError::from)?;
        match db.get(&rtxn, SCHEMA_VERSION_KEY).map_err(LmdbError::from)? {
            Some(bytes) => {
                let arr: [u8; 4] = bytes.try_into().map_err(|_| {
                    StoreError::Corruption("schema_version has unexpected byte length".to_string())
                })?;
                Ok(u32::from_le_bytes(arr))
            }
            None => Ok(0),
        }
    }

    pub fn set_schema_version(&self, version: u32) -> Result<(), StoreError> {
        self.env.create_table(META_TABLE)?;
        let db = self.env.table(META_TABLE)?;
        let mut wtxn = self.env.env().write_txn().map_err(LmdbError::from)?;
        db.put(&mut wtxn, SCHEMA_VERSION_KEY, &version.to_le_bytes())
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }
}

impl RelationalStore for LmdbRelationalStore {
    type Txn<'a>
        = LmdbRelationalTxn<'a>
    where
        Self: 'a;

    fn create_table(&self, table: &str) -> Result<(), StoreError> {
        self.env.create_table(table)
    }

    fn create_index(&self, index: &IndexSpec) -> Result<(), StoreError> {
        self.env.create_table(&index.table_name())
    }

    fn begin(&self) -> Result<Self::Txn<'_>, StoreError> {
        let txn = self.env.env().write_txn().map_err(LmdbError::from)?;
        Ok(LmdbRelationalTxn { env: &self.env, txn })
    }

    fn get(&self, table: &str, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        let db = self.env.table(table)?;
        let rtxn = self.env.env().read_txn().map_err(LmdbError::from)?;
        let value = db.get(&rtxn, key).map_err(LmdbError::from)?;
        Ok(value.map(<[u8]>::to_vec))
    }

    fn scan_prefix(&self, table: &str, prefix: &[u8]) -> Result<Vec<Row>, StoreError> {
        let db = self.env.table(table)?;
        let rtxn = self.env.env().read_txn().map_err(LmdbError::from)?;
        collect_prefix(&db, &rtxn, prefix)
    }
}

/// An open relational write transaction. Dropping it aborts the underlying
/// LMDB transaction.
pub struct LmdbRelationalTxn<'a> {
    env: &'a LmdbEnvironment,
    txn: RwTxn<'a>,
}

impl RelationalTxn for LmdbRelationalTxn<'_> {
    fn insert(&mut self, table: &str, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        let db = self.env.table_in(&self.txn, table)?;
        if db.get(&self.txn, key).map_err(LmdbError::from)?.is_some() {
            return Err(StoreError::Duplicate {
                table: table.to_string(),
                key: hex::encode(key),
            });
        }
        db.put(&mut self.txn, key, value).map_err(LmdbError::from)?;
        Ok(())
    }

    fn commit(self) -> Result<(), StoreError> {
        self.txn.commit().map_err(LmdbError::from)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> (tempfile::TempDir, LmdbRelationalStore) {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = LmdbRelationalStore::open(dir.path(), 10 * 1024 * 1024).expect("open store");
        (dir, store)
    }

    #[test]
    fn committed_rows_are_visible() {
        let (_dir, store) = temp_store();
        store.create_table("blocks").expect("create");
        store
            .create_index(&IndexSpec::new("blocks", "workchain"))
            .expect("index");

        let mut txn = store.begin().expect("begin");
        txn.insert("blocks", b"b1", b"block").expect("insert");
        txn.insert("blocks_workchain_idx", b"w1b1", b"b1")
            .expect("insert index");
        txn.commit().expect("commit");

        assert_eq!(store.get("blocks", b"b1").expect("get"), Some(b"block".to_vec()));
        assert_eq!(store.scan_prefix("blocks_workchain_idx", b"w1").expect("scan").len(), 1);
    }

    #[test]
    fn dropped_txn_does_not_persist() {
        let (_dir, store) = temp_store();
        store.create_table("blocks").expect("create");

        {
            let mut txn = store.begin().expect("begin");
            txn.insert("blocks", b"b1", b"block").expect("insert");
        }

        assert_eq!(store.get("blocks", b"b1").expect("get"), None);
    }

    #[test]
    fn duplicate_insert_is_rejected() {
        let (_dir, store) = temp_store();
        store.create_table("blocks").expect("create");

        let mut txn = store.begin().expect("begin");
        txn.insert("blocks", b"b1", b"block").expect("insert");
        let err = txn.insert("blocks", b"b1", b"again").unwrap_err();
        assert!(matches!(err, StoreError::Duplicate { ref key, .. } if key == "6231"));
    }

    #[test]
    fn schema_version_defaults_to_zero() {
        let (_dir, store) = temp_store();
        assert_eq!(store.schema_version().expect("version"), 0);
        store.set_schema_version(3).expect("set");
        assert_eq!(store.schema_version().expect("version"), 3);
    }
}
