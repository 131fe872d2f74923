//! LMDB implementation of [`AnalyticalStore`].
//!
//! Each insert batch runs in its own short write transaction, so from the
//! caller's point of view the store has no transaction concept. `put` on an
//! existing key overwrites it, which gives keep-the-latest deduplication.

use std::path::Path;

use tonidx_store::{AnalyticalStore, Row, StoreError};

use crate::environment::collect_prefix;
use crate::{LmdbEnvironment, LmdbError};

const MAX_TABLES: u32 = 32;

pub struct LmdbAnalyticalStore {
    env: LmdbEnvironment,
}

impl LmdbAnalyticalStore {
    pub fn open(path: &Path, map_size: usize) -> Result<Self, LmdbError> {
        Ok(Self {
            env: LmdbEnvironment::open(path, MAX_TABLES, map_size)?,
        })
    }

    pub fn environment(&self) -> &LmdbEnvironment {
        &self.env
    }
}

impl AnalyticalStore for LmdbAnalyticalStore {
    fn create_table(&self, table: &str) -> Result<(), StoreError> {
        self.env.create_table(table)
    }

    fn insert(&self, table: &str, rows: &[Row]) -> Result<(), StoreError> {
        let db = self.env.table(table)?;
        let mut wtxn = self.env.env().write_txn().map_err(LmdbError::from)?;
        for (key, value) in rows {
            db.put(&mut wtxn, key, value).map_err(LmdbError::from)?;
        }
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn last_with_prefix(&self, table: &str, prefix: &[u8]) -> Result<Option<Row>, StoreError> {
        let db = self.env.table(table)?;
        let rtxn = self.env.env().read_txn().map_err(LmdbError::from)?;
        // LMDB rejects empty range keys; an empty prefix means the last row overall.
        let last = if prefix.is_empty() {
            db.last(&rtxn).map_err(LmdbError::from)?.map(Ok)
        } else {
            db.rev_prefix_iter(&rtxn, prefix)
                .map_err(LmdbError::from)?
                .next()
        };
        match last {
            Some(entry) => {
                let (key, value) = entry.map_err(LmdbError::from)?;
                Ok(Some((key.to_vec(), value.to_vec())))
            }
            None => Ok(None),
        }
    }

    fn scan_prefix(&self, table: &str, prefix: &[u8]) -> Result<Vec<Row>, StoreError> {
        let db = self.env.table(table)?;
        let rtxn = self.env.env().read_txn().map_err(LmdbError::from)?;
        collect_prefix(&db, &rtxn, prefix)
    }
}
