//! LMDB environment setup and table handle cache.

use std::collections::HashMap;
use std::path::Path;
use std::sync::RwLock;

use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions, RoTxn, RwTxn};

use tonidx_store::{Row, StoreError};

use crate::LmdbError;

pub(crate) type Table = Database<Bytes, Bytes>;

/// Wraps one LMDB environment and the handles of the named databases
/// (tables) opened in it.
pub struct LmdbEnvironment {
    env: Env,
    tables: RwLock<HashMap<String, Table>>,
}

impl LmdbEnvironment {
    /// Open or create an LMDB environment at the given path.
    pub fn open(path: &Path, max_dbs: u32, map_size: usize) -> Result<Self, LmdbError> {
        std::fs::create_dir_all(path)?;

        // SAFETY: the environment directory is owned by this process; nothing
        // else maps the same files while the indexer runs.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(max_dbs)
                .open(path)?
        };

        tracing::debug!(path = %path.display(), map_size, max_dbs, "opened LMDB environment");

        Ok(Self {
            env,
            tables: RwLock::new(HashMap::new()),
        })
    }

    pub fn env(&self) -> &Env {
        &self.env
    }

    /// Create a table if needed and remember its handle.
    pub(crate) fn create_table(&self, name: &str) -> Result<(), StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let table: Table = self
            .env
            .create_database(&mut wtxn, Some(name))
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;

        self.tables
            .write()
            .map_err(|_| LmdbError::Poisoned)?
            .insert(name.to_string(), table);
        Ok(())
    }

    fn cached(&self, name: &str) -> Result<Option<Table>, StoreError> {
        Ok(self
            .tables
            .read()
            .map_err(|_| LmdbError::Poisoned)?
            .get(name)
            .copied())
    }

    /// Handle of an existing table. Must not be called while a write
    /// transaction is open on this environment; use [`Self::table_in`] then.
    pub(crate) fn table(&self, name: &str) -> Result<Table, StoreError> {
        if let Some(table) = self.cached(name)? {
            return Ok(table);
        }

        // Handles opened in a committed write transaction stay valid for the
        // lifetime of the environment.
        let wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let table: Table = self
            .env
            .open_database(&wtxn, Some(name))
            .map_err(LmdbError::from)?
            .ok_or_else(|| StoreError::UnknownTable(name.to_string()))?;
        wtxn.commit().map_err(LmdbError::from)?;

        self.tables
            .write()
            .map_err(|_| LmdbError::Poisoned)?
            .insert(name.to_string(), table);
        Ok(table)
    }

    /// Handle of an existing table, opened inside an already running write
    /// transaction if it is not cached yet.
    pub(crate) fn table_in(&self, txn: &RwTxn<'_>, name: &str) -> Result<Table, StoreError> {
        if let Some(table) = self.cached(name)? {
            return Ok(table);
        }
        let rtxn: &RoTxn<'_> = txn;
        self.env
            .open_database(rtxn, Some(name))
            .map_err(LmdbError::from)?
            .ok_or_else(|| StoreError::UnknownTable(name.to_string()))
    }
}

/// Every row of `db` whose key starts with `prefix`, in key order.
pub(crate) fn collect_prefix(db: &Table, rtxn: &RoTxn<'_>, prefix: &[u8]) -> Result<Vec<Row>, StoreError> {
    let mut rows = Vec::new();
    if prefix.is_empty() {
        for entry in db.iter(rtxn).map_err(LmdbError::from)? {
            let (key, value) = entry.map_err(LmdbError::from)?;
            rows.push((key.to_vec(), value.to_vec()));
        }
    } else {
        for entry in db.prefix_iter(rtxn, prefix).map_err(LmdbError::from)? {
            let (key, value) = entry.map_err(LmdbError::from)?;
            rows.push((key.to_vec(), value.to_vec()));
        }
    }
    Ok(rows)
}
