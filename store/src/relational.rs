//! Relational store traits.

use crate::{Row, StoreError};

/// A secondary index over one column of a table.
///
/// In key/value backends an index is its own table whose keys start with the
/// indexed column value; [`IndexSpec::table_name`] gives its name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IndexSpec {
    pub table: &'static str,
    pub column: &'static str,
}

impl IndexSpec {
    pub const fn new(table: &'static str, column: &'static str) -> Self {
        Self { table, column }
    }

    pub fn table_name(&self) -> String {
        format!("{}_{}_idx", self.table, self.column)
    }
}

/// Transactional, relation-aware store.
///
/// All writes go through a [`RelationalTxn`]. Callers write every entity
/// family of one block under the same transaction and commit once, which
/// makes the block, its transactions and its messages visible atomically.
pub trait RelationalStore {
    type Txn<'a>: RelationalTxn
    where
        Self: 'a;

    /// Create a table if it does not exist yet.
    fn create_table(&self, table: &str) -> Result<(), StoreError>;

    /// Create a secondary index if it does not exist yet.
    fn create_index(&self, index: &IndexSpec) -> Result<(), StoreError>;

    /// Begin a write transaction. Only one may be open at a time.
    fn begin(&self) -> Result<Self::Txn<'_>, StoreError>;

    fn get(&self, table: &str, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError>;

    /// All rows whose key starts with `prefix`, in key order.
    fn scan_prefix(&self, table: &str, prefix: &[u8]) -> Result<Vec<Row>, StoreError>;
}

/// An open relational write transaction. Dropping it without calling
/// [`RelationalTxn::commit`] rolls every write back.
pub trait RelationalTxn {
    /// Insert a new row. Fails with [`StoreError::Duplicate`] if the key exists.
    fn insert(&mut self, table: &str, key: &[u8], value: &[u8]) -> Result<(), StoreError>;

    fn commit(self) -> Result<(), StoreError>;
}
