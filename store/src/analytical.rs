//! Analytical store trait.

use crate::{Row, StoreError};

/// Append-optimized, deduplicating store.
///
/// Rows are ordered by key. Inserting a key that already exists replaces the
/// stored row (keep the latest inserted version), which makes re-inserting a
/// batch after a failed relational commit safe. There is no transaction
/// concept: every `insert` call is visible as soon as it returns.
pub trait AnalyticalStore {
    /// Create a table if it does not exist yet.
    fn create_table(&self, table: &str) -> Result<(), StoreError>;

    /// Insert (or replace) a batch of rows.
    fn insert(&self, table: &str, rows: &[Row]) -> Result<(), StoreError>;

    /// The row with the greatest key starting with `prefix`.
    fn last_with_prefix(&self, table: &str, prefix: &[u8]) -> Result<Option<Row>, StoreError>;

    /// All rows whose key starts with `prefix`, in key order.
    fn scan_prefix(&self, table: &str, prefix: &[u8]) -> Result<Vec<Row>, StoreError>;
}
