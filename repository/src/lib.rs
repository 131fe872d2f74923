//! Dual-store repositories for blocks, transactions and messages.
//!
//! Every entity family follows the same pattern:
//!
//! - `create_tables` creates the analytical table, the relational table and
//!   its secondary indexes; it is idempotent.
//! - `add_*` inserts a batch into the analytical store first and then into
//!   the relational store inside the caller's transaction. An empty batch
//!   touches neither store.
//!
//! There is no cross-store atomicity. If the analytical insert fails nothing
//! reaches the relational store. If the relational insert fails the caller
//! rolls its transaction back, but the analytical rows stay until the block is
//! indexed again; re-insertion replaces them, so retries are safe. The
//! relational store is authoritative.

pub mod block;
pub mod keys;
pub mod message;
pub mod query;
pub mod schema;
pub mod transaction;

mod row;

use std::sync::Arc;

use tonidx_store::{AnalyticalStore, RelationalStore, StoreError};

pub use block::BlockRepository;
pub use message::MessageRepository;
pub use query::{BlockQuery, EagerLoad, Predicate, Relation, Scope};
pub use transaction::{SourceTxLookup, TransactionRepository};

/// Bootstrap every entity family's tables and indexes in both stores.
pub fn create_all_tables<A: AnalyticalStore, R: RelationalStore>(
    analytical: Arc<A>,
    relational: Arc<R>,
) -> Result<(), StoreError> {
    Repositories::new(analytical, relational).create_tables()
}

/// The repositories of every entity family, sharing one pair of stores.
pub struct Repositories<A, R> {
    pub blocks: BlockRepository<A, R>,
    pub transactions: TransactionRepository<A, R>,
    pub messages: MessageRepository<A, R>,
    relational: Arc<R>,
}

impl<A: AnalyticalStore, R: RelationalStore> Repositories<A, R> {
    pub fn new(analytical: Arc<A>, relational: Arc<R>) -> Self {
        Self {
            blocks: BlockRepository::new(analytical.clone(), relational.clone()),
            transactions: TransactionRepository::new(analytical.clone(), relational.clone()),
            messages: MessageRepository::new(analytical, relational.clone()),
            relational,
        }
    }

    /// Bootstrap the schema of every entity family in both stores.
    pub fn create_tables(&self) -> Result<(), StoreError> {
        self.blocks.create_tables()?;
        self.transactions.create_tables()?;
        self.messages.create_tables()?;
        tracing::debug!("schema bootstrap complete");
        Ok(())
    }

    /// The relational store, for opening the per-block write transaction.
    pub fn relational(&self) -> &R {
        &self.relational
    }
}
