//! Table and index names shared by the repositories.

use tonidx_store::IndexSpec;

pub const BLOCKS: &str = "blocks";
pub const TRANSACTIONS: &str = "transactions";
pub const MESSAGES: &str = "messages";

/// `workchain|seq_no|shard` → block primary key.
pub const BLOCKS_BY_WORKCHAIN: IndexSpec = IndexSpec::new(BLOCKS, "workchain");
/// `master pk|shard pk` → empty.
pub const BLOCKS_BY_MASTER: IndexSpec = IndexSpec::new(BLOCKS, "master");
/// `block pk|lt|hash` → transaction hash.
pub const TRANSACTIONS_BY_BLOCK: IndexSpec = IndexSpec::new(TRANSACTIONS, "block");
/// `src|dst|created_lt` → hash of the transaction that sent the message.
pub const MESSAGES_BY_SOURCE: IndexSpec = IndexSpec::new(MESSAGES, "source");
