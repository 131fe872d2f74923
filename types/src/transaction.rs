//! Transactions.

use serde::{Deserialize, Serialize};

use crate::{Address, BlockId, Hash256, Message};

/// A transaction of one account, included in exactly one block.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub hash: Hash256,
    pub address: Address,
    pub block_id: BlockId,

    pub created_lt: u64,
    pub created_at: u32,
    pub prev_tx_hash: Hash256,
    pub prev_tx_lt: u64,
    pub total_fees: u64,

    /// Relation, filled by eager loading only.
    #[serde(default)]
    pub in_msg: Option<Box<Message>>,
    /// Relation, filled by eager loading only.
    #[serde(default)]
    pub out_msgs: Vec<Message>,
}
