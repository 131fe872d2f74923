//! Account state snapshots.

use serde::{Deserialize, Serialize};

use crate::{Address, Hash256};

/// Account code/data snapshot supplied by the node client. Used as a lookup
/// table during payload decoding; never mutated by the indexer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountState {
    pub address: Address,
    pub balance: u64,
    pub last_tx_lt: u64,
    pub last_tx_hash: Hash256,
    pub code_hash: Option<Hash256>,
    pub data_hash: Option<Hash256>,
    /// Contract interfaces detected for this account, e.g. `jetton_wallet`.
    pub interfaces: Vec<String>,
}
