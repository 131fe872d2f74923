//! Messages and decoded message payloads.

use serde::{Deserialize, Serialize};

use crate::{Address, Hash256};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageType {
    Internal,
    ExternalIn,
    ExternalOut,
}

impl MessageType {
    pub fn is_internal(self) -> bool {
        matches!(self, Self::Internal)
    }
}

/// A message as seen from the transaction that owns it.
///
/// The same on-chain internal message appears twice: once as an outgoing
/// message of the sending transaction and once as the incoming message of
/// the receiving one.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub kind: MessageType,
    pub incoming: bool,

    /// Owner transaction.
    pub tx_hash: Hash256,
    pub tx_address: Address,
    /// Transaction whose outgoing message produced this one. Only ever set on
    /// incoming internal messages.
    pub source_tx_hash: Option<Hash256>,

    pub src_address: Option<Address>,
    pub dst_address: Option<Address>,

    pub bounce: bool,
    pub bounced: bool,
    pub amount: u64,
    pub ihr_fee: u64,
    pub fwd_fee: u64,
    pub import_fee: u64,

    pub created_lt: u64,
    pub created_at: u32,

    pub body_hash: Hash256,
    pub body: Vec<u8>,

    pub operation_id: Option<u32>,
    pub transfer_comment: Option<String>,
}

/// Contract-level interpretation of a message body. Derived on demand, never
/// persisted by the indexer core.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MessagePayload {
    pub tx_hash: Hash256,
    pub body_hash: Hash256,
    pub created_lt: u64,

    pub src_address: Option<Address>,
    pub dst_address: Option<Address>,
    pub src_contract: Option<String>,
    pub dst_contract: Option<String>,

    pub operation_id: u32,
    pub operation_name: String,
    pub data: serde_json::Value,
}
