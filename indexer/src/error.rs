use thiserror::Error;
use tonidx_abi::AbiError;
use tonidx_store::StoreError;
use tonidx_types::Hash256;

/// Failure reported by the node client.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct SourceError(pub String);

#[derive(Debug, Error)]
pub enum IndexerError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("get source msg hash (tx_hash = {tx_hash}, created_lt = {created_lt}): {source}")]
    Lookup {
        tx_hash: Hash256,
        created_lt: u64,
        #[source]
        source: StoreError,
    },

    #[error("parse operation (tx_hash = {tx_hash}, msg_hash = {msg_hash}): {source}")]
    Decode {
        tx_hash: Hash256,
        msg_hash: Hash256,
        #[source]
        source: AbiError,
    },

    #[error("map message (tx_hash = {tx_hash}): {reason}")]
    MapMessage { tx_hash: Hash256, reason: String },

    #[error("node client error: {0}")]
    Source(#[from] SourceError),

    #[error("indexing cancelled")]
    Cancelled,

    #[error("config error: {0}")]
    Config(String),
}
