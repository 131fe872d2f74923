//! Provenance of incoming internal messages.

use std::collections::HashMap;

use tonidx_repository::SourceTxLookup;
use tonidx_store::StoreError;
use tonidx_types::{Hash256, Message};

/// Outgoing messages of the block being processed, keyed by logical time.
///
/// Scoped to one block; a later entry with the same logical time replaces
/// the earlier one.
#[derive(Debug, Default)]
pub struct OutMsgIndex {
    by_lt: HashMap<u64, Hash256>,
}

impl OutMsgIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, msg: &Message) {
        self.by_lt.insert(msg.created_lt, msg.tx_hash);
    }

    /// Owner transaction of the outgoing message created at `created_lt`.
    pub fn get(&self, created_lt: u64) -> Option<Hash256> {
        self.by_lt.get(&created_lt).copied()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Provenance {
    /// Outgoing or external message; nothing to link.
    NotApplicable,
    /// Produced by a transaction of the same block.
    InBlock(Hash256),
    /// Produced by an already indexed transaction of another block.
    External(Hash256),
    /// The source transaction is not indexed.
    Missing,
}

impl Provenance {
    pub fn source_tx_hash(self) -> Option<Hash256> {
        match self {
            Self::InBlock(hash) | Self::External(hash) => Some(hash),
            Self::NotApplicable | Self::Missing => None,
        }
    }
}

/// Find the transaction that produced `msg`.
///
/// The block-local index is consulted first; the lookup is only queried on
/// a miss. Lookup errors other than not-found are returned to the caller.
pub fn resolve_provenance<L: SourceTxLookup + ?Sized>(
    lookup: &L,
    index: &OutMsgIndex,
    msg: &Message,
) -> Result<Provenance, StoreError> {
    if !msg.incoming || !msg.kind.is_internal() {
        return Ok(Provenance::NotApplicable);
    }
    if let Some(hash) = index.get(msg.created_lt) {
        return Ok(Provenance::InBlock(hash));
    }
    let (Some(src), Some(dst)) = (&msg.src_address, &msg.dst_address) else {
        return Ok(Provenance::Missing);
    };
    match lookup.get_source_message_tx_hash(src, dst, msg.created_lt) {
        Ok(hash) => Ok(Provenance::External(hash)),
        Err(e) if e.is_not_found() => Ok(Provenance::Missing),
        Err(e) => Err(e),
    }
}
