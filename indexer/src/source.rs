//! Node client boundary.

use std::future::Future;

use tonidx_types::{AccountState, Address, BlockId};

use crate::raw::{RawBlock, RawTransaction};
use crate::SourceError;

/// Supplies raw chain data. Implemented by the node client.
pub trait BlockSource {
    /// Sequence number of the newest master block known to the node.
    fn last_master_seq_no(&self) -> impl Future<Output = Result<u32, SourceError>> + Send;

    fn master_block(&self, seq_no: u32)
        -> impl Future<Output = Result<RawBlock, SourceError>> + Send;

    /// Shard blocks committed in the given master block.
    fn shard_blocks(
        &self,
        master: &BlockId,
    ) -> impl Future<Output = Result<Vec<RawBlock>, SourceError>> + Send;

    fn block_transactions(
        &self,
        block: &BlockId,
    ) -> impl Future<Output = Result<Vec<RawTransaction>, SourceError>> + Send;

    /// Account states as of the given block. Unknown accounts are omitted.
    fn account_states(
        &self,
        block: &BlockId,
        addresses: &[Address],
    ) -> impl Future<Output = Result<Vec<AccountState>, SourceError>> + Send;
}
