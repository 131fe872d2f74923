//! Block ingestion service.

use std::collections::{BTreeSet, HashMap};
use std::time::Duration;

use tokio::sync::broadcast;
use tonidx_abi::{OperationIdDecoder, PayloadParser};
use tonidx_repository::Repositories;
use tonidx_store::{AnalyticalStore, RelationalStore, RelationalTxn};
use tonidx_types::{Address, Block, BlockId, Message, MessagePayload, Transaction};

use crate::config::IndexerConfig;
use crate::engine::{parse_message_payloads, process_block_messages};
use crate::mapping::{map_block, map_transaction};
use crate::raw::RawBlock;
use crate::source::BlockSource;
use crate::IndexerError;

/// Summary of one indexed block.
#[derive(Clone, Debug, PartialEq)]
pub struct IndexedBlock {
    pub block: Block,
    pub transactions: usize,
    pub messages: usize,
    /// Decoded payloads of the block's messages. Not persisted.
    pub payloads: Vec<MessagePayload>,
}

/// Pulls blocks from a [`BlockSource`] and writes them through the
/// repositories, one block per relational transaction.
pub struct IndexerService<A, R, S, P> {
    repos: Repositories<A, R>,
    source: S,
    parser: P,
    decoder: OperationIdDecoder,
    from_block: Option<u32>,
    poll_interval: Duration,
}

impl<A, R, S, P> IndexerService<A, R, S, P>
where
    A: AnalyticalStore,
    R: RelationalStore,
    S: BlockSource,
    P: PayloadParser,
{
    pub fn new(repos: Repositories<A, R>, source: S, parser: P, config: &IndexerConfig) -> Self {
        Self {
            repos,
            source,
            parser,
            decoder: OperationIdDecoder,
            from_block: config.from_block,
            poll_interval: Duration::from_millis(config.poll_interval_ms),
        }
    }

    pub fn repositories(&self) -> &Repositories<A, R> {
        &self.repos
    }

    /// Reconcile and persist one block.
    ///
    /// Block, transactions and messages are committed together; on error the
    /// relational transaction is rolled back.
    pub async fn index_block(&self, raw: &RawBlock) -> Result<IndexedBlock, IndexerError> {
        let raw_txs = self.source.block_transactions(&raw.id).await?;
        let messages = process_block_messages(&self.repos.transactions, &self.decoder, &raw_txs)?;

        let addresses = message_addresses(&messages);
        let accounts: HashMap<_, _> = if addresses.is_empty() {
            HashMap::new()
        } else {
            self.source
                .account_states(&raw.id, &addresses)
                .await?
                .into_iter()
                .map(|state| (state.address, state))
                .collect()
        };
        let payloads = parse_message_payloads(&self.parser, &messages, &accounts);

        let block = map_block(raw);
        let transactions: Vec<_> = raw_txs
            .iter()
            .map(|tx| map_transaction(raw.id, tx))
            .collect();
        self.write_block(&block, &transactions, &messages)?;

        tracing::info!(
            block = %block.id,
            transactions = transactions.len(),
            messages = messages.len(),
            payloads = payloads.len(),
            "block indexed"
        );
        Ok(IndexedBlock {
            block,
            transactions: transactions.len(),
            messages: messages.len(),
            payloads,
        })
    }

    fn write_block(
        &self,
        block: &Block,
        transactions: &[Transaction],
        messages: &[Message],
    ) -> Result<(), IndexerError> {
        let mut txn = self.repos.relational().begin()?;
        self.repos
            .blocks
            .add_blocks(&mut txn, std::slice::from_ref(block))?;
        self.repos.transactions.add_transactions(&mut txn, transactions)?;
        self.repos.messages.add_messages(&mut txn, messages)?;
        txn.commit()?;
        Ok(())
    }

    /// Index the shard blocks of a master block, then the master block.
    /// Shard blocks that are already indexed are skipped.
    pub async fn index_master_block(&self, seq_no: u32) -> Result<(), IndexerError> {
        let master = self.source.master_block(seq_no).await?;
        let shards = self.source.shard_blocks(&master.id).await?;
        for shard in &shards {
            if self.is_indexed(&shard.id)? {
                tracing::debug!(block = %shard.id, "shard block already indexed");
                continue;
            }
            self.index_block(shard).await?;
        }
        self.index_block(&master).await?;
        Ok(())
    }

    fn is_indexed(&self, id: &BlockId) -> Result<bool, IndexerError> {
        match self.repos.blocks.get_block(id) {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// First master block to index, if it follows from the stores or the
    /// configuration.
    fn resume_seq_no(&self) -> Result<Option<u32>, IndexerError> {
        let last = match self.repos.blocks.get_last_master_block() {
            Ok(last) => last,
            Err(e) if e.is_not_found() => return Ok(self.from_block),
            Err(e) => return Err(e.into()),
        };
        if self.is_indexed(&last.id)? {
            return Ok(Some(last.id.seq_no + 1));
        }
        tracing::warn!(
            block = %last.id,
            "last master block is missing from the relational store, indexing it again"
        );
        Ok(Some(last.id.seq_no))
    }

    /// Follow the chain until `shutdown` fires.
    ///
    /// Resumes after the last indexed master block, or at the configured
    /// start block, or at the newest master block when nothing is indexed.
    /// Always ends with [`IndexerError::Cancelled`] or the first failure.
    pub async fn run(&self, mut shutdown: broadcast::Receiver<()>) -> Result<(), IndexerError> {
        let mut next = match self.resume_seq_no()? {
            Some(seq_no) => seq_no,
            None => self.source.last_master_seq_no().await?,
        };
        tracing::info!(from_block = next, "indexer started");

        let mut interval = tokio::time::interval(self.poll_interval);
        loop {
            tokio::select! {
                biased;
                _ = shutdown.recv() => {
                    tracing::info!(next_block = next, "indexer shutting down");
                    return Err(IndexerError::Cancelled);
                }
                _ = interval.tick() => {}
            }

            let last = self.source.last_master_seq_no().await?;
            while next <= last {
                tokio::select! {
                    biased;
                    _ = shutdown.recv() => {
                        tracing::info!(next_block = next, "indexer shutting down");
                        return Err(IndexerError::Cancelled);
                    }
                    res = self.index_master_block(next) => res?,
                }
                next += 1;
            }
        }
    }
}

/// Distinct source and destination addresses of internal messages.
fn message_addresses(messages: &[Message]) -> Vec<Address> {
    messages
        .iter()
        .filter(|msg| msg.kind.is_internal())
        .flat_map(|msg| [msg.src_address, msg.dst_address])
        .flatten()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
