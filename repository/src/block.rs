//! Block repository.

use std::sync::Arc;

use tonidx_store::{AnalyticalStore, RelationalStore, RelationalTxn, StoreError};
use tonidx_types::{Block, BlockFilter, BlockId, MASTER_WORKCHAIN};

use crate::message::load_messages;
use crate::query::{BlockQuery, Predicate, Relation, Scope};
use crate::schema::{BLOCKS, BLOCKS_BY_MASTER, BLOCKS_BY_WORKCHAIN};
use crate::transaction::load_block_transactions;
use crate::{keys, row};

pub struct BlockRepository<A, R> {
    analytical: Arc<A>,
    relational: Arc<R>,
}

impl<A: AnalyticalStore, R: RelationalStore> BlockRepository<A, R> {
    pub fn new(analytical: Arc<A>, relational: Arc<R>) -> Self {
        Self {
            analytical,
            relational,
        }
    }

    pub fn create_tables(&self) -> Result<(), StoreError> {
        self.analytical
            .create_table(BLOCKS)
            .map_err(|e| e.context("block analytical create table"))?;
        self.relational
            .create_table(BLOCKS)
            .map_err(|e| e.context("block relational create table"))?;
        self.create_indexes()
    }

    fn create_indexes(&self) -> Result<(), StoreError> {
        self.relational
            .create_index(&BLOCKS_BY_WORKCHAIN)
            .map_err(|e| e.context("block workchain relational create index"))?;
        self.relational
            .create_index(&BLOCKS_BY_MASTER)
            .map_err(|e| e.context("block master relational create index"))
    }

    /// Most recent master block in the analytical store.
    ///
    /// Returns [`StoreError::NotFound`] when no master block is indexed yet.
    pub fn get_last_master_block(&self) -> Result<Block, StoreError> {
        let last = self
            .analytical
            .last_with_prefix(BLOCKS, &keys::workchain(MASTER_WORKCHAIN))
            .map_err(|e| e.context("block analytical select"))?;
        match last {
            Some((_, value)) => row::decode(&value),
            None => Err(StoreError::NotFound("last master block".to_string())),
        }
    }

    /// One block from the relational store, without relations.
    pub fn get_block(&self, id: &BlockId) -> Result<Block, StoreError> {
        self.find_block(id)?
            .ok_or_else(|| StoreError::NotFound(format!("block {id}")))
    }

    /// Insert a batch into both stores; see the crate docs for the failure policy.
    pub fn add_blocks(&self, txn: &mut R::Txn<'_>, blocks: &[Block]) -> Result<(), StoreError> {
        if blocks.is_empty() {
            return Ok(());
        }

        let values = blocks
            .iter()
            .map(|block| row::encode(&detached(block)))
            .collect::<Result<Vec<_>, _>>()?;

        let rows: Vec<_> = blocks
            .iter()
            .zip(&values)
            .map(|(block, value)| (keys::block_by_seq_no(&block.id).to_vec(), value.clone()))
            .collect();
        self.analytical
            .insert(BLOCKS, &rows)
            .map_err(|e| e.context("block analytical insert"))?;

        let by_workchain = BLOCKS_BY_WORKCHAIN.table_name();
        let by_master = BLOCKS_BY_MASTER.table_name();
        for (block, value) in blocks.iter().zip(&values) {
            let pk = keys::block_pk(&block.id);
            txn.insert(BLOCKS, &pk, value)
                .map_err(|e| e.context(format!("block relational insert (block = {})", block.id)))?;
            txn.insert(&by_workchain, &keys::block_by_seq_no(&block.id), &pk)
                .map_err(|e| e.context("block workchain relational index insert"))?;
            if let Some(master) = &block.master_id {
                txn.insert(&by_master, &keys::block_by_master(master, &block.id), &[])
                    .map_err(|e| e.context("block master relational index insert"))?;
            }
        }
        Ok(())
    }

    /// Blocks matching `filter`, newest first, with the requested relations
    /// loaded.
    pub fn get_blocks(
        &self,
        filter: &BlockFilter,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Block>, StoreError> {
        self.execute(&BlockQuery::build(filter, offset, limit))
    }

    pub fn execute(&self, query: &BlockQuery) -> Result<Vec<Block>, StoreError> {
        let mut blocks = self.select(query)?;
        blocks.retain(|block| query.matches(block));
        blocks.sort_by(|a, b| b.id.seq_no.cmp(&a.id.seq_no));

        let mut blocks: Vec<Block> = blocks
            .into_iter()
            .skip(query.offset)
            .take(query.limit)
            .collect();

        for relation in &query.relations {
            self.attach(&mut blocks, *relation)?;
        }
        Ok(blocks)
    }

    /// Candidate rows picked through the narrowest access path available.
    fn select(&self, query: &BlockQuery) -> Result<Vec<Block>, StoreError> {
        match query.narrowing() {
            Some(Predicate::Identity(id)) => Ok(self.find_block(id)?.into_iter().collect()),
            Some(Predicate::Workchain(wc)) => self
                .relational
                .scan_prefix(&BLOCKS_BY_WORKCHAIN.table_name(), &keys::workchain(*wc))?
                .into_iter()
                .map(|(_, pk)| self.load_by_pk(&pk))
                .collect(),
            _ => self
                .relational
                .scan_prefix(BLOCKS, &[])?
                .into_iter()
                .map(|(_, value)| row::decode(&value))
                .collect(),
        }
    }

    fn attach(&self, blocks: &mut [Block], relation: Relation) -> Result<(), StoreError> {
        match relation {
            Relation::Master => {
                for block in blocks.iter_mut() {
                    if let Some(master_id) = &block.master_id {
                        block.master = self.find_block(master_id)?.map(Box::new);
                    }
                }
                Ok(())
            }
            Relation::Shards => {
                for block in blocks.iter_mut() {
                    block.shards = self.load_shards(&block.id)?;
                }
                Ok(())
            }
            Relation::Transactions(scope) => for_each_in_scope(blocks, scope, |block| {
                block.transactions = load_block_transactions(self.relational.as_ref(), &block.id)?;
                Ok(())
            }),
            Relation::InMsg(scope) => for_each_in_scope(blocks, scope, |block| {
                for tx in &mut block.transactions {
                    tx.in_msg = load_messages(self.relational.as_ref(), &tx.hash, Some(true))?
                        .into_iter()
                        .next()
                        .map(Box::new);
                }
                Ok(())
            }),
            Relation::OutMsg(scope) => for_each_in_scope(blocks, scope, |block| {
                for tx in &mut block.transactions {
                    tx.out_msgs = load_messages(self.relational.as_ref(), &tx.hash, Some(false))?;
                }
                Ok(())
            }),
        }
    }

    fn find_block(&self, id: &BlockId) -> Result<Option<Block>, StoreError> {
        self.relational
            .get(BLOCKS, &keys::block_pk(id))?
            .map(|value| row::decode(&value))
            .transpose()
    }

    fn load_by_pk(&self, pk: &[u8]) -> Result<Block, StoreError> {
        let value = self.relational.get(BLOCKS, pk)?.ok_or_else(|| {
            StoreError::Corruption("dangling block index entry".to_string())
        })?;
        row::decode(&value)
    }

    fn load_shards(&self, master: &BlockId) -> Result<Vec<Block>, StoreError> {
        self.relational
            .scan_prefix(&BLOCKS_BY_MASTER.table_name(), &keys::block_pk(master))?
            .into_iter()
            .map(|(key, _)| self.load_by_pk(&key[keys::BLOCK_KEY_LEN..]))
            .collect()
    }
}

fn for_each_in_scope(
    blocks: &mut [Block],
    scope: Scope,
    mut f: impl FnMut(&mut Block) -> Result<(), StoreError>,
) -> Result<(), StoreError> {
    match scope {
        Scope::Root => blocks.iter_mut().try_for_each(f),
        Scope::Shards => blocks
            .iter_mut()
            .flat_map(|block| block.shards.iter_mut())
            .try_for_each(&mut f),
    }
}

fn detached(block: &Block) -> Block {
    Block {
        id: block.id,
        file_hash: block.file_hash,
        root_hash: block.root_hash,
        master_id: block.master_id,
        gen_utime: block.gen_utime,
        master: None,
        shards: Vec::new(),
        transactions: Vec::new(),
    }
}
