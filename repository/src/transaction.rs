//! Transaction repository and the source-transaction lookup.

use std::sync::Arc;

use tonidx_store::{AnalyticalStore, RelationalStore, RelationalTxn, StoreError};
use tonidx_types::{Address, BlockId, Hash256, Transaction};

use crate::schema::{MESSAGES_BY_SOURCE, TRANSACTIONS, TRANSACTIONS_BY_BLOCK};
use crate::{keys, row};

/// Finds the transaction whose outgoing message produced an incoming one.
///
/// Returns [`StoreError::NotFound`] when the source transaction has not been
/// indexed (yet), e.g. because it lives outside the indexing window.
pub trait SourceTxLookup {
    fn get_source_message_tx_hash(
        &self,
        src: &Address,
        dst: &Address,
        created_lt: u64,
    ) -> Result<Hash256, StoreError>;
}

pub struct TransactionRepository<A, R> {
    analytical: Arc<A>,
    relational: Arc<R>,
}

impl<A: AnalyticalStore, R: RelationalStore> TransactionRepository<A, R> {
    pub fn new(analytical: Arc<A>, relational: Arc<R>) -> Self {
        Self {
            analytical,
            relational,
        }
    }

    pub fn create_tables(&self) -> Result<(), StoreError> {
        self.analytical
            .create_table(TRANSACTIONS)
            .map_err(|e| e.context("transaction analytical create table"))?;
        self.relational
            .create_table(TRANSACTIONS)
            .map_err(|e| e.context("transaction relational create table"))?;
        self.relational
            .create_index(&TRANSACTIONS_BY_BLOCK)
            .map_err(|e| e.context("transaction block relational create index"))
    }

    /// Insert a batch into both stores; see the crate docs for the failure policy.
    pub fn add_transactions(
        &self,
        txn: &mut R::Txn<'_>,
        transactions: &[Transaction],
    ) -> Result<(), StoreError> {
        if transactions.is_empty() {
            return Ok(());
        }

        let values = transactions
            .iter()
            .map(|tx| row::encode(&detached(tx)))
            .collect::<Result<Vec<_>, _>>()?;

        let rows: Vec<_> = transactions
            .iter()
            .zip(&values)
            .map(|(tx, value)| {
                (
                    keys::transaction_by_seq_no(&tx.block_id, tx.created_lt, &tx.hash),
                    value.clone(),
                )
            })
            .collect();
        self.analytical
            .insert(TRANSACTIONS, &rows)
            .map_err(|e| e.context("transaction analytical insert"))?;

        let index = TRANSACTIONS_BY_BLOCK.table_name();
        for (tx, value) in transactions.iter().zip(&values) {
            txn.insert(TRANSACTIONS, tx.hash.as_bytes(), value)
                .map_err(|e| e.context(format!("transaction relational insert (tx_hash = {})", tx.hash)))?;
            txn.insert(
                &index,
                &keys::transaction_by_block(&tx.block_id, tx.created_lt, &tx.hash),
                tx.hash.as_bytes(),
            )
            .map_err(|e| e.context("transaction block relational index insert"))?;
        }
        Ok(())
    }

    pub fn get_transaction(&self, hash: &Hash256) -> Result<Transaction, StoreError> {
        let value = self
            .relational
            .get(TRANSACTIONS, hash.as_bytes())?
            .ok_or_else(|| StoreError::NotFound(format!("transaction {hash}")))?;
        row::decode(&value)
    }
}

impl<A: AnalyticalStore, R: RelationalStore> SourceTxLookup for TransactionRepository<A, R> {
    fn get_source_message_tx_hash(
        &self,
        src: &Address,
        dst: &Address,
        created_lt: u64,
    ) -> Result<Hash256, StoreError> {
        let key = keys::message_by_source(src, dst, created_lt);
        let value = self
            .relational
            .get(&MESSAGES_BY_SOURCE.table_name(), &key)?
            .ok_or_else(|| {
                StoreError::NotFound(format!(
                    "source transaction of message {src} -> {dst} (created_lt = {created_lt})"
                ))
            })?;
        Hash256::from_slice(&value).map_err(|e| StoreError::Corruption(e.to_string()))
    }
}

/// Transactions of one block in logical-time order.
pub(crate) fn load_block_transactions<R: RelationalStore>(
    relational: &R,
    block: &BlockId,
) -> Result<Vec<Transaction>, StoreError> {
    let index = TRANSACTIONS_BY_BLOCK.table_name();
    relational
        .scan_prefix(&index, &keys::block_pk(block))?
        .into_iter()
        .map(|(_, hash)| {
            let value = relational.get(TRANSACTIONS, &hash)?.ok_or_else(|| {
                StoreError::Corruption(format!("dangling transaction index entry in block {block}"))
            })?;
            row::decode(&value)
        })
        .collect()
}

fn detached(tx: &Transaction) -> Transaction {
    Transaction {
        hash: tx.hash,
        address: tx.address,
        block_id: tx.block_id,
        created_lt: tx.created_lt,
        created_at: tx.created_at,
        prev_tx_hash: tx.prev_tx_hash,
        prev_tx_lt: tx.prev_tx_lt,
        total_fees: tx.total_fees,
        in_msg: None,
        out_msgs: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Repositories;
    use tonidx_nullables::{NullAnalyticalStore, NullRelationalStore};
    use tonidx_types::{Message, MessageType};

    fn setup() -> (
        Arc<NullRelationalStore>,
        Repositories<NullAnalyticalStore, NullRelationalStore>,
    ) {
        let relational = Arc::new(NullRelationalStore::new());
        let repos = Repositories::new(Arc::new(NullAnalyticalStore::new()), relational.clone());
        repos.create_tables().expect("create tables");
        (relational, repos)
    }

    fn transaction(seed: u8, lt: u64) -> Transaction {
        Transaction {
            hash: Hash256::new([seed; 32]),
            address: Address::new(0, [seed; 32]),
            block_id: BlockId::new(0, 1 << 63, 5),
            created_lt: lt,
            created_at: 0,
            prev_tx_hash: Hash256::ZERO,
            prev_tx_lt: 0,
            total_fees: 0,
            in_msg: None,
            out_msgs: Vec::new(),
        }
    }

    fn outgoing(tx: &Transaction, dst: Address, lt: u64) -> Message {
        Message {
            kind: MessageType::Internal,
            incoming: false,
            tx_hash: tx.hash,
            tx_address: tx.address,
            source_tx_hash: None,
            src_address: Some(tx.address),
            dst_address: Some(dst),
            bounce: true,
            bounced: false,
            amount: 1,
            ihr_fee: 0,
            fwd_fee: 0,
            import_fee: 0,
            created_lt: lt,
            created_at: 0,
            body_hash: Hash256::ZERO,
            body: Vec::new(),
            operation_id: None,
            transfer_comment: None,
        }
    }

    #[test]
    fn source_lookup_finds_sending_transaction() {
        let (relational, repos) = setup();
        let sender = transaction(1, 10);
        let dst = Address::new(0, [9; 32]);

        let mut txn = relational.begin().unwrap();
        repos.transactions.add_transactions(&mut txn, &[sender.clone()]).unwrap();
        repos
            .messages
            .add_messages(&mut txn, &[outgoing(&sender, dst, 11)])
            .unwrap();
        txn.commit().unwrap();

        let found = repos
            .transactions
            .get_source_message_tx_hash(&sender.address, &dst, 11)
            .unwrap();
        assert_eq!(found, sender.hash);
    }

    #[test]
    fn source_lookup_misses_are_not_found() {
        let (_, repos) = setup();
        let err = repos
            .transactions
            .get_source_message_tx_hash(&Address::new(0, [1; 32]), &Address::new(0, [2; 32]), 7)
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn external_out_messages_are_not_indexed_as_sources() {
        let (relational, repos) = setup();
        let sender = transaction(1, 10);
        let dst = Address::new(0, [9; 32]);
        let mut msg = outgoing(&sender, dst, 11);
        msg.kind = MessageType::ExternalOut;

        let mut txn = relational.begin().unwrap();
        repos.messages.add_messages(&mut txn, &[msg]).unwrap();
        txn.commit().unwrap();

        let err = repos
            .transactions
            .get_source_message_tx_hash(&sender.address, &dst, 11)
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn stored_transactions_round_trip_without_relations() {
        let (relational, repos) = setup();
        let mut tx = transaction(3, 30);
        tx.out_msgs.push(outgoing(&tx, Address::new(0, [4; 32]), 31));

        let mut txn = relational.begin().unwrap();
        repos.transactions.add_transactions(&mut txn, &[tx.clone()]).unwrap();
        txn.commit().unwrap();

        let stored = repos.transactions.get_transaction(&tx.hash).unwrap();
        assert!(stored.out_msgs.is_empty());
        assert_eq!(stored.created_lt, 30);
        assert!(repos
            .transactions
            .get_transaction(&Hash256::new([0xee; 32]))
            .unwrap_err()
            .is_not_found());
    }

    #[test]
    fn block_transactions_load_in_lt_order() {
        let (relational, repos) = setup();
        let batch = [transaction(1, 30), transaction(2, 10), transaction(3, 20)];

        let mut txn = relational.begin().unwrap();
        repos.transactions.add_transactions(&mut txn, &batch).unwrap();
        txn.commit().unwrap();

        let lts: Vec<_> = load_block_transactions(relational.as_ref(), &batch[0].block_id)
            .unwrap()
            .into_iter()
            .map(|tx| tx.created_lt)
            .collect();
        assert_eq!(lts, vec![10, 20, 30]);
    }
}
