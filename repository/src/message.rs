//! Message repository.

use std::sync::Arc;

use tonidx_store::{AnalyticalStore, RelationalStore, RelationalTxn, StoreError};
use tonidx_types::{Hash256, Message};

use crate::schema::{MESSAGES, MESSAGES_BY_SOURCE};
use crate::{keys, row};

pub struct MessageRepository<A, R> {
    analytical: Arc<A>,
    relational: Arc<R>,
}

impl<A: AnalyticalStore, R: RelationalStore> MessageRepository<A, R> {
    pub fn new(analytical: Arc<A>, relational: Arc<R>) -> Self {
        Self {
            analytical,
            relational,
        }
    }

    pub fn create_tables(&self) -> Result<(), StoreError> {
        self.analytical
            .create_table(MESSAGES)
            .map_err(|e| e.context("message analytical create table"))?;
        self.relational
            .create_table(MESSAGES)
            .map_err(|e| e.context("message relational create table"))?;
        self.relational
            .create_index(&MESSAGES_BY_SOURCE)
            .map_err(|e| e.context("message source relational create index"))
    }

    /// Insert a batch into both stores. Outgoing internal messages are also
    /// registered in the source index used for cross-block provenance lookups.
    pub fn add_messages(&self, txn: &mut R::Txn<'_>, messages: &[Message]) -> Result<(), StoreError> {
        if messages.is_empty() {
            return Ok(());
        }

        let rows = messages
            .iter()
            .map(|msg| {
                Ok((
                    keys::message_pk(&msg.tx_hash, msg.incoming, msg.created_lt),
                    row::encode(msg)?,
                ))
            })
            .collect::<Result<Vec<_>, StoreError>>()?;
        self.analytical
            .insert(MESSAGES, &rows)
            .map_err(|e| e.context("message analytical insert"))?;

        let index = MESSAGES_BY_SOURCE.table_name();
        for (msg, (key, value)) in messages.iter().zip(&rows) {
            txn.insert(MESSAGES, key, value).map_err(|e| {
                e.context(format!(
                    "message relational insert (tx_hash = {}, msg_hash = {})",
                    msg.tx_hash, msg.body_hash
                ))
            })?;

            if msg.incoming || !msg.kind.is_internal() {
                continue;
            }
            if let (Some(src), Some(dst)) = (&msg.src_address, &msg.dst_address) {
                txn.insert(
                    &index,
                    &keys::message_by_source(src, dst, msg.created_lt),
                    msg.tx_hash.as_bytes(),
                )
                .map_err(|e| e.context("message source relational index insert"))?;
            }
        }
        Ok(())
    }

    /// Every message of one transaction: outgoing ones first, by logical time.
    pub fn get_transaction_messages(&self, tx_hash: &Hash256) -> Result<Vec<Message>, StoreError> {
        load_messages(self.relational.as_ref(), tx_hash, None)
    }
}

pub(crate) fn load_messages<R: RelationalStore>(
    relational: &R,
    tx_hash: &Hash256,
    incoming: Option<bool>,
) -> Result<Vec<Message>, StoreError> {
    relational
        .scan_prefix(MESSAGES, &keys::message_prefix(tx_hash, incoming))?
        .into_iter()
        .map(|(_, value)| row::decode(&value))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Repositories;
    use tonidx_nullables::{NullAnalyticalStore, NullRelationalStore};
    use tonidx_types::{Address, MessageType};

    fn message(incoming: bool, lt: u64) -> Message {
        Message {
            kind: if incoming {
                MessageType::ExternalIn
            } else {
                MessageType::ExternalOut
            },
            incoming,
            tx_hash: Hash256::new([7; 32]),
            tx_address: Address::new(0, [7; 32]),
            source_tx_hash: None,
            src_address: None,
            dst_address: None,
            bounce: false,
            bounced: false,
            amount: 0,
            ihr_fee: 0,
            fwd_fee: 0,
            import_fee: 0,
            created_lt: lt,
            created_at: 0,
            body_hash: Hash256::ZERO,
            body: vec![1, 2, 3],
            operation_id: None,
            transfer_comment: None,
        }
    }

    #[test]
    fn transaction_messages_group_by_direction() {
        let analytical = Arc::new(NullAnalyticalStore::new());
        let relational = Arc::new(NullRelationalStore::new());
        let repos = Repositories::new(analytical.clone(), relational.clone());
        repos.create_tables().unwrap();

        let batch = [message(false, 12), message(true, 5), message(false, 11)];
        let mut txn = relational.begin().unwrap();
        repos.messages.add_messages(&mut txn, &batch).unwrap();
        txn.commit().unwrap();

        let stored = repos
            .messages
            .get_transaction_messages(&Hash256::new([7; 32]))
            .unwrap();
        let order: Vec<_> = stored.iter().map(|m| (m.incoming, m.created_lt)).collect();
        assert_eq!(order, vec![(false, 11), (false, 12), (true, 5)]);
        assert_eq!(analytical.row_count(MESSAGES), 3);

        let incoming = load_messages(relational.as_ref(), &Hash256::new([7; 32]), Some(true)).unwrap();
        assert_eq!(incoming, vec![batch[1].clone()]);
    }
}
