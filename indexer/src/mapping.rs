//! Mapping of node client records into the entity model.

use sha2::{Digest, Sha256};
use tonidx_types::{Block, BlockId, Hash256, Message, MessageType, Transaction};

use crate::raw::{RawBlock, RawMessage, RawMessageInfo, RawTransaction};
use crate::IndexerError;

pub fn map_block(raw: &RawBlock) -> Block {
    Block {
        id: raw.id,
        file_hash: raw.file_hash,
        root_hash: raw.root_hash,
        master_id: raw.master_id,
        gen_utime: raw.gen_utime,
        master: None,
        shards: Vec::new(),
        transactions: Vec::new(),
    }
}

/// Map a transaction without its messages; those come from the
/// reconciliation pass.
pub fn map_transaction(block_id: BlockId, raw: &RawTransaction) -> Transaction {
    Transaction {
        hash: raw.hash,
        address: raw.address,
        block_id,
        created_lt: raw.created_lt,
        created_at: raw.created_at,
        prev_tx_hash: raw.prev_tx_hash,
        prev_tx_lt: raw.prev_tx_lt,
        total_fees: raw.total_fees,
        in_msg: None,
        out_msgs: Vec::new(),
    }
}

/// SHA-256 of a message body.
pub fn body_hash(body: &[u8]) -> Hash256 {
    let mut hasher = Sha256::new();
    hasher.update(body);
    let mut output = [0u8; 32];
    output.copy_from_slice(&hasher.finalize());
    Hash256::new(output)
}

/// Map one message of `tx` as seen from the owning transaction.
///
/// External-in messages can only be incoming and external-out messages only
/// outgoing; anything else is a mapping error.
pub fn map_message(
    incoming: bool,
    tx: &RawTransaction,
    raw: &RawMessage,
) -> Result<Message, IndexerError> {
    let mut msg = Message {
        kind: MessageType::Internal,
        incoming,
        tx_hash: tx.hash,
        tx_address: tx.address,
        source_tx_hash: None,
        src_address: None,
        dst_address: None,
        bounce: false,
        bounced: false,
        amount: 0,
        ihr_fee: 0,
        fwd_fee: 0,
        import_fee: 0,
        created_lt: 0,
        created_at: 0,
        body_hash: body_hash(&raw.body),
        body: raw.body.clone(),
        operation_id: None,
        transfer_comment: None,
    };

    match &raw.info {
        RawMessageInfo::Internal {
            src,
            dst,
            bounce,
            bounced,
            amount,
            ihr_fee,
            fwd_fee,
            created_lt,
            created_at,
        } => {
            msg.src_address = Some(*src);
            msg.dst_address = Some(*dst);
            msg.bounce = *bounce;
            msg.bounced = *bounced;
            msg.amount = *amount;
            msg.ihr_fee = *ihr_fee;
            msg.fwd_fee = *fwd_fee;
            msg.created_lt = *created_lt;
            msg.created_at = *created_at;
        }
        RawMessageInfo::ExternalIn {
            src,
            dst,
            import_fee,
        } => {
            if !incoming {
                return Err(IndexerError::MapMessage {
                    tx_hash: tx.hash,
                    reason: "external in message cannot be outgoing".to_string(),
                });
            }
            msg.kind = MessageType::ExternalIn;
            msg.src_address = *src;
            msg.dst_address = Some(*dst);
            msg.import_fee = *import_fee;
            msg.created_lt = tx.created_lt;
            msg.created_at = tx.created_at;
        }
        RawMessageInfo::ExternalOut {
            src,
            dst,
            created_lt,
            created_at,
        } => {
            if incoming {
                return Err(IndexerError::MapMessage {
                    tx_hash: tx.hash,
                    reason: "external out message cannot be incoming".to_string(),
                });
            }
            msg.kind = MessageType::ExternalOut;
            msg.src_address = Some(*src);
            msg.dst_address = *dst;
            msg.created_lt = *created_lt;
            msg.created_at = *created_at;
        }
    }
    Ok(msg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tonidx_types::Address;

    fn tx() -> RawTransaction {
        RawTransaction {
            hash: Hash256::new([1; 32]),
            address: Address::new(0, [1; 32]),
            created_lt: 500,
            created_at: 1_700_000_000,
            prev_tx_hash: Hash256::ZERO,
            prev_tx_lt: 0,
            total_fees: 0,
            in_msg: None,
            out_msgs: Vec::new(),
        }
    }

    #[test]
    fn external_in_takes_transaction_time() {
        let raw = RawMessage {
            info: RawMessageInfo::ExternalIn {
                src: None,
                dst: Address::new(0, [1; 32]),
                import_fee: 3,
            },
            body: vec![1, 2, 3],
        };
        let msg = map_message(true, &tx(), &raw).unwrap();
        assert_eq!(msg.kind, MessageType::ExternalIn);
        assert_eq!(msg.created_lt, 500);
        assert_eq!(msg.import_fee, 3);
        assert_eq!(msg.body_hash, body_hash(&[1, 2, 3]));
    }

    #[test]
    fn direction_mismatch_is_rejected() {
        let raw = RawMessage {
            info: RawMessageInfo::ExternalIn {
                src: None,
                dst: Address::new(0, [1; 32]),
                import_fee: 0,
            },
            body: Vec::new(),
        };
        assert!(matches!(
            map_message(false, &tx(), &raw),
            Err(IndexerError::MapMessage { .. })
        ));

        let raw = RawMessage {
            info: RawMessageInfo::ExternalOut {
                src: Address::new(0, [1; 32]),
                dst: None,
                created_lt: 501,
                created_at: 0,
            },
            body: Vec::new(),
        };
        assert!(matches!(
            map_message(true, &tx(), &raw),
            Err(IndexerError::MapMessage { .. })
        ));
    }

    #[test]
    fn body_hash_is_sha256() {
        assert_eq!(
            body_hash(b"").to_string(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
