//! Message reconciliation engine.
//!
//! Turns the raw transactions of one block into [`Message`] records and
//! links every incoming internal message to the transaction whose outgoing
//! message produced it. Matching uses logical time only: within a block the
//! outgoing messages are indexed by `created_lt`, and anything not found
//! there is looked up in the already indexed data by
//! `(src, dst, created_lt)`.

use std::collections::HashMap;

use tonidx_abi::{OperationDecoder, PayloadError, PayloadParser};
use tonidx_repository::SourceTxLookup;
use tonidx_types::{AccountState, Address, Message, MessagePayload};

use crate::mapping::map_message;
use crate::provenance::{resolve_provenance, OutMsgIndex, Provenance};
use crate::raw::RawTransaction;
use crate::IndexerError;

/// Map and link the messages of one block.
///
/// Returns every outgoing message followed by every incoming one. A source
/// transaction that cannot be found is logged and leaves `source_tx_hash`
/// empty; it never fails the block.
pub fn process_block_messages<L, D>(
    lookup: &L,
    decoder: &D,
    transactions: &[RawTransaction],
) -> Result<Vec<Message>, IndexerError>
where
    L: SourceTxLookup + ?Sized,
    D: OperationDecoder + ?Sized,
{
    let mut out_messages = Vec::new();
    let mut index = OutMsgIndex::new();

    for tx in transactions {
        for raw in &tx.out_msgs {
            let mut msg = map_message(false, tx, raw)?;
            decode_operation(decoder, &mut msg)?;
            index.insert(&msg);
            out_messages.push(msg);
        }
    }

    let mut in_messages = Vec::new();
    for tx in transactions {
        let Some(raw) = &tx.in_msg else {
            continue;
        };
        let mut msg = map_message(true, tx, raw)?;

        let provenance =
            resolve_provenance(lookup, &index, &msg).map_err(|source| IndexerError::Lookup {
                tx_hash: tx.hash,
                created_lt: msg.created_lt,
                source,
            })?;
        if provenance == Provenance::Missing {
            tracing::error!(
                tx_hash = %tx.hash,
                created_lt = msg.created_lt,
                "cannot get source msg hash"
            );
        }
        msg.source_tx_hash = provenance.source_tx_hash();

        decode_operation(decoder, &mut msg)?;
        in_messages.push(msg);
    }

    tracing::debug!(
        out_messages = out_messages.len(),
        in_messages = in_messages.len(),
        "block messages reconciled"
    );
    out_messages.extend(in_messages);
    Ok(out_messages)
}

fn decode_operation<D: OperationDecoder + ?Sized>(
    decoder: &D,
    msg: &mut Message,
) -> Result<(), IndexerError> {
    decoder
        .parse_operation_id(msg)
        .map_err(|source| IndexerError::Decode {
            tx_hash: msg.tx_hash,
            msg_hash: msg.body_hash,
            source,
        })
}

/// Result of decoding one message payload.
#[derive(Clone, Debug, PartialEq)]
pub enum PayloadOutcome {
    Decoded(MessagePayload),
    /// Not an internal message, an account is unknown, or no schema applies.
    Skipped,
    /// A schema applies but the body does not fit it. Logged and dropped.
    Undecodable(PayloadError),
}

/// Decode the payload of every internal message whose accounts are known.
///
/// Payloads are never persisted, so a body that does not decode only loses
/// its own payload.
pub fn parse_message_payloads<P: PayloadParser + ?Sized>(
    parser: &P,
    messages: &[Message],
    accounts: &HashMap<Address, AccountState>,
) -> Vec<MessagePayload> {
    messages
        .iter()
        .filter_map(|msg| match parse_message_payload(parser, msg, accounts) {
            PayloadOutcome::Decoded(payload) => Some(payload),
            PayloadOutcome::Skipped | PayloadOutcome::Undecodable(_) => None,
        })
        .collect()
}

pub fn parse_message_payload<P: PayloadParser + ?Sized>(
    parser: &P,
    msg: &Message,
    accounts: &HashMap<Address, AccountState>,
) -> PayloadOutcome {
    if !msg.kind.is_internal() {
        return PayloadOutcome::Skipped;
    }

    let src = msg.src_address.as_ref().and_then(|addr| accounts.get(addr));
    let Some(src) = src else {
        tracing::debug!(src_addr = ?msg.src_address, "cannot find src account");
        return PayloadOutcome::Skipped;
    };
    let dst = msg.dst_address.as_ref().and_then(|addr| accounts.get(addr));
    let Some(dst) = dst else {
        tracing::debug!(dst_addr = ?msg.dst_address, "cannot find dst account");
        return PayloadOutcome::Skipped;
    };

    match parser.parse_message_payload(src, dst, msg) {
        Ok(payload) => PayloadOutcome::Decoded(payload),
        Err(e) if e.is_not_available() => PayloadOutcome::Skipped,
        Err(e) => {
            tracing::error!(
                tx_hash = %msg.tx_hash,
                msg_hash = %msg.body_hash,
                error = %e,
                "parse message payload"
            );
            PayloadOutcome::Undecodable(e)
        }
    }
}
