//! Reconciliation engine properties: in-block linking, cross-block lookups,
//! missing sources and payload decoding, driven through stub collaborators.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use tonidx_abi::{AbiError, OperationDecoder, OperationIdDecoder, OperationRegistry, PayloadError};
use tonidx_indexer::{
    parse_message_payload, parse_message_payloads, process_block_messages, IndexerError,
    PayloadOutcome, RawMessage, RawMessageInfo, RawTransaction,
};
use tonidx_repository::SourceTxLookup;
use tonidx_store::StoreError;
use tonidx_types::{AccountState, Address, Hash256, Message, MessageType};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Fails the test if the engine ever reaches for the repository.
struct PanickingLookup;

impl SourceTxLookup for PanickingLookup {
    fn get_source_message_tx_hash(&self, _: &Address, _: &Address, lt: u64) -> Result<Hash256, StoreError> {
        panic!("unexpected source lookup for lt {lt}");
    }
}

/// Answers from a fixed table and records every query.
#[derive(Default)]
struct TableLookup {
    sources: HashMap<(Address, Address, u64), Hash256>,
    calls: RefCell<Vec<u64>>,
}

impl SourceTxLookup for TableLookup {
    fn get_source_message_tx_hash(
        &self,
        src: &Address,
        dst: &Address,
        created_lt: u64,
    ) -> Result<Hash256, StoreError> {
        self.calls.borrow_mut().push(created_lt);
        self.sources
            .get(&(*src, *dst, created_lt))
            .copied()
            .ok_or_else(|| StoreError::NotFound(format!("source of lt {created_lt}")))
    }
}

struct BrokenLookup;

impl SourceTxLookup for BrokenLookup {
    fn get_source_message_tx_hash(&self, _: &Address, _: &Address, _: u64) -> Result<Hash256, StoreError> {
        Err(StoreError::Backend("disk on fire".to_string()))
    }
}

/// Counts decoded messages and delegates to the real decoder.
#[derive(Default)]
struct CountingDecoder {
    calls: Cell<usize>,
}

impl OperationDecoder for CountingDecoder {
    fn parse_operation_id(&self, msg: &mut Message) -> Result<(), AbiError> {
        self.calls.set(self.calls.get() + 1);
        OperationIdDecoder.parse_operation_id(msg)
    }
}

fn addr(seed: u8) -> Address {
    Address::new(0, [seed; 32])
}

fn internal(src: Address, dst: Address, lt: u64, body: Vec<u8>) -> RawMessage {
    RawMessage {
        info: RawMessageInfo::Internal {
            src,
            dst,
            bounce: true,
            bounced: false,
            amount: 1_000,
            ihr_fee: 0,
            fwd_fee: 1,
            created_lt: lt,
            created_at: 1_700_000_000,
        },
        body,
    }
}

fn tx(seed: u8, account: Address, lt: u64) -> RawTransaction {
    RawTransaction {
        hash: Hash256::new([seed; 32]),
        address: account,
        created_lt: lt,
        created_at: 1_700_000_000,
        prev_tx_hash: Hash256::ZERO,
        prev_tx_lt: 0,
        total_fees: 10,
        in_msg: None,
        out_msgs: Vec::new(),
    }
}

// ---------------------------------------------------------------------------
// Provenance
// ---------------------------------------------------------------------------

#[test]
fn in_block_source_is_linked_without_lookup() {
    let (a, b) = (addr(0xa), addr(0xb));
    let mut sender = tx(1, a, 40);
    sender.out_msgs.push(internal(a, b, 42, Vec::new()));
    let mut receiver = tx(2, b, 43);
    receiver.in_msg = Some(internal(a, b, 42, Vec::new()));

    let messages =
        process_block_messages(&PanickingLookup, &OperationIdDecoder, &[sender.clone(), receiver])
            .unwrap();

    assert_eq!(messages.len(), 2);
    assert!(!messages[0].incoming);
    assert_eq!(messages[0].source_tx_hash, None);
    assert!(messages[1].incoming);
    assert_eq!(messages[1].source_tx_hash, Some(sender.hash));
}

#[test]
fn in_block_link_ignores_transaction_order() {
    let (a, b) = (addr(0xa), addr(0xb));
    let mut receiver = tx(2, b, 43);
    receiver.in_msg = Some(internal(a, b, 42, Vec::new()));
    let mut sender = tx(1, a, 40);
    sender.out_msgs.push(internal(a, b, 42, Vec::new()));

    let messages =
        process_block_messages(&PanickingLookup, &OperationIdDecoder, &[receiver, sender.clone()])
            .unwrap();
    assert_eq!(messages[1].source_tx_hash, Some(sender.hash));
}

#[test]
fn cross_block_source_comes_from_lookup() {
    let (a, b) = (addr(0xa), addr(0xb));
    let earlier = Hash256::new([0xee; 32]);
    let lookup = TableLookup {
        sources: HashMap::from([((a, b, 7), earlier)]),
        ..TableLookup::default()
    };
    let mut receiver = tx(2, b, 43);
    receiver.in_msg = Some(internal(a, b, 7, Vec::new()));

    let messages = process_block_messages(&lookup, &OperationIdDecoder, &[receiver]).unwrap();
    assert_eq!(messages[0].source_tx_hash, Some(earlier));
    assert_eq!(*lookup.calls.borrow(), vec![7]);
}

#[test]
fn missing_source_does_not_fail_the_block() {
    let (a, b) = (addr(0xa), addr(0xb));
    let lookup = TableLookup::default();
    let mut receiver = tx(2, b, 43);
    receiver.in_msg = Some(internal(a, b, 9, Vec::new()));
    let mut other = tx(3, a, 50);
    other.out_msgs.push(internal(a, b, 51, Vec::new()));

    let messages = process_block_messages(&lookup, &OperationIdDecoder, &[receiver, other]).unwrap();
    assert_eq!(messages.len(), 2);
    let incoming = messages.iter().find(|m| m.incoming).unwrap();
    assert_eq!(incoming.source_tx_hash, None);
    assert_eq!(*lookup.calls.borrow(), vec![9]);
}

#[test]
fn other_lookup_errors_abort_with_context() {
    let (a, b) = (addr(0xa), addr(0xb));
    let mut receiver = tx(2, b, 43);
    receiver.in_msg = Some(internal(a, b, 9, Vec::new()));

    let err = process_block_messages(&BrokenLookup, &OperationIdDecoder, &[receiver.clone()])
        .unwrap_err();
    match err {
        IndexerError::Lookup {
            tx_hash,
            created_lt,
            ..
        } => {
            assert_eq!(tx_hash, receiver.hash);
            assert_eq!(created_lt, 9);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn outgoing_and_external_messages_never_carry_a_source() {
    let (a, b) = (addr(0xa), addr(0xb));
    let mut wallet = tx(1, a, 40);
    wallet.in_msg = Some(RawMessage {
        info: RawMessageInfo::ExternalIn {
            src: None,
            dst: a,
            import_fee: 0,
        },
        body: Vec::new(),
    });
    wallet.out_msgs.push(internal(a, b, 41, Vec::new()));
    wallet.out_msgs.push(RawMessage {
        info: RawMessageInfo::ExternalOut {
            src: a,
            dst: None,
            created_lt: 42,
            created_at: 0,
        },
        body: Vec::new(),
    });

    let messages = process_block_messages(&PanickingLookup, &OperationIdDecoder, &[wallet]).unwrap();
    assert_eq!(messages.len(), 3);
    assert!(messages.iter().all(|m| m.source_tx_hash.is_none()));
    assert_eq!(messages[2].kind, MessageType::ExternalIn);
}

#[test]
fn every_message_is_decoded_once() {
    let (a, b) = (addr(0xa), addr(0xb));
    let mut sender = tx(1, a, 40);
    sender.out_msgs.push(internal(a, b, 41, vec![0, 0, 0, 0, b'h', b'i']));
    sender.out_msgs.push(internal(a, b, 42, vec![0x12, 0x34, 0x56, 0x78]));
    let mut receiver = tx(2, b, 43);
    receiver.in_msg = Some(internal(a, b, 41, vec![0, 0, 0, 0, b'h', b'i']));

    let decoder = CountingDecoder::default();
    let messages = process_block_messages(&PanickingLookup, &decoder, &[sender, receiver]).unwrap();
    assert_eq!(decoder.calls.get(), 3);
    assert_eq!(messages[0].transfer_comment.as_deref(), Some("hi"));
    assert_eq!(messages[1].operation_id, Some(0x1234_5678));
    assert_eq!(messages[2].transfer_comment.as_deref(), Some("hi"));
}

#[test]
fn non_utf8_comment_does_not_fail_the_block() {
    let (a, b) = (addr(0xa), addr(0xb));
    let mut sender = tx(1, a, 40);
    sender.out_msgs.push(internal(a, b, 41, vec![0, 0, 0, 0, 0xff, 0xfe]));
    let mut receiver = tx(2, b, 43);
    receiver.in_msg = Some(internal(a, b, 41, vec![0, 0, 0, 0, 0xff, 0xfe]));

    let messages =
        process_block_messages(&PanickingLookup, &OperationIdDecoder, &[sender.clone(), receiver])
            .unwrap();
    assert_eq!(messages.len(), 2);
    for msg in &messages {
        assert_eq!(msg.operation_id, Some(0));
        assert_eq!(msg.transfer_comment, None);
    }
    assert_eq!(messages[1].source_tx_hash, Some(sender.hash));
}

/// Rejects every body, standing in for a decoder with stricter rules.
struct RejectingDecoder;

impl OperationDecoder for RejectingDecoder {
    fn parse_operation_id(&self, _: &mut Message) -> Result<(), AbiError> {
        Err(AbiError::Registry("operation tag rejected".to_string()))
    }
}

#[test]
fn decoder_failure_aborts_with_message_hash() {
    let (a, b) = (addr(0xa), addr(0xb));
    let mut sender = tx(1, a, 40);
    sender.out_msgs.push(internal(a, b, 41, vec![0x12, 0x34, 0x56, 0x78]));

    let err = process_block_messages(&PanickingLookup, &RejectingDecoder, &[sender.clone()])
        .unwrap_err();
    assert!(matches!(err, IndexerError::Decode { tx_hash, .. } if tx_hash == sender.hash));
}

#[test]
fn outgoing_external_in_is_a_mapping_error() {
    let a = addr(0xa);
    let mut sender = tx(1, a, 40);
    sender.out_msgs.push(RawMessage {
        info: RawMessageInfo::ExternalIn {
            src: None,
            dst: a,
            import_fee: 0,
        },
        body: Vec::new(),
    });
    let err = process_block_messages(&PanickingLookup, &OperationIdDecoder, &[sender]).unwrap_err();
    assert!(matches!(err, IndexerError::MapMessage { .. }));
}

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

const REGISTRY: &str = r#"
    [[operations]]
    interface = "jetton_wallet"
    op_id = 0x7362d09c
    name = "jetton_transfer_notification"
    fields = [{ name = "amount", kind = "u64" }]
"#;

fn account(address: Address, interfaces: &[&str]) -> AccountState {
    AccountState {
        address,
        balance: 0,
        last_tx_lt: 0,
        last_tx_hash: Hash256::ZERO,
        code_hash: None,
        data_hash: None,
        interfaces: interfaces.iter().map(|s| s.to_string()).collect(),
    }
}

fn notification_body(truncated: bool) -> Vec<u8> {
    let mut body = 0x7362_d09cu32.to_be_bytes().to_vec();
    body.extend_from_slice(&1u64.to_be_bytes());
    if !truncated {
        body.extend_from_slice(&500u64.to_be_bytes());
    }
    body
}

#[test]
fn payloads_skip_unknown_accounts_and_unregistered_operations() {
    let registry = OperationRegistry::from_toml_str(REGISTRY).unwrap();
    let (a, b, c) = (addr(0xa), addr(0xb), addr(0xc));

    let mut sender = tx(1, a, 40);
    sender.out_msgs.push(internal(a, b, 41, notification_body(false)));
    sender.out_msgs.push(internal(a, c, 42, notification_body(false)));
    sender.out_msgs.push(internal(a, b, 43, vec![0xde, 0xad, 0xbe, 0xef]));
    let messages = process_block_messages(&PanickingLookup, &OperationIdDecoder, &[sender]).unwrap();

    let accounts = HashMap::from([
        (a, account(a, &["wallet"])),
        (b, account(b, &["jetton_wallet"])),
    ]);
    let payloads = parse_message_payloads(&registry, &messages, &accounts);

    assert_eq!(payloads.len(), 1);
    assert_eq!(payloads[0].created_lt, 41);
    assert_eq!(payloads[0].operation_name, "jetton_transfer_notification");
    assert_eq!(payloads[0].data["amount"], 500u64);
}

#[test]
fn payload_decode_failure_is_skipped() {
    let registry = OperationRegistry::from_toml_str(REGISTRY).unwrap();
    let (a, b) = (addr(0xa), addr(0xb));

    let mut sender = tx(1, a, 40);
    sender.out_msgs.push(internal(a, b, 41, notification_body(true)));
    let messages = process_block_messages(&PanickingLookup, &OperationIdDecoder, &[sender]).unwrap();

    let accounts = HashMap::from([
        (a, account(a, &[])),
        (b, account(b, &["jetton_wallet"])),
    ]);
    assert!(matches!(
        parse_message_payload(&registry, &messages[0], &accounts),
        PayloadOutcome::Undecodable(PayloadError::Decode(_))
    ));
    assert!(parse_message_payloads(&registry, &messages, &accounts).is_empty());
}
