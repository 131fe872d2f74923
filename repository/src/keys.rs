//! Binary key layouts.
//!
//! All integers are big-endian and signed workchains have their sign bit
//! flipped, so lexicographic key order equals numeric order and prefix scans
//! return rows sorted the way the read paths need them.
//!
//! | table / index            | key                              |
//! |--------------------------|----------------------------------|
//! | blocks (relational)      | `wc(4) shard(8) seq_no(4)`       |
//! | blocks (analytical)      | `wc(4) seq_no(4) shard(8)`       |
//! | blocks_workchain_idx     | `wc(4) seq_no(4) shard(8)`       |
//! | blocks_master_idx        | `master pk(16) shard pk(16)`     |
//! | transactions (relational)| `hash(32)`                       |
//! | transactions (analytical), transactions_block_idx | `block(16) lt(8) hash(32)` |
//! | messages                 | `tx_hash(32) incoming(1) lt(8)`  |
//! | messages_source_idx      | `src(36) dst(36) lt(8)`          |

use tonidx_types::{Address, BlockId, Hash256};

pub const BLOCK_KEY_LEN: usize = 16;
pub const ADDRESS_KEY_LEN: usize = 4 + 32;

pub fn workchain(wc: i32) -> [u8; 4] {
    ((wc as u32) ^ 0x8000_0000).to_be_bytes()
}

fn decode_workchain(bytes: [u8; 4]) -> i32 {
    (u32::from_be_bytes(bytes) ^ 0x8000_0000) as i32
}

/// Relational primary key of a block.
pub fn block_pk(id: &BlockId) -> [u8; BLOCK_KEY_LEN] {
    let mut key = [0u8; BLOCK_KEY_LEN];
    key[..4].copy_from_slice(&workchain(id.workchain));
    key[4..12].copy_from_slice(&id.shard.to_be_bytes());
    key[12..].copy_from_slice(&id.seq_no.to_be_bytes());
    key
}

pub fn decode_block_pk(key: &[u8]) -> Option<BlockId> {
    if key.len() != BLOCK_KEY_LEN {
        return None;
    }
    Some(BlockId {
        workchain: decode_workchain(key[..4].try_into().ok()?),
        shard: u64::from_be_bytes(key[4..12].try_into().ok()?),
        seq_no: u32::from_be_bytes(key[12..].try_into().ok()?),
    })
}

/// Sequence-ordered block key: analytical row key and workchain index key.
pub fn block_by_seq_no(id: &BlockId) -> [u8; BLOCK_KEY_LEN] {
    let mut key = [0u8; BLOCK_KEY_LEN];
    key[..4].copy_from_slice(&workchain(id.workchain));
    key[4..8].copy_from_slice(&id.seq_no.to_be_bytes());
    key[8..].copy_from_slice(&id.shard.to_be_bytes());
    key
}

pub fn block_by_master(master: &BlockId, shard: &BlockId) -> [u8; 2 * BLOCK_KEY_LEN] {
    let mut key = [0u8; 2 * BLOCK_KEY_LEN];
    key[..BLOCK_KEY_LEN].copy_from_slice(&block_pk(master));
    key[BLOCK_KEY_LEN..].copy_from_slice(&block_pk(shard));
    key
}

pub fn address(addr: &Address) -> [u8; ADDRESS_KEY_LEN] {
    let mut key = [0u8; ADDRESS_KEY_LEN];
    key[..4].copy_from_slice(&workchain(addr.workchain));
    key[4..].copy_from_slice(addr.account.as_bytes());
    key
}

/// Transaction key ordered by block, then logical time.
pub fn transaction_by_block(block: &BlockId, lt: u64, hash: &Hash256) -> Vec<u8> {
    let mut key = Vec::with_capacity(BLOCK_KEY_LEN + 8 + 32);
    key.extend_from_slice(&block_pk(block));
    key.extend_from_slice(&lt.to_be_bytes());
    key.extend_from_slice(hash.as_bytes());
    key
}

/// Analytical transaction key, ordered by sequence number.
pub fn transaction_by_seq_no(block: &BlockId, lt: u64, hash: &Hash256) -> Vec<u8> {
    let mut key = Vec::with_capacity(BLOCK_KEY_LEN + 8 + 32);
    key.extend_from_slice(&block_by_seq_no(block));
    key.extend_from_slice(&lt.to_be_bytes());
    key.extend_from_slice(hash.as_bytes());
    key
}

/// Prefix of every message owned by `tx_hash`, optionally narrowed to one direction.
pub fn message_prefix(tx_hash: &Hash256, incoming: Option<bool>) -> Vec<u8> {
    let mut key = Vec::with_capacity(32 + 1 + 8);
    key.extend_from_slice(tx_hash.as_bytes());
    if let Some(incoming) = incoming {
        key.push(u8::from(incoming));
    }
    key
}

pub fn message_pk(tx_hash: &Hash256, incoming: bool, created_lt: u64) -> Vec<u8> {
    let mut key = message_prefix(tx_hash, Some(incoming));
    key.extend_from_slice(&created_lt.to_be_bytes());
    key
}

pub fn message_by_source(src: &Address, dst: &Address, created_lt: u64) -> Vec<u8> {
    let mut key = Vec::with_capacity(2 * ADDRESS_KEY_LEN + 8);
    key.extend_from_slice(&address(src));
    key.extend_from_slice(&address(dst));
    key.extend_from_slice(&created_lt.to_be_bytes());
    key
}
