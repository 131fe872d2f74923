//! Blocks, block identities and the read-side block filter.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{Hash256, Transaction, TypesError};

/// Workchain id of the coordinating (master) chain.
pub const MASTER_WORKCHAIN: i32 = -1;

/// Block identity coordinates in the sharded-chain structure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BlockId {
    pub workchain: i32,
    pub shard: u64,
    pub seq_no: u32,
}

impl BlockId {
    pub fn new(workchain: i32, shard: u64, seq_no: u32) -> Self {
        Self {
            workchain,
            shard,
            seq_no,
        }
    }

    pub fn is_master(&self) -> bool {
        self.workchain == MASTER_WORKCHAIN
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{:016x},{})", self.workchain, self.shard, self.seq_no)
    }
}

/// Parses `workchain:shard_hex:seq_no`, e.g. `-1:8000000000000000:100`.
impl FromStr for BlockId {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || TypesError::InvalidBlockId(s.to_string());
        let mut parts = s.split(':');
        let (Some(wc), Some(shard), Some(seq_no), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(invalid());
        };
        Ok(Self {
            workchain: wc.parse().map_err(|_| invalid())?,
            shard: u64::from_str_radix(shard, 16).map_err(|_| invalid())?,
            seq_no: seq_no.parse().map_err(|_| invalid())?,
        })
    }
}

/// A master or shard block.
///
/// `master`, `shards` and `transactions` are relations: they are only filled
/// by eager loading on the read path and are never persisted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub id: BlockId,
    pub file_hash: Hash256,
    pub root_hash: Hash256,
    /// Master block that registered this shard block. `None` for master blocks.
    pub master_id: Option<BlockId>,
    pub gen_utime: u32,

    #[serde(default)]
    pub master: Option<Box<Block>>,
    #[serde(default)]
    pub shards: Vec<Block>,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
}

impl Block {
    pub fn is_master(&self) -> bool {
        self.id.is_master()
    }
}

/// Read-side block query descriptor.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockFilter {
    /// Exact identity. Takes precedence over `workchain`.
    pub id: Option<BlockId>,
    pub workchain: Option<i32>,
    pub file_hash: Option<Hash256>,

    pub with_master: bool,
    pub with_shards: bool,
    pub with_transactions: bool,
    /// Only honoured together with `with_transactions`.
    pub with_transaction_messages: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_id_parses_hex_shard() {
        let id: BlockId = "-1:8000000000000000:100".parse().unwrap();
        assert_eq!(id, BlockId::new(-1, 0x8000_0000_0000_0000, 100));
        assert!(id.is_master());
    }

    #[test]
    fn block_id_rejects_extra_parts() {
        assert!("0:80:1:2".parse::<BlockId>().is_err());
        assert!("0:zz:1".parse::<BlockId>().is_err());
    }
}
