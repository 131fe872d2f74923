//! Records supplied by the node client, before mapping into the entity model.

use tonidx_types::{Address, BlockId, Hash256};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawBlock {
    pub id: BlockId,
    pub file_hash: Hash256,
    pub root_hash: Hash256,
    /// Master block a shard block was committed in. `None` for master blocks.
    pub master_id: Option<BlockId>,
    pub gen_utime: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawTransaction {
    pub hash: Hash256,
    pub address: Address,
    pub created_lt: u64,
    pub created_at: u32,
    pub prev_tx_hash: Hash256,
    pub prev_tx_lt: u64,
    pub total_fees: u64,
    pub in_msg: Option<RawMessage>,
    pub out_msgs: Vec<RawMessage>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawMessage {
    pub info: RawMessageInfo,
    pub body: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RawMessageInfo {
    Internal {
        src: Address,
        dst: Address,
        bounce: bool,
        bounced: bool,
        amount: u64,
        ihr_fee: u64,
        fwd_fee: u64,
        created_lt: u64,
        created_at: u32,
    },
    ExternalIn {
        src: Option<Address>,
        dst: Address,
        import_fee: u64,
    },
    ExternalOut {
        src: Address,
        dst: Option<Address>,
        created_lt: u64,
        created_at: u32,
    },
}
