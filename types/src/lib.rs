//! Entity model for the tonidx indexer.
//!
//! Plain records shared by every other crate in the workspace: hashes,
//! addresses, block identities, blocks, transactions, messages, decoded
//! payloads, account snapshots and read-side filters. Nothing here talks to
//! storage or the network.

pub mod account;
pub mod address;
pub mod block;
pub mod error;
pub mod hash;
pub mod message;
pub mod transaction;

pub use account::AccountState;
pub use address::Address;
pub use block::{Block, BlockFilter, BlockId, MASTER_WORKCHAIN};
pub use error::TypesError;
pub use hash::Hash256;
pub use message::{Message, MessagePayload, MessageType};
pub use transaction::Transaction;
