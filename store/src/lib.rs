//! Abstract storage backend traits for the tonidx indexer.
//!
//! The indexer writes every entity family into two stores:
//!
//! - an [`AnalyticalStore`]: flat, append-optimized tables without
//!   transactions, where a row inserted again under the same key replaces the
//!   previous version (last write wins), so replaying a block is harmless;
//! - a [`RelationalStore`]: transactional tables plus secondary indexes,
//!   authoritative for consistency and used for relation-aware reads.
//!
//! Repositories depend only on these traits. The LMDB backend lives in
//! `tonidx-store-lmdb`, in-memory doubles in `tonidx-nullables`.

pub mod analytical;
pub mod error;
pub mod relational;

pub use analytical::AnalyticalStore;
pub use error::StoreError;
pub use relational::{IndexSpec, RelationalStore, RelationalTxn};

/// A raw key/value row as stored by a backend.
pub type Row = (Vec<u8>, Vec<u8>);
