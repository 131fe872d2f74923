//! LMDB storage backend for the tonidx indexer.
//!
//! Implements both backend traits from `tonidx-store` on top of the `heed`
//! LMDB bindings. The analytical and the relational store each own a separate
//! LMDB environment; every table (and every secondary index) is one named
//! database inside it.

pub mod analytical;
pub mod environment;
pub mod error;
pub mod migration;
pub mod relational;

pub use analytical::LmdbAnalyticalStore;
pub use environment::LmdbEnvironment;
pub use error::LmdbError;
pub use migration::{Migrator, CURRENT_SCHEMA_VERSION};
pub use relational::{LmdbRelationalStore, LmdbRelationalTxn};
