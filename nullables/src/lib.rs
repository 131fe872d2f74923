//! Nullable infrastructure for deterministic testing.
//!
//! The repositories are written against the storage traits of
//! `tonidx-store`. This crate provides in-memory implementations that:
//! - Never touch the filesystem
//! - Count every interaction so tests can assert a store was never reached
//! - Can be told to fail, to exercise the partial-failure paths
//!
//! Usage: swap the LMDB backends for nullables in tests.

pub mod store;

pub use store::{NullAnalyticalStore, NullRelationalStore, NullRelationalTxn};
