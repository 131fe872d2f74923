//! Indexing engine for the tonidx indexer.
//!
//! - [`engine`] maps the raw transactions of a block into messages, links
//!   incoming messages to their source transactions and decodes payloads.
//! - [`service`] drives ingestion: it polls a [`BlockSource`], and writes
//!   each block with its transactions and messages in one relational
//!   transaction.
//! - [`config`], [`logging`] and [`shutdown`] are the process plumbing used
//!   by the daemon.

pub mod config;
pub mod engine;
pub mod error;
pub mod logging;
pub mod mapping;
pub mod provenance;
pub mod raw;
pub mod service;
pub mod shutdown;
pub mod source;

pub use config::IndexerConfig;
pub use engine::{parse_message_payload, parse_message_payloads, process_block_messages, PayloadOutcome};
pub use error::{IndexerError, SourceError};
pub use logging::{init_logging, LogFormat};
pub use mapping::{map_block, map_message, map_transaction};
pub use provenance::{resolve_provenance, OutMsgIndex, Provenance};
pub use raw::{RawBlock, RawMessage, RawMessageInfo, RawTransaction};
pub use service::{IndexedBlock, IndexerService};
pub use shutdown::ShutdownController;
pub use source::BlockSource;
