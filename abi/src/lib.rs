//! Message body decoders.
//!
//! Two collaborators of the indexing engine live here:
//!
//! - [`OperationDecoder`] reads the operation ID (and text comment) from the
//!   head of a message body and stores it on the message.
//! - [`PayloadParser`] turns a message plus the account states of both ends
//!   into a structured [`MessagePayload`](tonidx_types::MessagePayload).
//!   [`OperationRegistry`] is the table-driven implementation, loadable from
//!   TOML.

pub mod error;
pub mod operation;
pub mod payload;
pub mod registry;

pub use error::{AbiError, PayloadError};
pub use operation::{OperationDecoder, OperationIdDecoder, TEXT_COMMENT_OP};
pub use payload::PayloadParser;
pub use registry::{FieldKind, FieldSchema, OperationRegistry, OperationSchema};
