use thiserror::Error;

/// Errors raised while parsing textual representations of model types.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypesError {
    #[error("invalid hash: {0}")]
    InvalidHash(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid block id: {0}")]
    InvalidBlockId(String),
}
