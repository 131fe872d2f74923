use thiserror::Error;

#[derive(Debug, Error)]
pub enum AbiError {
    #[error("failed to read operation registry: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid operation registry: {0}")]
    Registry(String),
}

/// Outcome of a failed payload decode.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum PayloadError {
    /// No schema describes this message. Not a failure; callers skip it.
    #[error("payload not available: {0}")]
    NotAvailable(String),

    #[error("payload decode error: {0}")]
    Decode(String),
}

impl PayloadError {
    pub fn is_not_available(&self) -> bool {
        matches!(self, Self::NotAvailable(_))
    }
}
