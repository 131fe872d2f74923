use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The requested row does not exist. An expected outcome callers branch on.
    #[error("not found: {0}")]
    NotFound(String),

    #[error("duplicate key in {table}: {key}")]
    Duplicate { table: String, key: String },

    #[error("unknown table: {0}")]
    UnknownTable(String),

    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("database is corrupted: {0}")]
    Corruption(String),

    /// Wraps a lower-level error with the store and entity it happened in.
    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<StoreError>,
    },
}

impl StoreError {
    pub fn context(self, context: impl Into<String>) -> Self {
        Self::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// `true` if this error, or the error it wraps, is [`StoreError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound(_) => true,
            Self::Context { source, .. } => source.is_not_found(),
            _ => false,
        }
    }
}
