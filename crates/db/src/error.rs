//! Errors raised by document store backends.

use thiserror::Error;

/// Failures surfaced by a [`crate::DocumentStore`] implementation.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("invalid document id '{0}'")]
    InvalidId(String),

    #[error("duplicate document in collection '{collection}'")]
    Duplicate { collection: &'static str },

    #[error("document in collection '{collection}' has no ObjectId '_id'")]
    MissingId { collection: &'static str },

    #[error("counter '{field}' in collection '{collection}' would overflow")]
    CounterOverflow {
        collection: &'static str,
        field: &'static str,
    },

    #[error("failed to encode document: {0}")]
    Encode(#[from] mongodb::bson::ser::Error),

    #[error("failed to decode document: {0}")]
    Decode(#[from] mongodb::bson::de::Error),

    #[error(transparent)]
    Backend(#[from] mongodb::error::Error),
}

impl StoreError {
    /// True when the store rejected a write because an equal document exists.
    pub fn is_duplicate(&self) -> bool {
        matches!(self, StoreError::Duplicate { .. })
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
