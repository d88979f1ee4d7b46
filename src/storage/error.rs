//! Store Errors
//!
//! Only `get` can fail. The two outcomes are kept apart on purpose:
//! `NotFound` means the key is not in the store at all, `Expired` means the
//! key was still present but its deadline had passed, and this very call
//! evicted it. A second `get` on the same key reports `NotFound`.

use thiserror::Error;

/// Errors returned by [`TtlStore::get`](crate::storage::TtlStore::get).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The key was never set, or was deleted or evicted earlier
    #[error("key not found: {key}")]
    NotFound { key: String },

    /// The key was present but past its expiration; it has now been evicted
    #[error("key expired: {key}")]
    Expired { key: String },
}

impl StoreError {
    /// Returns true for [`StoreError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }

    /// Returns true for [`StoreError::Expired`].
    pub fn is_expired(&self) -> bool {
        matches!(self, StoreError::Expired { .. })
    }

    /// The key the failed lookup was for.
    pub fn key(&self) -> &str {
        match self {
            StoreError::NotFound { key } | StoreError::Expired { key } => key,
        }
    }
}

/// Result type for store lookups.
pub type StoreResult<T> = Result<T, StoreError>;
