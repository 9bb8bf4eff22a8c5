//! Error surface of the inventory components.

use thiserror::Error;

use stockledger_core::{DomainError, Sku};

/// Opaque infrastructure failure of a backing store.
///
/// The core never retries these itself; a failed operation leaves stock and
/// status unchanged, so the calling layer may retry with backoff.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A lock guarding in-memory state was poisoned by a panicking writer.
    #[error("lock poisoned: {0}")]
    LockPoisoned(&'static str),

    /// The record changed underneath a conditional write.
    #[error("stale record: {0}")]
    StaleRecord(String),

    /// The record a write targeted is gone.
    #[error("missing record: {0}")]
    MissingRecord(String),

    /// Backend-specific failure (connection loss, I/O, ...).
    #[error("store backend failure: {0}")]
    Backend(String),

    /// An id sequence has no values left.
    #[error("id sequence exhausted: {0}")]
    SequenceExhausted(&'static str),

    /// A SKU guard was presented to a component that did not issue it.
    #[error("guard for sku {0} was issued by a different lock set")]
    ForeignGuard(Sku),
}

impl StoreError {
    /// Whether the same call may succeed later without changes.
    pub fn is_transient(&self) -> bool {
        !matches!(
            self,
            StoreError::SequenceExhausted(_) | StoreError::ForeignGuard(_)
        )
    }
}

/// Error returned by every component operation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InventoryError {
    /// Deterministic business rejection.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Infrastructure failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl InventoryError {
    /// The business rejection, if this is one.
    pub fn domain(&self) -> Option<&DomainError> {
        match self {
            InventoryError::Domain(e) => Some(e),
            InventoryError::Store(_) => None,
        }
    }

    /// Only transient infrastructure failures are worth retrying unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, InventoryError::Store(e) if e.is_transient())
    }
}

/// Result type of the inventory components.
pub type InventoryResult<T> = Result<T, InventoryError>;
