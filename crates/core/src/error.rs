//! Domain error model.

use thiserror::Error;

use crate::id::{Sku, TransactionId};

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Kind of entity a lookup failed for.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Product,
    Transaction,
    Warehouse,
    Staff,
}

impl core::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            EntityKind::Product => "product",
            EntityKind::Transaction => "transaction",
            EntityKind::Warehouse => "warehouse",
            EntityKind::Staff => "staff",
        })
    }
}

/// Domain-level error.
///
/// Keep this focused on deterministic, business/domain failures. Every variant
/// names the offending field or id so a presentation layer can render a
/// specific message. Infrastructure concerns belong elsewhere.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Malformed input (negative number, empty required text, unknown reference).
    #[error("validation failed on `{field}`: {message}")]
    Validation { field: &'static str, message: String },

    /// A referenced entity is absent.
    #[error("{entity} {id} not found")]
    NotFound { entity: EntityKind, id: String },

    /// A caller-supplied SKU is already taken.
    #[error("sku {0} already exists")]
    DuplicateSku(Sku),

    /// A quantity adjustment would drive stock below zero.
    #[error("insufficient stock for sku {sku}: on hand {on_hand}, requested {requested}")]
    InsufficientStock { sku: Sku, on_hand: u64, requested: u64 },

    /// A status transition that the life cycle does not allow.
    #[error("transaction {id} cannot move from {from} to {to}")]
    InvalidTransition {
        id: TransactionId,
        from: &'static str,
        to: &'static str,
    },

    /// Deletion blocked by ledger entries that reference the product.
    #[error("sku {sku} is referenced by {references} transaction(s)")]
    ReferentialIntegrity { sku: Sku, references: usize },

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A non-SKU uniqueness conflict (e.g. a taken warehouse id).
    #[error("conflict: {0}")]
    Conflict(String),
}

impl DomainError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    pub fn not_found(entity: EntityKind, id: impl core::fmt::Display) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }
}
