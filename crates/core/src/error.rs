//! Domain error model.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::value_object::Sku;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// One short line reported by a failed reservation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shortage {
    pub sku: Sku,
    pub requested: i64,
    pub available: i64,
}

impl core::fmt::Display for Shortage {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "{} (requested {}, available {})",
            self.sku, self.requested, self.available
        )
    }
}

/// Domain-level error.
///
/// Every variant is a deterministic business failure. Each maps to exactly one
/// wire code (see [`DomainError::code`]) so callers can tell "retry is safe"
/// from "request is invalid".
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// An entity id is unknown.
    #[error("not found: {0}")]
    NotFound(String),

    /// The operation is illegal for the entity's current lifecycle state.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// A reservation exceeds available stock.
    #[error("insufficient stock: {}", format_shortages(.0))]
    InsufficientStock(Vec<Shortage>),

    /// Malformed or out-of-range input (non-positive quantity, bad numeric text, ...).
    #[error("validation failed: {0}")]
    InvalidInput(String),

    /// A physical count is lower than stock already earmarked for shipment.
    #[error("stocktake for {sku} counted {counted} but {locked} are locked")]
    StocktakeBelowLocked { sku: Sku, counted: i64, locked: i64 },

    /// A referential or uniqueness conflict.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Lock acquisition timed out; safe to retry with backoff.
    #[error("busy: {0}")]
    Busy(String),

    /// Internal consistency fault. Always fatal.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),
}

fn format_shortages(shortages: &[Shortage]) -> String {
    shortages
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl DomainError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn busy(msg: impl Into<String>) -> Self {
        Self::Busy(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    /// Stable wire code for this kind.
    pub fn code(&self) -> &'static str {
        match self {
            DomainError::NotFound(_) => "NOT_FOUND",
            DomainError::InvalidState(_) => "INVALID_STATE",
            DomainError::InsufficientStock(_) => "INSUFFICIENT_STOCK",
            DomainError::InvalidInput(_) => "VALIDATION_ERROR",
            DomainError::StocktakeBelowLocked { .. } => "STOCKTAKE_BELOW_LOCKED",
            DomainError::Conflict(_) => "CONFLICT",
            DomainError::Busy(_) => "BUSY",
            DomainError::InvariantViolation(_) => "INVARIANT_VIOLATION",
        }
    }

    /// Whether repeating the identical request may succeed without the caller
    /// changing anything.
    pub fn is_retryable(&self) -> bool {
        matches!(self, DomainError::Busy(_))
    }

    pub fn shortages(&self) -> &[Shortage] {
        match self {
            DomainError::InsufficientStock(s) => s,
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insufficient_stock_message_lists_every_short_sku() {
        let err = DomainError::InsufficientStock(vec![
            Shortage {
                sku: Sku::parse("A").unwrap(),
                requested: 5,
                available: 2,
            },
            Shortage {
                sku: Sku::parse("B").unwrap(),
                requested: 1,
                available: 0,
            },
        ]);

        let msg = err.to_string();
        assert!(msg.contains("A (requested 5, available 2)"));
        assert!(msg.contains("B (requested 1, available 0)"));
        assert_eq!(err.shortages().len(), 2);
    }

    #[test]
    fn only_busy_is_retryable() {
        assert!(DomainError::busy("lock").is_retryable());
        assert!(!DomainError::not_found("order").is_retryable());
        assert!(!DomainError::invalid_state("shipped").is_retryable());
        assert!(!DomainError::invariant("negative").is_retryable());
    }

    #[test]
    fn codes_are_distinct_per_kind() {
        let errs = [
            DomainError::not_found("x"),
            DomainError::invalid_state("x"),
            DomainError::InsufficientStock(vec![]),
            DomainError::validation("x"),
            DomainError::StocktakeBelowLocked {
                sku: Sku::parse("A").unwrap(),
                counted: 0,
                locked: 1,
            },
            DomainError::conflict("x"),
            DomainError::busy("x"),
            DomainError::invariant("x"),
        ];
        let mut codes: Vec<_> = errs.iter().map(DomainError::code).collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), errs.len());
    }
}
