//! # Engine Error Types
//!
//! The unit-of-work failure type every settlement operation returns.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  CoreError / ValidationError (khata-core)  ┐                            │
//! │  DbError / LedgerError (khata-db)          ├──► EngineError             │
//! │                                            ┘        │                   │
//! │  A failure mid-settlement rolls back the WHOLE      ▼                   │
//! │  transaction; the caller sees which line and        Caller              │
//! │  which constraint failed, and no partial state.                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing here is retried automatically: replaying a stock debit after a
//! transient failure could double-charge inventory, so retries are a
//! caller-level concern with a fresh idempotency key.

use thiserror::Error;

use khata_core::{CoreError, ValidationError};
use khata_db::{DbError, LedgerError};

/// A settlement unit-of-work failure.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Business rule violation from the domain layer.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Database failure.
    #[error(transparent)]
    Db(#[from] DbError),

    /// A specific line item failed; wraps the underlying constraint so
    /// the caller can point at the offending line.
    #[error("line {index} (product {product_id}): {source}")]
    LineFailed {
        index: usize,
        product_id: String,
        #[source]
        source: Box<EngineError>,
    },
}

impl EngineError {
    /// Tags an error with the line item it came from.
    pub fn at_line(self, index: usize, product_id: &str) -> Self {
        EngineError::LineFailed {
            index,
            product_id: product_id.to_string(),
            source: Box::new(self),
        }
    }

    /// The innermost constraint failure, unwrapping line context.
    pub fn root(&self) -> &EngineError {
        match self {
            EngineError::LineFailed { source, .. } => source.root(),
            other => other,
        }
    }
}

impl From<ValidationError> for EngineError {
    fn from(err: ValidationError) -> Self {
        EngineError::Core(err.into())
    }
}

impl From<LedgerError> for EngineError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Domain(core) => EngineError::Core(core),
            LedgerError::Db(db) => EngineError::Db(db),
        }
    }
}

impl From<sqlx::Error> for EngineError {
    fn from(err: sqlx::Error) -> Self {
        EngineError::Db(err.into())
    }
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_context_wraps_and_unwraps() {
        let inner: EngineError = CoreError::InsufficientStock {
            product: "Lux Rose 120g".to_string(),
            available: 3,
            requested: 5,
        }
        .into();

        let err = inner.at_line(2, "p-9");
        assert!(err.to_string().starts_with("line 2 (product p-9)"));
        assert!(matches!(
            err.root(),
            EngineError::Core(CoreError::InsufficientStock { .. })
        ));
    }
}
