//! # Ledger Module
//!
//! The two append-only ledgers that own all stock and debt mutation.
//!
//! ## Ledger Discipline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Who Mutates What                                   │
//! │                                                                         │
//! │  products.packages_in_stock ┐                                          │
//! │  products.pieces_in_stock   ├──► ONLY ledger::inventory                │
//! │                             ┘     (debit / credit)                     │
//! │                                                                         │
//! │  customers.debt_balance_cents ──► ONLY ledger::debt                    │
//! │                                   (add_debt / pay_debt / apply_plan)   │
//! │                                                                         │
//! │  Every mutation appends its own history row with before/after          │
//! │  captured at write time. Repositories never touch these columns.       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Ledger operations take `&mut SqliteConnection` instead of a pool: the
//! settlement engine opens one transaction and threads its connection
//! through every ledger call, so a mid-sequence failure rolls back all of
//! them together.

pub mod debt;
pub mod inventory;

use thiserror::Error;

use crate::error::DbError;
use khata_core::CoreError;

/// A ledger operation fails either on a business rule (insufficient stock,
/// debt ceiling) or on the database itself.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Business rule violation (insufficient stock, limit exceeded, ...).
    #[error(transparent)]
    Domain(#[from] CoreError),

    /// Database failure.
    #[error(transparent)]
    Db(#[from] DbError),
}

impl From<sqlx::Error> for LedgerError {
    fn from(err: sqlx::Error) -> Self {
        LedgerError::Db(err.into())
    }
}

impl From<khata_core::ValidationError> for LedgerError {
    fn from(err: khata_core::ValidationError) -> Self {
        LedgerError::Domain(err.into())
    }
}

/// Result type for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;
