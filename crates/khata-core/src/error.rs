//! # Error Types
//!
//! Domain-specific error types for khata-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  khata-core errors (this file)                                         │
//! │  ├── CoreError        - Settlement / domain rule failures              │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  khata-db errors (separate crate)                                      │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  khata-engine errors (separate crate)                                  │
//! │  └── EngineError      - Unit-of-work failures (wraps both)             │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → EngineError → Caller              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (product name, quantities, amounts)
//! 3. Errors are enum variants, never String
//! 4. A failed settlement reports WHICH line and WHICH constraint failed

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent business rule violations during settlement.
/// Any of them aborts the whole unit of work; none are retried internally.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Product cannot be found.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Customer cannot be found.
    #[error("Customer not found: {0}")]
    CustomerNotFound(String),

    /// Sale cannot be found.
    #[error("Sale not found: {0}")]
    SaleNotFound(String),

    /// Order cannot be found.
    #[error("Order not found: {0}")]
    OrderNotFound(String),

    /// Requested quantity exceeds what the stock split can supply.
    ///
    /// ## When This Occurs
    /// - Requested pieces exceed `packages_in_stock * package_size + pieces_in_stock`
    /// - Loose pieces are short and no whole package is left to break
    /// - A concurrent settlement won the race for the last stock
    #[error("Insufficient stock for {product}: available {available} pieces, requested {requested}")]
    InsufficientStock {
        product: String,
        available: i64,
        requested: i64,
    },

    /// The price tier selected by the customer type is zero or negative.
    ///
    /// A sale must never silently fall back to another tier; a missing
    /// price is a data problem the operator has to fix on the product.
    #[error("Invalid {tier} price for {product}: {price_cents}")]
    InvalidPrice {
        product: String,
        tier: String,
        price_cents: i64,
    },

    /// Payment falls short of the total and the shortfall may not become debt.
    ///
    /// ## When This Occurs
    /// - Sale has no customer attached (nobody to owe the shortfall)
    /// - Caller did not permit debt for this settlement
    #[error("Payment {paid_cents} is short of total {total_cents} and debt is not permitted")]
    PaymentInsufficient { total_cents: i64, paid_cents: i64 },

    /// Adding the shortfall would push the customer past their debt ceiling.
    #[error("Debt limit exceeded for customer {customer}: balance {balance_cents} + {additional_cents} > limit {limit_cents}")]
    DebtLimitExceeded {
        customer: String,
        balance_cents: i64,
        additional_cents: i64,
        limit_cents: i64,
    },

    /// A pending sale was already approved or rejected.
    #[error("Sale {sale_id} was already processed (status: {status})")]
    AlreadyProcessed { sale_id: String, status: String },

    /// Order status transition is not allowed by the state machine.
    #[error("Order {order_id} cannot move from {from} to {to}")]
    InvalidTransition {
        order_id: String,
        from: String,
        to: String,
    },

    /// Defensive: a mutation would leave stock or a balance negative,
    /// or a ledger row would not satisfy `after == before + change`.
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when caller input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Invalid format (e.g., invalid UUID, invalid date).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in the allowed set.
    ///
    /// This is the strict replacement for the loose string coercion the
    /// system used to do: an unknown payment method or status string is
    /// reported here instead of silently becoming a default.
    #[error("{field} '{value}' must be one of: {allowed:?}")]
    NotAllowed {
        field: String,
        value: String,
        allowed: Vec<&'static str>,
    },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

/// Convenience type alias for validation results.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            product: "Tapal Danedar 95g".to_string(),
            available: 23,
            requested: 25,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for Tapal Danedar 95g: available 23 pieces, requested 25"
        );
    }

    #[test]
    fn test_payment_insufficient_message() {
        let err = CoreError::PaymentInsufficient {
            total_cents: 10000,
            paid_cents: 8000,
        };
        assert_eq!(
            err.to_string(),
            "Payment 8000 is short of total 10000 and debt is not permitted"
        );
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::MustBePositive {
            field: "quantity".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }

    #[test]
    fn test_not_allowed_message() {
        let err = ValidationError::NotAllowed {
            field: "paymentMethod".to_string(),
            value: "barter".to_string(),
            allowed: vec!["cash", "card", "bank_transfer"],
        };
        assert!(err.to_string().contains("barter"));
        assert!(err.to_string().contains("cash"));
    }
}
