//! # khata-core: Pure Business Logic for Khata POS
//!
//! This crate is the **heart** of Khata POS. It contains all business logic
//! as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Khata POS Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 khata-engine (Services)                         │   │
//! │  │   Settlement orchestrator · Approval gate · Order lifecycle    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ khata-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │  ┌───────────┐ ┌───────────┐ ┌───────────┐ ┌───────────────┐  │   │
//! │  │  │   types   │ │   money   │ │ decompose │ │    payment    │  │   │
//! │  │  │  Product  │ │   Money   │ │ pkg/piece │ │ excess/short  │  │   │
//! │  │  │  Customer │ │ integer   │ │   split   │ │ reconciliation│  │   │
//! │  │  │ Sale/Order│ │   cents   │ │           │ │               │  │   │
//! │  │  └───────────┘ └───────────┘ └───────────┘ └───────────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    khata-db (Database Layer)                    │   │
//! │  │        SQLite repositories, inventory + debt ledgers            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Customer, Sale, Order, ledger rows)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`decompose`] - Package/piece quantity decomposition
//! - [`payment`] - Excess/shortfall payment reconciliation
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in minor units (i64)
//! 4. **Explicit Errors**: All errors are typed, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use khata_core::money::Money;
//! use khata_core::payment::reconcile_payment;
//! use khata_core::types::ExcessAction;
//!
//! // A walk-in sale: total 100.00, paid 120.00, no customer attached.
//! let plan = reconcile_payment(
//!     Money::from_cents(10000),
//!     Money::from_cents(12000),
//!     ExcessAction::Return,
//!     None,
//!     false,
//! )
//! .unwrap();
//!
//! assert_eq!(plan.excess_paid.cents(), 2000);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod decompose;
pub mod error;
pub mod money;
pub mod payment;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use khata_core::Money` instead of
// `use khata_core::money::Money`

pub use decompose::{decompose, Decomposition};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use payment::{reconcile_payment, PaymentPlan};
pub use types::*;
