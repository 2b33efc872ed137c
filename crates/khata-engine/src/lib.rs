//! # khata-engine: Settlement Services for Khata POS
//!
//! The orchestration layer: the only crate that opens transactions
//! spanning multiple repositories and ledgers.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Khata POS Services                               │
//! │                                                                         │
//! │  Caller (API shell, CLI, tests)                                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  khata-engine (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │  ┌──────────────┐  ┌──────────────┐  ┌─────────────────────┐  │   │
//! │  │  │ settlement   │  │  approval    │  │      orders         │  │   │
//! │  │  │ create_sale  │  │ approve/     │  │ create_order        │  │   │
//! │  │  │ debt payment │  │ reject_sale  │  │ update_status       │  │   │
//! │  │  │ restock      │  │              │  │ (complete/cancel/…) │  │   │
//! │  │  └──────┬───────┘  └──────┬───────┘  └─────────┬───────────┘  │   │
//! │  │         │                 │                    │               │   │
//! │  │         └────────┬────────┴────────────────────┘               │   │
//! │  │                  ▼                                             │   │
//! │  │   One sqlx transaction per settlement; ledgers and             │   │
//! │  │   repositories share its connection. Rollback on ANY failure. │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  khata-db (repositories + ledgers) ──► SQLite                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`settlement`] - The sale settlement orchestrator
//! - [`approval`] - The deferred-commit approval gate
//! - [`orders`] - The order lifecycle controller
//! - [`notify`] - The fire-and-forget notification collaborator boundary
//! - [`config`] - Store-level defaults
//! - [`error`] - Unit-of-work failure type

// =============================================================================
// Module Declarations
// =============================================================================

pub mod approval;
pub mod config;
pub mod error;
pub mod notify;
pub mod orders;
pub mod settlement;

// =============================================================================
// Re-exports
// =============================================================================

pub use approval::{ApprovalService, ApprovedSale};
pub use config::SettlementConfig;
pub use error::{EngineError, EngineResult};
pub use notify::{LogNotifier, Notifier, NotifyError, PendingApprovalNotice};
pub use orders::{CreateOrderRequest, OrderService, PlacedOrder, TransitionedOrder};
pub use settlement::{CreateSaleRequest, SaleLine, SettledSale, SettlementService};
