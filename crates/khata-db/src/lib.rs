//! # khata-db: Database Layer for Khata POS
//!
//! This crate provides database access for the Khata POS system.
//! It uses SQLite for local storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Khata POS Data Flow                              │
//! │                                                                         │
//! │  khata-engine (create_sale, approve_sale, update_order_status)        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     khata-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │   Ledgers    │  │   │
//! │  │   │   (pool.rs)   │    │ product/sale/ │    │  inventory   │  │   │
//! │  │   │               │    │ customer/order│    │  debt        │  │   │
//! │  │   │ SqlitePool    │◄───│  (pool reads) │    │ (tx-scoped)  │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database (WAL mode, foreign keys ON)                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations (product, customer, sale, order)
//! - [`ledger`] - The append-only inventory and debt ledgers
//!
//! ## Usage
//!
//! ```rust,ignore
//! use khata_db::{Database, DbConfig};
//!
//! // Create database with default config (runs migrations)
//! let db = Database::new(DbConfig::new("path/to/khata.db")).await?;
//!
//! // Plain reads go through repositories
//! let product = db.products().get_by_sku("TAPAL-95").await?;
//!
//! // Stock/debt mutation goes through the ledgers, inside a transaction
//! let mut tx = db.pool().begin().await?;
//! db.inventory_ledger().debit(&mut tx, &request).await?;
//! tx.commit().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod ledger;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use ledger::debt::DebtLedger;
pub use ledger::inventory::{InventoryLedger, StockMovement, StockRequest};
pub use ledger::{LedgerError, LedgerResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::customer::CustomerRepository;
pub use repository::order::OrderRepository;
pub use repository::product::ProductRepository;
pub use repository::sale::SaleRepository;
