//! # Repository Module
//!
//! Database repository implementations for Khata POS.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern Explained                         │
//! │                                                                         │
//! │  The Repository pattern abstracts database access behind a clean API.  │
//! │                                                                         │
//! │  Engine / caller                                                       │
//! │       │                                                                 │
//! │       │  db.products().get_by_sku("TAPAL-95")                          │
//! │       │  ↓                                                              │
//! │       ▼                                                                 │
//! │  ProductRepository                                                     │
//! │  ├── get_by_id(&self, id)                                              │
//! │  ├── insert(&self, product)                                            │
//! │  └── update(&self, product)                                            │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  Two access shapes per table:                                          │
//! │  • Pool-backed repository methods for plain reads/CRUD                 │
//! │  • Module-level fns taking &mut SqliteConnection for writes that       │
//! │    must join the settlement engine's transaction                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`product::ProductRepository`] - Product CRUD (stock columns excluded)
//! - [`customer::CustomerRepository`] - Customer CRUD (balance excluded)
//! - [`sale::SaleRepository`] - Sale and sale item reads
//! - [`order::OrderRepository`] - Order and order item reads

pub mod customer;
pub mod order;
pub mod product;
pub mod sale;
