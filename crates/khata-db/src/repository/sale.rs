//! # Sale Repository
//!
//! Database operations for sales and sale items.
//!
//! ## Sale Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sale Lifecycle                                    │
//! │                                                                         │
//! │  1. SETTLE (no approval required)                                      │
//! │     └── insert_sale() + insert_item()×N + update_total()               │
//! │         + ledger debit/reconciliation, all in ONE transaction          │
//! │                                                                         │
//! │  2. OR: PENDING APPROVAL                                               │
//! │     └── same inserts, approval_status = 'pending',                     │
//! │         NO ledger effects yet                                          │
//! │     └── resolve_approval() flips pending → approved/rejected;          │
//! │         the status-guarded UPDATE is what makes double-approval        │
//! │         impossible                                                     │
//! │                                                                         │
//! │  Read side: receipts and approval queues go through the pool.          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Transaction-scoped writes are module-level functions taking
//! `&mut SqliteConnection`; the settlement engine owns the transaction.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use khata_core::{ApprovalStatus, Sale, SaleItem};

/// Column list shared by every sale SELECT.
const SALE_COLUMNS: &str = "id, seller_id, seller_name, customer_id, total_amount_cents, \
     payment_method, payment_amount_cents, excess_action, approval_status, \
     debt_paid_cents, excess_paid_cents, debt_added_cents, notes, created_at, updated_at";

const SALE_ITEM_COLUMNS: &str = "id, sale_id, product_id, name_snapshot, requested_quantity, \
     packages_sold, pieces_sold, unit_price_cents, subtotal_cents, created_at";

// =============================================================================
// Transaction-Scoped Writes
// =============================================================================

/// Inserts a sale header.
pub async fn insert_sale(conn: &mut SqliteConnection, sale: &Sale) -> DbResult<()> {
    debug!(id = %sale.id, "Inserting sale");

    sqlx::query(
        r#"
        INSERT INTO sales (
            id, seller_id, seller_name, customer_id,
            total_amount_cents, payment_method, payment_amount_cents,
            excess_action, approval_status,
            debt_paid_cents, excess_paid_cents, debt_added_cents,
            notes, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
        "#,
    )
    .bind(&sale.id)
    .bind(&sale.seller_id)
    .bind(&sale.seller_name)
    .bind(&sale.customer_id)
    .bind(sale.total_amount_cents)
    .bind(sale.payment_method)
    .bind(sale.payment_amount_cents)
    .bind(sale.excess_action)
    .bind(sale.approval_status)
    .bind(sale.debt_paid_cents)
    .bind(sale.excess_paid_cents)
    .bind(sale.debt_added_cents)
    .bind(&sale.notes)
    .bind(sale.created_at)
    .bind(sale.updated_at)
    .execute(conn)
    .await?;

    Ok(())
}

/// Inserts one line item.
///
/// ## Snapshot Pattern
/// Product name and unit price are copied onto the item. This preserves
/// the sale history even if the product changes later.
pub async fn insert_item(conn: &mut SqliteConnection, item: &SaleItem) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO sale_items (
            id, sale_id, product_id, name_snapshot,
            requested_quantity, packages_sold, pieces_sold,
            unit_price_cents, subtotal_cents, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        "#,
    )
    .bind(&item.id)
    .bind(&item.sale_id)
    .bind(&item.product_id)
    .bind(&item.name_snapshot)
    .bind(item.requested_quantity)
    .bind(item.packages_sold)
    .bind(item.pieces_sold)
    .bind(item.unit_price_cents)
    .bind(item.subtotal_cents)
    .bind(item.created_at)
    .execute(conn)
    .await?;

    Ok(())
}

/// Persists the final computed total.
pub async fn update_total(
    conn: &mut SqliteConnection,
    sale_id: &str,
    total_amount_cents: i64,
) -> DbResult<()> {
    let now = Utc::now();

    sqlx::query("UPDATE sales SET total_amount_cents = ?2, updated_at = ?3 WHERE id = ?1")
        .bind(sale_id)
        .bind(total_amount_cents)
        .bind(now)
        .execute(conn)
        .await?;

    Ok(())
}

/// Records the money reconciliation outcome on the header.
pub async fn update_reconciliation(
    conn: &mut SqliteConnection,
    sale_id: &str,
    payment_amount_cents: i64,
    debt_paid_cents: i64,
    excess_paid_cents: i64,
    debt_added_cents: i64,
) -> DbResult<()> {
    let now = Utc::now();

    sqlx::query(
        r#"
        UPDATE sales SET
            payment_amount_cents = ?2,
            debt_paid_cents = ?3,
            excess_paid_cents = ?4,
            debt_added_cents = ?5,
            updated_at = ?6
        WHERE id = ?1
        "#,
    )
    .bind(sale_id)
    .bind(payment_amount_cents)
    .bind(debt_paid_cents)
    .bind(excess_paid_cents)
    .bind(debt_added_cents)
    .bind(now)
    .execute(conn)
    .await?;

    Ok(())
}

/// Flips a pending sale to its terminal approval state.
///
/// ## Returns
/// `false` when the sale was not pending anymore — the status-guarded
/// UPDATE is the double-approval lock, so the caller maps `false` to
/// `AlreadyProcessed`.
pub async fn resolve_approval(
    conn: &mut SqliteConnection,
    sale_id: &str,
    status: ApprovalStatus,
) -> DbResult<bool> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        UPDATE sales SET
            approval_status = ?2,
            updated_at = ?3
        WHERE id = ?1 AND approval_status = 'pending'
        "#,
    )
    .bind(sale_id)
    .bind(status)
    .bind(now)
    .execute(conn)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Fetches a sale header on an explicit connection.
pub async fn fetch_sale(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Sale>> {
    let sql = format!("SELECT {SALE_COLUMNS} FROM sales WHERE id = ?1");
    let sale = sqlx::query_as::<_, Sale>(&sql)
        .bind(id)
        .fetch_optional(conn)
        .await?;

    Ok(sale)
}

/// Fetches a sale's items on an explicit connection.
pub async fn fetch_items(conn: &mut SqliteConnection, sale_id: &str) -> DbResult<Vec<SaleItem>> {
    let sql =
        format!("SELECT {SALE_ITEM_COLUMNS} FROM sale_items WHERE sale_id = ?1 ORDER BY created_at");
    let items = sqlx::query_as::<_, SaleItem>(&sql)
        .bind(sale_id)
        .fetch_all(conn)
        .await?;

    Ok(items)
}

// =============================================================================
// Repository (pool reads)
// =============================================================================

/// Repository for sale read operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Gets a sale by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Sale>> {
        let sql = format!("SELECT {SALE_COLUMNS} FROM sales WHERE id = ?1");
        let sale = sqlx::query_as::<_, Sale>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(sale)
    }

    /// Gets all items for a sale (read path for the receipt renderer).
    pub async fn get_items(&self, sale_id: &str) -> DbResult<Vec<SaleItem>> {
        let sql = format!(
            "SELECT {SALE_ITEM_COLUMNS} FROM sale_items WHERE sale_id = ?1 ORDER BY created_at"
        );
        let items = sqlx::query_as::<_, SaleItem>(&sql)
            .bind(sale_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(items)
    }

    /// Lists the most recent sales.
    pub async fn list_recent(&self, limit: u32) -> DbResult<Vec<Sale>> {
        let sql =
            format!("SELECT {SALE_COLUMNS} FROM sales ORDER BY created_at DESC LIMIT ?1");
        let sales = sqlx::query_as::<_, Sale>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(sales)
    }

    /// Lists sales waiting for an approval decision (oldest first).
    pub async fn list_pending_approval(&self, limit: u32) -> DbResult<Vec<Sale>> {
        let sql = format!(
            "SELECT {SALE_COLUMNS} FROM sales \
             WHERE approval_status = 'pending' ORDER BY created_at LIMIT ?1"
        );
        let sales = sqlx::query_as::<_, Sale>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(sales)
    }
}

/// Generates a new sale ID.
pub fn generate_sale_id() -> String {
    Uuid::new_v4().to_string()
}

/// Generates a new sale item ID.
pub fn generate_sale_item_id() -> String {
    Uuid::new_v4().to_string()
}
