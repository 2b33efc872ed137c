//! # Order Repository
//!
//! Database operations for orders and order items.
//!
//! Orders carry the lifecycle status machine; the transition itself is a
//! status-guarded UPDATE so two concurrent transitions cannot both win.
//! Transaction-scoped writes are module-level functions taking
//! `&mut SqliteConnection`; the lifecycle controller owns the transaction.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use khata_core::{Order, OrderItem, OrderStatus};

/// Column list shared by every order SELECT.
const ORDER_COLUMNS: &str = "id, seller_id, seller_name, customer_id, status, \
     total_amount_cents, payment_method, sale_id, notes, created_at, updated_at";

const ORDER_ITEM_COLUMNS: &str = "id, order_id, product_id, name_snapshot, requested_quantity, \
     packages_sold, pieces_sold, unit_price_cents, subtotal_cents, created_at";

// =============================================================================
// Transaction-Scoped Writes
// =============================================================================

/// Inserts an order header.
pub async fn insert_order(conn: &mut SqliteConnection, order: &Order) -> DbResult<()> {
    debug!(id = %order.id, "Inserting order");

    sqlx::query(
        r#"
        INSERT INTO orders (
            id, seller_id, seller_name, customer_id, status,
            total_amount_cents, payment_method, sale_id,
            notes, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
        "#,
    )
    .bind(&order.id)
    .bind(&order.seller_id)
    .bind(&order.seller_name)
    .bind(&order.customer_id)
    .bind(order.status)
    .bind(order.total_amount_cents)
    .bind(order.payment_method)
    .bind(&order.sale_id)
    .bind(&order.notes)
    .bind(order.created_at)
    .bind(order.updated_at)
    .execute(conn)
    .await?;

    Ok(())
}

/// Inserts one line item (same snapshot discipline as sale items).
pub async fn insert_item(conn: &mut SqliteConnection, item: &OrderItem) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO order_items (
            id, order_id, product_id, name_snapshot,
            requested_quantity, packages_sold, pieces_sold,
            unit_price_cents, subtotal_cents, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        "#,
    )
    .bind(&item.id)
    .bind(&item.order_id)
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
    order_id: &str,
    total_amount_cents: i64,
) -> DbResult<()> {
    let now = Utc::now();

    sqlx::query("UPDATE orders SET total_amount_cents = ?2, updated_at = ?3 WHERE id = ?1")
        .bind(order_id)
        .bind(total_amount_cents)
        .bind(now)
        .execute(conn)
        .await?;

    Ok(())
}

/// Moves an order from `from` to `to`.
///
/// ## Returns
/// `false` when the order was no longer in `from` — a concurrent
/// transition won; the caller surfaces `InvalidTransition`.
pub async fn transition_status(
    conn: &mut SqliteConnection,
    order_id: &str,
    from: OrderStatus,
    to: OrderStatus,
) -> DbResult<bool> {
    let now = Utc::now();

    let result =
        sqlx::query("UPDATE orders SET status = ?3, updated_at = ?4 WHERE id = ?1 AND status = ?2")
            .bind(order_id)
            .bind(from)
            .bind(to)
            .bind(now)
            .execute(conn)
            .await?;

    Ok(result.rows_affected() == 1)
}

/// Links the sale of record materialized by completing this order.
pub async fn link_sale(
    conn: &mut SqliteConnection,
    order_id: &str,
    sale_id: &str,
) -> DbResult<()> {
    let now = Utc::now();

    sqlx::query("UPDATE orders SET sale_id = ?2, updated_at = ?3 WHERE id = ?1")
        .bind(order_id)
        .bind(sale_id)
        .bind(now)
        .execute(conn)
        .await?;

    Ok(())
}

/// Fetches an order header on an explicit connection.
pub async fn fetch_order(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Order>> {
    let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?1");
    let order = sqlx::query_as::<_, Order>(&sql)
        .bind(id)
        .fetch_optional(conn)
        .await?;

    Ok(order)
}

/// Fetches an order's items on an explicit connection.
pub async fn fetch_items(conn: &mut SqliteConnection, order_id: &str) -> DbResult<Vec<OrderItem>> {
    let sql = format!(
        "SELECT {ORDER_ITEM_COLUMNS} FROM order_items WHERE order_id = ?1 ORDER BY created_at"
    );
    let items = sqlx::query_as::<_, OrderItem>(&sql)
        .bind(order_id)
        .fetch_all(conn)
        .await?;

    Ok(items)
}

// =============================================================================
// Repository (pool reads)
// =============================================================================

/// Repository for order read operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Gets an order by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Order>> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?1");
        let order = sqlx::query_as::<_, Order>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(order)
    }

    /// Gets all items for an order.
    pub async fn get_items(&self, order_id: &str) -> DbResult<Vec<OrderItem>> {
        let sql = format!(
            "SELECT {ORDER_ITEM_COLUMNS} FROM order_items WHERE order_id = ?1 ORDER BY created_at"
        );
        let items = sqlx::query_as::<_, OrderItem>(&sql)
            .bind(order_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(items)
    }

    /// Lists orders in a given status, oldest first.
    ///
    /// The status arrives here already strictly parsed — an unknown status
    /// string fails at the API edge instead of silently matching nothing.
    pub async fn list_by_status(&self, status: OrderStatus, limit: u32) -> DbResult<Vec<Order>> {
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE status = ?1 ORDER BY created_at LIMIT ?2"
        );
        let orders = sqlx::query_as::<_, Order>(&sql)
            .bind(status)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(orders)
    }

    /// Lists the most recent orders.
    pub async fn list_recent(&self, limit: u32) -> DbResult<Vec<Order>> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC LIMIT ?1");
        let orders = sqlx::query_as::<_, Order>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(orders)
    }
}

/// Generates a new order ID.
pub fn generate_order_id() -> String {
    Uuid::new_v4().to_string()
}

/// Generates a new order item ID.
pub fn generate_order_item_id() -> String {
    Uuid::new_v4().to_string()
}
