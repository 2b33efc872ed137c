//! # Customer Repository
//!
//! Database operations for customers.
//!
//! ## What Is NOT Here
//! `debt_balance_cents` mutation. The running balance belongs to the debt
//! ledger ([`crate::ledger::debt`]); `update()` excludes it so a profile
//! edit can never clobber a concurrent settlement's reconciliation.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use khata_core::Customer;

/// Column list shared by every customer SELECT.
const CUSTOMER_COLUMNS: &str = "id, name, phone, customer_type, debt_balance_cents, \
     debt_limit_cents, is_active, created_at, updated_at";

/// Fetches a customer by id on an explicit connection.
///
/// Settlements call this inside their transaction so the balance they
/// reconcile against is the one the debt ledger will move.
pub async fn fetch_customer(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Customer>> {
    let sql = format!("SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = ?1");
    let customer = sqlx::query_as::<_, Customer>(&sql)
        .bind(id)
        .fetch_optional(conn)
        .await?;

    Ok(customer)
}

/// Repository for customer database operations.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    /// Creates a new CustomerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    /// Gets a customer by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Customer>> {
        let sql = format!("SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = ?1");
        let customer = sqlx::query_as::<_, Customer>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(customer)
    }

    /// Lists active customers sorted by name.
    pub async fn list_active(&self, limit: u32) -> DbResult<Vec<Customer>> {
        let sql = format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE is_active = 1 ORDER BY name LIMIT ?1"
        );
        let customers = sqlx::query_as::<_, Customer>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(customers)
    }

    /// Inserts a new customer.
    pub async fn insert(&self, customer: &Customer) -> DbResult<()> {
        debug!(name = %customer.name, "Inserting customer");

        sqlx::query(
            r#"
            INSERT INTO customers (
                id, name, phone, customer_type,
                debt_balance_cents, debt_limit_cents,
                is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&customer.id)
        .bind(&customer.name)
        .bind(&customer.phone)
        .bind(customer.customer_type)
        .bind(customer.debt_balance_cents)
        .bind(customer.debt_limit_cents)
        .bind(customer.is_active)
        .bind(customer.created_at)
        .bind(customer.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Updates a customer's profile fields.
    ///
    /// The debt balance is excluded on purpose — only the debt ledger
    /// moves it.
    pub async fn update(&self, customer: &Customer) -> DbResult<()> {
        debug!(id = %customer.id, "Updating customer");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE customers SET
                name = ?2,
                phone = ?3,
                customer_type = ?4,
                debt_limit_cents = ?5,
                is_active = ?6,
                updated_at = ?7
            WHERE id = ?1
            "#,
        )
        .bind(&customer.id)
        .bind(&customer.name)
        .bind(&customer.phone)
        .bind(customer.customer_type)
        .bind(customer.debt_limit_cents)
        .bind(customer.is_active)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", &customer.id));
        }

        Ok(())
    }

    /// Soft-deletes a customer.
    ///
    /// Settled sales keep their (nullable) customer reference via
    /// `ON DELETE SET NULL` — deletion detaches, never cascades.
    pub async fn soft_delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Soft-deleting customer");

        let now = Utc::now();

        let result =
            sqlx::query("UPDATE customers SET is_active = 0, updated_at = ?2 WHERE id = ?1")
                .bind(id)
                .bind(now)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", id));
        }

        Ok(())
    }
}

/// Helper to generate a new customer ID.
pub fn generate_customer_id() -> String {
    Uuid::new_v4().to_string()
}
