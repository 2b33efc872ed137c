//! # Debt Ledger
//!
//! The only code allowed to move `customers.debt_balance_cents`.
//!
//! ## The Khata Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  add_debt(amount)   balance += amount        (ceiling checked upstream) │
//! │  pay_debt(amount)   balance = max(0, balance - amount)                  │
//! │                     — a payment alone never drives debt negative        │
//! │                                                                         │
//! │  Every movement appends a debt_history row carrying BOTH               │
//! │  balance_before and balance_after, captured at write time.             │
//! │  after == before + amount is the invariant readers rely on;            │
//! │  history is never recomputed from the current balance.                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::debug;
use uuid::Uuid;

use crate::ledger::{LedgerError, LedgerResult};
use crate::repository::customer::fetch_customer;
use khata_core::{
    Actor, CoreError, Customer, DebtEntryType, DebtHistoryEntry, Money, PaymentPlan,
    ValidationError,
};

// =============================================================================
// Debt Ledger
// =============================================================================

/// Stateless handle for debt movements.
///
/// Operations take `&mut SqliteConnection` so the caller's transaction is
/// the unit of work.
#[derive(Debug, Clone, Copy, Default)]
pub struct DebtLedger;

impl DebtLedger {
    pub fn new() -> Self {
        DebtLedger
    }

    /// Adds to a customer's debt (a shortfall becoming debt).
    ///
    /// The debt ceiling is a settlement-time decision checked by the
    /// payment reconciliation; this ledger records what was decided.
    pub async fn add_debt(
        &self,
        conn: &mut SqliteConnection,
        customer_id: &str,
        amount: Money,
        reference: Option<&str>,
        notes: Option<&str>,
        actor: &Actor,
    ) -> LedgerResult<DebtHistoryEntry> {
        if !amount.is_positive() {
            return Err(ValidationError::MustBePositive {
                field: "amount".to_string(),
            }
            .into());
        }

        let customer = require_customer(conn, customer_id).await?;
        let balance_after = customer.debt_balance_cents + amount.cents();

        self.record(
            conn,
            &customer,
            balance_after,
            DebtEntryType::DebtAdded,
            reference,
            notes,
            actor,
        )
        .await
    }

    /// Pays down a customer's debt.
    ///
    /// `balance = max(0, balance - amount)`: paying more than is owed
    /// clamps at zero, and the history row records the actual movement.
    pub async fn pay_debt(
        &self,
        conn: &mut SqliteConnection,
        customer_id: &str,
        amount: Money,
        reference: Option<&str>,
        notes: Option<&str>,
        actor: &Actor,
    ) -> LedgerResult<DebtHistoryEntry> {
        if !amount.is_positive() {
            return Err(ValidationError::MustBePositive {
                field: "amount".to_string(),
            }
            .into());
        }

        let customer = require_customer(conn, customer_id).await?;
        let balance_after = customer.debt_balance().saturating_sub(amount).cents();

        self.record(
            conn,
            &customer,
            balance_after,
            DebtEntryType::DebtPaid,
            reference,
            notes,
            actor,
        )
        .await
    }

    /// Checks whether `additional` more debt stays under the ceiling.
    ///
    /// Passes when the customer has no limit configured.
    pub async fn check_limit(
        &self,
        conn: &mut SqliteConnection,
        customer_id: &str,
        additional: Money,
    ) -> LedgerResult<()> {
        let customer = require_customer(conn, customer_id).await?;

        if !customer.within_debt_limit(additional) {
            return Err(LedgerError::Domain(CoreError::DebtLimitExceeded {
                customer: customer.name,
                balance_cents: customer.debt_balance_cents,
                additional_cents: additional.cents(),
                limit_cents: customer.debt_limit_cents.unwrap_or(0),
            }));
        }

        Ok(())
    }

    /// Applies a settlement's reconciliation plan.
    ///
    /// At most two history rows: the excess paydown and the shortfall.
    /// (By construction a plan never carries both.)
    pub async fn apply_plan(
        &self,
        conn: &mut SqliteConnection,
        customer_id: &str,
        plan: &PaymentPlan,
        reference: &str,
        actor: &Actor,
    ) -> LedgerResult<Vec<DebtHistoryEntry>> {
        let mut entries = Vec::new();

        if plan.debt_paid.is_positive() {
            entries.push(
                self.pay_debt(
                    conn,
                    customer_id,
                    plan.debt_paid,
                    Some(reference),
                    Some("excess payment applied to outstanding debt"),
                    actor,
                )
                .await?,
            );
        }

        if plan.debt_added.is_positive() {
            entries.push(
                self.add_debt(
                    conn,
                    customer_id,
                    plan.debt_added,
                    Some(reference),
                    Some("unpaid amount added to debt"),
                    actor,
                )
                .await?,
            );
        }

        Ok(entries)
    }

    /// Writes the balance and its history row.
    async fn record(
        &self,
        conn: &mut SqliteConnection,
        customer: &Customer,
        balance_after: i64,
        entry_type: DebtEntryType,
        reference: Option<&str>,
        notes: Option<&str>,
        actor: &Actor,
    ) -> LedgerResult<DebtHistoryEntry> {
        let balance_before = customer.debt_balance_cents;
        let amount = balance_after - balance_before;
        let now = Utc::now();

        // The balance guard is the serialization backstop: if another
        // settlement moved this customer's balance between our read and
        // this write, zero rows match and the whole unit of work rolls
        // back instead of silently losing a movement.
        let result = sqlx::query(
            r#"
            UPDATE customers SET
                debt_balance_cents = ?2,
                updated_at = ?3
            WHERE id = ?1 AND debt_balance_cents = ?4
            "#,
        )
        .bind(&customer.id)
        .bind(balance_after)
        .bind(now)
        .bind(balance_before)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(LedgerError::Domain(CoreError::InvariantViolation(format!(
                "debt balance for customer {} moved during settlement",
                customer.id
            ))));
        }

        let entry = DebtHistoryEntry {
            id: Uuid::new_v4().to_string(),
            customer_id: customer.id.clone(),
            amount_cents: amount,
            balance_before_cents: balance_before,
            balance_after_cents: balance_after,
            entry_type,
            reference: reference.map(str::to_string),
            notes: notes.map(str::to_string),
            actor_id: actor.id.clone(),
            actor_name: actor.name.clone(),
            created_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO debt_history (
                id, customer_id, amount_cents,
                balance_before_cents, balance_after_cents,
                entry_type, reference, notes,
                actor_id, actor_name, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&entry.id)
        .bind(&entry.customer_id)
        .bind(entry.amount_cents)
        .bind(entry.balance_before_cents)
        .bind(entry.balance_after_cents)
        .bind(entry.entry_type)
        .bind(&entry.reference)
        .bind(&entry.notes)
        .bind(&entry.actor_id)
        .bind(&entry.actor_name)
        .bind(entry.created_at)
        .execute(&mut *conn)
        .await?;

        debug!(
            customer_id = %entry.customer_id,
            amount = entry.amount_cents,
            balance_before,
            balance_after,
            entry_type = entry_type.as_str(),
            "Debt moved"
        );

        Ok(entry)
    }

    /// Debt history for a customer, newest first.
    pub async fn history(
        &self,
        conn: &mut SqliteConnection,
        customer_id: &str,
        limit: u32,
    ) -> LedgerResult<Vec<DebtHistoryEntry>> {
        let entries = sqlx::query_as::<_, DebtHistoryEntry>(
            "SELECT id, customer_id, amount_cents, balance_before_cents, balance_after_cents, \
             entry_type, reference, notes, actor_id, actor_name, created_at \
             FROM debt_history WHERE customer_id = ?1 ORDER BY created_at DESC LIMIT ?2",
        )
        .bind(customer_id)
        .bind(limit)
        .fetch_all(conn)
        .await
        .map_err(LedgerError::from)?;

        Ok(entries)
    }
}

async fn require_customer(
    conn: &mut SqliteConnection,
    customer_id: &str,
) -> LedgerResult<Customer> {
    fetch_customer(conn, customer_id)
        .await?
        .ok_or_else(|| LedgerError::Domain(CoreError::CustomerNotFound(customer_id.to_string())))
}
