//! # Approval Gate
//!
//! The deferred-commit pattern for sales flagged as requiring admin
//! sign-off.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │            pending ──► approved   (terminal)                            │
//! │                  └───► rejected   (terminal)                            │
//! │                                                                         │
//! │  At creation: items + total computed, NOTHING debited, NO money moved. │
//! │                                                                         │
//! │  approve(): performs the deferred per-line inventory debit, then the   │
//! │             money reconciliation — at the prices and totals captured   │
//! │             when the sale was created. Prices are NOT recomputed.      │
//! │                                                                         │
//! │  reject():  flips the status. No inventory or money side effects,     │
//! │             ever.                                                       │
//! │                                                                         │
//! │  Either action on an already-resolved sale fails AlreadyProcessed;     │
//! │  the status-guarded UPDATE makes the race a clean loser.               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::SqliteConnection;
use tracing::info;

use crate::error::{EngineError, EngineResult};
use khata_core::{
    reconcile_payment, Actor, ApprovalStatus, CoreError, InventoryTransactionType, Money,
    PaymentPlan, Sale, SaleItem,
};
use khata_db::repository::customer::fetch_customer;
use khata_db::repository::sale as sale_repo;
use khata_db::{Database, StockRequest};

/// The outcome of an approval decision.
#[derive(Debug, Clone)]
pub struct ApprovedSale {
    pub sale: Sale,
    pub items: Vec<SaleItem>,
    pub plan: PaymentPlan,
}

/// Resolves pending sales.
#[derive(Debug, Clone)]
pub struct ApprovalService {
    db: Database,
}

impl ApprovalService {
    pub fn new(db: Database) -> Self {
        ApprovalService { db }
    }

    /// Approves a pending sale: commits the deferred inventory debit and
    /// money reconciliation in one transaction.
    pub async fn approve_sale(&self, sale_id: &str, actor: &Actor) -> EngineResult<ApprovedSale> {
        let mut tx = self.db.pool().begin().await?;

        let mut sale = require_pending(&mut tx, sale_id).await?;

        // Claim the pending status first; losing this race means someone
        // else resolved the sale between our read and this write.
        if !sale_repo::resolve_approval(&mut tx, sale_id, ApprovalStatus::Approved).await? {
            return Err(already_processed(sale_id, "resolved"));
        }
        sale.approval_status = Some(ApprovalStatus::Approved);

        // Deferred debit: the split captured at creation, debited now.
        let items = sale_repo::fetch_items(&mut tx, sale_id).await?;
        for (index, item) in items.iter().enumerate() {
            self.db
                .inventory_ledger()
                .debit(
                    &mut tx,
                    &StockRequest {
                        product_id: item.product_id.clone(),
                        packages: item.packages_sold,
                        pieces: item.pieces_sold,
                        transaction_type: InventoryTransactionType::SaleApproved,
                        reference: Some(sale_id.to_string()),
                        actor: actor.clone(),
                        reason: "sale approved".to_string(),
                    },
                )
                .await
                .map_err(|err| EngineError::from(err).at_line(index, &item.product_id))?;
        }

        // Money reconciliation at creation-time totals; prices are not
        // recomputed.
        let customer = match &sale.customer_id {
            Some(id) => Some(
                fetch_customer(&mut tx, id)
                    .await?
                    .ok_or_else(|| CoreError::CustomerNotFound(id.clone()))?,
            ),
            None => None,
        };

        let plan = reconcile_payment(
            Money::from_cents(sale.total_amount_cents),
            Money::from_cents(sale.payment_amount_cents),
            sale.excess_action,
            customer.as_ref(),
            customer.is_some(),
        )?;

        if let Some(c) = &customer {
            if plan.moves_debt() {
                self.db
                    .debt_ledger()
                    .apply_plan(&mut tx, &c.id, &plan, sale_id, actor)
                    .await?;
            }
        }

        sale_repo::update_reconciliation(
            &mut tx,
            sale_id,
            sale.payment_amount_cents,
            plan.debt_paid.cents(),
            plan.excess_paid.cents(),
            plan.debt_added.cents(),
        )
        .await?;

        sale.debt_paid_cents = plan.debt_paid.cents();
        sale.excess_paid_cents = plan.excess_paid.cents();
        sale.debt_added_cents = plan.debt_added.cents();

        tx.commit().await?;

        info!(
            sale_id = %sale_id,
            approver = %actor.name,
            total = sale.total_amount_cents,
            "Sale approved"
        );

        Ok(ApprovedSale { sale, items, plan })
    }

    /// Rejects a pending sale. Terminal state only — no inventory or
    /// money side effects ever occur for a rejected sale.
    pub async fn reject_sale(&self, sale_id: &str, actor: &Actor) -> EngineResult<Sale> {
        let mut tx = self.db.pool().begin().await?;

        let mut sale = require_pending(&mut tx, sale_id).await?;

        if !sale_repo::resolve_approval(&mut tx, sale_id, ApprovalStatus::Rejected).await? {
            return Err(already_processed(sale_id, "resolved"));
        }
        sale.approval_status = Some(ApprovalStatus::Rejected);

        tx.commit().await?;

        info!(sale_id = %sale_id, approver = %actor.name, "Sale rejected");

        Ok(sale)
    }
}

/// Loads a sale and verifies it is still waiting for a decision.
async fn require_pending(conn: &mut SqliteConnection, sale_id: &str) -> EngineResult<Sale> {
    let sale = sale_repo::fetch_sale(conn, sale_id)
        .await?
        .ok_or_else(|| CoreError::SaleNotFound(sale_id.to_string()))?;

    match sale.approval_status {
        Some(ApprovalStatus::Pending) => Ok(sale),
        Some(status) => Err(already_processed(sale_id, status.as_str())),
        // Sales that never required approval were settled at creation.
        None => Err(already_processed(sale_id, "approved")),
    }
}

fn already_processed(sale_id: &str, status: &str) -> EngineError {
    EngineError::Core(CoreError::AlreadyProcessed {
        sale_id: sale_id.to_string(),
        status: status.to_string(),
    })
}
