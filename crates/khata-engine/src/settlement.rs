//! # Settlement Orchestrator
//!
//! Creates a sale as one all-or-nothing unit of work.
//!
//! ## Settlement Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  create_sale(request)                                                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  BEGIN TRANSACTION                                                     │
//! │       │                                                                 │
//! │       ├── load customer (price tier + debt standing)                   │
//! │       ├── insert sale header (total = 0)                               │
//! │       │                                                                 │
//! │       ├── for each line:                                               │
//! │       │     decompose → [debit inventory*] → snapshot item → Σ total   │
//! │       │     (* skipped when approval is required)                      │
//! │       │                                                                 │
//! │       ├── persist final total                                          │
//! │       │                                                                 │
//! │       ├── approval required? ──► COMMIT, notify approvers, done.       │
//! │       │                          No stock, no money moved yet.         │
//! │       │                                                                 │
//! │       └── else reconcile payment (excess → paydown/refund,             │
//! │           shortfall → debt) and record the outcome                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  COMMIT — or, on ANY line failure, roll back EVERYTHING                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqliteConnection;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::SettlementConfig;
use crate::error::{EngineError, EngineResult};
use crate::notify::{dispatch, Notifier, PendingApprovalNotice};
use khata_core::validation::{
    validate_line_count, validate_non_negative_amount, validate_positive_amount,
    validate_quantity,
};
use khata_core::{
    decompose, reconcile_payment, Actor, ApprovalStatus, CoreError, Customer, CustomerType,
    DebtHistoryEntry, ExcessAction, InventoryTransactionType, Money, PaymentMethod, PaymentPlan,
    Sale, SaleItem,
};
use khata_db::repository::customer::fetch_customer;
use khata_db::repository::product::fetch_product;
use khata_db::repository::sale as sale_repo;
use khata_db::{Database, StockMovement, StockRequest};

// =============================================================================
// Requests / Responses
// =============================================================================

/// One requested line: a product and a piece quantity.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleLine {
    pub product_id: String,
    pub quantity: i64,
}

/// Everything needed to settle one sale.
#[derive(Debug, Clone)]
pub struct CreateSaleRequest {
    /// The authenticated seller (opaque, from the auth collaborator).
    pub seller: Actor,

    /// Optional customer; required for any debt movement.
    pub customer_id: Option<String>,

    pub items: Vec<SaleLine>,

    pub payment_method: PaymentMethod,

    /// Amount tendered. `None` means "paid in full" (defaults to the
    /// computed total).
    pub payment_amount_cents: Option<i64>,

    pub excess_action: ExcessAction,

    /// When true, inventory and money effects wait for an admin decision.
    pub requires_approval: bool,

    pub notes: Option<String>,
}

/// The settled (or approval-pending) outcome.
#[derive(Debug, Clone)]
pub struct SettledSale {
    pub sale: Sale,
    pub items: Vec<SaleItem>,

    /// `None` while the sale is pending approval — no money has moved.
    pub plan: Option<PaymentPlan>,
}

// =============================================================================
// Settlement Service
// =============================================================================

/// Orchestrates sale settlement over the repositories and ledgers.
#[derive(Clone)]
pub struct SettlementService {
    db: Database,
    config: SettlementConfig,
    notifier: Arc<dyn Notifier>,
}

impl SettlementService {
    pub fn new(db: Database, config: SettlementConfig, notifier: Arc<dyn Notifier>) -> Self {
        SettlementService {
            db,
            config,
            notifier,
        }
    }

    pub fn config(&self) -> &SettlementConfig {
        &self.config
    }

    /// Settles one sale as a single transaction.
    ///
    /// Any line failure (stock, price, limit) aborts the whole settlement:
    /// the transaction is dropped unfinished, which rolls it back — no
    /// partial sale, no partial debit.
    pub async fn create_sale(&self, req: CreateSaleRequest) -> EngineResult<SettledSale> {
        validate_line_count(req.items.len())?;
        if let Some(paid) = req.payment_amount_cents {
            validate_non_negative_amount("paymentAmount", paid)?;
        }

        let mut tx = self.db.pool().begin().await?;

        let customer = self.load_customer(&mut tx, req.customer_id.as_deref()).await?;
        let tier = customer
            .as_ref()
            .map(|c| c.customer_type)
            .unwrap_or(CustomerType::Regular);

        let now = Utc::now();
        let sale_id = sale_repo::generate_sale_id();
        let approval_status = req.requires_approval.then_some(ApprovalStatus::Pending);

        let mut sale = Sale {
            id: sale_id.clone(),
            seller_id: req.seller.id.clone(),
            seller_name: req.seller.name.clone(),
            customer_id: customer.as_ref().map(|c| c.id.clone()),
            total_amount_cents: 0,
            payment_method: req.payment_method,
            payment_amount_cents: 0,
            excess_action: req.excess_action,
            approval_status,
            debt_paid_cents: 0,
            excess_paid_cents: 0,
            debt_added_cents: 0,
            notes: req.notes.clone(),
            created_at: now,
            updated_at: now,
        };

        sale_repo::insert_sale(&mut tx, &sale).await?;

        // Items and total are computed for every sale; the inventory debit
        // is deferred when an approval gates the sale.
        let debit_now = approval_status.is_none();
        let mut total = Money::zero();
        let mut items = Vec::with_capacity(req.items.len());

        for (index, line) in req.items.iter().enumerate() {
            let item = self
                .settle_line(&mut tx, &sale_id, line, tier, debit_now, &req.seller, now)
                .await
                .map_err(|err| err.at_line(index, &line.product_id))?;

            total += item.subtotal();
            items.push(item);
        }

        sale_repo::update_total(&mut tx, &sale_id, total.cents()).await?;
        sale.total_amount_cents = total.cents();

        let paid = Money::from_cents(req.payment_amount_cents.unwrap_or(total.cents()));
        sale.payment_amount_cents = paid.cents();

        if sale.is_pending_approval() {
            // Stop here: no inventory debit, no money reconciliation.
            // Only the tendered amount is captured for the later approval.
            sale_repo::update_reconciliation(&mut tx, &sale_id, paid.cents(), 0, 0, 0).await?;
            tx.commit().await?;

            info!(
                sale_id = %sale_id,
                total = total.cents(),
                items = items.len(),
                "Sale created, pending approval"
            );

            dispatch(
                self.notifier.clone(),
                PendingApprovalNotice {
                    sale_id: sale_id.clone(),
                    customer_name: customer.as_ref().map(|c| c.name.clone()),
                    seller_name: req.seller.name.clone(),
                    amount_cents: total.cents(),
                },
            );

            return Ok(SettledSale {
                sale,
                items,
                plan: None,
            });
        }

        let plan = reconcile_payment(
            total,
            paid,
            req.excess_action,
            customer.as_ref(),
            customer.is_some(),
        )?;

        if let Some(c) = &customer {
            if plan.moves_debt() {
                self.db
                    .debt_ledger()
                    .apply_plan(&mut tx, &c.id, &plan, &sale_id, &req.seller)
                    .await?;
            }
        }

        sale_repo::update_reconciliation(
            &mut tx,
            &sale_id,
            paid.cents(),
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
            total = total.cents(),
            paid = paid.cents(),
            debt_paid = plan.debt_paid.cents(),
            excess_paid = plan.excess_paid.cents(),
            debt_added = plan.debt_added.cents(),
            items = items.len(),
            "Sale settled"
        );

        Ok(SettledSale {
            sale,
            items,
            plan: Some(plan),
        })
    }

    /// Settles one line: decompose, optionally debit, snapshot the item.
    async fn settle_line(
        &self,
        conn: &mut SqliteConnection,
        sale_id: &str,
        line: &SaleLine,
        tier: CustomerType,
        debit_now: bool,
        seller: &Actor,
        now: chrono::DateTime<Utc>,
    ) -> EngineResult<SaleItem> {
        validate_quantity(line.quantity)?;

        let product = fetch_product(conn, &line.product_id)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(line.product_id.clone()))?;

        let split = decompose(&product, line.quantity)?;
        if split.package_size_normalized {
            warn!(
                product_id = %product.id,
                stored = product.package_size,
                "Product has invalid package size; treating as 1"
            );
        }

        let unit_price = product.price_for(tier)?;

        if debit_now {
            self.db
                .inventory_ledger()
                .debit(
                    conn,
                    &StockRequest {
                        product_id: product.id.clone(),
                        packages: split.packages,
                        pieces: split.pieces,
                        transaction_type: InventoryTransactionType::Sale,
                        reference: Some(sale_id.to_string()),
                        actor: seller.clone(),
                        reason: "sale".to_string(),
                    },
                )
                .await?;
        }

        let item = SaleItem {
            id: sale_repo::generate_sale_item_id(),
            sale_id: sale_id.to_string(),
            product_id: product.id.clone(),
            name_snapshot: product.name.clone(),
            requested_quantity: line.quantity,
            packages_sold: split.packages,
            pieces_sold: split.pieces,
            unit_price_cents: unit_price.cents(),
            subtotal_cents: unit_price.multiply_quantity(line.quantity).cents(),
            created_at: now,
        };

        sale_repo::insert_item(conn, &item).await?;

        Ok(item)
    }

    async fn load_customer(
        &self,
        conn: &mut SqliteConnection,
        customer_id: Option<&str>,
    ) -> EngineResult<Option<Customer>> {
        match customer_id {
            Some(id) => {
                let customer = fetch_customer(conn, id)
                    .await?
                    .ok_or_else(|| EngineError::Core(CoreError::CustomerNotFound(id.to_string())))?;
                Ok(Some(customer))
            }
            None => Ok(None),
        }
    }

    // =========================================================================
    // Standalone Operations
    // =========================================================================

    /// Records a walk-in debt paydown outside any sale.
    pub async fn record_debt_payment(
        &self,
        customer_id: &str,
        amount_cents: i64,
        actor: &Actor,
        notes: Option<&str>,
    ) -> EngineResult<DebtHistoryEntry> {
        validate_positive_amount("amount", amount_cents)?;

        let mut tx = self.db.pool().begin().await?;
        let entry = self
            .db
            .debt_ledger()
            .pay_debt(
                &mut tx,
                customer_id,
                Money::from_cents(amount_cents),
                None,
                notes,
                actor,
            )
            .await?;
        tx.commit().await?;

        info!(
            customer_id = %customer_id,
            amount = amount_cents,
            applied = -entry.amount_cents,
            "Debt payment recorded"
        );

        Ok(entry)
    }

    /// Receives stock into the warehouse through the ledger's credit path.
    pub async fn restock_product(
        &self,
        product_id: &str,
        packages: i64,
        pieces: i64,
        actor: &Actor,
        reason: &str,
    ) -> EngineResult<StockMovement> {
        let mut tx = self.db.pool().begin().await?;
        let movement = self
            .db
            .inventory_ledger()
            .credit(
                &mut tx,
                &StockRequest {
                    product_id: product_id.to_string(),
                    packages,
                    pieces,
                    transaction_type: InventoryTransactionType::Restock,
                    reference: None,
                    actor: actor.clone(),
                    reason: reason.to_string(),
                },
            )
            .await?;
        tx.commit().await?;

        info!(
            product_id = %product_id,
            packages,
            pieces,
            "Stock received"
        );

        Ok(movement)
    }
}
