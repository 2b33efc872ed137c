//! # Order Lifecycle Controller
//!
//! Drives an order's status state machine and its ledger effects.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  create_order() ── debits inventory IMMEDIATELY (no approval gate)     │
//! │       │                                                                 │
//! │  pending ──► processing ──► completed ──► cancelled / returned         │
//! │     │            │              │                                       │
//! │     │            │              └── materializes the Sale of record    │
//! │     │            │                  (explicit call, not an observer)   │
//! │     │            │                                                      │
//! │     └────────────┴──► cancelled / returned                             │
//! │                          │                                              │
//! │                          └── credits every item back through the       │
//! │                              ledger, audit-tagged order_cancelled /    │
//! │                              order_returned                            │
//! │                                                                         │
//! │  Stock was debited at creation, so the reversal fires from EVERY       │
//! │  post-creation state — cancelling a pending order restores stock too.  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::{info, warn};

use crate::config::SettlementConfig;
use crate::error::{EngineError, EngineResult};
use crate::settlement::SaleLine;
use khata_core::validation::{validate_line_count, validate_quantity};
use khata_core::{
    decompose, reconcile_payment, Actor, CoreError, CustomerType, ExcessAction,
    InventoryTransactionType, Money, Order, OrderItem, OrderStatus, PaymentMethod, Sale,
    ValidationError,
};
use khata_db::repository::customer::fetch_customer;
use khata_db::repository::order as order_repo;
use khata_db::repository::product::fetch_product;
use khata_db::repository::sale as sale_repo;
use khata_db::{Database, StockRequest};

// =============================================================================
// Requests / Responses
// =============================================================================

/// Everything needed to place one order.
#[derive(Debug, Clone)]
pub struct CreateOrderRequest {
    /// The order owner. `None` falls back to the configured default
    /// seller — which seller to auto-select is a business rule outside
    /// the core.
    pub seller: Option<Actor>,

    pub customer_id: Option<String>,

    pub items: Vec<SaleLine>,

    pub payment_method: PaymentMethod,

    pub notes: Option<String>,
}

/// A placed order with its lines.
#[derive(Debug, Clone)]
pub struct PlacedOrder {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

/// The outcome of a status transition.
#[derive(Debug, Clone)]
pub struct TransitionedOrder {
    pub order: Order,

    /// Set when the transition to `completed` materialized a sale.
    pub sale: Option<Sale>,
}

// =============================================================================
// Order Service
// =============================================================================

/// Manages the order lifecycle over the repositories and ledgers.
#[derive(Debug, Clone)]
pub struct OrderService {
    db: Database,
    config: SettlementConfig,
}

impl OrderService {
    pub fn new(db: Database, config: SettlementConfig) -> Self {
        OrderService { db, config }
    }

    /// Places an order, debiting inventory immediately.
    ///
    /// Orders have no approval gate; the stock leaves the warehouse when
    /// the order is created, and every later cancellation/return credits
    /// it back.
    pub async fn create_order(&self, req: CreateOrderRequest) -> EngineResult<PlacedOrder> {
        validate_line_count(req.items.len())?;

        let seller = req
            .seller
            .or_else(|| self.config.default_order_seller.clone())
            .ok_or(ValidationError::Required {
                field: "seller".to_string(),
            })?;

        let mut tx = self.db.pool().begin().await?;

        let customer = match &req.customer_id {
            Some(id) => Some(
                fetch_customer(&mut tx, id)
                    .await?
                    .ok_or_else(|| CoreError::CustomerNotFound(id.clone()))?,
            ),
            None => None,
        };
        let tier = customer
            .as_ref()
            .map(|c| c.customer_type)
            .unwrap_or(CustomerType::Regular);

        let now = Utc::now();
        let order_id = order_repo::generate_order_id();

        let mut order = Order {
            id: order_id.clone(),
            seller_id: seller.id.clone(),
            seller_name: seller.name.clone(),
            customer_id: customer.as_ref().map(|c| c.id.clone()),
            status: OrderStatus::Pending,
            total_amount_cents: 0,
            payment_method: req.payment_method,
            sale_id: None,
            notes: req.notes.clone(),
            created_at: now,
            updated_at: now,
        };

        order_repo::insert_order(&mut tx, &order).await?;

        let mut total = Money::zero();
        let mut items = Vec::with_capacity(req.items.len());

        for (index, line) in req.items.iter().enumerate() {
            let item = self
                .place_line(&mut tx, &order_id, line, tier, &seller, now)
                .await
                .map_err(|err| err.at_line(index, &line.product_id))?;

            total += Money::from_cents(item.subtotal_cents);
            items.push(item);
        }

        order_repo::update_total(&mut tx, &order_id, total.cents()).await?;
        order.total_amount_cents = total.cents();

        tx.commit().await?;

        info!(
            order_id = %order_id,
            total = total.cents(),
            items = items.len(),
            "Order placed"
        );

        Ok(PlacedOrder { order, items })
    }

    /// Moves an order to a new status, with the ledger effects the
    /// transition implies.
    pub async fn update_status(
        &self,
        order_id: &str,
        to: OrderStatus,
        actor: &Actor,
    ) -> EngineResult<TransitionedOrder> {
        let mut tx = self.db.pool().begin().await?;

        let mut order = order_repo::fetch_order(&mut tx, order_id)
            .await?
            .ok_or_else(|| CoreError::OrderNotFound(order_id.to_string()))?;

        let from = order.status;
        let invalid = || {
            EngineError::Core(CoreError::InvalidTransition {
                order_id: order_id.to_string(),
                from: from.as_str().to_string(),
                to: to.as_str().to_string(),
            })
        };

        if !from.can_transition_to(to) {
            return Err(invalid());
        }

        // Status-guarded UPDATE: a concurrent transition loses cleanly.
        if !order_repo::transition_status(&mut tx, order_id, from, to).await? {
            return Err(invalid());
        }
        order.status = to;
        order.updated_at = Utc::now();

        let sale = match to {
            OrderStatus::Completed => {
                let sale = self.materialize_sale(&mut tx, &order).await?;
                order.sale_id = Some(sale.id.clone());
                Some(sale)
            }
            OrderStatus::Cancelled | OrderStatus::Returned => {
                self.reverse_inventory(&mut tx, &order, from, to, actor).await?;
                None
            }
            // pending → processing is a pure status change.
            _ => None,
        };

        tx.commit().await?;

        info!(
            order_id = %order_id,
            from = from.as_str(),
            to = to.as_str(),
            actor = %actor.name,
            "Order transitioned"
        );

        Ok(TransitionedOrder { order, sale })
    }

    /// Places one line: decompose, debit, snapshot the item.
    async fn place_line(
        &self,
        conn: &mut SqliteConnection,
        order_id: &str,
        line: &SaleLine,
        tier: CustomerType,
        seller: &Actor,
        now: chrono::DateTime<Utc>,
    ) -> EngineResult<OrderItem> {
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

        self.db
            .inventory_ledger()
            .debit(
                conn,
                &StockRequest {
                    product_id: product.id.clone(),
                    packages: split.packages,
                    pieces: split.pieces,
                    transaction_type: InventoryTransactionType::OrderCreated,
                    reference: Some(order_id.to_string()),
                    actor: seller.clone(),
                    reason: "order created".to_string(),
                },
            )
            .await?;

        let item = OrderItem {
            id: order_repo::generate_order_item_id(),
            order_id: order_id.to_string(),
            product_id: product.id.clone(),
            name_snapshot: product.name.clone(),
            requested_quantity: line.quantity,
            packages_sold: split.packages,
            pieces_sold: split.pieces,
            unit_price_cents: unit_price.cents(),
            subtotal_cents: unit_price.multiply_quantity(line.quantity).cents(),
            created_at: now,
        };

        order_repo::insert_item(conn, &item).await?;

        Ok(item)
    }

    /// Completion materializes the sale of record from the order's items.
    ///
    /// Inventory was already debited when the order was created — the
    /// creation-time ledger rows (referencing the order id) remain the
    /// stock record. Completion only moves the money side, at the prices
    /// captured on the order lines.
    async fn materialize_sale(
        &self,
        conn: &mut SqliteConnection,
        order: &Order,
    ) -> EngineResult<Sale> {
        let items = order_repo::fetch_items(conn, &order.id).await?;
        let now = Utc::now();
        let sale_id = sale_repo::generate_sale_id();
        let total = Money::from_cents(order.total_amount_cents);

        let customer = match &order.customer_id {
            Some(id) => fetch_customer(conn, id).await?,
            None => None,
        };

        // The order is paid at its own amount; an exact payment moves no
        // debt, but the reconciliation is still computed and recorded the
        // same way a counter sale's would be.
        let plan = reconcile_payment(
            total,
            total,
            ExcessAction::Return,
            customer.as_ref(),
            customer.is_some(),
        )?;

        let sale = Sale {
            id: sale_id.clone(),
            seller_id: order.seller_id.clone(),
            seller_name: order.seller_name.clone(),
            customer_id: order.customer_id.clone(),
            total_amount_cents: total.cents(),
            payment_method: order.payment_method,
            payment_amount_cents: total.cents(),
            excess_action: ExcessAction::Return,
            approval_status: None,
            debt_paid_cents: plan.debt_paid.cents(),
            excess_paid_cents: plan.excess_paid.cents(),
            debt_added_cents: plan.debt_added.cents(),
            notes: Some(format!("completed order {}", order.id)),
            created_at: now,
            updated_at: now,
        };

        sale_repo::insert_sale(conn, &sale).await?;

        for item in &items {
            let sale_item = khata_core::SaleItem {
                id: sale_repo::generate_sale_item_id(),
                sale_id: sale_id.clone(),
                product_id: item.product_id.clone(),
                name_snapshot: item.name_snapshot.clone(),
                requested_quantity: item.requested_quantity,
                packages_sold: item.packages_sold,
                pieces_sold: item.pieces_sold,
                unit_price_cents: item.unit_price_cents,
                subtotal_cents: item.subtotal_cents,
                created_at: now,
            };
            sale_repo::insert_item(conn, &sale_item).await?;
        }

        order_repo::link_sale(conn, &order.id, &sale_id).await?;

        Ok(sale)
    }

    /// Credits every line back through the ledger.
    async fn reverse_inventory(
        &self,
        conn: &mut SqliteConnection,
        order: &Order,
        from: OrderStatus,
        to: OrderStatus,
        actor: &Actor,
    ) -> EngineResult<()> {
        if !from.reversal_restores_stock() {
            return Ok(());
        }

        let (transaction_type, reason) = match to {
            OrderStatus::Returned => (InventoryTransactionType::OrderReturned, "order_returned"),
            _ => (InventoryTransactionType::OrderCancelled, "order_cancelled"),
        };

        let items = order_repo::fetch_items(conn, &order.id).await?;

        for item in &items {
            self.db
                .inventory_ledger()
                .credit(
                    conn,
                    &StockRequest {
                        product_id: item.product_id.clone(),
                        packages: item.packages_sold,
                        pieces: item.pieces_sold,
                        transaction_type,
                        reference: Some(order.id.clone()),
                        actor: actor.clone(),
                        reason: reason.to_string(),
                    },
                )
                .await?;
        }

        Ok(())
    }
}
