//! End-to-end settlement tests.
//!
//! Each test drives the services against a fresh in-memory database, the
//! way an API shell would: create sales and orders, resolve approvals,
//! walk the order lifecycle, and check the ledgers afterwards.

use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use khata_core::{
    Actor, ApprovalStatus, CoreError, Customer, CustomerType, ExcessAction, OrderStatus,
    PaymentMethod, Product,
};
use khata_engine::{
    ApprovalService, CreateOrderRequest, CreateSaleRequest, EngineError, LogNotifier,
    OrderService, SaleLine, SettlementConfig, SettlementService,
};
use khata_db::{Database, DbConfig};

// =============================================================================
// Harness
// =============================================================================

struct Harness {
    db: Database,
    settlement: SettlementService,
    approval: ApprovalService,
    orders: OrderService,
}

async fn harness() -> Harness {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    let config = SettlementConfig::default();
    Harness {
        settlement: SettlementService::new(db.clone(), config.clone(), Arc::new(LogNotifier)),
        approval: ApprovalService::new(db.clone()),
        orders: OrderService::new(db.clone(), config),
        db,
    }
}

fn seller() -> Actor {
    Actor::new("u-1", "counter seller", "seller")
}

fn admin() -> Actor {
    Actor::new("u-2", "store admin", "admin")
}

async fn seed_product(db: &Database, package_size: i64, packages: i64, pieces: i64) -> Product {
    let now = Utc::now();
    let product = Product {
        id: Uuid::new_v4().to_string(),
        sku: format!("SKU-{}", Uuid::new_v4()),
        name: "Sooper Classic".to_string(),
        package_size,
        packages_in_stock: packages,
        pieces_in_stock: pieces,
        wholesale_price_cents: 400,
        retail_price_cents: 500,
        regular_price_cents: 550,
        cost_price_cents: 350,
        is_active: true,
        created_at: now,
        updated_at: now,
    };
    db.products().insert(&product).await.unwrap();
    product
}

async fn seed_customer(db: &Database, debt_cents: i64, limit_cents: Option<i64>) -> Customer {
    let now = Utc::now();
    let customer = Customer {
        id: Uuid::new_v4().to_string(),
        name: "Haji Riaz".to_string(),
        phone: None,
        customer_type: CustomerType::Retail,
        debt_balance_cents: debt_cents,
        debt_limit_cents: limit_cents,
        is_active: true,
        created_at: now,
        updated_at: now,
    };
    db.customers().insert(&customer).await.unwrap();
    customer
}

fn sale_request(customer_id: Option<String>, items: Vec<SaleLine>) -> CreateSaleRequest {
    CreateSaleRequest {
        seller: seller(),
        customer_id,
        items,
        payment_method: PaymentMethod::Cash,
        payment_amount_cents: None,
        excess_action: ExcessAction::Return,
        requires_approval: false,
        notes: None,
    }
}

async fn stock_of(db: &Database, product_id: &str) -> (i64, i64) {
    let p = db.products().get_by_id(product_id).await.unwrap().unwrap();
    (p.packages_in_stock, p.pieces_in_stock)
}

async fn debt_of(db: &Database, customer_id: &str) -> i64 {
    db.customers()
        .get_by_id(customer_id)
        .await
        .unwrap()
        .unwrap()
        .debt_balance_cents
}

// =============================================================================
// Settlement
// =============================================================================

#[tokio::test]
async fn settles_a_sale_and_keeps_totals_consistent() {
    let h = harness().await;
    let product = seed_product(&h.db, 10, 2, 3).await;
    let customer = seed_customer(&h.db, 0, None).await;

    let settled = h
        .settlement
        .create_sale(sale_request(
            Some(customer.id.clone()),
            vec![SaleLine {
                product_id: product.id.clone(),
                quantity: 12,
            }],
        ))
        .await
        .unwrap();

    // Retail tier: 12 × 500
    assert_eq!(settled.sale.total_amount_cents, 6000);
    assert_eq!(
        settled.sale.total_amount_cents,
        settled.items.iter().map(|i| i.subtotal_cents).sum::<i64>()
    );
    assert_eq!(settled.items[0].packages_sold, 1);
    assert_eq!(settled.items[0].pieces_sold, 2);
    // No approval requested: settled immediately, no approval state.
    assert_eq!(settled.sale.approval_status, None);

    assert_eq!(stock_of(&h.db, &product.id).await, (1, 1));

    // Unspecified payment defaults to the total: nothing owed, nothing back.
    let plan = settled.plan.unwrap();
    assert_eq!(plan.excess_paid.cents(), 0);
    assert_eq!(plan.debt_added.cents(), 0);
}

#[tokio::test]
async fn excess_pays_down_existing_debt_before_refunding() {
    let h = harness().await;
    let product = seed_product(&h.db, 10, 3, 5).await;
    let customer = seed_customer(&h.db, 5000, None).await;

    // total 10000 (20 pcs × 500), paid 12000, excess → debt
    let mut req = sale_request(
        Some(customer.id.clone()),
        vec![SaleLine {
            product_id: product.id.clone(),
            quantity: 20,
        }],
    );
    req.payment_amount_cents = Some(12000);
    req.excess_action = ExcessAction::Debt;

    let settled = h.settlement.create_sale(req).await.unwrap();

    // Excess 2000 fully absorbed by the 5000 owed.
    assert_eq!(settled.sale.debt_paid_cents, 2000);
    assert_eq!(settled.sale.excess_paid_cents, 0);
    assert_eq!(debt_of(&h.db, &customer.id).await, 3000);

    // The history row was captured, not recomputed.
    let (amount, before, after): (i64, i64, i64) = sqlx::query_as(
        "SELECT amount_cents, balance_before_cents, balance_after_cents \
         FROM debt_history WHERE customer_id = ?1",
    )
    .bind(&customer.id)
    .fetch_one(h.db.pool())
    .await
    .unwrap();
    assert_eq!((amount, before, after), (-2000, 5000, 3000));
}

#[tokio::test]
async fn excess_with_no_debt_is_refunded_in_full() {
    let h = harness().await;
    let product = seed_product(&h.db, 10, 3, 5).await;
    let customer = seed_customer(&h.db, 0, None).await;

    let mut req = sale_request(
        Some(customer.id.clone()),
        vec![SaleLine {
            product_id: product.id.clone(),
            quantity: 20,
        }],
    );
    req.payment_amount_cents = Some(12000);
    req.excess_action = ExcessAction::Debt;

    let settled = h.settlement.create_sale(req).await.unwrap();

    // Nothing owed: the debt action degrades to a refund.
    assert_eq!(settled.sale.debt_paid_cents, 0);
    assert_eq!(settled.sale.excess_paid_cents, 2000);
    assert_eq!(debt_of(&h.db, &customer.id).await, 0);
}

#[tokio::test]
async fn shortfall_becomes_debt_for_a_known_customer() {
    let h = harness().await;
    let product = seed_product(&h.db, 10, 3, 5).await;
    let customer = seed_customer(&h.db, 1000, None).await;

    let mut req = sale_request(
        Some(customer.id.clone()),
        vec![SaleLine {
            product_id: product.id.clone(),
            quantity: 20,
        }],
    );
    req.payment_amount_cents = Some(8000);

    let settled = h.settlement.create_sale(req).await.unwrap();

    assert_eq!(settled.sale.debt_added_cents, 2000);
    assert_eq!(debt_of(&h.db, &customer.id).await, 3000);
}

#[tokio::test]
async fn shortfall_without_customer_rolls_back_everything() {
    let h = harness().await;
    let product = seed_product(&h.db, 10, 3, 5).await;

    let mut req = sale_request(
        None,
        vec![SaleLine {
            product_id: product.id.clone(),
            quantity: 20,
        }],
    );
    req.payment_amount_cents = Some(8000);

    let err = h.settlement.create_sale(req).await.unwrap_err();
    assert!(matches!(
        err.root(),
        EngineError::Core(CoreError::PaymentInsufficient { .. })
    ));

    // The debit and the header both rolled back.
    assert_eq!(stock_of(&h.db, &product.id).await, (3, 5));
    let sales: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales")
        .fetch_one(h.db.pool())
        .await
        .unwrap();
    assert_eq!(sales, 0);
}

#[tokio::test]
async fn debt_ceiling_aborts_the_settlement() {
    let h = harness().await;
    let product = seed_product(&h.db, 10, 3, 5).await;
    let customer = seed_customer(&h.db, 4000, Some(5000)).await;

    let mut req = sale_request(
        Some(customer.id.clone()),
        vec![SaleLine {
            product_id: product.id.clone(),
            quantity: 20,
        }],
    );
    req.payment_amount_cents = Some(8000);

    let err = h.settlement.create_sale(req).await.unwrap_err();
    assert!(matches!(
        err.root(),
        EngineError::Core(CoreError::DebtLimitExceeded { .. })
    ));
    assert_eq!(stock_of(&h.db, &product.id).await, (3, 5));
    assert_eq!(debt_of(&h.db, &customer.id).await, 4000);
}

#[tokio::test]
async fn one_bad_line_aborts_every_line() {
    let h = harness().await;
    let good = seed_product(&h.db, 10, 2, 3).await;
    let short = seed_product(&h.db, 10, 0, 2).await;

    let err = h
        .settlement
        .create_sale(sale_request(
            None,
            vec![
                SaleLine {
                    product_id: good.id.clone(),
                    quantity: 5,
                },
                SaleLine {
                    product_id: short.id.clone(),
                    quantity: 10,
                },
            ],
        ))
        .await
        .unwrap_err();

    // The error points at the failing line...
    match &err {
        EngineError::LineFailed { index, product_id, .. } => {
            assert_eq!(*index, 1);
            assert_eq!(product_id, &short.id);
        }
        other => panic!("expected LineFailed, got {other}"),
    }
    assert!(matches!(
        err.root(),
        EngineError::Core(CoreError::InsufficientStock { .. })
    ));

    // ...and the good line's debit did not survive.
    assert_eq!(stock_of(&h.db, &good.id).await, (2, 3));
}

// =============================================================================
// Approval Gate
// =============================================================================

#[tokio::test]
async fn approval_defers_stock_and_money_until_approved() {
    let h = harness().await;
    let product = seed_product(&h.db, 10, 3, 5).await;
    let customer = seed_customer(&h.db, 5000, None).await;

    let mut req = sale_request(
        Some(customer.id.clone()),
        vec![SaleLine {
            product_id: product.id.clone(),
            quantity: 20,
        }],
    );
    req.payment_amount_cents = Some(12000);
    req.excess_action = ExcessAction::Debt;
    req.requires_approval = true;

    let pending = h.settlement.create_sale(req).await.unwrap();
    assert_eq!(pending.sale.approval_status, Some(ApprovalStatus::Pending));
    assert!(pending.plan.is_none());

    // Total is computed, but nothing has moved.
    assert_eq!(pending.sale.total_amount_cents, 10000);
    assert_eq!(stock_of(&h.db, &product.id).await, (3, 5));
    assert_eq!(debt_of(&h.db, &customer.id).await, 5000);

    // Approval commits the deferred debit and the reconciliation.
    let approved = h.approval.approve_sale(&pending.sale.id, &admin()).await.unwrap();
    assert_eq!(approved.sale.approval_status, Some(ApprovalStatus::Approved));
    assert_eq!(approved.plan.debt_paid.cents(), 2000);

    assert_eq!(stock_of(&h.db, &product.id).await, (1, 5));
    assert_eq!(debt_of(&h.db, &customer.id).await, 3000);

    // Resolving twice fails.
    let err = h.approval.approve_sale(&pending.sale.id, &admin()).await.unwrap_err();
    assert!(matches!(
        err,
        EngineError::Core(CoreError::AlreadyProcessed { .. })
    ));
}

#[tokio::test]
async fn rejection_is_terminal_and_free_of_side_effects() {
    let h = harness().await;
    let product = seed_product(&h.db, 10, 3, 5).await;
    let customer = seed_customer(&h.db, 5000, None).await;

    let mut req = sale_request(
        Some(customer.id.clone()),
        vec![SaleLine {
            product_id: product.id.clone(),
            quantity: 20,
        }],
    );
    req.requires_approval = true;

    let pending = h.settlement.create_sale(req).await.unwrap();

    let rejected = h.approval.reject_sale(&pending.sale.id, &admin()).await.unwrap();
    assert_eq!(rejected.approval_status, Some(ApprovalStatus::Rejected));

    // Permanently untouched.
    assert_eq!(stock_of(&h.db, &product.id).await, (3, 5));
    assert_eq!(debt_of(&h.db, &customer.id).await, 5000);

    let err = h.approval.approve_sale(&pending.sale.id, &admin()).await.unwrap_err();
    assert!(matches!(
        err,
        EngineError::Core(CoreError::AlreadyProcessed { .. })
    ));
}

// =============================================================================
// Order Lifecycle
// =============================================================================

fn order_request(customer_id: Option<String>, items: Vec<SaleLine>) -> CreateOrderRequest {
    CreateOrderRequest {
        seller: Some(seller()),
        customer_id,
        items,
        payment_method: PaymentMethod::Cash,
        notes: None,
    }
}

#[tokio::test]
async fn placing_an_order_debits_inventory_immediately() {
    let h = harness().await;
    let product = seed_product(&h.db, 10, 2, 3).await;

    let placed = h
        .orders
        .create_order(order_request(
            None,
            vec![SaleLine {
                product_id: product.id.clone(),
                quantity: 12,
            }],
        ))
        .await
        .unwrap();

    assert_eq!(placed.order.status, OrderStatus::Pending);
    // Regular tier: 12 × 550
    assert_eq!(placed.order.total_amount_cents, 6600);
    assert_eq!(stock_of(&h.db, &product.id).await, (1, 1));
}

#[tokio::test]
async fn cancelling_a_pending_order_restores_stock() {
    let h = harness().await;
    let product = seed_product(&h.db, 10, 2, 3).await;

    let placed = h
        .orders
        .create_order(order_request(
            None,
            vec![SaleLine {
                product_id: product.id.clone(),
                quantity: 12,
            }],
        ))
        .await
        .unwrap();
    assert_eq!(stock_of(&h.db, &product.id).await, (1, 1));

    // Stock was debited at creation, so cancelling from pending reverses it.
    let cancelled = h
        .orders
        .update_status(&placed.order.id, OrderStatus::Cancelled, &admin())
        .await
        .unwrap();
    assert_eq!(cancelled.order.status, OrderStatus::Cancelled);
    assert_eq!(stock_of(&h.db, &product.id).await, (2, 3));

    // The reversal is on the ledger, tagged to the order.
    let credits: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM inventory_transactions \
         WHERE reference = ?1 AND transaction_type = 'order_cancelled'",
    )
    .bind(&placed.order.id)
    .fetch_one(h.db.pool())
    .await
    .unwrap();
    assert_eq!(credits, 1);
}

#[tokio::test]
async fn completing_an_order_materializes_the_sale_of_record() {
    let h = harness().await;
    let product = seed_product(&h.db, 10, 2, 3).await;
    let customer = seed_customer(&h.db, 0, None).await;

    let placed = h
        .orders
        .create_order(order_request(
            Some(customer.id.clone()),
            vec![SaleLine {
                product_id: product.id.clone(),
                quantity: 12,
            }],
        ))
        .await
        .unwrap();

    h.orders
        .update_status(&placed.order.id, OrderStatus::Processing, &admin())
        .await
        .unwrap();
    let completed = h
        .orders
        .update_status(&placed.order.id, OrderStatus::Completed, &admin())
        .await
        .unwrap();

    let sale = completed.sale.expect("completion must create a sale");
    assert_eq!(completed.order.sale_id.as_deref(), Some(sale.id.as_str()));
    assert_eq!(sale.total_amount_cents, placed.order.total_amount_cents);
    assert_eq!(sale.customer_id.as_deref(), Some(customer.id.as_str()));

    let items = h.db.sales().get_items(&sale.id).await.unwrap();
    assert_eq!(
        sale.total_amount_cents,
        items.iter().map(|i| i.subtotal_cents).sum::<i64>()
    );

    // Stock was debited once, at creation — completion moved no stock.
    assert_eq!(stock_of(&h.db, &product.id).await, (1, 1));

    // Post-fulfillment return restores it.
    h.orders
        .update_status(&placed.order.id, OrderStatus::Returned, &admin())
        .await
        .unwrap();
    assert_eq!(stock_of(&h.db, &product.id).await, (2, 3));
}

#[tokio::test]
async fn illegal_transitions_are_rejected() {
    let h = harness().await;
    let product = seed_product(&h.db, 10, 2, 3).await;

    let placed = h
        .orders
        .create_order(order_request(
            None,
            vec![SaleLine {
                product_id: product.id.clone(),
                quantity: 5,
            }],
        ))
        .await
        .unwrap();

    // pending → completed skips processing.
    let err = h
        .orders
        .update_status(&placed.order.id, OrderStatus::Completed, &admin())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Core(CoreError::InvalidTransition { .. })
    ));

    // Terminal states stay terminal.
    h.orders
        .update_status(&placed.order.id, OrderStatus::Cancelled, &admin())
        .await
        .unwrap();
    let err = h
        .orders
        .update_status(&placed.order.id, OrderStatus::Processing, &admin())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Core(CoreError::InvalidTransition { .. })
    ));
}

#[tokio::test]
async fn order_without_seller_uses_configured_fallback() {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    let config = SettlementConfig {
        default_order_seller: Some(Actor::new("u-9", "shop owner", "admin")),
        ..SettlementConfig::default()
    };
    let orders = OrderService::new(db.clone(), config);
    let product = seed_product(&db, 10, 2, 3).await;

    let placed = orders
        .create_order(CreateOrderRequest {
            seller: None,
            customer_id: None,
            items: vec![SaleLine {
                product_id: product.id.clone(),
                quantity: 3,
            }],
            payment_method: PaymentMethod::Cash,
            notes: None,
        })
        .await
        .unwrap();

    assert_eq!(placed.order.seller_id, "u-9");
}

// =============================================================================
// Standalone Debt Operations
// =============================================================================

#[tokio::test]
async fn walk_in_debt_payment_clamps_at_zero() {
    let h = harness().await;
    let customer = seed_customer(&h.db, 1500, None).await;

    let entry = h
        .settlement
        .record_debt_payment(&customer.id, 5000, &admin(), Some("cash at counter"))
        .await
        .unwrap();

    assert_eq!(entry.amount_cents, -1500);
    assert_eq!(entry.balance_after_cents, 0);
    assert_eq!(debt_of(&h.db, &customer.id).await, 0);
}
