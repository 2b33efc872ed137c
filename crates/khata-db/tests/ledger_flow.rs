//! Integration tests for the inventory and debt ledgers.
//!
//! Each test runs against a fresh in-memory SQLite database with the full
//! schema applied, and drives the ledgers the way the settlement engine
//! does: one transaction per unit of work.

use chrono::Utc;
use uuid::Uuid;

use khata_core::{
    Actor, Customer, CustomerType, InventoryTransactionType, Money, Product,
};
use khata_db::ledger::LedgerError;
use khata_db::{Database, DbConfig, StockRequest};

async fn test_db() -> Database {
    Database::new(DbConfig::in_memory()).await.unwrap()
}

fn actor() -> Actor {
    Actor::new("u-1", "test admin", "admin")
}

async fn seed_product(db: &Database, package_size: i64, packages: i64, pieces: i64) -> Product {
    let now = Utc::now();
    let product = Product {
        id: Uuid::new_v4().to_string(),
        sku: format!("SKU-{}", Uuid::new_v4()),
        name: "Tapal Danedar 95g".to_string(),
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
        name: "Bashir General Store".to_string(),
        phone: None,
        customer_type: CustomerType::Wholesale,
        debt_balance_cents: debt_cents,
        debt_limit_cents: limit_cents,
        is_active: true,
        created_at: now,
        updated_at: now,
    };
    db.customers().insert(&customer).await.unwrap();
    customer
}

fn debit_request(product_id: &str, packages: i64, pieces: i64) -> StockRequest {
    StockRequest {
        product_id: product_id.to_string(),
        packages,
        pieces,
        transaction_type: InventoryTransactionType::Sale,
        reference: Some("sale-1".to_string()),
        actor: actor(),
        reason: "test sale".to_string(),
    }
}

// =============================================================================
// Inventory Ledger
// =============================================================================

#[tokio::test]
async fn debit_moves_both_stock_columns() {
    let db = test_db().await;
    let product = seed_product(&db, 10, 2, 3).await;

    let mut tx = db.pool().begin().await.unwrap();
    let movement = db
        .inventory_ledger()
        .debit(&mut tx, &debit_request(&product.id, 1, 2))
        .await
        .unwrap();
    tx.commit().await.unwrap();

    assert!(!movement.broke_package);
    assert_eq!(movement.packages_change, -1);
    assert_eq!(movement.pieces_change, -2);
    assert_eq!(movement.total_before, 23);
    assert_eq!(movement.total_after, 11);

    let after = db.products().get_by_id(&product.id).await.unwrap().unwrap();
    assert_eq!(after.packages_in_stock, 1);
    assert_eq!(after.pieces_in_stock, 1);
}

#[tokio::test]
async fn debit_breaks_one_package_when_loose_is_short() {
    let db = test_db().await;
    let product = seed_product(&db, 10, 3, 2).await;

    // Need 5 loose pieces, only 2 in stock: one package breaks.
    let mut tx = db.pool().begin().await.unwrap();
    let movement = db
        .inventory_ledger()
        .debit(&mut tx, &debit_request(&product.id, 2, 5))
        .await
        .unwrap();
    tx.commit().await.unwrap();

    assert!(movement.broke_package);
    assert_eq!(movement.packages_change, -3);
    assert_eq!(movement.pieces_change, 5);

    let after = db.products().get_by_id(&product.id).await.unwrap().unwrap();
    assert_eq!(after.packages_in_stock, 0);
    assert_eq!(after.pieces_in_stock, 7);
    // 32 - 25 requested = 7 remaining
    assert_eq!(after.total_pieces(), 7);
}

#[tokio::test]
async fn debit_fails_cleanly_when_no_package_left_to_break() {
    let db = test_db().await;
    let product = seed_product(&db, 10, 1, 2).await;

    // 1 package + 5 loose needs a second package to break: none left.
    let mut tx = db.pool().begin().await.unwrap();
    let err = db
        .inventory_ledger()
        .debit(&mut tx, &debit_request(&product.id, 1, 5))
        .await
        .unwrap_err();
    tx.rollback().await.unwrap();

    assert!(matches!(
        err,
        LedgerError::Domain(khata_core::CoreError::InsufficientStock { .. })
    ));

    let after = db.products().get_by_id(&product.id).await.unwrap().unwrap();
    assert_eq!(after.packages_in_stock, 1);
    assert_eq!(after.pieces_in_stock, 2);
}

#[tokio::test]
async fn debit_then_credit_restores_stock() {
    let db = test_db().await;
    let product = seed_product(&db, 10, 2, 3).await;

    let mut tx = db.pool().begin().await.unwrap();
    db.inventory_ledger()
        .debit(&mut tx, &debit_request(&product.id, 1, 2))
        .await
        .unwrap();
    tx.commit().await.unwrap();

    let mut tx = db.pool().begin().await.unwrap();
    let credit = StockRequest {
        transaction_type: InventoryTransactionType::OrderReturned,
        ..debit_request(&product.id, 1, 2)
    };
    db.inventory_ledger().credit(&mut tx, &credit).await.unwrap();
    tx.commit().await.unwrap();

    let after = db.products().get_by_id(&product.id).await.unwrap().unwrap();
    assert_eq!(after.packages_in_stock, 2);
    assert_eq!(after.pieces_in_stock, 3);
}

#[tokio::test]
async fn ledger_rows_record_signed_changes() {
    let db = test_db().await;
    let product = seed_product(&db, 10, 2, 3).await;

    let mut tx = db.pool().begin().await.unwrap();
    db.inventory_ledger()
        .debit(&mut tx, &debit_request(&product.id, 1, 2))
        .await
        .unwrap();
    tx.commit().await.unwrap();

    let (packages_change, pieces_change): (i64, i64) = sqlx::query_as(
        "SELECT packages_change, pieces_change FROM inventory_transactions WHERE product_id = ?1",
    )
    .bind(&product.id)
    .fetch_one(db.pool())
    .await
    .unwrap();

    assert_eq!(packages_change, -1);
    assert_eq!(pieces_change, -2);

    // The audit row carries consistent before/after totals.
    let (before, after, change): (i64, i64, i64) =
        sqlx::query_as("SELECT total_before, total_after, change FROM audit_log WHERE product_id = ?1")
            .bind(&product.id)
            .fetch_one(db.pool())
            .await
            .unwrap();

    assert_eq!(after, before + change);
    assert_eq!(change, -12);
}

#[tokio::test]
async fn rollback_leaves_no_trace() {
    let db = test_db().await;
    let product = seed_product(&db, 10, 2, 3).await;

    let mut tx = db.pool().begin().await.unwrap();
    db.inventory_ledger()
        .debit(&mut tx, &debit_request(&product.id, 1, 2))
        .await
        .unwrap();
    tx.rollback().await.unwrap();

    let after = db.products().get_by_id(&product.id).await.unwrap().unwrap();
    assert_eq!(after.packages_in_stock, 2);
    assert_eq!(after.pieces_in_stock, 3);

    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM inventory_transactions WHERE product_id = ?1")
            .bind(&product.id)
            .fetch_one(db.pool())
            .await
            .unwrap();
    assert_eq!(count, 0);
}

// =============================================================================
// Debt Ledger
// =============================================================================

#[tokio::test]
async fn add_debt_records_before_and_after() {
    let db = test_db().await;
    let customer = seed_customer(&db, 1000, None).await;

    let mut tx = db.pool().begin().await.unwrap();
    let entry = db
        .debt_ledger()
        .add_debt(
            &mut tx,
            &customer.id,
            Money::from_cents(2500),
            Some("sale-1"),
            None,
            &actor(),
        )
        .await
        .unwrap();
    tx.commit().await.unwrap();

    assert_eq!(entry.balance_before_cents, 1000);
    assert_eq!(entry.balance_after_cents, 3500);
    assert_eq!(entry.amount_cents, 2500);
    assert!(entry.is_consistent());

    let after = db.customers().get_by_id(&customer.id).await.unwrap().unwrap();
    assert_eq!(after.debt_balance_cents, 3500);
}

#[tokio::test]
async fn pay_debt_clamps_at_zero() {
    let db = test_db().await;
    let customer = seed_customer(&db, 1500, None).await;

    let mut tx = db.pool().begin().await.unwrap();
    let entry = db
        .debt_ledger()
        .pay_debt(
            &mut tx,
            &customer.id,
            Money::from_cents(5000),
            None,
            Some("walk-in paydown"),
            &actor(),
        )
        .await
        .unwrap();
    tx.commit().await.unwrap();

    // Paying 5000 against 1500 owed only moves 1500.
    assert_eq!(entry.amount_cents, -1500);
    assert_eq!(entry.balance_after_cents, 0);
    assert!(entry.is_consistent());

    let after = db.customers().get_by_id(&customer.id).await.unwrap().unwrap();
    assert_eq!(after.debt_balance_cents, 0);
}

#[tokio::test]
async fn check_limit_enforces_ceiling() {
    let db = test_db().await;
    let customer = seed_customer(&db, 4000, Some(5000)).await;

    let mut tx = db.pool().begin().await.unwrap();
    assert!(db
        .debt_ledger()
        .check_limit(&mut tx, &customer.id, Money::from_cents(1000))
        .await
        .is_ok());
    let err = db
        .debt_ledger()
        .check_limit(&mut tx, &customer.id, Money::from_cents(1001))
        .await
        .unwrap_err();
    tx.rollback().await.unwrap();

    assert!(matches!(
        err,
        LedgerError::Domain(khata_core::CoreError::DebtLimitExceeded { .. })
    ));
}

#[tokio::test]
async fn rejects_non_positive_amounts() {
    let db = test_db().await;
    let customer = seed_customer(&db, 0, None).await;

    let mut tx = db.pool().begin().await.unwrap();
    assert!(db
        .debt_ledger()
        .add_debt(&mut tx, &customer.id, Money::zero(), None, None, &actor())
        .await
        .is_err());
    assert!(db
        .debt_ledger()
        .pay_debt(
            &mut tx,
            &customer.id,
            Money::from_cents(-100),
            None,
            None,
            &actor()
        )
        .await
        .is_err());
    tx.rollback().await.unwrap();
}
