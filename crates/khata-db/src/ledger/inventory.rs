//! # Inventory Ledger
//!
//! The only code allowed to move `packages_in_stock` / `pieces_in_stock`.
//!
//! ## Debit Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  debit(packages: 1, pieces: 5)        product: size 10, 3 pkg + 2 pcs  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  loose pieces short? (5 > 2)                                           │
//! │       │ yes: break exactly ONE extra package                           │
//! │       ▼                                                                 │
//! │  applied delta: packages -2, pieces +5   (=-1 pkg debit, -1 broken,    │
//! │       │                                   +10 loose, -5 sold)          │
//! │       ▼                                                                 │
//! │  guarded UPDATE ... WHERE packages_in_stock + ?p >= 0                  │
//! │                       AND pieces_in_stock  + ?q >= 0                   │
//! │       │ 0 rows → lost a race → clean InsufficientStock                 │
//! │       ▼                                                                 │
//! │  append inventory_transactions row (signed applied delta)              │
//! │       ▼                                                                 │
//! │  append audit_log row — BEST EFFORT: failure is warn!'d, never        │
//! │  propagated. Observability is best-effort; stock correctness is not.   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::ledger::{LedgerError, LedgerResult};
use crate::repository::product::fetch_product;
use khata_core::{Actor, CoreError, InventoryTransactionType, Product, ValidationError};

// =============================================================================
// Requests / Results
// =============================================================================

/// A requested stock movement (either direction).
#[derive(Debug, Clone)]
pub struct StockRequest {
    pub product_id: String,

    /// Whole packages to move. Never negative; direction comes from the
    /// operation (debit/credit).
    pub packages: i64,

    /// Loose pieces to move. Never negative.
    pub pieces: i64,

    pub transaction_type: InventoryTransactionType,

    /// The causing sale/order id.
    pub reference: Option<String>,

    pub actor: Actor,

    /// Free-text reason recorded on the audit row.
    pub reason: String,
}

/// The applied outcome of a stock movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockMovement {
    /// Signed delta actually applied to `packages_in_stock`.
    pub packages_change: i64,

    /// Signed delta actually applied to `pieces_in_stock`.
    pub pieces_change: i64,

    /// True when the debit broke one extra package to cover loose pieces.
    pub broke_package: bool,

    /// Total pieces before/after, for the audit trail.
    pub total_before: i64,
    pub total_after: i64,
}

// =============================================================================
// Inventory Ledger
// =============================================================================

/// Stateless handle for stock movements.
///
/// Operations take `&mut SqliteConnection` so the caller's transaction is
/// the unit of work.
#[derive(Debug, Clone, Copy, Default)]
pub struct InventoryLedger;

impl InventoryLedger {
    pub fn new() -> Self {
        InventoryLedger
    }

    /// Debits stock for a sale/order line.
    ///
    /// If the requested loose pieces exceed the loose stock, exactly one
    /// additional whole package is broken to cover them; if that is not
    /// enough (or no package remains), the debit fails `InsufficientStock`
    /// and the product row is untouched.
    pub async fn debit(
        &self,
        conn: &mut SqliteConnection,
        req: &StockRequest,
    ) -> LedgerResult<StockMovement> {
        validate_request(req)?;

        let product = fetch_product(conn, &req.product_id)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(req.product_id.clone()))?;

        let size = product.effective_package_size();
        if size != product.package_size {
            warn!(
                product_id = %product.id,
                stored = product.package_size,
                "Product has invalid package size; treating as 1"
            );
        }

        let requested_pieces = req.packages * size + req.pieces;
        let insufficient = || {
            LedgerError::Domain(CoreError::InsufficientStock {
                product: product.name.clone(),
                available: product.total_pieces(),
                requested: requested_pieces,
            })
        };

        if req.packages > product.packages_in_stock {
            return Err(insufficient());
        }

        // Break exactly one extra package when loose pieces run short.
        let broke_package = if req.pieces > product.pieces_in_stock {
            let package_left = product.packages_in_stock >= req.packages + 1;
            let one_break_covers = req.pieces <= product.pieces_in_stock + size;
            if !(package_left && one_break_covers) {
                return Err(insufficient());
            }
            true
        } else {
            false
        };

        let (packages_change, pieces_change) = if broke_package {
            // One package converts to `size` loose pieces before the debit.
            (-(req.packages + 1), size - req.pieces)
        } else {
            (-req.packages, -req.pieces)
        };

        self.apply(conn, &product, packages_change, pieces_change, req, broke_package)
            .await
    }

    /// Credits stock back (restocks and order reversals).
    ///
    /// Cannot fail on stock grounds.
    pub async fn credit(
        &self,
        conn: &mut SqliteConnection,
        req: &StockRequest,
    ) -> LedgerResult<StockMovement> {
        validate_request(req)?;

        let product = fetch_product(conn, &req.product_id)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(req.product_id.clone()))?;

        self.apply(conn, &product, req.packages, req.pieces, req, false)
            .await
    }

    /// Applies a signed delta, appends the ledger row, and writes the
    /// audit entry best-effort.
    async fn apply(
        &self,
        conn: &mut SqliteConnection,
        product: &Product,
        packages_change: i64,
        pieces_change: i64,
        req: &StockRequest,
        broke_package: bool,
    ) -> LedgerResult<StockMovement> {
        let now = Utc::now();

        // The guard doubles as the serialization backstop: if another
        // settlement debited the same product between our read and this
        // write, zero rows match and the caller fails cleanly instead of
        // driving stock negative.
        let result = sqlx::query(
            r#"
            UPDATE products SET
                packages_in_stock = packages_in_stock + ?2,
                pieces_in_stock = pieces_in_stock + ?3,
                updated_at = ?4
            WHERE id = ?1
              AND packages_in_stock + ?2 >= 0
              AND pieces_in_stock + ?3 >= 0
            "#,
        )
        .bind(&product.id)
        .bind(packages_change)
        .bind(pieces_change)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        let size = product.effective_package_size();
        let net_pieces = packages_change * size + pieces_change;

        if result.rows_affected() == 0 {
            return Err(LedgerError::Domain(CoreError::InsufficientStock {
                product: product.name.clone(),
                available: product.total_pieces(),
                requested: -net_pieces,
            }));
        }

        let total_before = product.total_pieces();
        let total_after = total_before + net_pieces;

        debug!(
            product_id = %product.id,
            packages_change,
            pieces_change,
            broke_package,
            total_before,
            total_after,
            transaction_type = req.transaction_type.as_str(),
            "Stock moved"
        );

        sqlx::query(
            r#"
            INSERT INTO inventory_transactions (
                id, product_id, packages_change, pieces_change,
                transaction_type, reference, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&product.id)
        .bind(packages_change)
        .bind(pieces_change)
        .bind(req.transaction_type)
        .bind(&req.reference)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        // Audit trail is best-effort: a failed insert must never abort a
        // successful stock mutation.
        let audit_result = sqlx::query(
            r#"
            INSERT INTO audit_log (
                id, actor_id, actor_name, actor_role, product_id,
                total_before, total_after, change, reason, reference, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&req.actor.id)
        .bind(&req.actor.name)
        .bind(&req.actor.role)
        .bind(&product.id)
        .bind(total_before)
        .bind(total_after)
        .bind(net_pieces)
        .bind(&req.reason)
        .bind(&req.reference)
        .bind(now)
        .execute(&mut *conn)
        .await;

        if let Err(err) = audit_result {
            warn!(
                product_id = %product.id,
                error = %err,
                "Audit log write failed; stock mutation stands"
            );
        }

        Ok(StockMovement {
            packages_change,
            pieces_change,
            broke_package,
            total_before,
            total_after,
        })
    }
}

fn validate_request(req: &StockRequest) -> Result<(), ValidationError> {
    if req.packages < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: "packages".to_string(),
        });
    }
    if req.pieces < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: "pieces".to_string(),
        });
    }
    Ok(())
}
