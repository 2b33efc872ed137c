//! # Quantity Decomposer
//!
//! Splits a requested piece-quantity into whole packages plus loose pieces
//! given a product's package size and current stock split.
//!
//! ## Why Decompose?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  The cashier sells in PIECES. The warehouse stores PACKAGES + PIECES.  │
//! │                                                                         │
//! │  Product: package_size = 10, stock = 2 packages + 3 pieces (23 total)  │
//! │  Request: 12 pieces                                                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  decompose() ──► { packages: 1, pieces: 2 }                            │
//! │                                                                         │
//! │  1 package (10 pcs) + 2 loose pieces = 12 pieces                       │
//! │  Whole packages are preserved whenever the split allows it.            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The decomposer is a pure function: it never touches stock. The inventory
//! ledger applies the returned split, breaking at most one extra package at
//! mutation time when loose pieces run short.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::types::Product;

// =============================================================================
// Decomposition
// =============================================================================

/// A packages/pieces split satisfying
/// `packages * package_size + pieces == requested`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Decomposition {
    /// Whole packages to take from stock. Never exceeds `packages_in_stock`.
    pub packages: i64,

    /// Loose pieces to take from stock. Never negative. May exceed the
    /// loose stock by up to one package's worth — the ledger breaks a
    /// package to cover it.
    pub pieces: i64,

    /// The package size the split was computed against (post-normalization).
    pub package_size: i64,

    /// True when the stored package size was 0/invalid and was normalized
    /// to 1. Callers log this once — it signals bad product data, not a
    /// silent success path.
    pub package_size_normalized: bool,
}

impl Decomposition {
    /// Total pieces this split deducts.
    #[inline]
    pub fn total_pieces(&self) -> i64 {
        self.packages * self.package_size + self.pieces
    }
}

// =============================================================================
// Decompose
// =============================================================================

/// Decomposes a requested piece quantity against a product's stock split.
///
/// ## Algorithm
/// 1. Fail `InsufficientStock` if `requested > total_pieces`.
/// 2. Start with `packages = requested / size`, `pieces = requested % size`.
/// 3. Cap `packages` at `packages_in_stock`, pushing the remainder into
///    `pieces`.
/// 4. If `pieces` exceeds the loose stock and a whole package is still
///    unclaimed, try taking one more package (`packages += 1`,
///    `pieces -= size`); when that overshoots the request (negative
///    `pieces`) the package is given back and the shortfall is left for
///    the ledger's break-one-package rule at debit time.
///
/// ## Errors
/// - `ValidationError::MustBePositive` for `requested <= 0`
/// - `CoreError::InsufficientStock` when the stock cannot cover the request
pub fn decompose(product: &Product, requested: i64) -> CoreResult<Decomposition> {
    if requested <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "requestedQuantity".to_string(),
        }
        .into());
    }

    // Single normalization point for the legacy 0/NULL package size.
    let size = product.effective_package_size();
    let normalized = size != product.package_size;

    let available = product.packages_in_stock * size + product.pieces_in_stock;
    if requested > available {
        return Err(CoreError::InsufficientStock {
            product: product.name.clone(),
            available,
            requested,
        });
    }

    let mut packages = requested / size;
    let mut pieces = requested % size;

    // Cannot take more whole packages than are in stock.
    if packages > product.packages_in_stock {
        pieces += (packages - product.packages_in_stock) * size;
        packages = product.packages_in_stock;
    }

    if pieces > product.pieces_in_stock {
        if packages < product.packages_in_stock {
            packages += 1;
            pieces -= size;
            if pieces < 0 {
                // The extra whole package overshoots the request; give it
                // back and let the debit path break it into loose pieces.
                packages -= 1;
                pieces += size;
            }
        } else {
            // No further package available to cover the loose shortfall.
            // Step 1 makes this unreachable, but the ledger relies on the
            // decomposer never over-promising.
            return Err(CoreError::InsufficientStock {
                product: product.name.clone(),
                available,
                requested,
            });
        }
    }

    debug_assert!(packages >= 0 && pieces >= 0);
    debug_assert_eq!(packages * size + pieces, requested);

    Ok(Decomposition {
        packages,
        pieces,
        package_size: size,
        package_size_normalized: normalized,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use crate::types::Product;

    fn product(package_size: i64, packages: i64, pieces: i64) -> Product {
        Product {
            id: "p-1".to_string(),
            sku: "SKU-1".to_string(),
            name: "Test Product".to_string(),
            package_size,
            packages_in_stock: packages,
            pieces_in_stock: pieces,
            wholesale_price_cents: 400,
            retail_price_cents: 500,
            regular_price_cents: 550,
            cost_price_cents: 300,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_splits_into_packages_and_remainder() {
        // package_size=10, 2 packages + 3 pieces (23 total); request 12
        let split = decompose(&product(10, 2, 3), 12).unwrap();
        assert_eq!(split.packages, 1);
        assert_eq!(split.pieces, 2);
    }

    #[test]
    fn test_fails_when_request_exceeds_total() {
        // 23 total; request 25
        let err = decompose(&product(10, 2, 3), 25).unwrap_err();
        match err {
            CoreError::InsufficientStock {
                available,
                requested,
                ..
            } => {
                assert_eq!(available, 23);
                assert_eq!(requested, 25);
            }
            other => panic!("expected InsufficientStock, got {other}"),
        }
    }

    #[test]
    fn test_no_unnecessary_package_break() {
        // package_size=5, 1 package + 2 pieces (7 total); request 6
        // 1 package + 1 piece covers it without breaking anything.
        let split = decompose(&product(5, 1, 2), 6).unwrap();
        assert_eq!(split.packages, 1);
        assert_eq!(split.pieces, 1);
    }

    #[test]
    fn test_caps_packages_at_stock() {
        // package_size=10, 1 package + 30 pieces; request 25
        // 25/10 = 2 packages, but only 1 in stock: remainder goes loose.
        let split = decompose(&product(10, 1, 30), 25).unwrap();
        assert_eq!(split.packages, 1);
        assert_eq!(split.pieces, 15);
    }

    #[test]
    fn test_loose_shortfall_left_for_debit_break() {
        // package_size=10, 3 packages + 2 pieces; request 25
        // (2 packages, 5 pieces): only 2 loose in stock, third package
        // stays whole in the split — the ledger breaks it at debit time.
        let split = decompose(&product(10, 3, 2), 25).unwrap();
        assert_eq!(split.packages, 2);
        assert_eq!(split.pieces, 5);
        assert_eq!(split.total_pieces(), 25);
    }

    #[test]
    fn test_rejects_non_positive_request() {
        assert!(decompose(&product(10, 2, 3), 0).is_err());
        assert!(decompose(&product(10, 2, 3), -4).is_err());
    }

    #[test]
    fn test_zero_package_size_treated_as_one() {
        let split = decompose(&product(0, 2, 3), 4).unwrap();
        assert!(split.package_size_normalized);
        assert_eq!(split.package_size, 1);
        assert_eq!(split.packages * 1 + split.pieces, 4);
    }

    #[test]
    fn test_exactness_over_small_domain() {
        // For every valid input in a small grid, the split sums back to
        // the request and never claims more packages than exist.
        for size in 1..=6 {
            for packages in 0..=4 {
                for pieces in 0..=8 {
                    let p = product(size, packages, pieces);
                    let total = p.total_pieces();
                    for requested in 1..=total {
                        let split = decompose(&p, requested).unwrap();
                        assert_eq!(
                            split.packages * size + split.pieces,
                            requested,
                            "size={size} stock=({packages},{pieces}) req={requested}"
                        );
                        assert!(split.packages <= packages);
                        assert!(split.pieces >= 0);
                    }
                    // One past the total always fails.
                    assert!(decompose(&p, total + 1).is_err());
                }
            }
        }
    }
}
