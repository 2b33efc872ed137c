//! # Payment Reconciliation
//!
//! Pure arithmetic for settling money paid against money owed.
//!
//! ## The Excess / Shortfall Rule
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  excess = payment - total                                               │
//! │                                                                         │
//! │  excess > 0 (overpayment)                                              │
//! │    excess_action = debt   ──► pay down existing debt first,            │
//! │                               refund whatever remains                   │
//! │    excess_action = return ──► refund all of it                         │
//! │    Excess NEVER becomes stored customer credit.                        │
//! │                                                                         │
//! │  excess < 0 (shortfall)                                                │
//! │    debt permitted   ──► shortfall becomes new debt (ceiling checked)   │
//! │    debt not allowed ──► PaymentInsufficient                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! This module only PLANS the movement; the debt ledger in khata-db applies
//! the plan as history entries inside the settlement transaction.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{Customer, ExcessAction};

// =============================================================================
// Payment Plan
// =============================================================================

/// The reconciliation outcome of one settlement, before it is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentPlan {
    /// The transaction total being settled.
    pub total: Money,

    /// What the customer handed over.
    pub paid: Money,

    /// Portion of the excess applied against existing debt.
    pub debt_paid: Money,

    /// Portion of the excess refunded to the customer.
    pub excess_paid: Money,

    /// Shortfall converted into new debt.
    pub debt_added: Money,

    /// The disposition actually used. A `debt` request with no debt to pay
    /// down degrades to `return` — the remainder is always refunded.
    pub effective_excess_action: ExcessAction,
}

impl PaymentPlan {
    /// Whether applying this plan touches the debt ledger at all.
    #[inline]
    pub fn moves_debt(&self) -> bool {
        self.debt_paid.is_positive() || self.debt_added.is_positive()
    }
}

// =============================================================================
// Reconcile
// =============================================================================

/// Reconciles a payment against a transaction total.
///
/// ## Arguments
/// * `total` - computed transaction total (never client-supplied)
/// * `paid` - payment amount tendered
/// * `excess_action` - caller-chosen disposition of any overpayment
/// * `customer` - the attached customer, if any; source of the current
///   debt balance and ceiling
/// * `allow_debt` - whether a shortfall may become debt (requires a
///   customer to owe it)
///
/// ## Errors
/// - `PaymentInsufficient` - shortfall without debt permission or customer
/// - `DebtLimitExceeded` - shortfall would pass the customer's ceiling
pub fn reconcile_payment(
    total: Money,
    paid: Money,
    excess_action: ExcessAction,
    customer: Option<&Customer>,
    allow_debt: bool,
) -> CoreResult<PaymentPlan> {
    if total.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: "totalAmount".to_string(),
        }
        .into());
    }
    if paid.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: "paymentAmount".to_string(),
        }
        .into());
    }

    let excess = paid - total;

    if excess >= Money::zero() {
        let outstanding = customer
            .map(|c| c.debt_balance())
            .filter(|b| b.is_positive())
            .unwrap_or(Money::zero());

        let (debt_paid, effective) = match excess_action {
            ExcessAction::Debt if outstanding.is_positive() => {
                (excess.min(outstanding), ExcessAction::Debt)
            }
            // Nothing owed (or an explicit return): everything goes back.
            _ => (Money::zero(), ExcessAction::Return),
        };

        return Ok(PaymentPlan {
            total,
            paid,
            debt_paid,
            excess_paid: excess - debt_paid,
            debt_added: Money::zero(),
            effective_excess_action: if excess.is_zero() {
                excess_action
            } else {
                effective
            },
        });
    }

    // Shortfall path.
    let shortfall = -excess;

    let customer = match (allow_debt, customer) {
        (true, Some(c)) => c,
        _ => {
            return Err(CoreError::PaymentInsufficient {
                total_cents: total.cents(),
                paid_cents: paid.cents(),
            })
        }
    };

    if !customer.within_debt_limit(shortfall) {
        // Unlimited customers pass the check above, so the limit is Some.
        let limit = customer.debt_limit_cents.unwrap_or(0);
        return Err(CoreError::DebtLimitExceeded {
            customer: customer.name.clone(),
            balance_cents: customer.debt_balance_cents,
            additional_cents: shortfall.cents(),
            limit_cents: limit,
        });
    }

    Ok(PaymentPlan {
        total,
        paid,
        debt_paid: Money::zero(),
        excess_paid: Money::zero(),
        debt_added: shortfall,
        effective_excess_action: excess_action,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
