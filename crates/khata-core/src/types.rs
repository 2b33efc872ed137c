//! # Domain Types
//!
//! Core domain types used throughout Khata POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │    Customer     │   │   Sale / Order  │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  package_size   │   │  customer_type  │   │  total_amount   │       │
//! │  │  packages/pieces│   │  debt_balance   │   │  payment_method │       │
//! │  │  3 price tiers  │   │  debt_limit     │   │  line items     │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  Append-only ledger rows:                                              │
//! │  InventoryTransaction · AuditLogEntry · DebtHistoryEntry               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business ID where one exists (product SKU) - human-readable
//!
//! ## Strict Enum Parsing
//! Every status/method enum parses with `FromStr` and FAILS on unknown
//! input. There is no silent `cash` fallback and no ignored status filter;
//! a bad string is a `ValidationError::NotAllowed` the caller sees.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;

// =============================================================================
// Customer Type (price tier selector)
// =============================================================================

/// Which price tier applies to a customer.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomerType {
    /// Buys in bulk, gets the wholesale tier.
    Wholesale,
    /// Shop-counter customer, retail tier.
    Retail,
    /// Walk-in / unclassified customer, regular tier.
    Regular,
}

impl CustomerType {
    /// Canonical wire string for this tier.
    pub const fn as_str(&self) -> &'static str {
        match self {
            CustomerType::Wholesale => "wholesale",
            CustomerType::Retail => "retail",
            CustomerType::Regular => "regular",
        }
    }
}

impl fmt::Display for CustomerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CustomerType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "wholesale" => Ok(CustomerType::Wholesale),
            "retail" => Ok(CustomerType::Retail),
            "regular" => Ok(CustomerType::Regular),
            other => Err(ValidationError::NotAllowed {
                field: "customerType".to_string(),
                value: other.to_string(),
                allowed: vec!["wholesale", "retail", "regular"],
            }),
        }
    }
}

// =============================================================================
// Payment Method
// =============================================================================

#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Physical cash payment.
    Cash,
    /// Card payment on external terminal.
    Card,
    /// Direct bank transfer / mobile wallet.
    BankTransfer,
}

impl PaymentMethod {
    pub const fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::BankTransfer => "bank_transfer",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cash" => Ok(PaymentMethod::Cash),
            "card" => Ok(PaymentMethod::Card),
            "bank_transfer" => Ok(PaymentMethod::BankTransfer),
            other => Err(ValidationError::NotAllowed {
                field: "paymentMethod".to_string(),
                value: other.to_string(),
                allowed: vec!["cash", "card", "bank_transfer"],
            }),
        }
    }
}

// =============================================================================
// Excess Action
// =============================================================================

/// What to do with a payment beyond the transaction total.
///
/// Excess is either refunded or applied against existing debt — it is
/// never converted into stored customer credit.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExcessAction {
    /// Hand the excess back to the customer.
    Return,
    /// Apply the excess against the customer's outstanding debt first,
    /// refund whatever remains.
    Debt,
}

impl ExcessAction {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ExcessAction::Return => "return",
            ExcessAction::Debt => "debt",
        }
    }
}

impl FromStr for ExcessAction {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "return" => Ok(ExcessAction::Return),
            "debt" => Ok(ExcessAction::Debt),
            other => Err(ValidationError::NotAllowed {
                field: "excessAction".to_string(),
                value: other.to_string(),
                allowed: vec!["return", "debt"],
            }),
        }
    }
}

// =============================================================================
// Approval Status
// =============================================================================

/// Approval state for sales flagged as requiring admin sign-off.
///
/// A sale that never required approval carries no approval status at all
/// (NULL in storage); `pending` sales have had their items and total
/// computed but no inventory or money effects yet.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

impl ApprovalStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ApprovalStatus::Pending => "pending",
            ApprovalStatus::Approved => "approved",
            ApprovalStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Order Status
// =============================================================================

/// The status state machine of an app order.
///
/// ```text
/// pending ──► processing ──► completed ──► cancelled
///    │             │             │    └───► returned
///    │             ├──► cancelled│
///    │             └──► returned │
///    ├──► cancelled (stock IS reversed — debited at creation)
///    └──► returned
/// ```
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Processing,
    Completed,
    Cancelled,
    Returned,
}

impl OrderStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Returned => "returned",
        }
    }

    /// Whether the state machine allows moving to `next`.
    ///
    /// `cancelled` and `returned` are terminal; `completed` may still be
    /// reversed into either of them (post-fulfillment reversal).
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, Processing)
                | (Pending, Cancelled)
                | (Pending, Returned)
                | (Processing, Completed)
                | (Processing, Cancelled)
                | (Processing, Returned)
                | (Completed, Cancelled)
                | (Completed, Returned)
        )
    }

    /// Whether inventory debited at creation must be credited back when
    /// cancelling/returning out of this state.
    ///
    /// Stock is debited when the order is created, so the reversal applies
    /// from every state — including `pending`.
    pub const fn reversal_restores_stock(&self) -> bool {
        matches!(
            self,
            OrderStatus::Pending | OrderStatus::Processing | OrderStatus::Completed
        )
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "processing" => Ok(OrderStatus::Processing),
            "completed" => Ok(OrderStatus::Completed),
            "cancelled" => Ok(OrderStatus::Cancelled),
            "returned" => Ok(OrderStatus::Returned),
            other => Err(ValidationError::NotAllowed {
                field: "status".to_string(),
                value: other.to_string(),
                allowed: vec!["pending", "processing", "completed", "cancelled", "returned"],
            }),
        }
    }
}

// =============================================================================
// Ledger Entry Kinds
// =============================================================================

/// What caused an inventory ledger entry.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InventoryTransactionType {
    /// Immediate point-of-sale debit.
    Sale,
    /// Deferred debit committed by an approval.
    SaleApproved,
    /// Stock received into the warehouse.
    Restock,
    /// Debit at order creation.
    OrderCreated,
    /// Credit reversing a cancelled order.
    OrderCancelled,
    /// Credit reversing a returned order.
    OrderReturned,
    /// Manual correction by an operator.
    Adjustment,
}

impl InventoryTransactionType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            InventoryTransactionType::Sale => "sale",
            InventoryTransactionType::SaleApproved => "sale_approved",
            InventoryTransactionType::Restock => "restock",
            InventoryTransactionType::OrderCreated => "order_created",
            InventoryTransactionType::OrderCancelled => "order_cancelled",
            InventoryTransactionType::OrderReturned => "order_returned",
            InventoryTransactionType::Adjustment => "adjustment",
        }
    }
}

/// Direction of a debt ledger entry.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebtEntryType {
    /// Balance went up (shortfall became debt).
    DebtAdded,
    /// Balance went down (payment or excess applied).
    DebtPaid,
}

impl DebtEntryType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            DebtEntryType::DebtAdded => "debt_added",
            DebtEntryType::DebtPaid => "debt_paid",
        }
    }
}

// =============================================================================
// Actor
// =============================================================================

/// The authenticated identity performing a mutation.
///
/// Supplied by the auth collaborator on every mutating call; the core
/// treats it as opaque and never re-derives it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
    pub id: String,
    pub name: String,
    pub role: String,
}

impl Actor {
    pub fn new(id: impl Into<String>, name: impl Into<String>, role: impl Into<String>) -> Self {
        Actor {
            id: id.into(),
            name: name.into(),
            role: role.into(),
        }
    }
}

// =============================================================================
// Product
// =============================================================================

/// A product stocked in two units: whole packages and loose pieces.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Stock Keeping Unit - business identifier.
    pub sku: String,

    /// Display name shown to cashier and on receipt.
    pub name: String,

    /// Pieces per package. Legacy rows may carry 0; the decomposer
    /// normalizes that to 1 at its entry point.
    pub package_size: i64,

    /// Whole packages currently in stock (never negative).
    pub packages_in_stock: i64,

    /// Loose pieces currently in stock (never negative).
    pub pieces_in_stock: i64,

    /// Per-piece price for wholesale customers.
    pub wholesale_price_cents: i64,

    /// Per-piece price for retail customers.
    pub retail_price_cents: i64,

    /// Per-piece price for regular customers.
    pub regular_price_cents: i64,

    /// Purchase cost per piece. 0 = unknown.
    pub cost_price_cents: i64,

    /// Whether product is active (soft delete).
    pub is_active: bool,

    /// When the product was created.
    pub created_at: DateTime<Utc>,

    /// When the product was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Package size with the legacy 0/negative case normalized to 1.
    #[inline]
    pub fn effective_package_size(&self) -> i64 {
        if self.package_size >= 1 {
            self.package_size
        } else {
            1
        }
    }

    /// Total sellable pieces across both units.
    #[inline]
    pub fn total_pieces(&self) -> i64 {
        self.packages_in_stock * self.effective_package_size() + self.pieces_in_stock
    }

    /// Selects the per-piece price for a customer tier.
    ///
    /// A tier that is zero or negative is a data error on the product, not
    /// something to silently substitute — the sale fails `InvalidPrice`.
    pub fn price_for(&self, customer_type: CustomerType) -> CoreResult<Money> {
        let (tier, cents) = match customer_type {
            CustomerType::Wholesale => ("wholesale", self.wholesale_price_cents),
            CustomerType::Retail => ("retail", self.retail_price_cents),
            CustomerType::Regular => ("regular", self.regular_price_cents),
        };

        if cents <= 0 {
            return Err(CoreError::InvalidPrice {
                product: self.name.clone(),
                tier: tier.to_string(),
                price_cents: cents,
            });
        }

        Ok(Money::from_cents(cents))
    }
}

// =============================================================================
// Customer
// =============================================================================

/// A customer with a running debt balance (the khata).
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub phone: Option<String>,
    pub customer_type: CustomerType,

    /// Signed running total; >= 0 means the customer owes the store.
    /// Mutated exclusively by the debt ledger.
    pub debt_balance_cents: i64,

    /// Ceiling on the debt balance. NULL = unlimited.
    pub debt_limit_cents: Option<i64>,

    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Customer {
    /// Current debt balance as Money.
    #[inline]
    pub fn debt_balance(&self) -> Money {
        Money::from_cents(self.debt_balance_cents)
    }

    /// Whether taking on `additional` more debt stays under the ceiling.
    pub fn within_debt_limit(&self, additional: Money) -> bool {
        match self.debt_limit_cents {
            None => true,
            Some(limit) => self.debt_balance_cents + additional.cents() <= limit,
        }
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A settled (or approval-pending) point-of-sale transaction.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sale {
    pub id: String,

    /// Opaque seller identity from the auth collaborator.
    pub seller_id: String,
    pub seller_name: String,

    /// Customer deletion detaches but never cascades, hence nullable.
    pub customer_id: Option<String>,

    /// Sum of item subtotals. Computed, never client-supplied.
    pub total_amount_cents: i64,

    pub payment_method: PaymentMethod,

    /// What the customer actually handed over.
    pub payment_amount_cents: i64,

    /// Caller-chosen disposition of any excess payment.
    pub excess_action: ExcessAction,

    /// NULL when the sale never required approval.
    pub approval_status: Option<ApprovalStatus>,

    /// Reconciliation outcome, captured at settlement for the receipt.
    pub debt_paid_cents: i64,
    pub excess_paid_cents: i64,
    pub debt_added_cents: i64,

    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Sale {
    /// Whether money/stock effects are still deferred behind an approval.
    #[inline]
    pub fn is_pending_approval(&self) -> bool {
        self.approval_status == Some(ApprovalStatus::Pending)
    }

    #[inline]
    pub fn total_amount(&self) -> Money {
        Money::from_cents(self.total_amount_cents)
    }
}

/// A line item in a sale.
/// Uses snapshot pattern to freeze product data at time of sale.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleItem {
    pub id: String,
    pub sale_id: String,
    pub product_id: String,

    /// Product name at time of sale (frozen).
    pub name_snapshot: String,

    /// What the user asked for, in pieces — the unit they reason in.
    pub requested_quantity: i64,

    /// Decomposed split actually taken from stock.
    pub packages_sold: i64,
    pub pieces_sold: i64,

    /// Unit price in cents at time of sale (frozen). Price changes later
    /// must not retroactively alter historical lines.
    pub unit_price_cents: i64,

    /// requested_quantity × unit_price.
    pub subtotal_cents: i64,

    pub created_at: DateTime<Utc>,
}

impl SaleItem {
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }
}

// =============================================================================
// Order
// =============================================================================

/// A mobile-app order moving through the lifecycle state machine.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub seller_id: String,
    pub seller_name: String,
    pub customer_id: Option<String>,
    pub status: OrderStatus,
    pub total_amount_cents: i64,
    pub payment_method: PaymentMethod,

    /// Set when completion materializes the sale of record.
    pub sale_id: Option<String>,

    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    #[inline]
    pub fn total_amount(&self) -> Money {
        Money::from_cents(self.total_amount_cents)
    }
}

/// A line item in an order. Same snapshot discipline as [`SaleItem`].
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: String,
    pub order_id: String,
    pub product_id: String,
    pub name_snapshot: String,
    pub requested_quantity: i64,
    pub packages_sold: i64,
    pub pieces_sold: i64,
    pub unit_price_cents: i64,
    pub subtotal_cents: i64,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Ledger Rows (append-only)
// =============================================================================

/// One signed stock movement. Append-only.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryTransaction {
    pub id: String,
    pub product_id: String,

    /// Signed: negative for debits, positive for credits.
    pub packages_change: i64,
    pub pieces_change: i64,

    pub transaction_type: InventoryTransactionType,

    /// The causing sale/order id.
    pub reference: Option<String>,

    pub created_at: DateTime<Utc>,
}

/// Broader change record for compliance/history. Append-only; written
/// best-effort and never consulted to recompute state.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub id: String,
    pub actor_id: String,
    pub actor_name: String,
    pub actor_role: String,
    pub product_id: String,

    /// Total pieces before and after the mutation.
    pub total_before: i64,
    pub total_after: i64,

    /// Net change in pieces (signed).
    pub change: i64,

    pub reason: String,
    pub reference: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// One signed movement of a customer's debt balance. Append-only.
///
/// `balance_before`/`balance_after` are both captured at write time, not
/// recomputed later — `after == before + amount` is the reconciliation
/// invariant every reader may rely on.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebtHistoryEntry {
    pub id: String,
    pub customer_id: String,

    /// Signed: positive for debt added, negative for debt paid.
    pub amount_cents: i64,

    pub balance_before_cents: i64,
    pub balance_after_cents: i64,

    pub entry_type: DebtEntryType,
    pub reference: Option<String>,
    pub notes: Option<String>,

    pub actor_id: String,
    pub actor_name: String,

    pub created_at: DateTime<Utc>,
}

impl DebtHistoryEntry {
    /// Checks the row's internal consistency.
    pub fn is_consistent(&self) -> bool {
        self.balance_after_cents == self.balance_before_cents + self.amount_cents
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn product(package_size: i64) -> Product {
        Product {
            id: "p-1".to_string(),
            sku: "TAPAL-95".to_string(),
            name: "Tapal Danedar 95g".to_string(),
            package_size,
            packages_in_stock: 2,
            pieces_in_stock: 3,
            wholesale_price_cents: 400,
            retail_price_cents: 500,
            regular_price_cents: 550,
            cost_price_cents: 350,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_total_pieces() {
        assert_eq!(product(10).total_pieces(), 23);
    }

    #[test]
    fn test_zero_package_size_normalizes_to_one() {
        let p = product(0);
        assert_eq!(p.effective_package_size(), 1);
        assert_eq!(p.total_pieces(), 5);
    }

    #[test]
    fn test_price_tier_selection() {
        let p = product(10);
        assert_eq!(
            p.price_for(CustomerType::Wholesale).unwrap().cents(),
            400
        );
        assert_eq!(p.price_for(CustomerType::Retail).unwrap().cents(), 500);
        assert_eq!(p.price_for(CustomerType::Regular).unwrap().cents(), 550);
    }

    #[test]
    fn test_zero_tier_price_is_invalid() {
        let mut p = product(10);
        p.retail_price_cents = 0;
        assert!(matches!(
            p.price_for(CustomerType::Retail),
            Err(CoreError::InvalidPrice { .. })
        ));
    }

    #[test]
    fn test_order_status_transitions() {
        use OrderStatus::*;
        assert!(Pending.can_transition_to(Processing));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Processing.can_transition_to(Completed));
        assert!(Completed.can_transition_to(Returned));
        assert!(!Completed.can_transition_to(Processing));
        assert!(!Cancelled.can_transition_to(Processing));
        assert!(!Pending.can_transition_to(Completed));
    }

    #[test]
    fn test_strict_payment_method_parse() {
        assert_eq!(
            "bank_transfer".parse::<PaymentMethod>().unwrap(),
            PaymentMethod::BankTransfer
        );
        // The reference defaulted unknown strings to cash; we fail loudly.
        assert!("barter".parse::<PaymentMethod>().is_err());
        assert!("CASH".parse::<PaymentMethod>().is_err());
    }

    #[test]
    fn test_strict_status_parse() {
        assert_eq!(
            "returned".parse::<OrderStatus>().unwrap(),
            OrderStatus::Returned
        );
        assert!("shipped".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_debt_limit_check() {
        let customer = Customer {
            id: "c-1".to_string(),
            name: "Bashir".to_string(),
            phone: None,
            customer_type: CustomerType::Retail,
            debt_balance_cents: 4000,
            debt_limit_cents: Some(5000),
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert!(customer.within_debt_limit(Money::from_cents(1000)));
        assert!(!customer.within_debt_limit(Money::from_cents(1001)));
    }

    #[test]
    fn test_debt_history_consistency() {
        let entry = DebtHistoryEntry {
            id: "d-1".to_string(),
            customer_id: "c-1".to_string(),
            amount_cents: -2000,
            balance_before_cents: 5000,
            balance_after_cents: 3000,
            entry_type: DebtEntryType::DebtPaid,
            reference: None,
            notes: None,
            actor_id: "u-1".to_string(),
            actor_name: "admin".to_string(),
            created_at: Utc::now(),
        };
        assert!(entry.is_consistent());
    }
}
