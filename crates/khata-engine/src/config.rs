//! # Settlement Configuration
//!
//! Store-level defaults the services consult. The settlement algorithms
//! themselves never read configuration — these are the narrow values the
//! settings collaborator supplies.

use serde::{Deserialize, Serialize};

use khata_core::Actor;

/// Store defaults for the settlement services.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementConfig {
    /// Currency symbol handed to the receipt-rendering collaborator.
    /// Money math never touches it.
    pub currency_symbol: String,

    /// Fallback owner for orders created without an explicit seller.
    /// Which seller gets picked is a business rule outside the core; the
    /// engine only needs an identity to record.
    pub default_order_seller: Option<Actor>,
}

impl Default for SettlementConfig {
    fn default() -> Self {
        SettlementConfig {
            currency_symbol: "Rs".to_string(),
            default_order_seller: None,
        }
    }
}
