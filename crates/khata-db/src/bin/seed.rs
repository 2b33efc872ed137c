//! # Seed Data Generator
//!
//! Populates the database with test products and customers for development.
//!
//! ## Usage
//! ```bash
//! # Seed the default database
//! cargo run -p khata-db --bin seed
//!
//! # Specify database path
//! cargo run -p khata-db --bin seed -- --db ./data/khata.db
//! ```
//!
//! ## Generated Data
//! Dual-unit products across typical kirana categories, each with:
//! - Unique SKU: `{CATEGORY}-{INDEX}`
//! - Package size matching how the item actually ships (dozen, carton, ...)
//! - Spread of packages/pieces in stock
//! - Three price tiers (wholesale < retail < regular)
//!
//! Plus a handful of customers across the three tiers, some carrying
//! opening debt and a ceiling.

use chrono::Utc;
use std::env;
use tracing::info;
use uuid::Uuid;

use khata_core::{Customer, CustomerType, Product};
use khata_db::{Database, DbConfig};

/// Product categories with (sku prefix, package size, base piece price).
const CATEGORIES: &[(&str, i64, i64, &[&str])] = &[
    (
        "TEA",
        12,
        4500,
        &[
            "Tapal Danedar 95g",
            "Lipton Yellow Label 95g",
            "Vital Tea 385g",
            "Tapal Family Mixture 95g",
        ],
    ),
    (
        "SOAP",
        48,
        950,
        &[
            "Lifebuoy Soap 100g",
            "Lux Rose 120g",
            "Safeguard White 95g",
            "Dettol Original 85g",
        ],
    ),
    (
        "BISC",
        24,
        500,
        &[
            "Sooper Classic",
            "Prince Chocolate",
            "Oreo Mini",
            "Gala Egg & Milk",
            "Candi Biscuit",
        ],
    ),
    (
        "BEV",
        6,
        1800,
        &[
            "Pepsi 1.5L",
            "Coca-Cola 1.5L",
            "Sprite 1.5L",
            "Sting Energy 500ml",
        ],
    ),
    (
        "RICE",
        1,
        32000,
        &["Falak Basmati 5kg", "Guard Rice 5kg", "Kernel Basmati 5kg"],
    ),
];

const CUSTOMERS: &[(&str, &str, i64, Option<i64>)] = &[
    ("Bashir General Store", "wholesale", 150000, Some(500000)),
    ("Madina Kiryana", "wholesale", 0, Some(300000)),
    ("Haji Riaz", "retail", 42000, None),
    ("Shazia Bibi", "retail", 0, Some(20000)),
    ("Walk-in Regular", "regular", 0, None),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let db_path = parse_db_path().unwrap_or_else(|| "./khata.db".to_string());

    info!(path = %db_path, "Seeding database");

    let db = Database::new(DbConfig::new(&db_path)).await?;

    let now = Utc::now();
    let mut product_count = 0u32;

    for (prefix, package_size, base_price, names) in CATEGORIES {
        for (index, name) in names.iter().enumerate() {
            // Deterministic spread so repeated runs stay comparable.
            let step = (index as i64 + 1) * 3;
            let wholesale = base_price + step * 10;

            let product = Product {
                id: Uuid::new_v4().to_string(),
                sku: format!("{}-{:03}", prefix, index + 1),
                name: name.to_string(),
                package_size: *package_size,
                packages_in_stock: 2 + step % 7,
                pieces_in_stock: step % (*package_size).max(1),
                wholesale_price_cents: wholesale,
                retail_price_cents: wholesale + wholesale / 10,
                regular_price_cents: wholesale + wholesale / 5,
                cost_price_cents: wholesale - wholesale / 10,
                is_active: true,
                created_at: now,
                updated_at: now,
            };

            db.products().insert(&product).await?;
            product_count += 1;
        }
    }

    let mut customer_count = 0u32;

    for (name, tier, opening_debt, limit) in CUSTOMERS {
        let customer = Customer {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            phone: None,
            customer_type: tier.parse::<CustomerType>()?,
            debt_balance_cents: *opening_debt,
            debt_limit_cents: *limit,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        db.customers().insert(&customer).await?;
        customer_count += 1;
    }

    info!(
        products = product_count,
        customers = customer_count,
        "Seed complete"
    );

    db.close().await;
    Ok(())
}

/// Parses `--db <path>` from the command line.
fn parse_db_path() -> Option<String> {
    let args: Vec<String> = env::args().collect();
    args.iter()
        .position(|a| a == "--db")
        .and_then(|i| args.get(i + 1))
        .cloned()
}
