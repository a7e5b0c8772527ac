//! # Seed Data Generator
//!
//! Populates the database with a demo catalog and customers for development.
//!
//! ## Usage
//! ```bash
//! # 200 products (default)
//! cargo run -p shopdesk-db --bin seed
//!
//! # Custom amount
//! cargo run -p shopdesk-db --bin seed -- --count 1000
//!
//! # Specify database path
//! cargo run -p shopdesk-db --bin seed -- --db ./data/shopdesk.db
//! ```
//!
//! ## Generated Data
//! - Brands from the popular list, each tagged with the categories it sells
//! - Categories (Phones, Accessories, Audio, Chargers, Repairs)
//! - A couple of suppliers
//! - Products, each with 1-3 variants (`{BRAND}-{INDEX}-{VARIANT}` SKUs)
//! - A few customers across the loyalty tiers

use chrono::Utc;
use std::env;
use uuid::Uuid;

use shopdesk_core::catalog::{BrandInput, CategoryInput, SupplierInput};
use shopdesk_core::customer::CustomerInput;
use shopdesk_core::product::{Product, ProductVariant};
use shopdesk_core::{CustomerType, Money};
use shopdesk_db::repository::product::generate_product_id;
use shopdesk_db::{Database, DbConfig};

const BRANDS: &[(&str, &[&str])] = &[
    ("Apple", &["Phones", "Accessories", "Audio"]),
    ("Samsung", &["Phones", "Accessories", "Audio"]),
    ("Tecno", &["Phones"]),
    ("Infinix", &["Phones"]),
    ("Oraimo", &["Accessories", "Audio", "Chargers"]),
    ("Anker", &["Chargers", "Accessories"]),
    ("JBL", &["Audio"]),
];

const CATEGORIES: &[(&str, &str)] = &[
    ("Phones", "#3b82f6"),
    ("Accessories", "#10b981"),
    ("Audio", "#f59e0b"),
    ("Chargers", "#ef4444"),
    ("Repairs", "#8b5cf6"),
];

const MODELS: &[&str] = &[
    "Power Bank 10000mAh",
    "USB-C Cable 1m",
    "Fast Charger 25W",
    "Wireless Earbuds",
    "Bluetooth Speaker",
    "Screen Protector",
    "Silicone Case",
    "Car Charger",
    "Smart Watch",
    "Neckband",
];

/// Variant name and price step in minor units.
const VARIANTS: &[(&str, i64)] = &[("Black", 0), ("White", 0), ("Blue", 1_500)];

const CUSTOMERS: &[(&str, &str, &str, i64)] = &[
    ("Amina Juma", "0712 345 678", "Dar es Salaam", 0),
    ("Baraka Mushi", "0754 111 222", "Arusha", 1_200),
    ("Neema Kessy", "+255 768 900 100", "Mwanza", 2_400),
    ("Juma Ally", "0655 010 203", "Dodoma", 6_000),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut count: usize = 200;
    let mut db_path = String::from("./shopdesk_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(200);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("ShopDesk Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of products to generate (default: 200)");
                println!("  -d, --db <PATH>    Database file path (default: ./shopdesk_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 ShopDesk Seed Data Generator");
    println!("===============================");
    println!("Database: {}", db_path);
    println!("Products: {}", count);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let mut category_ids = Vec::with_capacity(CATEGORIES.len());
    for (name, color) in CATEGORIES {
        let category = db
            .categories()
            .create(&CategoryInput {
                name: (*name).to_string(),
                color: Some((*color).to_string()),
                ..Default::default()
            })
            .await?;
        category_ids.push(category.id);
    }
    println!("✓ {} categories", category_ids.len());

    let mut brand_ids = Vec::with_capacity(BRANDS.len());
    for (name, categories) in BRANDS {
        let brand = db
            .brands()
            .create(&BrandInput {
                name: (*name).to_string(),
                categories: categories.iter().map(|c| (*c).to_string()).collect(),
                ..Default::default()
            })
            .await?;
        brand_ids.push(brand.id);
    }
    println!("✓ {} brands", brand_ids.len());

    for (name, contact, city) in [
        ("Kariakoo Wholesale", "Halima", "Dar es Salaam"),
        ("Lake Zone Traders", "Peter", "Mwanza"),
    ] {
        db.suppliers()
            .create(&SupplierInput {
                name: name.to_string(),
                contact_person: Some(contact.to_string()),
                city: Some(city.to_string()),
                categories: vec!["Accessories".to_string(), "Chargers".to_string()],
                ..Default::default()
            })
            .await?;
    }
    println!("✓ 2 suppliers");

    println!();
    println!("Generating products...");
    let start = std::time::Instant::now();
    let mut generated = 0;

    for seed in 0..count {
        let (product, variants) = generate_product(seed, &brand_ids, &category_ids);
        if let Err(e) = db.products().insert(&product, &variants).await {
            eprintln!("Failed to insert {}: {}", product.name, e);
            continue;
        }
        generated += 1;
        if generated % 100 == 0 {
            println!("  Generated {} products...", generated);
        }
    }

    let elapsed = start.elapsed();
    println!("✓ Generated {} products in {:?}", generated, elapsed);

    for (name, phone, city, points) in CUSTOMERS {
        let customer = db
            .customers()
            .create(&CustomerInput {
                name: (*name).to_string(),
                phone: (*phone).to_string(),
                city: Some((*city).to_string()),
                customer_type: if *points > 5_000 {
                    CustomerType::Wholesale
                } else {
                    CustomerType::Retail
                },
                ..Default::default()
            })
            .await?;
        if *points > 0 {
            db.customers().check_in(&customer.id, *points).await?;
        }
    }
    println!("✓ {} customers", CUSTOMERS.len());

    println!();
    println!("Verifying search...");
    let hits = db.products().search_for_sale("charger", 10).await?;
    println!("  Search 'charger': {} results", hits.len());

    println!();
    println!("✓ Seed complete!");
    Ok(())
}

/// Builds one product and its variants from a running index.
fn generate_product(seed: usize, brand_ids: &[String], category_ids: &[String]) -> (Product, Vec<ProductVariant>) {
    let brand_idx = seed % BRANDS.len();
    let model = MODELS[(seed / BRANDS.len()) % MODELS.len()];
    let brand_code = BRANDS[brand_idx].0.to_uppercase();

    let product = Product {
        id: generate_product_id(),
        name: format!("{} {} #{}", BRANDS[brand_idx].0, model, seed + 1),
        brand_id: brand_ids.get(brand_idx).cloned(),
        category_id: category_ids.get(seed % category_ids.len().max(1)).cloned(),
        description: None,
        is_active: true,
        created_at: Utc::now(),
    };

    // 5,000 - 84,500 in steps of 500
    let base = 5_000 + ((seed as i64 * 17) % 160) * 500;
    let variant_count = 1 + seed % VARIANTS.len();
    let variants = VARIANTS[..variant_count]
        .iter()
        .map(|(name, step)| {
            let selling = base + step;
            ProductVariant {
                id: Uuid::new_v4().to_string(),
                product_id: product.id.clone(),
                name: (*name).to_string(),
                sku: Some(format!("{}-{:04}-{}", brand_code, seed, name.to_uppercase())),
                selling_price: Money::from_minor(selling),
                wholesale_price: Some(Money::from_minor(selling * 85 / 100)),
                cost_price: Some(Money::from_minor(selling * 65 / 100)),
                stock_quantity: (seed % 40) as i64,
                is_active: true,
            }
        })
        .collect();

    (product, variants)
}
