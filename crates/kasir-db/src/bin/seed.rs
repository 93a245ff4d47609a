//! # Seed Data Generator
//!
//! Populates the database with demo categories and products for
//! development.
//!
//! ## Usage
//! ```bash
//! # Seed ./kasir.db
//! cargo run -p kasir-db --bin seed
//!
//! # Specify database path
//! cargo run -p kasir-db --bin seed -- --db ./data/kasir.db
//! ```
//!
//! ## Generated Data
//! One category per group below, each product with price in rupiah and a
//! stock between 10 and 50.

use std::env;

use kasir_core::{Money, NewCategory, NewProduct};
use kasir_db::{Database, DbConfig};

/// (category, description, [(product, price)])
const CATALOG: &[(&str, &str, &[(&str, i64)])] = &[
    (
        "Makanan",
        "Mie instan dan makanan ringan",
        &[
            ("Indomie Goreng", 3000),
            ("Indomie Soto", 3000),
            ("Indomie Ayam Bawang", 3000),
            ("Chitato", 10000),
            ("Roti Tawar", 15000),
        ],
    ),
    (
        "Minuman",
        "Minuman kemasan",
        &[
            ("Teh Botol", 5000),
            ("Aqua 600ml", 4000),
            ("Kopi Kapal Api", 2000),
            ("Susu Ultra", 7000),
        ],
    ),
    (
        "Kebutuhan Rumah",
        "Perlengkapan rumah tangga",
        &[("Sabun Lifebuoy", 4500), ("Rinso 800g", 22000), ("Baterai ABC", 9000)],
    ),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./kasir.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Kasir POS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./kasir.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Kasir POS Seed Data Generator");
    println!("================================");
    println!("Database: {}", db_path);
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

    let mut generated = 0;
    for (seed, (category_name, description, products)) in CATALOG.iter().enumerate() {
        let category = db
            .categories()
            .insert(&NewCategory {
                name: category_name.to_string(),
                description: description.to_string(),
            }
            .validate()?)
            .await?;
        println!("  Category {} ({})", category.name, category.id);

        for (idx, (name, price)) in products.iter().enumerate() {
            let product = NewProduct {
                name: name.to_string(),
                price: Money::from_minor(*price),
                stock: 10 + ((seed * 7 + idx * 13) % 41) as i64,
                category_id: Some(category.id),
            }
            .validate()?;

            if let Err(e) = db.products().insert(&product).await {
                eprintln!("Failed to insert {}: {}", product.name, e);
                continue;
            }
            generated += 1;
        }
    }

    println!();
    println!("✓ Generated {} products", generated);
    println!("✓ Seed complete!");

    db.close().await;
    Ok(())
}
