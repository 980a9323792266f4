//! # Seed Data Generator
//!
//! Prepares a development database: default admin account, the airtime
//! recharge entry, and a small starter catalog.
//!
//! ## Usage
//! ```bash
//! # Seed the default database
//! cargo run -p mercado-db --bin seed
//!
//! # Specify database path
//! cargo run -p mercado-db --bin seed -- --db ./data/mercado.db
//! ```

use std::env;

use mercado_core::{NewProduct, ProductKind};
use mercado_db::{Database, DbConfig};

/// Starter catalog: (barcode, name, price cents, cost cents, stock, category)
const PRODUCTS: &[(&str, &str, i64, i64, i64, &str)] = &[
    ("7501031310017", "Lápiz HB #2", 350, 150, 100, "Papelería"),
    ("7501031310024", "Cuaderno Profesional", 2500, 1500, 40, "Papelería"),
    ("7501031310031", "Bolígrafo Negro", 800, 400, 80, "Papelería"),
    ("7501031310048", "Pegamento en Barra", 1500, 900, 30, "Papelería"),
    ("7501055300075", "Refresco 600ml", 1800, 1200, 60, "Abarrotes"),
    ("7501055300082", "Agua 1L", 1200, 700, 60, "Abarrotes"),
    ("7501055300099", "Galletas Surtidas", 1600, 1000, 45, "Abarrotes"),
    ("7501055300105", "Papas Fritas 45g", 1700, 1100, 50, "Abarrotes"),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();
    let mut db_path = String::from("./mercado_dev.db");

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
                println!("Mercado POS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./mercado_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Mercado POS Seed Data Generator");
    println!("==================================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    // First-run bootstrap: the admin/admin account
    if db.users().ensure_default_admin().await? {
        println!("✓ Default admin account created (admin/admin - change it!)");
    } else {
        println!("✓ Admin account already present");
    }

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping catalog seed to avoid duplicates.");
        return Ok(());
    }

    // The airtime recharge entry: priced per-sale, stock is a counter
    db.products()
        .create(&NewProduct {
            barcode: "RECARGA-001".to_string(),
            name: "Recarga Celular".to_string(),
            description: "Recarga de tiempo aire, comisión $1.00".to_string(),
            price_cents: 0,
            cost_cents: 0,
            stock: 0,
            kind: ProductKind::NonInventoried,
            category_id: None,
        })
        .await?;
    println!("✓ Recharge entry created");

    println!();
    println!("Seeding catalog...");

    let mut created = 0;
    for (barcode, name, price, cost, stock, category) in PRODUCTS {
        let category = db.categories().find_or_create(category).await?;

        db.products()
            .create(&NewProduct {
                barcode: barcode.to_string(),
                name: name.to_string(),
                description: String::new(),
                price_cents: *price,
                cost_cents: *cost,
                stock: *stock,
                kind: ProductKind::Standard,
                category_id: Some(category.id),
            })
            .await?;
        created += 1;
    }

    println!("✓ Seeded {} products", created);

    let low = db.products().low_stock().await?;
    println!("  Low-stock alerts: {}", low.len());

    println!();
    println!("✓ Seed complete!");

    Ok(())
}
