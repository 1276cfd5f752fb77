//! # Seed Data
//!
//! Creates the bootstrap accounts and a small demo catalogue.
//!
//! ## Usage
//! ```bash
//! cargo run -p tally-db --bin seed
//! cargo run -p tally-db --bin seed -- --db ./data/tally.db --password s3cret-pass
//! ```
//!
//! Accounts (skipped when any user exists):
//! - `admin` with the given password (default `admin12345`)
//! - `manager` and `cashier` with the same password
//!
//! Catalogue (skipped when any product exists): a few categories with
//! products, some of them deliberately at or below their minimum stock so
//! the low-stock views have something to show.

use std::env;

use tally_core::input::{CategoryInput, NewUser, ProductInput};
use tally_core::Role;
use tally_db::{Database, DbConfig};

const DEFAULT_DB: &str = "./tally.db";
const DEFAULT_PASSWORD: &str = "admin12345";

/// (category, [(barcode, name, price_cents, cost_cents, stock, min_stock)])
const CATALOGUE: &[(&str, &[(&str, &str, i64, i64, i64, i64)])] = &[
    (
        "Beverages",
        &[
            ("5449000000996", "Cola 330ml", 150, 70, 48, 12),
            ("5449000131805", "Cola Zero 330ml", 150, 70, 36, 12),
            ("5000112548167", "Sparkling Water 500ml", 120, 40, 6, 10),
            ("8715700110103", "Orange Juice 1L", 299, 160, 14, 6),
        ],
    ),
    (
        "Snacks",
        &[
            ("5053990101573", "Salted Crisps", 199, 90, 30, 10),
            ("7622210449283", "Milk Chocolate Bar", 175, 80, 3, 8),
            ("5000159407236", "Peanut Bar", 125, 55, 22, 8),
        ],
    ),
    (
        "Stationery",
        &[
            ("4006381333931", "Ballpoint Pen", 150, 60, 120, 20),
            ("3086123385126", "A5 Notebook", 399, 180, 0, 5),
            ("4007817327098", "Highlighter Set", 549, 260, 18, 4),
        ],
    ),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = DEFAULT_DB.to_string();
    let mut password = DEFAULT_PASSWORD.to_string();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--password" | "-p" => {
                if i + 1 < args.len() {
                    password = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Tally POS Seed Data");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>          Database file (default: {})", DEFAULT_DB);
                println!("  -p, --password <PASS>    Password for seeded accounts (default: {})", DEFAULT_PASSWORD);
                println!("  -h, --help               Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Tally POS Seed Data");
    println!("===================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected, migrations applied");

    seed_users(&db, &password).await?;
    seed_catalogue(&db).await?;

    println!();
    println!("✓ Seed complete");
    Ok(())
}

async fn seed_users(db: &Database, password: &str) -> Result<(), Box<dyn std::error::Error>> {
    let existing = db.users().count().await?;
    if existing > 0 {
        println!("⚠ {} user(s) already exist, skipping accounts", existing);
        return Ok(());
    }

    for (username, full_name, role) in [
        ("admin", "Store Admin", Role::Admin),
        ("manager", "Store Manager", Role::Manager),
        ("cashier", "Front Till", Role::Cashier),
    ] {
        let user = NewUser {
            username: username.to_string(),
            password: password.to_string(),
            full_name: full_name.to_string(),
            email: None,
            role,
        };
        user.validate()?;
        db.users().insert(&user).await?;
        println!("✓ Created {} account '{}'", role, username);
    }

    Ok(())
}

async fn seed_catalogue(db: &Database) -> Result<(), Box<dyn std::error::Error>> {
    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ {} product(s) already exist, skipping catalogue", existing);
        return Ok(());
    }

    let mut created = 0;
    for (category_name, products) in CATALOGUE {
        let category = db
            .categories()
            .insert(&CategoryInput {
                name: category_name.to_string(),
                description: None,
            })
            .await?;

        for (barcode, name, price_cents, cost_cents, stock, min_stock) in products.iter() {
            let input = ProductInput {
                barcode: barcode.to_string(),
                name: name.to_string(),
                description: None,
                price_cents: *price_cents,
                cost_cents: *cost_cents,
                stock_quantity: *stock,
                min_stock_level: *min_stock,
                category_id: Some(category.id.clone()),
                is_active: None,
            };

            if let Err(e) = db.products().insert(&input).await {
                eprintln!("Failed to insert {}: {}", barcode, e);
                continue;
            }
            created += 1;
        }
    }

    let low = db.products().count_low_stock().await?;
    println!("✓ Created {} products ({} at or below minimum stock)", created, low);
    Ok(())
}
