//! # Seed Data Generator
//!
//! Populates the database with demo products (and optionally sales).
//!
//! ## Usage
//! ```bash
//! # Generate 500 products (default)
//! cargo run -p caixa-db --bin seed
//!
//! # Custom amount, custom file, plus 50 demo sales
//! cargo run -p caixa-db --bin seed -- --count 2000 --db ./data/caixa.db --sales 50
//! ```
//!
//! ## Generated Products
//! One block per category (beverages, food, hygiene, cleaning, other),
//! each product in several sizes:
//! - Barcode: `789{category}{index:09}` (EAN-13 shaped, checksum not valid)
//! - Price: $1.99 - $9.99 plus a size addon
//! - Stock: 0 - 100

use std::env;
use std::time::{Duration, Instant};

use caixa_core::{CartLine, Category, NewProduct, PaymentMethod, Product};
use caixa_db::{Database, DbConfig};

/// Product names per category.
const CATALOGUE: &[(Category, &[&str])] = &[
    (
        Category::Beverages,
        &[
            "Cola", "Guarana Soda", "Lemon Soda", "Orange Juice", "Grape Juice",
            "Mineral Water", "Sparkling Water", "Iced Tea", "Coffee", "Energy Drink",
        ],
    ),
    (
        Category::Food,
        &[
            "White Rice", "Black Beans", "Spaghetti", "Wheat Flour", "Sugar",
            "Salt", "Coffee Beans", "Crackers", "Chocolate Bar", "Corn Flakes",
        ],
    ),
    (
        Category::Hygiene,
        &[
            "Toothpaste", "Toothbrush", "Shampoo", "Conditioner", "Bar Soap",
            "Deodorant", "Toilet Paper", "Dental Floss", "Hand Cream", "Cotton Swabs",
        ],
    ),
    (
        Category::Cleaning,
        &[
            "Dish Soap", "Laundry Detergent", "Bleach", "Multi-Surface Cleaner", "Sponges",
            "Glass Cleaner", "Fabric Softener", "Trash Bags", "Floor Cleaner", "Disinfectant",
        ],
    ),
    (
        Category::Other,
        &[
            "Batteries AA", "Light Bulb", "Matches", "Candles", "Lighter",
            "Notebook", "Ballpoint Pen", "Tape", "Phone Charger", "Umbrella",
        ],
    ),
];

/// Size variants and their price addon in cents.
const SIZES: &[(&str, i64)] = &[
    ("Small", 0),
    ("Medium", 100),
    ("Large", 200),
    ("Family", 350),
    ("Value Pack", 500),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut count: usize = 500;
    let mut sales: usize = 0;
    let mut db_path = String::from("./caixa_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(500);
                    i += 1;
                }
            }
            "--sales" | "-s" => {
                if i + 1 < args.len() {
                    sales = args[i + 1].parse().unwrap_or(0);
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
                println!("Caixa POS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of products to generate (default: 500)");
                println!("  -s, --sales <N>    Number of demo sales to commit (default: 0)");
                println!("  -d, --db <PATH>    Database file path (default: ./caixa_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Caixa POS Seed Data Generator");
    println!("================================");
    println!("Database: {}", db_path);
    println!("Products: {}", count);
    println!("Sales:    {}", sales);
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

    println!();
    println!("Generating products...");

    let catalog = db.catalog();
    let mut created: Vec<Product> = Vec::with_capacity(count);
    let start = Instant::now();

    'outer: for (category_idx, (category, names)) in CATALOGUE.iter().enumerate() {
        for (name_idx, name) in names.iter().enumerate() {
            for (size_idx, (size, price_addon)) in SIZES.iter().enumerate() {
                if created.len() >= count {
                    break 'outer;
                }

                let seed = category_idx * 1000 + name_idx * 20 + size_idx;
                let product = generate_product(*category, name, size, *price_addon, seed);
                let barcode = product.barcode.clone();

                match catalog.create(product).await {
                    Ok(p) => created.push(p),
                    Err(e) => {
                        eprintln!("Failed to insert {}: {}", barcode, e);
                        continue;
                    }
                }

                if created.len() % 100 == 0 {
                    println!("  Generated {} products...", created.len());
                }
            }
        }
    }

    let elapsed = start.elapsed();
    println!();
    println!("✓ Generated {} products in {:?}", created.len(), elapsed);

    if sales > 0 && !created.is_empty() {
        println!();
        println!("Committing demo sales...");

        let coordinator = db.coordinator(Duration::from_secs(caixa_core::SALE_COMMIT_TIMEOUT_SECS));
        let mut committed = 0;

        for n in 0..sales {
            let lines: Vec<CartLine> = (0..=(n % 3))
                .map(|k| {
                    let product = &created[(n * 7 + k * 13) % created.len()];
                    CartLine::new(product.barcode.clone(), 1 + (k as i64))
                })
                .collect();
            let method = PaymentMethod::ALL[n % PaymentMethod::ALL.len()];

            match coordinator.commit_sale(&lines, method).await {
                Ok(_) => committed += 1,
                Err(e) => eprintln!("  Sale {} skipped: {}", n + 1, e),
            }
        }

        println!("✓ Committed {} of {} sales", committed, sales);
    }

    println!();
    println!("Verifying search...");
    let hits = db.products().search(None, Some("soda")).await?;
    println!("  Search 'soda': {} results", hits.len());
    let hits = db.products().search(Some(Category::Cleaning), None).await?;
    println!("  Category CLEANING: {} results", hits.len());

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Builds one product with deterministic pseudo-random values.
fn generate_product(
    category: Category,
    name: &str,
    size: &str,
    price_addon: i64,
    seed: usize,
) -> NewProduct {
    let category_digit = Category::ALL
        .iter()
        .position(|c| *c == category)
        .unwrap_or(0);

    NewProduct {
        name: format!("{} {}", name, size),
        barcode: format!("789{}{:09}", category_digit, seed),
        // $1.99 - $9.99 + size addon
        price_cents: 199 + ((seed * 17) % 800) as i64 + price_addon,
        stock: (seed % 101) as i64,
        category,
    }
}
