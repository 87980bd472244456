//! # Seed Data Generator
//!
//! Loads a small, realistic workshop catalog plus a few clients and orders,
//! so the CLI and reports have something to show during development.
//!
//! ## Usage
//! ```bash
//! # Seed ./siconi_dev.db
//! cargo run -p siconi-db --bin seed
//!
//! # Specify database path
//! cargo run -p siconi-db --bin seed -- --db ./data/siconi.db
//! ```
//!
//! ## Generated Data
//! - One product per (model, size) across the seeded categories
//! - Three clients, one of them VIP
//! - Two orders: one with a deposit, one paid in full
//!
//! Runs only against an empty catalog.

use std::env;

use siconi_core::{Money, NewClient, NewPayment, NewProduct, NewSale, PaymentMethod, SaleLineInput};
use siconi_db::{Database, DbConfig};

/// (category name, code prefix, models with base price in cents)
const CATALOG: &[(&str, &str, &[(&str, i64)])] = &[
    (
        "TRAJES DE BAÑO",
        "TRJ",
        &[
            ("Traje entero competencia", 2000),
            ("Traje dos piezas", 1800),
            ("Traje entrenamiento niña", 1500),
        ],
    ),
    (
        "BERMUDAS",
        "BER",
        &[("Bermuda lycra", 1200), ("Jammer competencia", 2200)],
    ),
    ("GORROS", "GOR", &[("Gorro silicón", 800), ("Gorro tela", 500)]),
    ("LENTES", "LEN", &[("Lentes natación adulto", 1500), ("Lentes niño", 1000)]),
];

/// Size variants and price addon in cents
const SIZES: &[(&str, i64)] = &[("S", 0), ("M", 0), ("L", 200), ("XL", 400)];

const CLIENTS: &[(&str, &str, bool)] = &[
    ("María Pérez", "V-12345678", false),
    ("Club Delfines", "J-40123456-7", true),
    ("José Rodríguez", "V-20987654", false),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./siconi_dev.db");

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
                println!("SICONI Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./siconi_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("SICONI Seed Data Generator");
    println!("==========================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected, migrations applied");

    if !db.products().list(true, 1).await?.is_empty() {
        println!("⚠ Catalog is not empty, skipping seed.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    // Products
    let mut product_ids = Vec::new();
    let mut seed = 0usize;
    for (category_name, prefix, models) in CATALOG {
        let category_id = db.categories().get_by_name(category_name).await?.map(|c| c.id);

        for (model_idx, (model, base_price)) in models.iter().enumerate() {
            for (size, addon) in SIZES {
                seed += 1;
                let sale_price = base_price + addon;
                let product = NewProduct {
                    code: format!("{}-{:02}{}", prefix, model_idx + 1, size),
                    name: format!("{} {}", model, size),
                    category_id: category_id.clone(),
                    cost_price: Money::from_cents(sale_price * 55 / 100),
                    sale_price: Money::from_cents(sale_price),
                    initial_stock: (seed % 12) as i64,
                    min_stock: 3,
                    ..Default::default()
                };

                match db.products().insert(&product).await {
                    Ok(p) => product_ids.push(p.id),
                    Err(e) => eprintln!("Failed to insert {}: {}", product.code, e),
                }
            }
        }
    }
    println!("✓ {} products", product_ids.len());

    // Clients
    let mut client_ids = Vec::new();
    for (name, document, vip) in CLIENTS {
        let client = db
            .clients()
            .insert(&NewClient {
                name: name.to_string(),
                document_id: Some(document.to_string()),
                is_vip: *vip,
                ..Default::default()
            })
            .await?;
        client_ids.push(client.id);
    }
    println!("✓ {} clients", client_ids.len());

    // Orders, only against products that actually have stock
    let in_stock: Vec<String> = db
        .products()
        .list(false, 500)
        .await?
        .into_iter()
        .filter(|p| p.current_stock >= 2)
        .map(|p| p.id)
        .collect();

    if in_stock.len() >= 2 && client_ids.len() >= 2 {
        let store = db.store();

        let deposit = store
            .register_sale(&NewSale {
                client_id: Some(client_ids[0].clone()),
                lines: vec![SaleLineInput {
                    product_id: in_stock[0].clone(),
                    quantity: 2,
                    unit_price: None,
                }],
                amount_paid: Money::from_cents(1000),
                payment_method: PaymentMethod::PagoMovil,
                ..Default::default()
            })
            .await?;
        println!(
            "✓ {} with deposit, balance {}",
            deposit.sale.code,
            deposit.sale.balance_due()
        );

        let quote = store
            .register_sale(&NewSale {
                client_id: Some(client_ids[1].clone()),
                lines: vec![SaleLineInput {
                    product_id: in_stock[1].clone(),
                    quantity: 1,
                    unit_price: None,
                }],
                ..Default::default()
            })
            .await?;
        let paid = store
            .register_payment(&NewPayment {
                sale_id: quote.sale.id.clone(),
                amount: quote.sale.total(),
                method: PaymentMethod::Efectivo,
                reference: None,
                notes: None,
            })
            .await?;
        println!("✓ {} paid in full ({})", paid.sale.code, paid.sale.status);
    }

    println!();
    println!("✓ Seed complete!");

    Ok(())
}
