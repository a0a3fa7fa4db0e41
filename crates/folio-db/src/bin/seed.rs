//! # Seed Data Generator
//!
//! Populates a database with books and stock for development.
//!
//! ## Usage
//! ```bash
//! # Seed the configured database (folio.toml / FOLIO_DB_PATH)
//! cargo run -p folio-db --bin seed
//!
//! # Explicit database and layout
//! cargo run -p folio-db --bin seed -- --db ./folio_dev.db --warehouses 2 --stores 4
//!
//! # Verbose
//! RUST_LOG=debug cargo run -p folio-db --bin seed
//! ```
//!
//! ## Generated Data
//! - One catalog entry per title below, prices $6.99 - $24.99
//! - Every warehouse restocked with 20 - 120 copies of every book
//! - Every store receives a share of the first warehouse's stock through
//!   ordinary warehouse-to-store transfers, so the movement journal looks
//!   like real traffic

use std::env;
use std::path::PathBuf;

use folio_core::{Money, NewBook, PageRequest, StockKey};
use folio_db::{Database, FolioConfig};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// (title, author id, genre id)
const TITLES: &[(&str, &str, &str)] = &[
    ("Dune", "frank-herbert", "science-fiction"),
    ("Children of Dune", "frank-herbert", "science-fiction"),
    ("The Left Hand of Darkness", "ursula-le-guin", "science-fiction"),
    ("A Wizard of Earthsea", "ursula-le-guin", "fantasy"),
    ("Solaris", "stanislaw-lem", "science-fiction"),
    ("Middlemarch", "george-eliot", "classics"),
    ("Emma", "jane-austen", "classics"),
    ("Persuasion", "jane-austen", "classics"),
    ("The Name of the Rose", "umberto-eco", "mystery"),
    ("The Big Sleep", "raymond-chandler", "mystery"),
    ("Beloved", "toni-morrison", "literary-fiction"),
    ("Invisible Cities", "italo-calvino", "literary-fiction"),
    ("The Remains of the Day", "kazuo-ishiguro", "literary-fiction"),
    ("Cosmos", "carl-sagan", "science"),
    ("The Selfish Gene", "richard-dawkins", "science"),
    ("A Brief History of Time", "stephen-hawking", "science"),
    ("Meditations", "marcus-aurelius", "philosophy"),
    ("The Hobbit", "jrr-tolkien", "fantasy"),
    ("Piranesi", "susanna-clarke", "fantasy"),
    ("Annihilation", "jeff-vandermeer", "science-fiction"),
];

#[derive(Debug)]
struct Options {
    config: Option<PathBuf>,
    db: Option<PathBuf>,
    warehouses: usize,
    stores: usize,
}

fn parse_args() -> Option<Options> {
    let args: Vec<String> = env::args().collect();
    let mut options = Options {
        config: None,
        db: None,
        warehouses: 1,
        stores: 3,
    };

    let mut i = 1;
    while i < args.len() {
        let value = args.get(i + 1);
        match args[i].as_str() {
            "--config" | "-c" => {
                options.config = value.map(PathBuf::from);
                i += 1;
            }
            "--db" | "-d" => {
                options.db = value.map(PathBuf::from);
                i += 1;
            }
            "--warehouses" | "-w" => {
                options.warehouses = value.and_then(|v| v.parse().ok()).unwrap_or(1).max(1);
                i += 1;
            }
            "--stores" | "-s" => {
                options.stores = value.and_then(|v| v.parse().ok()).unwrap_or(3);
                i += 1;
            }
            "--help" | "-h" => {
                println!("Folio Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --config <PATH>     Config file (default: platform config dir)");
                println!("  -d, --db <PATH>         Database file, overrides the config");
                println!("  -w, --warehouses <N>    Warehouses to stock (default: 1)");
                println!("  -s, --stores <N>        Stores to supply (default: 3)");
                println!("  -h, --help              Show this help message");
                return None;
            }
            other => warn!(arg = %other, "Ignoring unknown argument"),
        }
        i += 1;
    }

    Some(options)
}

fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let Some(options) = parse_args() else {
        return Ok(());
    };

    let mut config = FolioConfig::load(options.config.clone())?;
    if let Some(db) = &options.db {
        config.database.path = Some(db.clone());
    }
    init_tracing(&config.logging.filter);

    let db_config = config.db_config()?;
    println!("🌱 Folio Seed Data Generator");
    println!("============================");
    println!("Database:   {}", db_config.database_path.display());
    println!("Warehouses: {}", options.warehouses);
    println!("Stores:     {}", options.stores);
    println!();

    if let Some(parent) = db_config.database_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let db = Database::new(db_config).await?;
    println!("✓ Connected to database, migrations applied");

    let existing = db.catalog().list(PageRequest::first(1)?).await?.total;
    if existing > 0 {
        println!("⚠ Catalog already has {} books", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let start = std::time::Instant::now();
    let warehouses: Vec<String> = (1..=options.warehouses).map(|n| format!("wh-{n:02}")).collect();
    let stores: Vec<String> = (1..=options.stores).map(|n| format!("store-{n:02}")).collect();

    let mut books = Vec::with_capacity(TITLES.len());
    for (seed, (title, author_id, genre_id)) in TITLES.iter().enumerate() {
        let book = db
            .catalog()
            .register(&NewBook {
                title: title.to_string(),
                author_id: author_id.to_string(),
                genre_id: genre_id.to_string(),
                price: seed_price(seed),
            })
            .await?;
        books.push(book);
    }
    println!("✓ Registered {} books", books.len());

    let mut restocked = 0;
    for (w, warehouse) in warehouses.iter().enumerate() {
        for (seed, book) in books.iter().enumerate() {
            let copies = 20 + ((seed * 37 + w * 11) % 101) as i64;
            db.stock()
                .increase(&StockKey::warehouse(warehouse, &book.id), copies)
                .await?;
            restocked += copies;
        }
    }
    println!("✓ Restocked {} copies across {} warehouse(s)", restocked, warehouses.len());

    let mut transferred = 0;
    if let Some(source) = warehouses.first() {
        for (s, store) in stores.iter().enumerate() {
            for (seed, book) in books.iter().enumerate() {
                let copies = 1 + ((seed + s * 3) % 5) as i64;
                match db
                    .transfers()
                    .warehouse_to_store(source, store, &book.id, copies)
                    .await
                {
                    Ok(_) => transferred += copies,
                    Err(err) => warn!(store = %store, book_id = %book.id, error = %err, "Transfer skipped"),
                }
            }
        }
    }
    println!("✓ Transferred {} copies to {} store(s)", transferred, stores.len());

    let elapsed = start.elapsed();
    info!(books = books.len(), restocked, transferred, ?elapsed, "Seed complete");
    println!();
    println!("✓ Seed complete in {:?}", elapsed);

    db.close().await;
    Ok(())
}

/// $6.99 - $24.99, deterministic per title.
fn seed_price(seed: usize) -> Money {
    let dollars = 6 + ((seed * 7) % 19) as i64;
    Money::from_major_minor(dollars, 99)
}
