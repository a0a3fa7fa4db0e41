//! # folio-db: Storage and Inventory Operations for Folio
//!
//! SQLite storage (via sqlx) plus the operations that must be atomic
//! against it: the stock ledger, warehouse orders, store sales and
//! transfers between locations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Folio Data Flow                                  │
//! │                                                                         │
//! │  Request layer (outside this workspace)                                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     folio-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Services    │    │  Repositories │    │  Database    │  │   │
//! │  │   │  (service/)   │    │ (repository/) │    │  (pool.rs)   │  │   │
//! │  │   │               │    │               │    │              │  │   │
//! │  │   │ OrderLifecycle│───►│ StockLedger   │───►│ SqlitePool   │  │   │
//! │  │   │ SaleProcessor │    │ Catalog       │    │ Migrations   │  │   │
//! │  │   │ Transfers     │    │ Order / Sale  │    │ FolioConfig  │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database (WAL)                       │   │
//! │  │   ~/.local/share/folio/folio.db                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`config`] - File and environment configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Catalog, stock ledger, order and sale storage
//! - [`service`] - Order lifecycle, sale processing, transfers
//!
//! ## Usage
//!
//! ```rust,ignore
//! use folio_core::{LineRequest, StockKey};
//! use folio_db::{Database, FolioConfig};
//!
//! let config = FolioConfig::load(None)?;
//! let db = Database::new(config.db_config()?).await?;
//!
//! db.stock().increase(&StockKey::warehouse("w1", &book_id), 30).await?;
//! let order = db.orders().create("w1", &[LineRequest::new(&book_id, 5)]).await?;
//! db.orders().complete(&order.id).await?;
//! db.transfers().warehouse_to_store("w1", "s1", &book_id, 10).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod service;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::FolioConfig;
pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::{CatalogRepository, OrderRepository, SaleRepository, StockLedger};
pub use service::{OrderLifecycle, SaleProcessor, TransferCoordinator};
