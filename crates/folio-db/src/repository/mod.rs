//! # Repository Module
//!
//! SQL access for Folio, one repository per table family.
//!
//! ## Layering
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  service::{OrderLifecycle, SaleProcessor, TransferCoordinator}         │
//! │       │  owns the transaction                                          │
//! │       │  passes &mut SqliteConnection down                             │
//! │       ▼                                                                 │
//! │  stock::{increase_in, decrease_in}         (only writer of stock)      │
//! │  order::{insert_in, transition_in,                                     │
//! │          status_in, load_in}               (rows + lines)              │
//! │  sale::insert_in                                                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite                                                                │
//! │                                                                         │
//! │  CatalogRepository is read before the transaction opens.               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`CatalogRepository`] - Book registry and prices
//! - [`StockLedger`] - Stock counters and movement journal
//! - [`OrderRepository`] / [`SaleRepository`] - Stored orders and sales

pub mod catalog;
pub mod order;
pub mod sale;
pub mod stock;

pub use catalog::CatalogRepository;
pub use order::OrderRepository;
pub use sale::SaleRepository;
pub use stock::StockLedger;
