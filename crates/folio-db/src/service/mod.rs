//! # Inventory Operations
//!
//! The three request-level components. Each public method is one unit of
//! work: it validates, resolves catalog prices, then opens exactly one
//! transaction and commits it or drops it.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   OrderLifecycle        SaleProcessor        TransferCoordinator       │
//! │        │                      │                       │                 │
//! │        └──────────────┬───────┴───────────────────────┘                 │
//! │                       ▼                                                 │
//! │          CatalogRepository (before the transaction)                    │
//! │          StockLedger primitives (inside the transaction)               │
//! │                                                                         │
//! │   None of the three call each other.                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod orders;
pub mod sales;
pub mod transfer;

pub use orders::OrderLifecycle;
pub use sales::SaleProcessor;
pub use transfer::TransferCoordinator;
