//! # folio-core: Pure Domain Model for the Folio Bookstore Backend
//!
//! This crate holds the inventory & fulfillment domain as plain types and
//! pure functions. Everything that touches SQLite lives in `folio-db`.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Folio Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │          Request handling layer (HTTP, auth, JSON)              │   │
//! │  │      create order / process sale / transfer stock / ...        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    folio-db (Storage Layer)                     │   │
//! │  │   StockLedger • OrderLifecycle • SaleProcessor • Transfers      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ folio-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │   error   │  │ validation│  │   │
//! │  │   │ StockEntry│  │   Money   │  │ CoreError │  │   rules   │  │   │
//! │  │   │ Order/Sale│  │           │  │           │  │           │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Book, StockEntry, Order, Sale, Transfer, paging)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`error`] - Domain error taxonomy
//! - [`validation`] - Input validation rules
//!
//! ## Example Usage
//!
//! ```rust
//! use folio_core::{LineItem, Money, OrderStatus};
//!
//! let line = LineItem::new("book-1", 5, Money::from_cents(1250));
//! assert_eq!(line.line_total().unwrap().cents(), 6250);
//!
//! assert!(OrderStatus::Created.can_transition_to(OrderStatus::Canceled));
//! assert!(!OrderStatus::Completed.can_transition_to(OrderStatus::Canceled));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum number of lines accepted in one order or sale request.
pub const MAX_LINES_PER_REQUEST: usize = 100;

/// Page size used when the caller does not ask for one.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Upper bound on a single page of results.
pub const MAX_PAGE_SIZE: u32 = 100;
