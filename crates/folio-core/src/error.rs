//! # Error Types
//!
//! Domain-specific error types for folio-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  folio-core errors (this file)                                         │
//! │  ├── CoreError        - Inventory / order / sale rule violations       │
//! │  └── ValidationError  - Input shape failures                           │
//! │                                                                         │
//! │  folio-db errors (separate crate)                                      │
//! │  └── DbError          - Storage failures + DbError::Domain(CoreError)  │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → request layer           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use crate::types::{LocationKind, OrderStatus};

// =============================================================================
// Core Error
// =============================================================================

/// Inventory and fulfillment rule violations.
///
/// Every failure the ledger, order lifecycle, sale processor or transfer
/// coordinator can report to a caller is one of these variants.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// A mutating call received a quantity that is zero or negative.
    #[error("Invalid quantity {quantity}: must be greater than zero")]
    InvalidQuantity { quantity: i64 },

    /// A decrease targeted a (location, book) pair that has never been stocked.
    #[error("No stock of book {book_id} at {location_kind} {location_id}")]
    LocationBookNotFound {
        location_kind: LocationKind,
        location_id: String,
        book_id: String,
    },

    /// Requested decrease exceeds the quantity on hand.
    ///
    /// ## User Workflow
    /// ```text
    /// Order 5 × "Dune" from warehouse W
    ///      │
    ///      ▼
    /// Warehouse W holds 3
    ///      │
    ///      ▼
    /// InsufficientStock { book_id: "dune", available: 3, requested: 5 }
    ///      │
    ///      ▼
    /// Whole order rolled back, nothing deducted
    /// ```
    #[error("Insufficient stock for book {book_id}: available {available}, requested {requested}")]
    InsufficientStock {
        book_id: String,
        available: i64,
        requested: i64,
    },

    /// The catalog cannot resolve a book id.
    #[error("Book unknown: {0}")]
    BookUnknown(String),

    /// Order id does not exist.
    #[error("Order not found: {0}")]
    OrderNotFound(String),

    /// Sale id does not exist.
    #[error("Sale not found: {0}")]
    SaleNotFound(String),

    /// Complete/cancel attempted on an order that already left CREATED.
    #[error("Order {order_id} is {from}, cannot move to {to}")]
    InvalidOrderTransition {
        order_id: String,
        from: OrderStatus,
        to: OrderStatus,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any storage access so a malformed request never opens a
/// transaction.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Range bounds are inverted.
    #[error("{field} start must not be after its end")]
    InvertedRange { field: String },

    /// Transfer source and destination are the same location.
    #[error("Cannot transfer from {location_kind} {location_id} to itself")]
    SameLocation {
        location_kind: LocationKind,
        location_id: String,
    },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            book_id: "dune".to_string(),
            available: 3,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for book dune: available 3, requested 5"
        );

        let err = CoreError::LocationBookNotFound {
            location_kind: LocationKind::Store,
            location_id: "s1".to_string(),
            book_id: "dune".to_string(),
        };
        assert_eq!(err.to_string(), "No stock of book dune at store s1");
    }

    #[test]
    fn test_transition_message() {
        let err = CoreError::InvalidOrderTransition {
            order_id: "o1".to_string(),
            from: OrderStatus::Completed,
            to: OrderStatus::Canceled,
        };
        assert_eq!(err.to_string(), "Order o1 is completed, cannot move to canceled");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "lines".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
        assert_eq!(core_err.to_string(), "Validation error: lines is required");
    }
}
