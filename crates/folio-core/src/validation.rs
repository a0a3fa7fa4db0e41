//! # Validation Module
//!
//! Input validation for Folio requests.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Request layer (outside this workspace)                       │
//! │  └── Shape / type checks on incoming payloads                          │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── quantities > 0, ids present, line count bounded                   │
//! │  └── runs before any transaction is opened                             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK (quantity >= 0)                                             │
//! │  └── UNIQUE (location_kind, location_id, book_id)                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use folio_core::validation::{validate_lines, validate_quantity};
//! use folio_core::LineRequest;
//!
//! validate_quantity(5).unwrap();
//! validate_lines(&[LineRequest::new("dune", 2)]).unwrap();
//! assert!(validate_lines(&[]).is_err());
//! ```

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{LineRequest, NewBook, StockKey};
use crate::{MAX_LINES_PER_REQUEST, MAX_PAGE_SIZE};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

const MAX_TITLE_LEN: usize = 200;

// =============================================================================
// Identifier Validators
// =============================================================================

/// Rejects empty or whitespace-only identifiers.
///
/// ```rust
/// use folio_core::validation::validate_id;
///
/// assert!(validate_id("warehouse_id", "w-1").is_ok());
/// assert!(validate_id("warehouse_id", "  ").is_err());
/// ```
pub fn validate_id(field: &str, value: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    Ok(())
}

/// Validates every identifier of a ledger key.
pub fn validate_key(key: &StockKey) -> ValidationResult<()> {
    validate_id("location_id", &key.location_id)?;
    validate_id("book_id", &key.book_id)
}

// =============================================================================
// Quantity Validators
// =============================================================================

/// Validates a quantity passed to a mutating call.
///
/// ## Rules
/// - Must be strictly positive, otherwise `CoreError::InvalidQuantity`
///
/// ```text
/// increase(W, "dune", 0)
///      │
///      ▼
/// validate_quantity(0) ← THIS FUNCTION
///      │
///      └── InvalidQuantity { quantity: 0 }, no transaction opened
/// ```
pub fn validate_quantity(quantity: i64) -> CoreResult<()> {
    if quantity <= 0 {
        return Err(CoreError::InvalidQuantity { quantity });
    }

    Ok(())
}

/// Validates the lines of an order or sale request.
///
/// ## Rules
/// - At least one line, at most `MAX_LINES_PER_REQUEST`
/// - Every line names a book and has a positive quantity
///
/// Repeated book ids are accepted; each line is applied in order.
pub fn validate_lines(lines: &[LineRequest]) -> CoreResult<()> {
    if lines.is_empty() {
        return Err(ValidationError::Required {
            field: "lines".to_string(),
        }
        .into());
    }

    if lines.len() > MAX_LINES_PER_REQUEST {
        return Err(ValidationError::OutOfRange {
            field: "lines".to_string(),
            min: 1,
            max: MAX_LINES_PER_REQUEST as i64,
        }
        .into());
    }

    for line in lines {
        validate_id("book_id", &line.book_id)?;
        validate_quantity(line.quantity)?;
    }

    Ok(())
}

// =============================================================================
// Catalog Validators
// =============================================================================

/// Validates a catalog price.
///
/// ## Rules
/// - Must be non-negative; zero is allowed (giveaways)
pub fn validate_price(price: Money) -> ValidationResult<()> {
    if price.is_negative() {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a book registration.
pub fn validate_new_book(book: &NewBook) -> ValidationResult<()> {
    let title = book.title.trim();
    if title.is_empty() {
        return Err(ValidationError::Required {
            field: "title".to_string(),
        });
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(ValidationError::TooLong {
            field: "title".to_string(),
            max: MAX_TITLE_LEN,
        });
    }

    validate_id("author_id", &book.author_id)?;
    validate_id("genre_id", &book.genre_id)?;
    validate_price(book.price)
}

// =============================================================================
// Transfer & Paging Validators
// =============================================================================

/// A transfer must move stock between two distinct locations.
pub fn validate_transfer_endpoints(source: &StockKey, destination: &StockKey) -> ValidationResult<()> {
    validate_key(source)?;
    validate_key(destination)?;

    if source.same_location(destination) {
        return Err(ValidationError::SameLocation {
            location_kind: source.location_kind,
            location_id: source.location_id.clone(),
        });
    }

    Ok(())
}

/// Page size must be within `1..=MAX_PAGE_SIZE`.
pub fn validate_page_size(size: u32) -> ValidationResult<()> {
    if size == 0 || size > MAX_PAGE_SIZE {
        return Err(ValidationError::OutOfRange {
            field: "page size".to_string(),
            min: 1,
            max: i64::from(MAX_PAGE_SIZE),
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(10_000).is_ok());

        assert_eq!(validate_quantity(0), Err(CoreError::InvalidQuantity { quantity: 0 }));
        assert_eq!(validate_quantity(-3), Err(CoreError::InvalidQuantity { quantity: -3 }));
    }

    #[test]
    fn test_validate_lines() {
        assert!(validate_lines(&[LineRequest::new("a", 1), LineRequest::new("a", 2)]).is_ok());

        assert!(matches!(
            validate_lines(&[]),
            Err(CoreError::Validation(ValidationError::Required { .. }))
        ));
        assert_eq!(
            validate_lines(&[LineRequest::new("a", 1), LineRequest::new("b", 0)]),
            Err(CoreError::InvalidQuantity { quantity: 0 })
        );
        assert!(matches!(
            validate_lines(&[LineRequest::new(" ", 1)]),
            Err(CoreError::Validation(ValidationError::Required { .. }))
        ));

        let too_many: Vec<_> = (0..=MAX_LINES_PER_REQUEST)
            .map(|i| LineRequest::new(format!("b{i}"), 1))
            .collect();
        assert!(matches!(
            validate_lines(&too_many),
            Err(CoreError::Validation(ValidationError::OutOfRange { .. }))
        ));
    }

    #[test]
    fn test_validate_new_book() {
        let book = NewBook {
            title: "Dune".to_string(),
            author_id: "herbert".to_string(),
            genre_id: "scifi".to_string(),
            price: Money::from_cents(1499),
        };
        assert!(validate_new_book(&book).is_ok());

        let free = NewBook {
            price: Money::zero(),
            ..book.clone()
        };
        assert!(validate_new_book(&free).is_ok());

        let negative = NewBook {
            price: Money::from_cents(-1),
            ..book.clone()
        };
        assert!(validate_new_book(&negative).is_err());

        let untitled = NewBook {
            title: "   ".to_string(),
            ..book.clone()
        };
        assert!(validate_new_book(&untitled).is_err());

        let long = NewBook {
            title: "A".repeat(MAX_TITLE_LEN + 1),
            ..book
        };
        assert!(validate_new_book(&long).is_err());
    }

    #[test]
    fn test_validate_transfer_endpoints() {
        let w = StockKey::warehouse("w1", "dune");
        let s = StockKey::store("s1", "dune");
        assert!(validate_transfer_endpoints(&w, &s).is_ok());
        assert!(validate_transfer_endpoints(&s, &StockKey::store("s2", "dune")).is_ok());

        assert!(matches!(
            validate_transfer_endpoints(&s, &s.clone()),
            Err(ValidationError::SameLocation { .. })
        ));
        assert!(validate_transfer_endpoints(&StockKey::store("", "dune"), &s).is_err());
    }

    #[test]
    fn test_validate_page_size() {
        assert!(validate_page_size(1).is_ok());
        assert!(validate_page_size(MAX_PAGE_SIZE).is_ok());
        assert!(validate_page_size(0).is_err());
        assert!(validate_page_size(MAX_PAGE_SIZE + 1).is_err());
    }
}
