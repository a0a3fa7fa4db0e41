//! # Domain Types
//!
//! Core domain types used throughout Folio.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │      Book       │   │   StockEntry    │   │  StockMovement  │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │   │  location_kind  │   │  delta          │       │
//! │  │  title          │   │  location_id    │   │  quantity_after │       │
//! │  │  price_cents    │   │  book_id        │   │  reason         │       │
//! │  └─────────────────┘   │  quantity ≥ 0   │   └─────────────────┘       │
//! │                        └─────────────────┘                              │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │     Order       │   │      Sale       │   │    Transfer     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  warehouse_id   │   │  store_id       │   │  source         │       │
//! │  │  status         │   │  lines          │   │  destination    │       │
//! │  │  lines, total   │   │  total          │   │  quantity       │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Snapshot Pattern
//! Order and sale lines copy the catalog price at request time into
//! `unit_price_cents`. Later repricing never changes a stored total.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::validation::{validate_page_size, ValidationResult};
use crate::DEFAULT_PAGE_SIZE;

// =============================================================================
// Locations
// =============================================================================

/// Which kind of location holds a stock counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum LocationKind {
    /// Fulfillment source for orders.
    Warehouse,
    /// Retail store; source for point-of-sale checkouts.
    Store,
}

impl LocationKind {
    /// Stable lowercase name, matching the stored representation.
    pub const fn as_str(&self) -> &'static str {
        match self {
            LocationKind::Warehouse => "warehouse",
            LocationKind::Store => "store",
        }
    }
}

impl fmt::Display for LocationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of one ledger counter: (location kind, location id, book id).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StockKey {
    pub location_kind: LocationKind,
    pub location_id: String,
    pub book_id: String,
}

impl StockKey {
    pub fn new(
        location_kind: LocationKind,
        location_id: impl Into<String>,
        book_id: impl Into<String>,
    ) -> Self {
        StockKey {
            location_kind,
            location_id: location_id.into(),
            book_id: book_id.into(),
        }
    }

    /// Key for a book held at a warehouse.
    pub fn warehouse(warehouse_id: impl Into<String>, book_id: impl Into<String>) -> Self {
        StockKey::new(LocationKind::Warehouse, warehouse_id, book_id)
    }

    /// Key for a book held at a store.
    pub fn store(store_id: impl Into<String>, book_id: impl Into<String>) -> Self {
        StockKey::new(LocationKind::Store, store_id, book_id)
    }

    /// True when both keys point at the same physical location.
    pub fn same_location(&self, other: &StockKey) -> bool {
        self.location_kind == other.location_kind && self.location_id == other.location_id
    }

    /// Builds the `LocationBookNotFound` error for this key.
    pub fn not_found(&self) -> CoreError {
        CoreError::LocationBookNotFound {
            location_kind: self.location_kind,
            location_id: self.location_id.clone(),
            book_id: self.book_id.clone(),
        }
    }
}

impl fmt::Display for StockKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.location_kind, self.location_id, self.book_id)
    }
}

// =============================================================================
// Book
// =============================================================================

/// A catalog entry. The catalog is the only owner of book identity and price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Book {
    pub id: String,
    pub title: String,
    /// Reference to the author record (owned outside this core).
    pub author_id: String,
    /// Reference to the genre record (owned outside this core).
    pub genre_id: String,
    /// Unit price in cents, never negative.
    pub price_cents: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Book {
    /// Returns the unit price as Money.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }
}

/// Input for registering a book in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBook {
    pub title: String,
    pub author_id: String,
    pub genre_id: String,
    pub price: Money,
}

// =============================================================================
// Stock
// =============================================================================

/// The ledger's unit of truth: how many copies of a book a location holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StockEntry {
    pub location_kind: LocationKind,
    pub location_id: String,
    pub book_id: String,
    /// Always ≥ 0.
    pub quantity: i64,
    pub updated_at: DateTime<Utc>,
}

impl StockEntry {
    pub fn key(&self) -> StockKey {
        StockKey::new(self.location_kind, &self.location_id, &self.book_id)
    }
}

/// Why a ledger counter moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum MovementReason {
    /// Stock received at a location.
    Restock,
    /// Manual removal (shrinkage, damage, count correction).
    AdjustmentOut,
    /// Deducted from a warehouse when an order was created.
    OrderReserved,
    /// Returned to a warehouse when an order was canceled.
    OrderCanceled,
    /// Sold at a store.
    Sale,
    /// Left the source location of a transfer.
    TransferOut,
    /// Arrived at the destination location of a transfer.
    TransferIn,
}

/// One row of the append-only stock journal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StockMovement {
    pub id: String,
    pub location_kind: LocationKind,
    pub location_id: String,
    pub book_id: String,
    /// Signed change: positive for increases, negative for decreases.
    pub delta: i64,
    pub quantity_after: i64,
    pub reason: MovementReason,
    /// Order, sale or transfer id that caused the movement.
    pub reference_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Line Items
// =============================================================================

/// A requested (book, quantity) pair before prices are resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRequest {
    pub book_id: String,
    pub quantity: i64,
}

impl LineRequest {
    pub fn new(book_id: impl Into<String>, quantity: i64) -> Self {
        LineRequest {
            book_id: book_id.into(),
            quantity,
        }
    }
}

/// A priced line of an order or sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct LineItem {
    pub book_id: String,
    pub quantity: i64,
    /// Catalog price at request time (frozen).
    pub unit_price_cents: i64,
}

impl LineItem {
    pub fn new(book_id: impl Into<String>, quantity: i64, unit_price: Money) -> Self {
        LineItem {
            book_id: book_id.into(),
            quantity,
            unit_price_cents: unit_price.cents(),
        }
    }

    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// quantity × unit price snapshot.
    ///
    /// Fails with `OutOfRange` when the product does not fit in `i64` cents.
    pub fn line_total(&self) -> CoreResult<Money> {
        self.unit_price()
            .checked_multiply_quantity(self.quantity)
            .ok_or_else(total_out_of_range)
    }
}

/// Line of a warehouse order.
pub type OrderLine = LineItem;

/// Line of a store sale.
pub type SaleLine = LineItem;

/// Sums line totals. Computed once when an order or sale is created,
/// before any stock is touched.
pub fn total_of(lines: &[LineItem]) -> CoreResult<Money> {
    lines.iter().try_fold(Money::zero(), |total, line| {
        total
            .checked_add(line.line_total()?)
            .ok_or_else(total_out_of_range)
    })
}

fn total_out_of_range() -> CoreError {
    ValidationError::OutOfRange {
        field: "total_price".to_string(),
        min: 0,
        max: i64::MAX,
    }
    .into()
}

// =============================================================================
// Order
// =============================================================================

/// Lifecycle state of a warehouse order.
///
/// ```text
///            complete()
///   CREATED ───────────► COMPLETED
///      │
///      │ cancel()
///      ▼
///   CANCELED
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Stock already deducted from the warehouse; awaiting completion.
    Created,
    /// Terminal: fulfilled.
    Completed,
    /// Terminal: stock returned to the warehouse.
    Canceled,
}

impl OrderStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Created => "created",
            OrderStatus::Completed => "completed",
            OrderStatus::Canceled => "canceled",
        }
    }

    /// COMPLETED and CANCELED have no outgoing transitions.
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, OrderStatus::Created)
    }

    pub const fn can_transition_to(&self, next: OrderStatus) -> bool {
        matches!(
            (self, next),
            (OrderStatus::Created, OrderStatus::Completed)
                | (OrderStatus::Created, OrderStatus::Canceled)
        )
    }

    /// Checks a transition for `order_id`, returning the new status.
    pub fn transition(&self, order_id: &str, next: OrderStatus) -> CoreResult<OrderStatus> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(CoreError::InvalidOrderTransition {
                order_id: order_id.to_string(),
                from: *self,
                to: next,
            })
        }
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Created
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A warehouse-sourced order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub warehouse_id: String,
    pub ordered_at: DateTime<Utc>,
    pub status: OrderStatus,
    pub lines: Vec<OrderLine>,
    /// Σ line totals at creation; never recomputed.
    pub total_price_cents: i64,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    #[inline]
    pub fn total_price(&self) -> Money {
        Money::from_cents(self.total_price_cents)
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A point-of-sale checkout. Final on creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sale {
    pub id: String,
    pub store_id: String,
    pub sold_at: DateTime<Utc>,
    pub lines: Vec<SaleLine>,
    pub total_price_cents: i64,
}

impl Sale {
    #[inline]
    pub fn total_price(&self) -> Money {
        Money::from_cents(self.total_price_cents)
    }
}

// =============================================================================
// Transfer
// =============================================================================

/// Outcome of moving copies of one book between two locations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    /// Reference id stamped on both journal rows.
    pub id: String,
    pub source: StockKey,
    pub destination: StockKey,
    pub quantity: i64,
    pub source_quantity_after: i64,
    pub destination_quantity_after: i64,
    pub transferred_at: DateTime<Utc>,
}

// =============================================================================
// Paging & Filters
// =============================================================================

/// Zero-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    page: u32,
    size: u32,
}

impl PageRequest {
    /// Creates a page request, rejecting sizes outside `1..=MAX_PAGE_SIZE`.
    pub fn new(page: u32, size: u32) -> ValidationResult<Self> {
        validate_page_size(size)?;
        Ok(PageRequest { page, size })
    }

    /// First page of the given size.
    pub fn first(size: u32) -> ValidationResult<Self> {
        PageRequest::new(0, size)
    }

    #[inline]
    pub const fn page(&self) -> u32 {
        self.page
    }

    #[inline]
    pub const fn size(&self) -> u32 {
        self.size
    }

    /// SQL LIMIT value.
    #[inline]
    pub fn limit(&self) -> i64 {
        i64::from(self.size)
    }

    /// SQL OFFSET value.
    #[inline]
    pub fn offset(&self) -> i64 {
        i64::from(self.page) * i64::from(self.size)
    }

    /// The following page of the same size.
    pub fn next(&self) -> Self {
        PageRequest {
            page: self.page + 1,
            size: self.size,
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        PageRequest {
            page: 0,
            size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// One page of results plus the total match count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub size: u32,
    pub total: i64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, request: PageRequest, total: i64) -> Self {
        Page {
            items,
            page: request.page(),
            size: request.size(),
            total,
        }
    }

    pub fn total_pages(&self) -> i64 {
        if self.size == 0 {
            return 0;
        }
        let size = i64::from(self.size);
        (self.total + size - 1) / size
    }

    pub fn has_next(&self) -> bool {
        i64::from(self.page) + 1 < self.total_pages()
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            size: self.size,
            total: self.total,
        }
    }
}

/// Half-open UTC interval `[from, to)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    from: DateTime<Utc>,
    to: DateTime<Utc>,
}

impl DateRange {
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> ValidationResult<Self> {
        if from > to {
            return Err(ValidationError::InvertedRange {
                field: "date range".to_string(),
            });
        }
        Ok(DateRange { from, to })
    }

    #[inline]
    pub const fn start(&self) -> DateTime<Utc> {
        self.from
    }

    #[inline]
    pub const fn end(&self) -> DateTime<Utc> {
        self.to
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.from <= at && at < self.to
    }
}

/// Filters for order lookups. Unset fields do not filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderQuery {
    pub status: Option<OrderStatus>,
    pub warehouse_id: Option<String>,
    pub ordered: Option<DateRange>,
}

impl OrderQuery {
    pub fn by_status(status: OrderStatus) -> Self {
        OrderQuery {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn by_warehouse(warehouse_id: impl Into<String>) -> Self {
        OrderQuery {
            warehouse_id: Some(warehouse_id.into()),
            ..Default::default()
        }
    }

    pub fn ordered_within(range: DateRange) -> Self {
        OrderQuery {
            ordered: Some(range),
            ..Default::default()
        }
    }

    pub fn with_status(mut self, status: OrderStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_warehouse(mut self, warehouse_id: impl Into<String>) -> Self {
        self.warehouse_id = Some(warehouse_id.into());
        self
    }
}

/// Filters for sale lookups. Unset fields do not filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleQuery {
    pub store_id: Option<String>,
    pub sold: Option<DateRange>,
}

impl SaleQuery {
    pub fn by_store(store_id: impl Into<String>) -> Self {
        SaleQuery {
            store_id: Some(store_id.into()),
            sold: None,
        }
    }

    pub fn sold_within(range: DateRange) -> Self {
        SaleQuery {
            store_id: None,
            sold: Some(range),
        }
    }

    pub fn with_store(mut self, store_id: impl Into<String>) -> Self {
        self.store_id = Some(store_id.into());
        self
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_order_status_default() {
        assert_eq!(OrderStatus::default(), OrderStatus::Created);
    }

    #[test]
    fn test_order_transitions() {
        let created = OrderStatus::Created;
        assert_eq!(created.transition("o1", OrderStatus::Completed), Ok(OrderStatus::Completed));
        assert_eq!(created.transition("o1", OrderStatus::Canceled), Ok(OrderStatus::Canceled));
        assert!(!created.can_transition_to(OrderStatus::Created));

        for terminal in [OrderStatus::Completed, OrderStatus::Canceled] {
            assert!(terminal.is_terminal());
            for next in [OrderStatus::Created, OrderStatus::Completed, OrderStatus::Canceled] {
                let err = terminal.transition("o1", next).unwrap_err();
                assert_eq!(
                    err,
                    CoreError::InvalidOrderTransition {
                        order_id: "o1".to_string(),
                        from: terminal,
                        to: next,
                    }
                );
            }
        }
    }

    #[test]
    fn test_wire_names() {
        assert_eq!(serde_json::to_string(&OrderStatus::Canceled).unwrap(), "\"canceled\"");
        assert_eq!(serde_json::to_string(&LocationKind::Warehouse).unwrap(), "\"warehouse\"");
        assert_eq!(
            serde_json::to_string(&MovementReason::TransferOut).unwrap(),
            "\"transfer_out\""
        );
        assert_eq!(LocationKind::Store.to_string(), "store");
    }

    #[test]
    fn test_line_totals() {
        let lines = vec![
            LineItem::new("a", 5, Money::from_cents(1250)),
            LineItem::new("b", 2, Money::from_cents(999)),
        ];
        assert_eq!(lines[0].line_total().unwrap().cents(), 6250);
        assert_eq!(total_of(&lines).unwrap().cents(), 6250 + 1998);
        assert!(total_of(&[]).unwrap().is_zero());
    }

    #[test]
    fn test_line_totals_overflow() {
        let huge = LineItem::new("a", i64::MAX / 2, Money::from_cents(1250));
        assert!(matches!(
            huge.line_total(),
            Err(CoreError::Validation(ValidationError::OutOfRange { .. }))
        ));

        let lines = vec![
            LineItem::new("a", i64::MAX / 1000, Money::from_cents(600)),
            LineItem::new("b", i64::MAX / 1000, Money::from_cents(600)),
        ];
        assert!(lines[0].line_total().is_ok());
        assert!(matches!(
            total_of(&lines),
            Err(CoreError::Validation(ValidationError::OutOfRange { .. }))
        ));
    }

    #[test]
    fn test_stock_key() {
        let w = StockKey::warehouse("w1", "dune");
        let s = StockKey::store("w1", "dune");
        assert!(!w.same_location(&s));
        assert!(w.same_location(&StockKey::warehouse("w1", "other")));
        assert_eq!(w.to_string(), "warehouse/w1/dune");
        assert!(matches!(w.not_found(), CoreError::LocationBookNotFound { .. }));
    }

    #[test]
    fn test_page_request() {
        let req = PageRequest::new(2, 25).unwrap();
        assert_eq!(req.offset(), 50);
        assert_eq!(req.limit(), 25);
        assert_eq!(req.next().page(), 3);
        assert!(PageRequest::new(0, 0).is_err());
        assert!(PageRequest::new(0, crate::MAX_PAGE_SIZE + 1).is_err());
        assert_eq!(PageRequest::default().size(), DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn test_page_math() {
        let page = Page::new(vec![1, 2], PageRequest::new(0, 2).unwrap(), 5);
        assert_eq!(page.total_pages(), 3);
        assert!(page.has_next());

        let last = Page::new(vec![5], PageRequest::new(2, 2).unwrap(), 5).map(|n| n * 10);
        assert_eq!(last.items, vec![50]);
        assert!(!last.has_next());
    }

    #[test]
    fn test_date_range() {
        let now = Utc::now();
        let range = DateRange::new(now, now + Duration::hours(1)).unwrap();
        assert!(range.contains(now));
        assert!(!range.contains(now + Duration::hours(1)));
        assert!(DateRange::new(now, now - Duration::seconds(1)).is_err());
    }
}
