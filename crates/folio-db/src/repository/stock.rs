//! # Stock Ledger
//!
//! The only writer of `stock_entries`. Every counter is keyed by
//! (location kind, location id, book id) and never drops below zero.
//!
//! ## Primitives
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  increase(key, n)                                                      │
//! │  └── INSERT .. ON CONFLICT DO UPDATE SET quantity = quantity + n       │
//! │      one statement: concurrent first-time increases never make two rows │
//! │                                                                         │
//! │  decrease(key, n)                                                      │
//! │  └── UPDATE .. SET quantity = quantity - n WHERE .. AND quantity >= n  │
//! │      │                                                                  │
//! │      ├── row returned ──► done                                         │
//! │      └── no row ──► SELECT quantity                                    │
//! │                     ├── absent  ──► LocationBookNotFound               │
//! │                     └── present ──► InsufficientStock                  │
//! │                                                                         │
//! │  Both append a stock_movements row on the same connection.            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The public `increase`/`decrease` run in a transaction of their own.
//! Orders, sales and transfers call `increase_in`/`decrease_in` on the
//! connection of the transaction they already hold.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use folio_core::validation::{validate_id, validate_key, validate_quantity};
use folio_core::{
    CoreError, LocationKind, MovementReason, Page, PageRequest, StockEntry, StockKey,
    StockMovement, ValidationError,
};

const ENTRY_COLUMNS: &str = "location_kind, location_id, book_id, quantity, updated_at";

const MOVEMENT_COLUMNS: &str = "id, location_kind, location_id, book_id, delta, quantity_after, \
                                reason, reference_id, created_at";

/// Per-location stock counters and their movement journal.
#[derive(Debug, Clone)]
pub struct StockLedger {
    pool: SqlitePool,
}

impl StockLedger {
    /// Creates a new StockLedger.
    pub fn new(pool: SqlitePool) -> Self {
        StockLedger { pool }
    }

    /// Adds `quantity` copies at `key`, creating the entry on first use.
    ///
    /// Recorded as a `Restock` movement.
    pub async fn increase(&self, key: &StockKey, quantity: i64) -> DbResult<StockEntry> {
        validate_key(key)?;
        validate_quantity(quantity)?;

        let mut tx = self.pool.begin().await.map_err(DbError::transaction)?;
        let entry = increase_in(&mut *tx, key, quantity, MovementReason::Restock, None).await?;
        tx.commit().await.map_err(DbError::transaction)?;

        Ok(entry)
    }

    /// Removes `quantity` copies at `key`. All or nothing.
    ///
    /// Recorded as an `AdjustmentOut` movement.
    pub async fn decrease(&self, key: &StockKey, quantity: i64) -> DbResult<StockEntry> {
        validate_key(key)?;
        validate_quantity(quantity)?;

        let mut tx = self.pool.begin().await.map_err(DbError::transaction)?;
        let entry = decrease_in(&mut *tx, key, quantity, MovementReason::AdjustmentOut, None).await?;
        tx.commit().await.map_err(DbError::transaction)?;

        Ok(entry)
    }

    /// Current quantity at `key`; 0 when no entry exists.
    pub async fn read(&self, key: &StockKey) -> DbResult<i64> {
        Ok(self.entry(key).await?.map_or(0, |entry| entry.quantity))
    }

    /// The entry at `key`, if one was ever created.
    pub async fn entry(&self, key: &StockKey) -> DbResult<Option<StockEntry>> {
        let sql = format!(
            "SELECT {ENTRY_COLUMNS} FROM stock_entries \
             WHERE location_kind = ?1 AND location_id = ?2 AND book_id = ?3"
        );
        let entry = sqlx::query_as::<_, StockEntry>(&sql)
            .bind(key.location_kind)
            .bind(&key.location_id)
            .bind(&key.book_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(entry)
    }

    /// All entries at one location, ordered by book id.
    pub async fn page(
        &self,
        location_kind: LocationKind,
        location_id: &str,
        page: PageRequest,
    ) -> DbResult<Page<StockEntry>> {
        validate_id("location_id", location_id)?;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM stock_entries WHERE location_kind = ?1 AND location_id = ?2",
        )
        .bind(location_kind)
        .bind(location_id)
        .fetch_one(&self.pool)
        .await?;

        let sql = format!(
            "SELECT {ENTRY_COLUMNS} FROM stock_entries \
             WHERE location_kind = ?1 AND location_id = ?2 \
             ORDER BY book_id LIMIT ?3 OFFSET ?4"
        );
        let entries = sqlx::query_as::<_, StockEntry>(&sql)
            .bind(location_kind)
            .bind(location_id)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok(Page::new(entries, page, total))
    }

    /// Journal of one counter, newest first.
    pub async fn movements(&self, key: &StockKey, page: PageRequest) -> DbResult<Page<StockMovement>> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM stock_movements \
             WHERE location_kind = ?1 AND location_id = ?2 AND book_id = ?3",
        )
        .bind(key.location_kind)
        .bind(&key.location_id)
        .bind(&key.book_id)
        .fetch_one(&self.pool)
        .await?;

        let sql = format!(
            "SELECT {MOVEMENT_COLUMNS} FROM stock_movements \
             WHERE location_kind = ?1 AND location_id = ?2 AND book_id = ?3 \
             ORDER BY rowid DESC LIMIT ?4 OFFSET ?5"
        );
        let movements = sqlx::query_as::<_, StockMovement>(&sql)
            .bind(key.location_kind)
            .bind(&key.location_id)
            .bind(&key.book_id)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok(Page::new(movements, page, total))
    }

    /// Every movement caused by one order, sale or transfer, in the order
    /// they were written.
    pub async fn movements_for(&self, reference_id: &str) -> DbResult<Vec<StockMovement>> {
        let sql = format!(
            "SELECT {MOVEMENT_COLUMNS} FROM stock_movements WHERE reference_id = ?1 ORDER BY rowid"
        );
        let movements = sqlx::query_as::<_, StockMovement>(&sql)
            .bind(reference_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(movements)
    }
}

// =============================================================================
// Transaction-scoped primitives
// =============================================================================

/// Upserts `quantity` onto `key` and journals it. Caller owns the transaction.
pub(crate) async fn increase_in(
    conn: &mut SqliteConnection,
    key: &StockKey,
    quantity: i64,
    reason: MovementReason,
    reference_id: Option<&str>,
) -> DbResult<StockEntry> {
    validate_quantity(quantity)?;

    let now = Utc::now();
    let sql = format!(
        r#"
        INSERT INTO stock_entries (location_kind, location_id, book_id, quantity, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5)
        ON CONFLICT (location_kind, location_id, book_id) DO UPDATE SET
            quantity = quantity + excluded.quantity,
            updated_at = excluded.updated_at
        WHERE stock_entries.quantity <= 9223372036854775807 - excluded.quantity
        RETURNING {ENTRY_COLUMNS}
        "#
    );
    let entry = sqlx::query_as::<_, StockEntry>(&sql)
        .bind(key.location_kind)
        .bind(&key.location_id)
        .bind(&key.book_id)
        .bind(quantity)
        .bind(now)
        .fetch_optional(&mut *conn)
        .await?;

    // No row back means the guard refused: the sum would not fit in i64.
    let Some(entry) = entry else {
        let current = current_quantity(conn, key).await?.unwrap_or(0);
        warn!(key = %key, current, requested = quantity, "Rejected stock increase past i64 range");
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: i64::MAX - current,
        }
        .into());
    };

    debug!(
        location_kind = %key.location_kind,
        location_id = %key.location_id,
        book_id = %key.book_id,
        quantity,
        quantity_after = entry.quantity,
        ?reason,
        "Stock increased"
    );

    record_movement(conn, key, quantity, entry.quantity, reason, reference_id, now).await?;

    Ok(entry)
}

/// Takes `quantity` off `key` if enough is there, and journals it. Caller
/// owns the transaction.
pub(crate) async fn decrease_in(
    conn: &mut SqliteConnection,
    key: &StockKey,
    quantity: i64,
    reason: MovementReason,
    reference_id: Option<&str>,
) -> DbResult<StockEntry> {
    validate_quantity(quantity)?;

    let now = Utc::now();
    let sql = format!(
        r#"
        UPDATE stock_entries SET
            quantity = quantity - ?4,
            updated_at = ?5
        WHERE location_kind = ?1 AND location_id = ?2 AND book_id = ?3
          AND quantity >= ?4
        RETURNING {ENTRY_COLUMNS}
        "#
    );
    let updated = sqlx::query_as::<_, StockEntry>(&sql)
        .bind(key.location_kind)
        .bind(&key.location_id)
        .bind(&key.book_id)
        .bind(quantity)
        .bind(now)
        .fetch_optional(&mut *conn)
        .await?;

    let Some(entry) = updated else {
        return Err(rejected_decrease(conn, key, quantity).await);
    };

    debug!(
        location_kind = %key.location_kind,
        location_id = %key.location_id,
        book_id = %key.book_id,
        quantity,
        quantity_after = entry.quantity,
        ?reason,
        "Stock decreased"
    );

    record_movement(conn, key, -quantity, entry.quantity, reason, reference_id, now).await?;

    Ok(entry)
}

/// Works out why the guarded update matched nothing.
async fn rejected_decrease(conn: &mut SqliteConnection, key: &StockKey, requested: i64) -> DbError {
    match current_quantity(conn, key).await {
        Ok(None) => {
            warn!(key = %key, "Decrease of untracked stock");
            key.not_found().into()
        }
        Ok(Some(available)) => {
            warn!(key = %key, available, requested, "Insufficient stock");
            CoreError::InsufficientStock {
                book_id: key.book_id.clone(),
                available,
                requested,
            }
            .into()
        }
        Err(err) => err,
    }
}

async fn current_quantity(conn: &mut SqliteConnection, key: &StockKey) -> DbResult<Option<i64>> {
    let quantity: Option<i64> = sqlx::query_scalar(
        "SELECT quantity FROM stock_entries \
         WHERE location_kind = ?1 AND location_id = ?2 AND book_id = ?3",
    )
    .bind(key.location_kind)
    .bind(&key.location_id)
    .bind(&key.book_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(quantity)
}

async fn record_movement(
    conn: &mut SqliteConnection,
    key: &StockKey,
    delta: i64,
    quantity_after: i64,
    reason: MovementReason,
    reference_id: Option<&str>,
    at: DateTime<Utc>,
) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO stock_movements (
            id, location_kind, location_id, book_id,
            delta, quantity_after, reason, reference_id, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(key.location_kind)
    .bind(&key.location_id)
    .bind(&key.book_id)
    .bind(delta)
    .bind(quantity_after)
    .bind(reason)
    .bind(reference_id)
    .bind(at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    async fn ledger() -> (Database, StockLedger) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let ledger = db.stock();
        (db, ledger)
    }

    #[tokio::test]
    async fn test_increase_creates_then_adds() {
        let (_db, ledger) = ledger().await;
        let key = StockKey::warehouse("w1", "dune");

        assert_eq!(ledger.read(&key).await.unwrap(), 0);
        assert!(ledger.entry(&key).await.unwrap().is_none());

        let entry = ledger.increase(&key, 4).await.unwrap();
        assert_eq!(entry.quantity, 4);
        assert_eq!(entry.key(), key);

        ledger.increase(&key, 6).await.unwrap();
        assert_eq!(ledger.read(&key).await.unwrap(), 10);
    }

    #[tokio::test]
    async fn test_non_positive_quantity_rejected() {
        let (_db, ledger) = ledger().await;
        let key = StockKey::store("s1", "dune");

        for quantity in [0, -1] {
            let err = ledger.increase(&key, quantity).await.unwrap_err();
            assert_eq!(err.domain(), Some(&CoreError::InvalidQuantity { quantity }));
            let err = ledger.decrease(&key, quantity).await.unwrap_err();
            assert_eq!(err.domain(), Some(&CoreError::InvalidQuantity { quantity }));
        }

        assert!(ledger.entry(&key).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_decrease_failures() {
        let (_db, ledger) = ledger().await;
        let key = StockKey::store("s1", "dune");

        let err = ledger.decrease(&key, 1).await.unwrap_err();
        assert_eq!(err.domain(), Some(&key.not_found()));

        ledger.increase(&key, 2).await.unwrap();
        let err = ledger.decrease(&key, 3).await.unwrap_err();
        assert_eq!(
            err.domain(),
            Some(&CoreError::InsufficientStock {
                book_id: "dune".to_string(),
                available: 2,
                requested: 3,
            })
        );
        assert_eq!(ledger.read(&key).await.unwrap(), 2);

        let entry = ledger.decrease(&key, 2).await.unwrap();
        assert_eq!(entry.quantity, 0);
        assert!(ledger.entry(&key).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_increase_past_i64_range_rejected() {
        let (_db, ledger) = ledger().await;
        let key = StockKey::warehouse("w1", "dune");
        ledger.increase(&key, i64::MAX - 1).await.unwrap();

        ledger.increase(&key, 1).await.unwrap();
        let err = ledger.increase(&key, 1).await.unwrap_err();
        assert_eq!(
            err.domain(),
            Some(&CoreError::Validation(ValidationError::OutOfRange {
                field: "quantity".to_string(),
                min: 1,
                max: 0,
            }))
        );

        assert_eq!(ledger.read(&key).await.unwrap(), i64::MAX);
        let journal = ledger.movements(&key, PageRequest::default()).await.unwrap();
        assert_eq!(journal.total, 2);
    }

    #[tokio::test]
    async fn test_increase_then_decrease_round_trip() {
        let (_db, ledger) = ledger().await;
        let key = StockKey::warehouse("w1", "dune");
        ledger.increase(&key, 7).await.unwrap();

        ledger.increase(&key, 5).await.unwrap();
        ledger.decrease(&key, 5).await.unwrap();

        assert_eq!(ledger.read(&key).await.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_page_by_location() {
        let (_db, ledger) = ledger().await;
        ledger.increase(&StockKey::store("s1", "c"), 1).await.unwrap();
        ledger.increase(&StockKey::store("s1", "a"), 2).await.unwrap();
        ledger.increase(&StockKey::store("s1", "b"), 3).await.unwrap();
        ledger.increase(&StockKey::store("s2", "a"), 9).await.unwrap();
        ledger.increase(&StockKey::warehouse("s1", "a"), 9).await.unwrap();

        let page = ledger
            .page(LocationKind::Store, "s1", PageRequest::new(0, 2).unwrap())
            .await
            .unwrap();
        assert_eq!(page.total, 3);
        let books: Vec<_> = page.items.iter().map(|e| e.book_id.as_str()).collect();
        assert_eq!(books, vec!["a", "b"]);

        let rest = ledger
            .page(LocationKind::Store, "s1", PageRequest::new(1, 2).unwrap())
            .await
            .unwrap();
        assert_eq!(rest.items.len(), 1);
        assert_eq!(rest.items[0].book_id, "c");
    }

    #[tokio::test]
    async fn test_movements_journal() {
        let (_db, ledger) = ledger().await;
        let key = StockKey::warehouse("w1", "dune");

        ledger.increase(&key, 5).await.unwrap();
        ledger.decrease(&key, 2).await.unwrap();
        // rejected: no journal row
        ledger.decrease(&key, 10).await.unwrap_err();

        let page = ledger.movements(&key, PageRequest::default()).await.unwrap();
        assert_eq!(page.total, 2);

        let newest = &page.items[0];
        assert_eq!(newest.delta, -2);
        assert_eq!(newest.quantity_after, 3);
        assert_eq!(newest.reason, MovementReason::AdjustmentOut);
        assert!(newest.reference_id.is_none());

        let oldest = &page.items[1];
        assert_eq!(oldest.delta, 5);
        assert_eq!(oldest.quantity_after, 5);
        assert_eq!(oldest.reason, MovementReason::Restock);
    }
}
