//! # Transfer Coordinator
//!
//! Moves copies of one book between two locations.
//!
//! ```text
//! BEGIN
//!   decrease(source)       TRANSFER_OUT   fails ──► ROLLBACK, nothing moved
//!   increase(destination)  TRANSFER_IN    fails ──► ROLLBACK, source restored
//! COMMIT
//! ```
//!
//! Both journal rows carry the transfer id as their reference.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::stock::{decrease_in, increase_in};
use crate::repository::CatalogRepository;
use folio_core::validation::{validate_quantity, validate_transfer_endpoints};
use folio_core::{LocationKind, MovementReason, StockKey, Transfer};

/// Moves stock between locations.
#[derive(Debug, Clone)]
pub struct TransferCoordinator {
    pool: SqlitePool,
    catalog: CatalogRepository,
}

impl TransferCoordinator {
    pub fn new(pool: SqlitePool) -> Self {
        TransferCoordinator {
            catalog: CatalogRepository::new(pool.clone()),
            pool,
        }
    }

    /// Moves `quantity` copies of `book_id` from one location to another.
    pub async fn transfer(
        &self,
        source_kind: LocationKind,
        source_id: &str,
        destination_kind: LocationKind,
        destination_id: &str,
        book_id: &str,
        quantity: i64,
    ) -> DbResult<Transfer> {
        let source = StockKey::new(source_kind, source_id, book_id);
        let destination = StockKey::new(destination_kind, destination_id, book_id);

        validate_quantity(quantity)?;
        validate_transfer_endpoints(&source, &destination)?;
        self.catalog.require(book_id).await?;

        let id = Uuid::new_v4().to_string();

        let mut tx = self.pool.begin().await.map_err(DbError::transaction)?;

        let source_entry = decrease_in(
            &mut *tx,
            &source,
            quantity,
            MovementReason::TransferOut,
            Some(&id),
        )
        .await?;
        let destination_entry = increase_in(
            &mut *tx,
            &destination,
            quantity,
            MovementReason::TransferIn,
            Some(&id),
        )
        .await?;

        tx.commit().await.map_err(DbError::transaction)?;

        info!(
            transfer_id = %id,
            source = %source,
            destination = %destination,
            quantity,
            "Stock transferred"
        );

        Ok(Transfer {
            id,
            source,
            destination,
            quantity,
            source_quantity_after: source_entry.quantity,
            destination_quantity_after: destination_entry.quantity,
            transferred_at: Utc::now(),
        })
    }

    /// Restocks a store from a warehouse.
    pub async fn warehouse_to_store(
        &self,
        warehouse_id: &str,
        store_id: &str,
        book_id: &str,
        quantity: i64,
    ) -> DbResult<Transfer> {
        self.transfer(
            LocationKind::Warehouse,
            warehouse_id,
            LocationKind::Store,
            store_id,
            book_id,
            quantity,
        )
        .await
    }

    /// Rebalances stock between two stores.
    pub async fn store_to_store(
        &self,
        from_store_id: &str,
        to_store_id: &str,
        book_id: &str,
        quantity: i64,
    ) -> DbResult<Transfer> {
        self.transfer(
            LocationKind::Store,
            from_store_id,
            LocationKind::Store,
            to_store_id,
            book_id,
            quantity,
        )
        .await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use folio_core::{CoreError, Money, NewBook, ValidationError};

    async fn setup() -> (Database, String) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let book = db
            .catalog()
            .register(&NewBook {
                title: "Solaris".to_string(),
                author_id: "lem".to_string(),
                genre_id: "scifi".to_string(),
                price: Money::from_cents(1100),
            })
            .await
            .unwrap();
        (db, book.id)
    }

    #[tokio::test]
    async fn test_warehouse_to_store() {
        let (db, book) = setup().await;
        let w = StockKey::warehouse("w1", &book);
        let s = StockKey::store("s1", &book);
        db.stock().increase(&w, 30).await.unwrap();
        db.stock().increase(&s, 2).await.unwrap();

        let transfer = db
            .transfers()
            .warehouse_to_store("w1", "s1", &book, 10)
            .await
            .unwrap();

        assert_eq!(transfer.source_quantity_after, 20);
        assert_eq!(transfer.destination_quantity_after, 12);
        assert_eq!(db.stock().read(&w).await.unwrap(), 20);
        assert_eq!(db.stock().read(&s).await.unwrap(), 12);

        let journal = db.stock().movements_for(&transfer.id).await.unwrap();
        let reasons: Vec<_> = journal.iter().map(|m| (m.reason, m.delta)).collect();
        assert_eq!(
            reasons,
            vec![(MovementReason::TransferOut, -10), (MovementReason::TransferIn, 10)]
        );
    }

    #[tokio::test]
    async fn test_store_to_store_creates_destination() {
        let (db, book) = setup().await;
        db.stock().increase(&StockKey::store("s1", &book), 4).await.unwrap();

        db.transfers().store_to_store("s1", "s2", &book, 4).await.unwrap();

        assert_eq!(db.stock().read(&StockKey::store("s1", &book)).await.unwrap(), 0);
        assert_eq!(db.stock().read(&StockKey::store("s2", &book)).await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_failed_source_moves_nothing() {
        let (db, book) = setup().await;
        let s = StockKey::store("s1", &book);
        db.stock().increase(&s, 3).await.unwrap();

        let err = db
            .transfers()
            .store_to_store("s1", "s2", &book, 5)
            .await
            .unwrap_err();
        assert!(matches!(err.domain(), Some(CoreError::InsufficientStock { .. })));

        let err = db
            .transfers()
            .warehouse_to_store("w-empty", "s2", &book, 1)
            .await
            .unwrap_err();
        assert!(matches!(err.domain(), Some(CoreError::LocationBookNotFound { .. })));

        assert_eq!(db.stock().read(&s).await.unwrap(), 3);
        assert!(db.stock().entry(&StockKey::store("s2", &book)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_rejected_requests() {
        let (db, book) = setup().await;
        db.stock().increase(&StockKey::store("s1", &book), 3).await.unwrap();

        let err = db
            .transfers()
            .store_to_store("s1", "s1", &book, 1)
            .await
            .unwrap_err();
        assert!(matches!(
            err.domain(),
            Some(CoreError::Validation(ValidationError::SameLocation { .. }))
        ));

        let err = db
            .transfers()
            .store_to_store("s1", "s2", &book, 0)
            .await
            .unwrap_err();
        assert_eq!(err.domain(), Some(&CoreError::InvalidQuantity { quantity: 0 }));

        let err = db
            .transfers()
            .store_to_store("s1", "s2", "ghost", 1)
            .await
            .unwrap_err();
        assert_eq!(err.domain(), Some(&CoreError::BookUnknown("ghost".to_string())));
    }
}
