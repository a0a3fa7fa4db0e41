//! # Order Lifecycle
//!
//! Warehouse orders from creation to a terminal state.
//!
//! ## Stock Effects
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  create(W, lines)                                                      │
//! │  ├── validate lines, price every book (BookUnknown: nothing written)   │
//! │  └── BEGIN                                                             │
//! │      ├── decrease (warehouse, W, book) per line, in request order      │
//! │      │   any failure ──► ROLLBACK, no order                            │
//! │      ├── INSERT order + lines (CREATED)                                │
//! │      └── COMMIT                                                        │
//! │                                                                         │
//! │  complete(id)   CREATED ──► COMPLETED   stock untouched               │
//! │                                                                         │
//! │  cancel(id)     CREATED ──► CANCELED                                   │
//! │  └── increase (warehouse, W, book) per line, same transaction          │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::order::{self, OrderRepository};
use crate::repository::stock::{decrease_in, increase_in};
use crate::repository::CatalogRepository;
use folio_core::validation::{validate_id, validate_lines};
use folio_core::{
    total_of, CoreError, LineRequest, MovementReason, Order, OrderQuery, OrderStatus, Page,
    PageRequest, StockKey,
};

/// Creates, completes and cancels warehouse orders.
#[derive(Debug, Clone)]
pub struct OrderLifecycle {
    pool: SqlitePool,
    catalog: CatalogRepository,
    orders: OrderRepository,
}

impl OrderLifecycle {
    pub fn new(pool: SqlitePool) -> Self {
        OrderLifecycle {
            catalog: CatalogRepository::new(pool.clone()),
            orders: OrderRepository::new(pool.clone()),
            pool,
        }
    }

    /// Takes every line's quantity out of the warehouse and records the
    /// order as CREATED.
    ///
    /// Lines are priced at the current catalog price. Either every line is
    /// deducted and the order exists, or nothing changed.
    pub async fn create(&self, warehouse_id: &str, lines: &[LineRequest]) -> DbResult<Order> {
        validate_id("warehouse_id", warehouse_id)?;
        validate_lines(lines)?;

        let lines = self.catalog.price_lines(lines).await?;
        let now = Utc::now();
        let order = Order {
            id: Uuid::new_v4().to_string(),
            warehouse_id: warehouse_id.to_string(),
            ordered_at: now,
            status: OrderStatus::Created,
            total_price_cents: total_of(&lines)?.cents(),
            lines,
            updated_at: now,
        };

        let mut tx = self.pool.begin().await.map_err(DbError::transaction)?;

        for line in &order.lines {
            let key = StockKey::warehouse(warehouse_id, &line.book_id);
            decrease_in(
                &mut *tx,
                &key,
                line.quantity,
                MovementReason::OrderReserved,
                Some(&order.id),
            )
            .await?;
        }

        order::insert_in(&mut *tx, &order).await?;

        tx.commit().await.map_err(DbError::transaction)?;

        info!(
            order_id = %order.id,
            warehouse_id = %order.warehouse_id,
            lines = order.lines.len(),
            total = %order.total_price(),
            "Order created"
        );

        Ok(order)
    }

    /// CREATED → COMPLETED. Stock is not touched.
    pub async fn complete(&self, order_id: &str) -> DbResult<Order> {
        let mut tx = self.pool.begin().await.map_err(DbError::transaction)?;

        claim(&mut *tx, order_id, OrderStatus::Completed, Utc::now()).await?;
        let order = order::load_in(&mut *tx, order_id)
            .await?
            .ok_or_else(|| CoreError::OrderNotFound(order_id.to_string()))?;

        tx.commit().await.map_err(DbError::transaction)?;

        info!(order_id = %order.id, "Order completed");
        Ok(order)
    }

    /// CREATED → CANCELED, returning every line's quantity to the warehouse.
    pub async fn cancel(&self, order_id: &str) -> DbResult<Order> {
        let mut tx = self.pool.begin().await.map_err(DbError::transaction)?;

        claim(&mut *tx, order_id, OrderStatus::Canceled, Utc::now()).await?;
        let order = order::load_in(&mut *tx, order_id)
            .await?
            .ok_or_else(|| CoreError::OrderNotFound(order_id.to_string()))?;

        for line in &order.lines {
            let key = StockKey::warehouse(&order.warehouse_id, &line.book_id);
            increase_in(
                &mut *tx,
                &key,
                line.quantity,
                MovementReason::OrderCanceled,
                Some(&order.id),
            )
            .await?;
        }

        tx.commit().await.map_err(DbError::transaction)?;

        info!(
            order_id = %order.id,
            warehouse_id = %order.warehouse_id,
            lines = order.lines.len(),
            "Order canceled, stock returned"
        );
        Ok(order)
    }

    /// Gets an order or fails with `OrderNotFound`.
    pub async fn get(&self, order_id: &str) -> DbResult<Order> {
        self.orders
            .get(order_id)
            .await?
            .ok_or_else(|| CoreError::OrderNotFound(order_id.to_string()).into())
    }

    /// Orders matching the query, newest first.
    pub async fn find(&self, query: &OrderQuery, page: PageRequest) -> DbResult<Page<Order>> {
        self.orders.find(query, page).await
    }
}

/// Wins the CREATED → `to` transition or reports why it could not.
async fn claim(
    conn: &mut SqliteConnection,
    order_id: &str,
    to: OrderStatus,
    at: DateTime<Utc>,
) -> DbResult<()> {
    if order::transition_in(conn, order_id, to, at).await? {
        return Ok(());
    }

    match order::status_in(conn, order_id).await? {
        None => Err(CoreError::OrderNotFound(order_id.to_string()).into()),
        Some(current) => {
            warn!(order_id = %order_id, from = %current, to = %to, "Rejected order transition");
            current.transition(order_id, to)?;
            // Unreachable while this transaction holds the write lock.
            Err(DbError::Internal(format!(
                "order {order_id} is {current} but the guarded update matched nothing"
            )))
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use folio_core::{Money, NewBook, ValidationError};

    async fn setup() -> (Database, String, String) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut ids = Vec::new();
        for (title, cents) in [("Dune", 1250), ("Emma", 800)] {
            let book = db
                .catalog()
                .register(&NewBook {
                    title: title.to_string(),
                    author_id: "author".to_string(),
                    genre_id: "genre".to_string(),
                    price: Money::from_cents(cents),
                })
                .await
                .unwrap();
            ids.push(book.id);
        }
        let emma = ids.pop().unwrap();
        let dune = ids.pop().unwrap();
        (db, dune, emma)
    }

    #[tokio::test]
    async fn test_create_deducts_and_prices() {
        let (db, dune, _) = setup().await;
        let key = StockKey::warehouse("w1", &dune);
        db.stock().increase(&key, 5).await.unwrap();

        let order = db
            .orders()
            .create("w1", &[LineRequest::new(&dune, 5)])
            .await
            .unwrap();

        assert_eq!(order.status, OrderStatus::Created);
        assert_eq!(order.total_price_cents, 5 * 1250);
        assert_eq!(order.lines[0].unit_price_cents, 1250);
        assert_eq!(db.stock().read(&key).await.unwrap(), 0);

        let stored = db.orders().get(&order.id).await.unwrap();
        assert_eq!(stored.lines, order.lines);
        assert_eq!(stored.total_price_cents, order.total_price_cents);
    }

    #[tokio::test]
    async fn test_create_rolls_back_earlier_lines() {
        let (db, dune, emma) = setup().await;
        let dune_key = StockKey::warehouse("w1", &dune);
        let emma_key = StockKey::warehouse("w1", &emma);
        db.stock().increase(&dune_key, 10).await.unwrap();
        db.stock().increase(&emma_key, 1).await.unwrap();

        let err = db
            .orders()
            .create("w1", &[LineRequest::new(&dune, 4), LineRequest::new(&emma, 2)])
            .await
            .unwrap_err();

        assert!(matches!(err.domain(), Some(CoreError::InsufficientStock { .. })));
        assert_eq!(db.stock().read(&dune_key).await.unwrap(), 10);
        assert_eq!(db.stock().read(&emma_key).await.unwrap(), 1);

        let page = db
            .orders()
            .find(&OrderQuery::default(), PageRequest::default())
            .await
            .unwrap();
        assert_eq!(page.total, 0);
    }

    #[tokio::test]
    async fn test_create_rejects_bad_input_before_writing() {
        let (db, dune, _) = setup().await;
        let key = StockKey::warehouse("w1", &dune);
        db.stock().increase(&key, 3).await.unwrap();

        let err = db.orders().create("w1", &[]).await.unwrap_err();
        assert!(matches!(err.domain(), Some(CoreError::Validation(_))));

        let err = db
            .orders()
            .create("w1", &[LineRequest::new(&dune, 0)])
            .await
            .unwrap_err();
        assert_eq!(err.domain(), Some(&CoreError::InvalidQuantity { quantity: 0 }));

        let err = db
            .orders()
            .create("w1", &[LineRequest::new(&dune, 1), LineRequest::new("ghost", 1)])
            .await
            .unwrap_err();
        assert_eq!(err.domain(), Some(&CoreError::BookUnknown("ghost".to_string())));

        assert_eq!(db.stock().read(&key).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_create_rejects_unrepresentable_total() {
        let (db, dune, _) = setup().await;
        let key = StockKey::warehouse("w1", &dune);
        db.stock().increase(&key, 5).await.unwrap();

        let err = db
            .orders()
            .create("w1", &[LineRequest::new(&dune, i64::MAX / 2)])
            .await
            .unwrap_err();

        assert!(matches!(
            err.domain(),
            Some(CoreError::Validation(ValidationError::OutOfRange { .. }))
        ));
        assert_eq!(db.stock().read(&key).await.unwrap(), 5);
        assert_eq!(db.stock().movements(&key, PageRequest::default()).await.unwrap().total, 1);
    }

    #[tokio::test]
    async fn test_untracked_warehouse_stock() {
        let (db, dune, _) = setup().await;
        let err = db
            .orders()
            .create("w9", &[LineRequest::new(&dune, 1)])
            .await
            .unwrap_err();
        assert_eq!(err.domain(), Some(&StockKey::warehouse("w9", &dune).not_found()));
    }

    #[tokio::test]
    async fn test_complete_then_no_further_transitions() {
        let (db, dune, _) = setup().await;
        let key = StockKey::warehouse("w1", &dune);
        db.stock().increase(&key, 5).await.unwrap();
        let order = db
            .orders()
            .create("w1", &[LineRequest::new(&dune, 2)])
            .await
            .unwrap();

        let completed = db.orders().complete(&order.id).await.unwrap();
        assert_eq!(completed.status, OrderStatus::Completed);
        assert_eq!(db.stock().read(&key).await.unwrap(), 3);

        for result in [
            db.orders().complete(&order.id).await,
            db.orders().cancel(&order.id).await,
        ] {
            assert!(matches!(
                result.unwrap_err().domain(),
                Some(CoreError::InvalidOrderTransition {
                    from: OrderStatus::Completed,
                    ..
                })
            ));
        }
        assert_eq!(db.stock().read(&key).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_cancel_returns_stock_once() {
        let (db, dune, _) = setup().await;
        let key = StockKey::warehouse("w1", &dune);
        db.stock().increase(&key, 5).await.unwrap();
        let order = db
            .orders()
            .create("w1", &[LineRequest::new(&dune, 5)])
            .await
            .unwrap();
        assert_eq!(db.stock().read(&key).await.unwrap(), 0);

        let canceled = db.orders().cancel(&order.id).await.unwrap();
        assert_eq!(canceled.status, OrderStatus::Canceled);
        assert_eq!(db.stock().read(&key).await.unwrap(), 5);

        let err = db.orders().cancel(&order.id).await.unwrap_err();
        assert_eq!(
            err.domain(),
            Some(&CoreError::InvalidOrderTransition {
                order_id: order.id.clone(),
                from: OrderStatus::Canceled,
                to: OrderStatus::Canceled,
            })
        );
        assert_eq!(db.stock().read(&key).await.unwrap(), 5);

        let err = db.orders().complete(&order.id).await.unwrap_err();
        assert!(matches!(err.domain(), Some(CoreError::InvalidOrderTransition { .. })));
    }

    #[tokio::test]
    async fn test_unknown_order() {
        let (db, _, _) = setup().await;
        for err in [
            db.orders().get("nope").await.unwrap_err(),
            db.orders().complete("nope").await.unwrap_err(),
            db.orders().cancel("nope").await.unwrap_err(),
        ] {
            assert_eq!(err.domain(), Some(&CoreError::OrderNotFound("nope".to_string())));
        }
    }
}
