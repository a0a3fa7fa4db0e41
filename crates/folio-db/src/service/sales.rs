//! # Sale Processor
//!
//! Point-of-sale checkout against one store's stock. A sale is final once
//! committed; there is no pending state and no compensation path.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::sale::{self, SaleRepository};
use crate::repository::stock::decrease_in;
use crate::repository::CatalogRepository;
use folio_core::validation::{validate_id, validate_lines};
use folio_core::{
    total_of, CoreError, LineRequest, MovementReason, Page, PageRequest, Sale, SaleQuery, StockKey,
};

/// Records store checkouts.
#[derive(Debug, Clone)]
pub struct SaleProcessor {
    pool: SqlitePool,
    catalog: CatalogRepository,
    sales: SaleRepository,
}

impl SaleProcessor {
    pub fn new(pool: SqlitePool) -> Self {
        SaleProcessor {
            catalog: CatalogRepository::new(pool.clone()),
            sales: SaleRepository::new(pool.clone()),
            pool,
        }
    }

    /// Deducts every line from the store and records the sale, or does
    /// nothing at all.
    pub async fn process_sale(&self, store_id: &str, lines: &[LineRequest]) -> DbResult<Sale> {
        validate_id("store_id", store_id)?;
        validate_lines(lines)?;

        let lines = self.catalog.price_lines(lines).await?;
        let sale = Sale {
            id: Uuid::new_v4().to_string(),
            store_id: store_id.to_string(),
            sold_at: Utc::now(),
            total_price_cents: total_of(&lines)?.cents(),
            lines,
        };

        let mut tx = self.pool.begin().await.map_err(DbError::transaction)?;

        for line in &sale.lines {
            let key = StockKey::store(store_id, &line.book_id);
            decrease_in(&mut *tx, &key, line.quantity, MovementReason::Sale, Some(&sale.id)).await?;
        }

        sale::insert_in(&mut *tx, &sale).await?;

        tx.commit().await.map_err(DbError::transaction)?;

        info!(
            sale_id = %sale.id,
            store_id = %sale.store_id,
            lines = sale.lines.len(),
            total = %sale.total_price(),
            "Sale processed"
        );

        Ok(sale)
    }

    /// Gets a sale or fails with `SaleNotFound`.
    pub async fn get(&self, sale_id: &str) -> DbResult<Sale> {
        self.sales
            .get(sale_id)
            .await?
            .ok_or_else(|| CoreError::SaleNotFound(sale_id.to_string()).into())
    }

    /// Sales matching the query, newest first.
    pub async fn find(&self, query: &SaleQuery, page: PageRequest) -> DbResult<Page<Sale>> {
        self.sales.find(query, page).await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
