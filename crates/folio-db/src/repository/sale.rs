//! # Sale Repository
//!
//! Database operations for sales and sale lines.
//!
//! A sale is written once, inside the transaction that took the stock, and
//! never updated afterwards.
//!
//! ## Snapshot Pattern
//! Each line carries the catalog price at checkout. Repricing a book later
//! does not change stored sale totals.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use folio_core::{Page, PageRequest, Sale, SaleLine, SaleQuery};

/// Header row of `sales`, before lines are attached.
#[derive(Debug, FromRow)]
struct SaleRow {
    id: String,
    store_id: String,
    sold_at: DateTime<Utc>,
    total_price_cents: i64,
}

impl SaleRow {
    fn with_lines(self, lines: Vec<SaleLine>) -> Sale {
        Sale {
            id: self.id,
            store_id: self.store_id,
            sold_at: self.sold_at,
            lines,
            total_price_cents: self.total_price_cents,
        }
    }
}

/// Read access to stored sales.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Gets a sale by ID.
    pub async fn get(&self, id: &str) -> DbResult<Option<Sale>> {
        let row = sqlx::query_as::<_, SaleRow>(
            "SELECT id, store_id, sold_at, total_price_cents FROM sales WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let mut conn = self.pool.acquire().await?;
        let lines = lines_in(&mut *conn, &row.id).await?;
        Ok(Some(row.with_lines(lines)))
    }

    /// Sales matching every set filter, newest first.
    pub async fn find(&self, query: &SaleQuery, page: PageRequest) -> DbResult<Page<Sale>> {
        let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM sales WHERE 1 = 1");
        push_filters(&mut count, query);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::<Sqlite>::new(
            "SELECT id, store_id, sold_at, total_price_cents FROM sales WHERE 1 = 1",
        );
        push_filters(&mut select, query);
        select
            .push(" ORDER BY sold_at DESC, rowid DESC LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());

        let rows: Vec<SaleRow> = select.build_query_as().fetch_all(&self.pool).await?;

        debug!(?query, page = page.page(), matched = total, "Sale search");

        let mut conn = self.pool.acquire().await?;
        let mut sales = Vec::with_capacity(rows.len());
        for row in rows {
            let lines = lines_in(&mut *conn, &row.id).await?;
            sales.push(row.with_lines(lines));
        }

        Ok(Page::new(sales, page, total))
    }
}

fn push_filters(builder: &mut QueryBuilder<'_, Sqlite>, query: &SaleQuery) {
    if let Some(store_id) = &query.store_id {
        builder.push(" AND store_id = ").push_bind(store_id.clone());
    }
    if let Some(range) = query.sold {
        builder
            .push(" AND sold_at >= ")
            .push_bind(range.start())
            .push(" AND sold_at < ")
            .push_bind(range.end());
    }
}

// =============================================================================
// Transaction-scoped operations
// =============================================================================

/// Inserts the sale header and its lines.
pub(crate) async fn insert_in(conn: &mut SqliteConnection, sale: &Sale) -> DbResult<()> {
    debug!(id = %sale.id, store_id = %sale.store_id, total = %sale.total_price(), "Inserting sale");

    sqlx::query(
        "INSERT INTO sales (id, store_id, sold_at, total_price_cents) VALUES (?1, ?2, ?3, ?4)",
    )
    .bind(&sale.id)
    .bind(&sale.store_id)
    .bind(sale.sold_at)
    .bind(sale.total_price_cents)
    .execute(&mut *conn)
    .await?;

    for (line_no, line) in sale.lines.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO sale_lines (sale_id, line_no, book_id, quantity, unit_price_cents)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&sale.id)
        .bind(line_no as i64)
        .bind(&line.book_id)
        .bind(line.quantity)
        .bind(line.unit_price_cents)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

async fn lines_in(conn: &mut SqliteConnection, sale_id: &str) -> DbResult<Vec<SaleLine>> {
    let lines = sqlx::query_as::<_, SaleLine>(
        "SELECT book_id, quantity, unit_price_cents FROM sale_lines WHERE sale_id = ?1 ORDER BY line_no",
    )
    .bind(sale_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(lines)
}
