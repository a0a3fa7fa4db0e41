//! # Order Repository
//!
//! Row-level persistence for orders and their lines. Status changes and
//! inserts take the caller's transaction; stock is never touched here.
//!
//! ## Guarded Transition
//! ```text
//! UPDATE orders SET status = 'completed' WHERE id = ? AND status = 'created'
//!      │
//!      ├── 1 row  ──► this caller won the transition
//!      └── 0 rows ──► order missing, or already terminal (caller reads why)
//! ```

use chrono::{DateTime, Utc};
use sqlx::{FromRow, QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use folio_core::{Order, OrderLine, OrderQuery, OrderStatus, Page, PageRequest};

const ORDER_COLUMNS: &str = "id, warehouse_id, ordered_at, status, total_price_cents, updated_at";

/// Header row of `orders`, before lines are attached.
#[derive(Debug, FromRow)]
struct OrderRow {
    id: String,
    warehouse_id: String,
    ordered_at: DateTime<Utc>,
    status: OrderStatus,
    total_price_cents: i64,
    updated_at: DateTime<Utc>,
}

impl OrderRow {
    fn with_lines(self, lines: Vec<OrderLine>) -> Order {
        Order {
            id: self.id,
            warehouse_id: self.warehouse_id,
            ordered_at: self.ordered_at,
            status: self.status,
            lines,
            total_price_cents: self.total_price_cents,
            updated_at: self.updated_at,
        }
    }
}

/// Read access to stored orders.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Gets an order with its lines.
    pub async fn get(&self, id: &str) -> DbResult<Option<Order>> {
        let mut conn = self.pool.acquire().await?;
        load_in(&mut *conn, id).await
    }

    /// Orders matching every set filter, newest first.
    pub async fn find(&self, query: &OrderQuery, page: PageRequest) -> DbResult<Page<Order>> {
        let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM orders WHERE 1 = 1");
        push_filters(&mut count, query);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE 1 = 1"
        ));
        push_filters(&mut select, query);
        select
            .push(" ORDER BY ordered_at DESC, rowid DESC LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());

        let rows: Vec<OrderRow> = select.build_query_as().fetch_all(&self.pool).await?;

        debug!(?query, page = page.page(), matched = total, "Order search");

        let mut conn = self.pool.acquire().await?;
        let mut orders = Vec::with_capacity(rows.len());
        for row in rows {
            let lines = lines_in(&mut *conn, &row.id).await?;
            orders.push(row.with_lines(lines));
        }

        Ok(Page::new(orders, page, total))
    }
}

fn push_filters(builder: &mut QueryBuilder<'_, Sqlite>, query: &OrderQuery) {
    if let Some(status) = query.status {
        builder.push(" AND status = ").push_bind(status);
    }
    if let Some(warehouse_id) = &query.warehouse_id {
        builder.push(" AND warehouse_id = ").push_bind(warehouse_id.clone());
    }
    if let Some(range) = query.ordered {
        builder
            .push(" AND ordered_at >= ")
            .push_bind(range.start())
            .push(" AND ordered_at < ")
            .push_bind(range.end());
    }
}

// =============================================================================
// Transaction-scoped operations
// =============================================================================

/// Inserts the order header and its lines.
pub(crate) async fn insert_in(conn: &mut SqliteConnection, order: &Order) -> DbResult<()> {
    debug!(id = %order.id, warehouse_id = %order.warehouse_id, lines = order.lines.len(), "Inserting order");

    sqlx::query(
        r#"
        INSERT INTO orders (id, warehouse_id, ordered_at, status, total_price_cents, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
    )
    .bind(&order.id)
    .bind(&order.warehouse_id)
    .bind(order.ordered_at)
    .bind(order.status)
    .bind(order.total_price_cents)
    .bind(order.updated_at)
    .execute(&mut *conn)
    .await?;

    for (line_no, line) in order.lines.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO order_lines (order_id, line_no, book_id, quantity, unit_price_cents)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&order.id)
        .bind(line_no as i64)
        .bind(&line.book_id)
        .bind(line.quantity)
        .bind(line.unit_price_cents)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

/// Moves a CREATED order to `to`. Returns false when no CREATED order with
/// that id exists.
pub(crate) async fn transition_in(
    conn: &mut SqliteConnection,
    id: &str,
    to: OrderStatus,
    at: DateTime<Utc>,
) -> DbResult<bool> {
    let result = sqlx::query(
        "UPDATE orders SET status = ?2, updated_at = ?3 WHERE id = ?1 AND status = 'created'",
    )
    .bind(id)
    .bind(to)
    .bind(at)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Current status of an order, if it exists.
pub(crate) async fn status_in(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<OrderStatus>> {
    let status = sqlx::query_scalar("SELECT status FROM orders WHERE id = ?1")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(status)
}

/// Loads an order with its lines.
pub(crate) async fn load_in(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Order>> {
    let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?1");
    let row = sqlx::query_as::<_, OrderRow>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    match row {
        Some(row) => {
            let lines = lines_in(conn, &row.id).await?;
            Ok(Some(row.with_lines(lines)))
        }
        None => Ok(None),
    }
}

/// Lines of an order in request order.
pub(crate) async fn lines_in(conn: &mut SqliteConnection, order_id: &str) -> DbResult<Vec<OrderLine>> {
    let lines = sqlx::query_as::<_, OrderLine>(
        "SELECT book_id, quantity, unit_price_cents FROM order_lines WHERE order_id = ?1 ORDER BY line_no",
    )
    .bind(order_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(lines)
}
