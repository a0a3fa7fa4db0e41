//! # Catalog Repository
//!
//! Book identity and price. Orders, sales and transfers resolve books here
//! before they open a transaction, so an unknown book fails with nothing
//! written.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use folio_core::validation::{validate_id, validate_new_book, validate_price};
use folio_core::{Book, CoreError, LineItem, LineRequest, Money, NewBook, Page, PageRequest};

const BOOK_COLUMNS: &str = "id, title, author_id, genre_id, price_cents, created_at, updated_at";

/// Repository for the `books` table.
#[derive(Debug, Clone)]
pub struct CatalogRepository {
    pool: SqlitePool,
}

impl CatalogRepository {
    /// Creates a new CatalogRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CatalogRepository { pool }
    }

    /// Registers a book and returns it with its generated id.
    pub async fn register(&self, book: &NewBook) -> DbResult<Book> {
        validate_new_book(book)?;

        let now = Utc::now();
        let book = Book {
            id: Uuid::new_v4().to_string(),
            title: book.title.trim().to_string(),
            author_id: book.author_id.clone(),
            genre_id: book.genre_id.clone(),
            price_cents: book.price.cents(),
            created_at: now,
            updated_at: now,
        };

        debug!(id = %book.id, title = %book.title, price = %book.price(), "Registering book");

        sqlx::query(
            r#"
            INSERT INTO books (id, title, author_id, genre_id, price_cents, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&book.id)
        .bind(&book.title)
        .bind(&book.author_id)
        .bind(&book.genre_id)
        .bind(book.price_cents)
        .bind(book.created_at)
        .bind(book.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(book)
    }

    /// Gets a book by ID.
    pub async fn get(&self, id: &str) -> DbResult<Option<Book>> {
        let sql = format!("SELECT {BOOK_COLUMNS} FROM books WHERE id = ?1");
        let book = sqlx::query_as::<_, Book>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(book)
    }

    /// Gets a book, failing with `BookUnknown` when absent.
    pub async fn require(&self, id: &str) -> DbResult<Book> {
        self.get(id)
            .await?
            .ok_or_else(|| CoreError::BookUnknown(id.to_string()).into())
    }

    /// Current unit price of a book.
    pub async fn price_of(&self, id: &str) -> DbResult<Money> {
        let cents: Option<i64> = sqlx::query_scalar("SELECT price_cents FROM books WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        cents
            .map(Money::from_cents)
            .ok_or_else(|| CoreError::BookUnknown(id.to_string()).into())
    }

    /// Prices every requested line at the current catalog price.
    ///
    /// Fails on the first unknown book. Line order is preserved.
    pub async fn price_lines(&self, lines: &[LineRequest]) -> DbResult<Vec<LineItem>> {
        let mut priced = Vec::with_capacity(lines.len());
        for line in lines {
            let price = self.price_of(&line.book_id).await?;
            priced.push(LineItem::new(&line.book_id, line.quantity, price));
        }
        Ok(priced)
    }

    /// Lists books ordered by title.
    pub async fn list(&self, page: PageRequest) -> DbResult<Page<Book>> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books")
            .fetch_one(&self.pool)
            .await?;

        let sql = format!("SELECT {BOOK_COLUMNS} FROM books ORDER BY title, id LIMIT ?1 OFFSET ?2");
        let books = sqlx::query_as::<_, Book>(&sql)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok(Page::new(books, page, total))
    }

    /// Changes the catalog price. Existing order and sale lines keep the
    /// price they were created with.
    pub async fn reprice(&self, id: &str, price: Money) -> DbResult<Book> {
        validate_id("book_id", id)?;
        validate_price(price)?;

        debug!(id = %id, price = %price, "Repricing book");

        let sql = format!(
            "UPDATE books SET price_cents = ?2, updated_at = ?3 WHERE id = ?1 RETURNING {BOOK_COLUMNS}"
        );
        let book = sqlx::query_as::<_, Book>(&sql)
            .bind(id)
            .bind(price.cents())
            .bind(Utc::now())
            .fetch_optional(&self.pool)
            .await?;

        book.ok_or_else(|| CoreError::BookUnknown(id.to_string()).into())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
