//! Book Repository

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use super::{map_constraint_violation, RepositoryError, RepositoryResult};
use crate::models::{Book, NewBook};

/// Persistence operations for catalog entries
#[async_trait]
pub trait BookRepository: Send + Sync {
    /// All books ordered by title
    async fn list(&self) -> RepositoryResult<Vec<Book>>;

    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<Book>>;

    /// Insert a book; `Duplicate("isbn")` when the ISBN is taken
    async fn create(&self, book: NewBook) -> RepositoryResult<Book>;

    /// Overwrite every mutable column of an existing book
    async fn update(&self, book: Book) -> RepositoryResult<Book>;

    async fn delete_by_id(&self, id: Uuid) -> RepositoryResult<bool>;
}

/// PostgreSQL-backed book repository
#[derive(Clone)]
pub struct PgBookRepository {
    pool: PgPool,
}

impl PgBookRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookRepository for PgBookRepository {
    async fn list(&self) -> RepositoryResult<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>(
            r#"
            SELECT id, title, description, author, genre, isbn, total_copies, available_copies, created_at, updated_at
            FROM books
            ORDER BY title, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(books)
    }

    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<Book>> {
        let book = sqlx::query_as::<_, Book>(
            r#"
            SELECT id, title, description, author, genre, isbn, total_copies, available_copies, created_at, updated_at
            FROM books
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(book)
    }

    async fn create(&self, book: NewBook) -> RepositoryResult<Book> {
        let book = sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (id, title, description, author, genre, isbn, total_copies, available_copies)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, title, description, author, genre, isbn, total_copies, available_copies, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&book.title)
        .bind(&book.description)
        .bind(&book.author)
        .bind(&book.genre)
        .bind(&book.isbn)
        .bind(book.total_copies)
        .bind(book.available_copies)
        .fetch_one(&self.pool)
        .await
        .map_err(map_constraint_violation)?;

        Ok(book)
    }

    async fn update(&self, book: Book) -> RepositoryResult<Book> {
        let book = sqlx::query_as::<_, Book>(
            r#"
            UPDATE books
            SET title = $2, description = $3, author = $4, genre = $5, isbn = $6,
                total_copies = $7, available_copies = $8, updated_at = $9
            WHERE id = $1
            RETURNING id, title, description, author, genre, isbn, total_copies, available_copies, created_at, updated_at
            "#,
        )
        .bind(book.id)
        .bind(&book.title)
        .bind(&book.description)
        .bind(&book.author)
        .bind(&book.genre)
        .bind(&book.isbn)
        .bind(book.total_copies)
        .bind(book.available_copies)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_constraint_violation)?
        .ok_or(RepositoryError::NotFound)?;

        Ok(book)
    }

    async fn delete_by_id(&self, id: Uuid) -> RepositoryResult<bool> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
