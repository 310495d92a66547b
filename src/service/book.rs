//! Book Service
//!
//! Catalog management. Every write checks `0 <= available_copies <= total_copies`
//! and ISBN uniqueness before the record is stored.

use std::sync::Arc;

use log::info;
use thiserror::Error;
use uuid::Uuid;
use validator::Validate;

use crate::database::{BookRepository, RepositoryError};
use crate::models::{Book, CreateBookRequest, NewBook, UpdateBookRequest};
use crate::utils::error::AppError;
use crate::utils::validation::normalize_isbn;

#[derive(Error, Debug)]
pub enum BookServiceError {
    #[error("Book not found")]
    BookNotFound,

    #[error("A book with this ISBN already exists")]
    DuplicateIsbn,

    #[error("Invalid inventory: {0}")]
    InvalidInventory(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error(transparent)]
    Repository(RepositoryError),
}

impl From<RepositoryError> for BookServiceError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => BookServiceError::BookNotFound,
            RepositoryError::Duplicate(_) => BookServiceError::DuplicateIsbn,
            RepositoryError::CheckViolation(rule) => BookServiceError::InvalidInventory(rule),
            other => BookServiceError::Repository(other),
        }
    }
}

impl From<BookServiceError> for AppError {
    fn from(err: BookServiceError) -> Self {
        match err {
            BookServiceError::BookNotFound => AppError::NotFound(err.to_string()),
            BookServiceError::DuplicateIsbn => AppError::Conflict(err.to_string()),
            BookServiceError::InvalidInventory(_) => AppError::Validation(err.to_string()),
            BookServiceError::ValidationError(msg) => AppError::Validation(msg),
            BookServiceError::Repository(e) => e.into(),
        }
    }
}

pub type BookServiceResult<T> = Result<T, BookServiceError>;

#[derive(Clone)]
pub struct BookService {
    books: Arc<dyn BookRepository>,
}

impl BookService {
    pub fn new(books: Arc<dyn BookRepository>) -> Self {
        Self { books }
    }

    pub async fn list_books(&self) -> BookServiceResult<Vec<Book>> {
        Ok(self.books.list().await?)
    }

    pub async fn get_book(&self, id: Uuid) -> BookServiceResult<Book> {
        self.books
            .find_by_id(id)
            .await?
            .ok_or(BookServiceError::BookNotFound)
    }

    /// Adds a title; `available_copies` defaults to `total_copies`
    pub async fn create_book(&self, request: CreateBookRequest) -> BookServiceResult<Book> {
        let request = request.trimmed();
        request
            .validate()
            .map_err(|e| BookServiceError::ValidationError(format!("Invalid book data: {}", e)))?;

        let available_copies = request.available_copies.unwrap_or(request.total_copies);
        Book::check_inventory(request.total_copies, available_copies)
            .map_err(BookServiceError::InvalidInventory)?;

        let book = self
            .books
            .create(NewBook {
                title: request.title,
                description: request.description,
                author: request.author,
                genre: request.genre,
                isbn: normalize_isbn(&request.isbn),
                total_copies: request.total_copies,
                available_copies,
            })
            .await?;

        info!("Added book {} ({})", book.id, book.isbn);
        Ok(book)
    }

    /// Merges the provided fields into the stored book and re-checks inventory
    pub async fn update_book(&self, id: Uuid, request: UpdateBookRequest) -> BookServiceResult<Book> {
        let request = request.trimmed();
        request
            .validate()
            .map_err(|e| BookServiceError::ValidationError(format!("Invalid book data: {}", e)))?;

        let mut book = self.get_book(id).await?;

        if let Some(title) = request.title {
            book.title = title;
        }
        if let Some(description) = request.description {
            book.description = description;
        }
        if let Some(author) = request.author {
            book.author = author;
        }
        if let Some(genre) = request.genre {
            book.genre = genre;
        }
        if let Some(isbn) = request.isbn {
            book.isbn = normalize_isbn(&isbn);
        }
        if let Some(total_copies) = request.total_copies {
            book.total_copies = total_copies;
        }
        if let Some(available_copies) = request.available_copies {
            book.available_copies = available_copies;
        }

        Book::check_inventory(book.total_copies, book.available_copies)
            .map_err(BookServiceError::InvalidInventory)?;

        let book = self.books.update(book).await?;
        info!("Updated book {}", book.id);
        Ok(book)
    }

    pub async fn delete_book(&self, id: Uuid) -> BookServiceResult<()> {
        if !self.books.delete_by_id(id).await? {
            return Err(BookServiceError::BookNotFound);
        }

        info!("Deleted book {}", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryBookRepository;

    fn service() -> BookService {
        BookService::new(Arc::new(MemoryBookRepository::new()))
    }

    fn create_request(isbn: &str, total: i32, available: Option<i32>) -> CreateBookRequest {
        CreateBookRequest {
            title: "The Left Hand of Darkness".to_string(),
            description: "Winter".to_string(),
            author: "Ursula K. Le Guin".to_string(),
            genre: "Science Fiction".to_string(),
            isbn: isbn.to_string(),
            total_copies: total,
            available_copies: available,
        }
    }

    #[tokio::test]
    async fn test_create_defaults_available_copies() {
        let service = service();
        let book = service
            .create_book(create_request("978-0-306-40615-7", 4, None))
            .await
            .unwrap();

        assert_eq!(book.available_copies, 4);
        assert_eq!(book.isbn, "9780306406157");
        assert_eq!(service.get_book(book.id).await.unwrap(), book);
    }

    #[tokio::test]
    async fn test_create_enforces_inventory() {
        let service = service();
        let err = service
            .create_book(create_request("9780306406157", 2, Some(3)))
            .await
            .unwrap_err();

        assert!(matches!(err, BookServiceError::InvalidInventory(_)));
        assert!(service.list_books().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_isbn_after_normalization() {
        let service = service();
        service
            .create_book(create_request("9780306406157", 1, None))
            .await
            .unwrap();

        let err = service
            .create_book(create_request("978-0-306-40615-7", 1, None))
            .await
            .unwrap_err();
        assert!(matches!(err, BookServiceError::DuplicateIsbn));
    }

    #[tokio::test]
    async fn test_update_rechecks_merged_inventory() {
        let service = service();
        let book = service
            .create_book(create_request("9780306406157", 5, Some(5)))
            .await
            .unwrap();

        let err = service
            .update_book(
                book.id,
                UpdateBookRequest {
                    total_copies: Some(3),
                    ..UpdateBookRequest::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, BookServiceError::InvalidInventory(_)));

        let updated = service
            .update_book(
                book.id,
                UpdateBookRequest {
                    total_copies: Some(3),
                    available_copies: Some(1),
                    title: Some("The Dispossessed".to_string()),
                    ..UpdateBookRequest::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.total_copies, 3);
        assert_eq!(updated.available_copies, 1);
        assert_eq!(updated.title, "The Dispossessed");
        assert_eq!(updated.author, "Ursula K. Le Guin");
    }

    #[tokio::test]
    async fn test_text_fields_are_trimmed_before_validation() {
        let service = service();

        let mut blank = create_request("9780306406157", 1, None);
        blank.title = "   ".to_string();
        assert!(matches!(
            service.create_book(blank).await,
            Err(BookServiceError::ValidationError(_))
        ));

        let mut padded = create_request("9780306406157", 1, None);
        padded.author = "  Ursula K. Le Guin ".to_string();
        let book = service.create_book(padded).await.unwrap();
        assert_eq!(book.author, "Ursula K. Le Guin");

        let err = service
            .update_book(
                book.id,
                UpdateBookRequest {
                    genre: Some("\t".to_string()),
                    ..UpdateBookRequest::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, BookServiceError::ValidationError(_)));
        assert_eq!(service.get_book(book.id).await.unwrap().genre, "Science Fiction");
    }

    #[test]
    fn test_inventory_constraint_maps_to_invalid_inventory() {
        let err: BookServiceError =
            RepositoryError::CheckViolation("available_copies out of range".to_string()).into();
        assert!(matches!(err, BookServiceError::InvalidInventory(_)));

        let err: AppError = err.into();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_delete_book() {
        let service = service();
        let book = service
            .create_book(create_request("9780306406157", 1, None))
            .await
            .unwrap();

        service.delete_book(book.id).await.unwrap();
        assert!(matches!(
            service.delete_book(book.id).await,
            Err(BookServiceError::BookNotFound)
        ));
        assert!(matches!(
            service.get_book(book.id).await,
            Err(BookServiceError::BookNotFound)
        ));
    }
}
