//! In-memory repositories for testing and local runs without PostgreSQL.
//!
//! Each operation holds the lock for its whole duration, so uniqueness checks
//! and writes are atomic with respect to each other.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::{BookRepository, RepositoryError, RepositoryResult, UserRepository};
use crate::models::{Book, NewBook, NewUser, UserChanges, UserRecord};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// In-memory [`UserRepository`]
#[derive(Clone, Debug, Default)]
pub struct MemoryUserRepository {
    users: Arc<Mutex<HashMap<Uuid, UserRecord>>>,
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored users
    pub fn len(&self) -> usize {
        lock(&self.users).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<UserRecord>> {
        Ok(lock(&self.users)
            .values()
            .find(|user| user.email == email)
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<UserRecord>> {
        Ok(lock(&self.users).get(&id).cloned())
    }

    async fn create(&self, user: NewUser) -> RepositoryResult<UserRecord> {
        let mut users = lock(&self.users);

        if users.values().any(|u| u.email == user.email) {
            return Err(RepositoryError::Duplicate("email".to_string()));
        }
        if users.values().any(|u| u.username == user.username) {
            return Err(RepositoryError::Duplicate("username".to_string()));
        }

        let now = Utc::now();
        let record = UserRecord {
            id: Uuid::new_v4(),
            email: user.email,
            username: user.username,
            role: user.role,
            password_hash: user.password_hash,
            phone_number: None,
            address: None,
            email_verified: false,
            refresh_token_hash: None,
            created_at: now,
            updated_at: now,
        };
        users.insert(record.id, record.clone());

        Ok(record)
    }

    async fn update_by_id(&self, id: Uuid, changes: UserChanges) -> RepositoryResult<UserRecord> {
        let mut users = lock(&self.users);

        if let Some(username) = &changes.username {
            if users
                .values()
                .any(|u| u.id != id && &u.username == username)
            {
                return Err(RepositoryError::Duplicate("username".to_string()));
            }
        }

        let record = users.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        changes.apply_to(record, Utc::now());

        Ok(record.clone())
    }

    async fn rotate_refresh_token(
        &self,
        id: Uuid,
        expected: &str,
        replacement: &str,
    ) -> RepositoryResult<Option<UserRecord>> {
        let mut users = lock(&self.users);

        let Some(record) = users.get_mut(&id) else {
            return Ok(None);
        };
        if record.refresh_token_hash.as_deref() != Some(expected) {
            return Ok(None);
        }

        UserChanges::set_refresh_token_hash(replacement.to_string()).apply_to(record, Utc::now());

        Ok(Some(record.clone()))
    }

    async fn delete_by_id(&self, id: Uuid) -> RepositoryResult<bool> {
        Ok(lock(&self.users).remove(&id).is_some())
    }

    async fn health_check(&self) -> RepositoryResult<()> {
        Ok(())
    }
}

/// In-memory [`BookRepository`]
#[derive(Clone, Debug, Default)]
pub struct MemoryBookRepository {
    books: Arc<Mutex<HashMap<Uuid, Book>>>,
}

impl MemoryBookRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BookRepository for MemoryBookRepository {
    async fn list(&self) -> RepositoryResult<Vec<Book>> {
        let mut books: Vec<Book> = lock(&self.books).values().cloned().collect();
        books.sort_by(|a, b| a.title.cmp(&b.title).then(a.id.cmp(&b.id)));
        Ok(books)
    }

    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<Book>> {
        Ok(lock(&self.books).get(&id).cloned())
    }

    async fn create(&self, book: NewBook) -> RepositoryResult<Book> {
        let mut books = lock(&self.books);

        if books.values().any(|b| b.isbn == book.isbn) {
            return Err(RepositoryError::Duplicate("isbn".to_string()));
        }

        let now = Utc::now();
        let book = Book {
            id: Uuid::new_v4(),
            title: book.title,
            description: book.description,
            author: book.author,
            genre: book.genre,
            isbn: book.isbn,
            total_copies: book.total_copies,
            available_copies: book.available_copies,
            created_at: now,
            updated_at: now,
        };
        books.insert(book.id, book.clone());

        Ok(book)
    }

    async fn update(&self, mut book: Book) -> RepositoryResult<Book> {
        let mut books = lock(&self.books);

        if books.values().any(|b| b.id != book.id && b.isbn == book.isbn) {
            return Err(RepositoryError::Duplicate("isbn".to_string()));
        }

        let stored = books.get_mut(&book.id).ok_or(RepositoryError::NotFound)?;
        book.created_at = stored.created_at;
        book.updated_at = Utc::now();
        *stored = book.clone();

        Ok(book)
    }

    async fn delete_by_id(&self, id: Uuid) -> RepositoryResult<bool> {
        Ok(lock(&self.books).remove(&id).is_some())
    }
}
