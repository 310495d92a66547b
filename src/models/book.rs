//! Book Model
//!
//! Catalog records. Copy counts obey `0 <= available_copies <= total_copies`,
//! which [`Book::check_inventory`] verifies before anything is persisted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Catalog entry for a single title
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Book {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub author: String,
    pub genre: String,

    /// Normalized ISBN (separators removed), unique across the catalog
    pub isbn: String,

    pub total_copies: i32,
    pub available_copies: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Data required to insert a catalog entry
#[derive(Debug, Clone)]
pub struct NewBook {
    pub title: String,
    pub description: String,
    pub author: String,
    pub genre: String,
    pub isbn: String,
    pub total_copies: i32,
    pub available_copies: i32,
}

impl Book {
    /// Check the copy-count invariant
    pub fn check_inventory(total_copies: i32, available_copies: i32) -> Result<(), String> {
        if total_copies < 0 {
            return Err("total_copies cannot be negative".to_string());
        }
        if available_copies < 0 {
            return Err("available_copies cannot be negative".to_string());
        }
        if available_copies > total_copies {
            return Err(format!(
                "available_copies ({}) cannot exceed total_copies ({})",
                available_copies, total_copies
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inventory_invariant() {
        assert!(Book::check_inventory(0, 0).is_ok());
        assert!(Book::check_inventory(5, 5).is_ok());
        assert!(Book::check_inventory(5, 2).is_ok());
        assert!(Book::check_inventory(5, 6).is_err());
        assert!(Book::check_inventory(-1, 0).is_err());
        assert!(Book::check_inventory(3, -1).is_err());
    }
}
