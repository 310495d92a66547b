//! User Repository
//!
//! Credential store for accounts. Email and username are unique; the address
//! lives in its own table and is removed together with its user.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{map_constraint_violation, RepositoryError, RepositoryResult};
use crate::models::{Address, NewUser, UserChanges, UserRecord};

/// Persistence operations for user records
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Look up a user by normalized email
    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<UserRecord>>;

    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<UserRecord>>;

    /// Insert a new user; `Duplicate("email" | "username")` on collision
    async fn create(&self, user: NewUser) -> RepositoryResult<UserRecord>;

    /// Apply `changes` atomically; `NotFound` if the id is unknown
    async fn update_by_id(&self, id: Uuid, changes: UserChanges) -> RepositoryResult<UserRecord>;

    /// Replace the refresh token fingerprint only if it still equals `expected`
    ///
    /// `None` when the user is gone or holds a different fingerprint.
    async fn rotate_refresh_token(
        &self,
        id: Uuid,
        expected: &str,
        replacement: &str,
    ) -> RepositoryResult<Option<UserRecord>>;

    /// Returns whether a record was removed
    async fn delete_by_id(&self, id: Uuid) -> RepositoryResult<bool>;

    async fn health_check(&self) -> RepositoryResult<()>;
}

const SELECT_USER: &str = r#"
    SELECT u.id, u.email, u.username, u.role, u.password_hash, u.phone_number,
           u.email_verified, u.refresh_token_hash, u.created_at, u.updated_at,
           a.apartment_number, a.street, a.city, a.state, a.country,
           a.postal_code, a.latitude, a.longitude
    FROM users u
    LEFT JOIN addresses a ON a.user_id = u.id
"#;

/// Flat row produced by [`SELECT_USER`]
#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    username: String,
    role: String,
    password_hash: String,
    phone_number: Option<String>,
    email_verified: bool,
    refresh_token_hash: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    apartment_number: Option<String>,
    street: Option<String>,
    city: Option<String>,
    state: Option<String>,
    country: Option<String>,
    postal_code: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
}

impl TryFrom<UserRow> for UserRecord {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = row.role.parse().map_err(RepositoryError::InvalidData)?;

        let address = match (row.apartment_number, row.street, row.city, row.country) {
            (Some(apartment_number), Some(street), Some(city), Some(country)) => Some(Address {
                apartment_number,
                street,
                city,
                state: row.state,
                country,
                postal_code: row.postal_code,
                latitude: row.latitude,
                longitude: row.longitude,
            }),
            _ => None,
        };

        Ok(UserRecord {
            id: row.id,
            email: row.email,
            username: row.username,
            role,
            password_hash: row.password_hash,
            phone_number: row.phone_number,
            address,
            email_verified: row.email_verified,
            refresh_token_hash: row.refresh_token_hash,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// PostgreSQL-backed user repository
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<UserRecord>> {
        let sql = format!("{} WHERE u.email = $1", SELECT_USER);
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        row.map(UserRecord::try_from).transpose()
    }

    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<UserRecord>> {
        let sql = format!("{} WHERE u.id = $1", SELECT_USER);
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(UserRecord::try_from).transpose()
    }

    async fn create(&self, user: NewUser) -> RepositoryResult<UserRecord> {
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

        sqlx::query(
            r#"
            INSERT INTO users (id, email, username, role, password_hash, email_verified, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(record.id)
        .bind(&record.email)
        .bind(&record.username)
        .bind(record.role.as_str())
        .bind(&record.password_hash)
        .bind(record.email_verified)
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_constraint_violation)?;

        Ok(record)
    }

    async fn update_by_id(&self, id: Uuid, changes: UserChanges) -> RepositoryResult<UserRecord> {
        let mut tx = self.pool.begin().await?;

        let sql = format!("{} WHERE u.id = $1 FOR UPDATE OF u", SELECT_USER);
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        let mut record = UserRecord::try_from(row)?;
        let address_change = changes.address.clone();
        changes.apply_to(&mut record, Utc::now());

        sqlx::query(
            r#"
            UPDATE users
            SET username = $2, role = $3, phone_number = $4, email_verified = $5,
                refresh_token_hash = $6, updated_at = $7
            WHERE id = $1
            "#,
        )
        .bind(record.id)
        .bind(&record.username)
        .bind(record.role.as_str())
        .bind(&record.phone_number)
        .bind(record.email_verified)
        .bind(&record.refresh_token_hash)
        .bind(record.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(map_constraint_violation)?;

        match address_change {
            Some(Some(address)) => {
                sqlx::query(
                    r#"
                    INSERT INTO addresses (user_id, apartment_number, street, city, state, country, postal_code, latitude, longitude)
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                    ON CONFLICT (user_id) DO UPDATE
                    SET apartment_number = EXCLUDED.apartment_number,
                        street = EXCLUDED.street,
                        city = EXCLUDED.city,
                        state = EXCLUDED.state,
                        country = EXCLUDED.country,
                        postal_code = EXCLUDED.postal_code,
                        latitude = EXCLUDED.latitude,
                        longitude = EXCLUDED.longitude
                    "#,
                )
                .bind(record.id)
                .bind(&address.apartment_number)
                .bind(&address.street)
                .bind(&address.city)
                .bind(&address.state)
                .bind(&address.country)
                .bind(&address.postal_code)
                .bind(address.latitude)
                .bind(address.longitude)
                .execute(&mut *tx)
                .await?;
            }
            Some(None) => {
                sqlx::query("DELETE FROM addresses WHERE user_id = $1")
                    .bind(record.id)
                    .execute(&mut *tx)
                    .await?;
            }
            None => {}
        }

        tx.commit().await?;

        Ok(record)
    }

    async fn rotate_refresh_token(
        &self,
        id: Uuid,
        expected: &str,
        replacement: &str,
    ) -> RepositoryResult<Option<UserRecord>> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET refresh_token_hash = $3, updated_at = $4
            WHERE id = $1 AND refresh_token_hash = $2
            "#,
        )
        .bind(id)
        .bind(expected)
        .bind(replacement)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.find_by_id(id).await
    }

    async fn delete_by_id(&self, id: Uuid) -> RepositoryResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn health_check(&self) -> RepositoryResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
