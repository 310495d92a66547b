//! User Model
//!
//! Account and address data structures.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Authorization role carried by every account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    User,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::User => "user",
            UserRole::Admin => "admin",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(UserRole::User),
            "admin" => Ok(UserRole::Admin),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

/// Postal address owned by a single user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub apartment_number: String,
    pub street: String,
    pub city: String,
    pub state: Option<String>,
    pub country: String,
    pub postal_code: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// User representation for external API responses
///
/// Never carries the password hash or the refresh token reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier for the user
    pub id: Uuid,

    /// User's email address (unique, normalized)
    pub email: String,

    /// User's handle (unique)
    pub username: String,

    pub role: UserRole,

    pub phone_number: Option<String>,

    pub address: Option<Address>,

    /// Whether the user's email address has been verified
    pub email_verified: bool,

    /// Timestamp when the user account was created
    pub created_at: DateTime<Utc>,

    /// Timestamp when the user profile was last modified
    pub updated_at: DateTime<Utc>,
}

/// Stored user record including credentials
///
/// This is what the credential store reads and writes. It is converted into
/// [`User`] before leaving the service layer.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub role: UserRole,

    /// Argon2id PHC string
    pub password_hash: String,

    pub phone_number: Option<String>,
    pub address: Option<Address>,
    pub email_verified: bool,

    /// SHA-256 fingerprint of the most recently issued refresh token
    pub refresh_token_hash: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserRecord> for User {
    /// Strips the credential fields so they are never exposed in responses
    fn from(record: UserRecord) -> Self {
        User {
            id: record.id,
            email: record.email,
            username: record.username,
            role: record.role,
            phone_number: record.phone_number,
            address: record.address,
            email_verified: record.email_verified,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// Data required to create a user record
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub role: UserRole,
}

/// Partial update of a user record
///
/// `None` leaves a field untouched. Nullable fields use a nested `Option`
/// where `Some(None)` clears the stored value.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub username: Option<String>,
    pub role: Option<UserRole>,
    pub phone_number: Option<Option<String>>,
    pub address: Option<Option<Address>>,
    pub email_verified: Option<bool>,
    pub refresh_token_hash: Option<Option<String>>,
}

impl UserChanges {
    pub fn verify_email() -> Self {
        Self {
            email_verified: Some(true),
            ..Self::default()
        }
    }

    pub fn set_refresh_token_hash(hash: String) -> Self {
        Self {
            refresh_token_hash: Some(Some(hash)),
            ..Self::default()
        }
    }

    pub fn clear_refresh_token() -> Self {
        Self {
            refresh_token_hash: Some(None),
            ..Self::default()
        }
    }

    /// Role change that also ends the current session
    ///
    /// Access tokens carry the role, so the next refresh must fail and force
    /// a login that issues tokens with the new role.
    pub fn role_change(role: UserRole) -> Self {
        Self {
            role: Some(role),
            refresh_token_hash: Some(None),
            ..Self::default()
        }
    }

    /// Apply these changes to a record, bumping `updated_at`
    pub fn apply_to(self, record: &mut UserRecord, now: DateTime<Utc>) {
        if let Some(username) = self.username {
            record.username = username;
        }
        if let Some(role) = self.role {
            record.role = role;
        }
        if let Some(phone_number) = self.phone_number {
            record.phone_number = phone_number;
        }
        if let Some(address) = self.address {
            record.address = address;
        }
        if let Some(email_verified) = self.email_verified {
            record.email_verified = email_verified;
        }
        if let Some(refresh_token_hash) = self.refresh_token_hash {
            record.refresh_token_hash = refresh_token_hash;
        }
        record.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample_record() -> UserRecord {
        let now = Utc::now();
        UserRecord {
            id: Uuid::new_v4(),
            email: "reader@library.org".to_string(),
            username: "reader".to_string(),
            role: UserRole::User,
            password_hash: "$argon2id$v=19$m=256,t=1,p=1$c2FsdA$aGFzaA".to_string(),
            phone_number: None,
            address: None,
            email_verified: false,
            refresh_token_hash: Some("abc".to_string()),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_record_conversion_strips_credentials() {
        let record = sample_record();
        let user: User = record.clone().into();

        assert_eq!(user.id, record.id);
        assert_eq!(user.email, "reader@library.org");

        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
        assert!(json.get("refresh_token_hash").is_none());
        assert_eq!(json["role"], "user");
    }

    #[test]
    fn test_role_round_trip_through_str() {
        assert_eq!("admin".parse::<UserRole>().unwrap(), UserRole::Admin);
        assert_eq!(UserRole::User.to_string(), "user");
        assert!("root".parse::<UserRole>().is_err());
    }

    #[test]
    fn test_changes_apply_only_set_fields() {
        let mut record = sample_record();
        let before = record.updated_at;
        let later = before + Duration::seconds(5);

        UserChanges {
            phone_number: Some(Some("+1 555 0100".to_string())),
            ..UserChanges::default()
        }
        .apply_to(&mut record, later);

        assert_eq!(record.phone_number.as_deref(), Some("+1 555 0100"));
        assert_eq!(record.username, "reader");
        assert_eq!(record.refresh_token_hash.as_deref(), Some("abc"));
        assert_eq!(record.updated_at, later);
    }

    #[test]
    fn test_clear_refresh_token() {
        let mut record = sample_record();
        UserChanges::clear_refresh_token().apply_to(&mut record, Utc::now());
        assert!(record.refresh_token_hash.is_none());
    }

    #[test]
    fn test_role_change_ends_session() {
        let mut record = sample_record();
        UserChanges::role_change(UserRole::Admin).apply_to(&mut record, Utc::now());

        assert_eq!(record.role, UserRole::Admin);
        assert!(record.refresh_token_hash.is_none());
        assert_eq!(record.username, "reader");
    }
}
