//! Request and Response Models
//!
//! Data structures for API request and response payloads with validation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::user::Address;
use crate::utils::validation::{
    email_validator, isbn_validator, phone_or_empty_validator, username_validator,
};

/// Request payload for creating a new account
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(custom(function = "email_validator"))]
    pub email: String,

    #[validate(custom(function = "username_validator"))]
    pub username: String,

    #[validate(length(
        min = 1,
        max = 128,
        message = "Password must be between 1 and 128 characters"
    ))]
    pub password: String,
}

/// Request payload for signing in
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Email cannot be empty"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password cannot be empty"))]
    pub password: String,
}

/// Request payload for refreshing tokens
///
/// The token may be omitted when it is presented as the `refresh_token` cookie.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct RefreshTokenRequest {
    #[validate(length(min = 1, message = "Refresh token cannot be empty"))]
    pub refresh_token: Option<String>,
}

/// Request payload for (re)sending the verification email
#[derive(Debug, Deserialize, Validate)]
pub struct RequestVerificationRequest {
    #[validate(custom(function = "email_validator"))]
    pub email: String,
}

/// Request payload (or query string) for confirming an email address
#[derive(Debug, Deserialize, Validate)]
pub struct VerifyEmailRequest {
    #[validate(length(min = 1, message = "Verification token cannot be empty"))]
    pub token: String,
}

/// Address fields supplied by the client
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AddressInput {
    #[validate(length(min = 1, max = 32))]
    pub apartment_number: String,

    #[validate(length(min = 1, max = 255))]
    pub street: String,

    #[validate(length(min = 1, max = 128))]
    pub city: String,

    #[validate(length(max = 128))]
    pub state: Option<String>,

    #[validate(length(min = 1, max = 128))]
    pub country: String,

    #[validate(length(max = 20))]
    pub postal_code: Option<String>,

    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: Option<f64>,

    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: Option<f64>,
}

impl From<AddressInput> for Address {
    fn from(input: AddressInput) -> Self {
        Address {
            apartment_number: input.apartment_number.trim().to_string(),
            street: input.street.trim().to_string(),
            city: input.city.trim().to_string(),
            state: input.state.map(|s| s.trim().to_string()),
            country: input.country.trim().to_string(),
            postal_code: input.postal_code.map(|s| s.trim().to_string()),
            latitude: input.latitude,
            longitude: input.longitude,
        }
    }
}

/// Request payload for updating the caller's profile
///
/// Absent fields are preserved. An empty `phone_number` clears the stored number.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(custom(function = "username_validator"))]
    pub username: Option<String>,

    #[validate(custom(function = "phone_or_empty_validator"))]
    pub phone_number: Option<String>,

    #[validate(nested)]
    pub address: Option<AddressInput>,
}

/// Request payload for adding a title to the catalog
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateBookRequest {
    #[validate(length(min = 1, max = 255))]
    pub title: String,

    #[validate(length(max = 5000))]
    pub description: String,

    #[validate(length(min = 1, max = 255))]
    pub author: String,

    #[validate(length(min = 1, max = 100))]
    pub genre: String,

    #[validate(custom(function = "isbn_validator"))]
    pub isbn: String,

    #[validate(range(min = 0))]
    pub total_copies: i32,

    /// Defaults to `total_copies`
    #[validate(range(min = 0))]
    pub available_copies: Option<i32>,
}

impl CreateBookRequest {
    /// Strips surrounding whitespace from the text fields
    pub fn trimmed(self) -> Self {
        Self {
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            author: self.author.trim().to_string(),
            genre: self.genre.trim().to_string(),
            ..self
        }
    }
}

/// Request payload for updating a catalog entry
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateBookRequest {
    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,

    #[validate(length(max = 5000))]
    pub description: Option<String>,

    #[validate(length(min = 1, max = 255))]
    pub author: Option<String>,

    #[validate(length(min = 1, max = 100))]
    pub genre: Option<String>,

    #[validate(custom(function = "isbn_validator"))]
    pub isbn: Option<String>,

    #[validate(range(min = 0))]
    pub total_copies: Option<i32>,

    #[validate(range(min = 0))]
    pub available_copies: Option<i32>,
}

impl UpdateBookRequest {
    /// Strips surrounding whitespace from the text fields that are present
    pub fn trimmed(self) -> Self {
        let trim = |value: Option<String>| value.map(|v| v.trim().to_string());
        Self {
            title: trim(self.title),
            description: trim(self.description),
            author: trim(self.author),
            genre: trim(self.genre),
            ..self
        }
    }
}

/// Plain acknowledgement body
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Response for health check
#[derive(Debug, Serialize)]
pub struct HealthCheckResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_request_accepts_short_credentials() {
        let request = RegisterRequest {
            email: "a@x.com".to_string(),
            username: "a".to_string(),
            password: "P@ss1".to_string(),
        };
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_register_request_rejects_bad_email() {
        let request = RegisterRequest {
            email: "not-an-email".to_string(),
            username: "reader".to_string(),
            password: "secret".to_string(),
        };
        let errors = request.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("email"));
    }

    #[test]
    fn test_update_profile_nested_address_validation() {
        let request = UpdateProfileRequest {
            address: Some(AddressInput {
                apartment_number: "4B".to_string(),
                street: "Main Street".to_string(),
                city: "Springfield".to_string(),
                state: None,
                country: "US".to_string(),
                postal_code: None,
                latitude: Some(120.0),
                longitude: None,
            }),
            ..UpdateProfileRequest::default()
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_update_profile_phone_rules() {
        let mut request = UpdateProfileRequest {
            phone_number: Some(String::new()),
            ..UpdateProfileRequest::default()
        };
        assert!(request.validate().is_ok());

        request.phone_number = Some("not a phone".to_string());
        assert!(request.validate().is_err());

        request.phone_number = Some("+1 555 0100".to_string());
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_create_book_request_validation() {
        let mut request = CreateBookRequest {
            title: "The Rust Programming Language".to_string(),
            description: "An introduction".to_string(),
            author: "Steve Klabnik".to_string(),
            genre: "Programming".to_string(),
            isbn: "978-0-306-40615-7".to_string(),
            total_copies: 3,
            available_copies: None,
        };
        assert!(request.validate().is_ok());

        request.total_copies = -1;
        assert!(request.validate().is_err());
    }
}
