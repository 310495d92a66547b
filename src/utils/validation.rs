//! Validation Utilities
//!
//! Input validation functions for account, profile and catalog requests.

use regex::Regex;
use std::sync::OnceLock;
use validator::ValidationError;

/// Validates email address format
pub fn validate_email(email: &str) -> bool {
    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("Failed to compile email regex")
    });

    regex.is_match(email.trim())
}

/// Normalizes email address to lowercase and removes whitespace
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Validates a username: 1-32 characters of letters, digits, `.`, `_` or `-`
pub fn validate_username(username: &str) -> bool {
    static USERNAME_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = USERNAME_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._-]{1,32}$").expect("Failed to compile username regex")
    });

    regex.is_match(username)
}

/// Validates a phone number in a loose international format
pub fn validate_phone_number(phone: &str) -> bool {
    static PHONE_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = PHONE_REGEX.get_or_init(|| {
        Regex::new(r"^\+?[0-9][0-9 \-]{5,19}$").expect("Failed to compile phone regex")
    });

    regex.is_match(phone.trim())
}

/// Validates an ISBN-10 or ISBN-13, ignoring hyphens and spaces
pub fn validate_isbn(isbn: &str) -> bool {
    let compact = normalize_isbn(isbn);

    match compact.len() {
        10 => {
            let mut sum = 0u32;
            for (i, c) in compact.chars().enumerate() {
                let value = match c {
                    '0'..='9' => c as u32 - '0' as u32,
                    'X' if i == 9 => 10,
                    _ => return false,
                };
                sum += value * (10 - i as u32);
            }
            sum % 11 == 0
        }
        13 => {
            let mut sum = 0u32;
            for (i, c) in compact.chars().enumerate() {
                let Some(digit) = c.to_digit(10) else {
                    return false;
                };
                sum += if i % 2 == 0 { digit } else { digit * 3 };
            }
            sum % 10 == 0
        }
        _ => false,
    }
}

/// Strips separators from an ISBN and upper-cases the check character
pub fn normalize_isbn(isbn: &str) -> String {
    isbn.chars()
        .filter(|c| !matches!(c, '-' | ' '))
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// Custom validator for email fields using the validator crate
pub fn email_validator(email: &str) -> Result<(), ValidationError> {
    if validate_email(email) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_email").with_message(messages::INVALID_EMAIL.into()))
    }
}

/// Custom validator for username fields using the validator crate
pub fn username_validator(username: &str) -> Result<(), ValidationError> {
    if validate_username(username) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_username")
            .with_message(messages::INVALID_USERNAME.into()))
    }
}

/// Custom validator for phone number fields using the validator crate
pub fn phone_validator(phone: &str) -> Result<(), ValidationError> {
    if validate_phone_number(phone) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_phone").with_message(messages::INVALID_PHONE.into()))
    }
}

/// Phone validator that also accepts an empty value (used to clear the number)
pub fn phone_or_empty_validator(phone: &str) -> Result<(), ValidationError> {
    if phone.trim().is_empty() {
        Ok(())
    } else {
        phone_validator(phone)
    }
}

/// Custom validator for ISBN fields using the validator crate
pub fn isbn_validator(isbn: &str) -> Result<(), ValidationError> {
    if validate_isbn(isbn) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_isbn").with_message(messages::INVALID_ISBN.into()))
    }
}

/// Validation error messages for user-friendly responses
pub mod messages {
    pub const INVALID_EMAIL: &str = "Please enter a valid email address";
    pub const INVALID_USERNAME: &str =
        "Username must be 1-32 characters of letters, digits, '.', '_' or '-'";
    pub const INVALID_PHONE: &str = "Please enter a valid phone number";
    pub const INVALID_ISBN: &str = "Please enter a valid ISBN-10 or ISBN-13";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email() {
        assert!(validate_email("a@x.com"));
        assert!(validate_email("reader.one+tag@library.org"));
        assert!(!validate_email("missing-at.com"));
        assert!(!validate_email("a@x"));
        assert!(!validate_email(""));
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Reader@Library.ORG "), "reader@library.org");
    }

    #[test]
    fn test_validate_username() {
        assert!(validate_username("a"));
        assert!(validate_username("book_worm-42.x"));
        assert!(!validate_username(""));
        assert!(!validate_username("has space"));
        assert!(!validate_username(&"x".repeat(33)));
    }

    #[test]
    fn test_validate_phone_number() {
        assert!(validate_phone_number("+44 20 7946 0958"));
        assert!(validate_phone_number("555-123-4567"));
        assert!(!validate_phone_number("call me"));
        assert!(!validate_phone_number("12"));
    }

    #[test]
    fn test_validate_isbn() {
        assert!(validate_isbn("978-0-306-40615-7"));
        assert!(validate_isbn("9780306406157"));
        assert!(validate_isbn("0-306-40615-2"));
        assert!(validate_isbn("0-8044-2957-x"));
        assert!(!validate_isbn("978-0-306-40615-8"));
        assert!(!validate_isbn("12345"));
        assert!(!validate_isbn("X306406152"));
    }

    #[test]
    fn test_normalize_isbn() {
        assert_eq!(normalize_isbn("0-8044-2957-x"), "080442957X");
        assert_eq!(normalize_isbn("978 0 306 40615 7"), "9780306406157");
    }

    #[test]
    fn test_validators_attach_messages() {
        let err = email_validator("nope").unwrap_err();
        assert_eq!(err.code, "invalid_email");
        assert!(err.message.is_some());
        assert!(isbn_validator("9780306406157").is_ok());
    }
}
