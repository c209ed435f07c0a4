//! Platform users as seen by the scoring core.
//!
//! Credentials and sessions live with the identity collaborator; only the
//! id, display name and creation time are kept here.

use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{EntityId, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UsernameError {
    #[error("Name must be at least 2 characters long")]
    TooShort,

    #[error("Username cannot contain spaces")]
    ContainsWhitespace,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Create a user after validating and trimming the display name.
    pub fn new(name: &str) -> Result<Self, UsernameError> {
        let name = Self::validate_name(name)?;
        Ok(Self {
            id: EntityId::random(),
            name,
            created_at: Utc::now(),
        })
    }

    /// Trim a display name and enforce the username rules.
    pub fn validate_name(name: &str) -> Result<String, UsernameError> {
        static WHITESPACE: OnceLock<Regex> = OnceLock::new();
        let whitespace = WHITESPACE.get_or_init(|| Regex::new(r"\s").expect("valid regex"));

        let cleaned = name.trim();
        if cleaned.chars().count() < 2 {
            return Err(UsernameError::TooShort);
        }
        if whitespace.is_match(cleaned) {
            return Err(UsernameError::ContainsWhitespace);
        }
        Ok(cleaned.to_string())
    }

    /// Case-insensitive exact match on the display name.
    pub fn name_matches(&self, name: &str) -> bool {
        self.name.to_lowercase() == name.to_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name_trims() {
        assert_eq!(User::validate_name("  ada  ").unwrap(), "ada");
    }

    #[test]
    fn test_validate_name_rejects_short_and_spaced() {
        assert_eq!(User::validate_name(" a "), Err(UsernameError::TooShort));
        assert_eq!(
            User::validate_name("ada lovelace"),
            Err(UsernameError::ContainsWhitespace)
        );
    }

    #[test]
    fn test_name_matches_ignores_case() {
        let user = User::new("SpeedyKeys").unwrap();
        assert!(user.name_matches("speedykeys"));
        assert!(!user.name_matches("speedy"));
    }
}
