//! Entity identifiers.
//!
//! Built-in challenges get deterministic ids derived from a SHA256 of their
//! content; users, results and custom challenges get random v4 UUIDs.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use uuid::Uuid;

/// An opaque entity ID.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    /// Create a new EntityId from an existing string.
    pub fn new(id: String) -> Self {
        Self(id)
    }

    /// Generate a deterministic EntityId from input fields.
    /// Uses SHA256 and takes the first 16 characters for brevity.
    pub fn generate(fields: &[&str]) -> Self {
        let mut hasher = Sha256::new();
        for (i, field) in fields.iter().enumerate() {
            if i > 0 {
                hasher.update(b"|");
            }
            hasher.update(field.as_bytes());
        }
        let hash = hex::encode(hasher.finalize());
        Self(hash[..16].to_string())
    }

    /// Generate a fresh random EntityId.
    pub fn random() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Get the ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({})", self.0)
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Type alias for user IDs
pub type UserId = EntityId;

/// Type alias for typing result IDs
pub type ResultId = EntityId;

/// Type alias for challenge IDs (built-in and custom)
pub type ChallengeId = EntityId;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_is_deterministic() {
        let id1 = EntityId::generate(&["paragraph", "The quick brown fox"]);
        let id2 = EntityId::generate(&["paragraph", "The quick brown fox"]);
        assert_eq!(id1, id2);
    }

    #[test]
    fn test_generate_differs_by_field() {
        let id1 = EntityId::generate(&["paragraph", "The quick brown fox"]);
        let id2 = EntityId::generate(&["daily", "The quick brown fox"]);
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_generate_length_and_hex() {
        let id = EntityId::generate(&["standard"]);
        assert_eq!(id.as_str().len(), 16);
        assert!(id.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_random_ids_are_unique() {
        assert_ne!(EntityId::random(), EntityId::random());
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let id = EntityId::from("abc123");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"abc123\"");
        let back: EntityId = serde_json::from_str("\"abc123\"").unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_debug_and_display() {
        let id = EntityId::new("debug-test".to_string());
        assert_eq!(format!("{}", id), "debug-test");
        assert!(format!("{:?}", id).contains("debug-test"));
    }
}
