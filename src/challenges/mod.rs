//! Challenge texts.
//!
//! - `catalog`: the fixed built-in texts and their selection rules
//! - `normalize`: reduction of user-submitted text to typeable ASCII

pub mod catalog;
pub mod normalize;

pub use catalog::{daily_index, pick, pick_next, texts};
pub use normalize::{normalize_content, validate_custom_content, MAX_CUSTOM_LEN, MIN_CUSTOM_LEN};

use chrono::Utc;

use crate::models::{ChallengeError, CustomChallenge, Difficulty, EntityId, User};

/// Build a new custom challenge owned by `creator`.
///
/// The title is trimmed and required; content is normalized before its
/// length is checked.
pub fn new_custom_challenge(
    title: &str,
    raw_content: &str,
    creator: &User,
) -> Result<CustomChallenge, ChallengeError> {
    let title = title.trim();
    if title.is_empty() || raw_content.trim().is_empty() {
        return Err(ChallengeError::MissingField);
    }
    let content = validate_custom_content(raw_content)?;
    let now = Utc::now();

    Ok(CustomChallenge {
        id: EntityId::random(),
        title: title.to_string(),
        content,
        creator: creator.id.clone(),
        creator_name: creator.name.clone(),
        reviews: Vec::new(),
        average_difficulty: Difficulty::Unrated,
        play_count: 0,
        created_at: now,
        updated_at: now,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_custom_challenge_normalizes_content() {
        let creator = User::new("maker").unwrap();
        let raw = format!("  {}\u{2026}  ", "word ".repeat(12));
        let challenge = new_custom_challenge(" Warmup ", &raw, &creator).unwrap();

        assert_eq!(challenge.title, "Warmup");
        assert!(challenge.content.ends_with("word..."));
        assert_eq!(challenge.creator, creator.id);
        assert_eq!(challenge.creator_name, "maker");
        assert_eq!(challenge.play_count, 0);
        assert_eq!(challenge.average_difficulty, Difficulty::Unrated);
    }

    #[test]
    fn test_new_custom_challenge_requires_title_and_content() {
        let creator = User::new("maker").unwrap();
        assert_eq!(
            new_custom_challenge("  ", &"a".repeat(60), &creator),
            Err(ChallengeError::MissingField)
        );
        assert_eq!(
            new_custom_challenge("Title", "   ", &creator),
            Err(ChallengeError::MissingField)
        );
    }

    #[test]
    fn test_new_custom_challenge_too_short_after_normalization() {
        let creator = User::new("maker").unwrap();
        let raw = "\u{4E16}".repeat(80) + "short";
        assert!(matches!(
            new_custom_challenge("Title", &raw, &creator),
            Err(ChallengeError::ContentLength { len: 5, .. })
        ));
    }
}
