//! Challenge texts and community reviews of custom challenges.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{Category, ChallengeId, UserId};

/// Validation failures for challenge content and reviews.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChallengeError {
    #[error("Title and content are required")]
    MissingField,

    #[error("Content must be between {min} and {max} characters (got {len})")]
    ContentLength { len: usize, min: usize, max: usize },

    #[error("Invalid rating. Must be Easy, Medium, or Hard.")]
    InvalidRating,

    #[error("Comment is required.")]
    CommentRequired,

    #[error("You have already reviewed this challenge.")]
    AlreadyReviewed,
}

/// A text a user must reproduce exactly.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Challenge {
    pub id: ChallengeId,
    pub category: Category,
    pub name: String,
    pub content: String,
}

/// Perceived difficulty of a custom challenge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Difficulty {
    #[default]
    Unrated,
    Easy,
    Medium,
    Hard,
}

/// A reviewer's difficulty vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rating {
    Easy,
    Medium,
    Hard,
}

impl Rating {
    pub fn score(&self) -> u32 {
        match self {
            Rating::Easy => 1,
            Rating::Medium => 2,
            Rating::Hard => 3,
        }
    }
}

impl std::str::FromStr for Rating {
    type Err = ChallengeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Easy" => Ok(Rating::Easy),
            "Medium" => Ok(Rating::Medium),
            "Hard" => Ok(Rating::Hard),
            _ => Err(ChallengeError::InvalidRating),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub user: UserId,
    pub username: String,
    pub rating: Rating,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

impl Review {
    pub fn new(
        user: UserId,
        username: String,
        rating: Rating,
        comment: &str,
    ) -> Result<Self, ChallengeError> {
        let comment = comment.trim();
        if comment.is_empty() {
            return Err(ChallengeError::CommentRequired);
        }
        Ok(Self {
            user,
            username,
            rating,
            comment: comment.to_string(),
            created_at: Utc::now(),
        })
    }
}

/// A user-submitted challenge. Content is stored already normalized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomChallenge {
    pub id: ChallengeId,
    pub title: String,
    pub content: String,
    pub creator: UserId,
    pub creator_name: String,
    #[serde(default)]
    pub reviews: Vec<Review>,
    #[serde(default)]
    pub average_difficulty: Difficulty,
    /// Incremented every time the content is fetched, not on completion.
    #[serde(default)]
    pub play_count: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CustomChallenge {
    /// Record a review, one per user, and refresh the average difficulty.
    pub fn add_review(&mut self, review: Review) -> Result<(), ChallengeError> {
        if self.reviews.iter().any(|r| r.user == review.user) {
            return Err(ChallengeError::AlreadyReviewed);
        }
        self.reviews.push(review);
        self.average_difficulty = average_difficulty(&self.reviews);
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn as_challenge(&self) -> Challenge {
        Challenge {
            id: self.id.clone(),
            category: Category::Custom,
            name: self.title.clone(),
            content: self.content.clone(),
        }
    }
}

/// Mean of Easy=1, Medium=2, Hard=3 bucketed back into a difficulty.
pub fn average_difficulty(reviews: &[Review]) -> Difficulty {
    if reviews.is_empty() {
        return Difficulty::Unrated;
    }
    let total: u32 = reviews.iter().map(|r| r.rating.score()).sum();
    let avg = total as f64 / reviews.len() as f64;
    if avg <= 1.5 {
        Difficulty::Easy
    } else if avg <= 2.5 {
        Difficulty::Medium
    } else {
        Difficulty::Hard
    }
}
