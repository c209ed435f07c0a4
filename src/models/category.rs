//! Challenge categories.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Closed set of challenge categories.
///
/// Declaration order is the canonical display order for per-category figures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Standard,
    Paragraph,
    Developer,
    Daily,
    Custom,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown challenge category: {0}")]
pub struct UnknownCategory(pub String);

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Standard,
        Category::Paragraph,
        Category::Developer,
        Category::Daily,
        Category::Custom,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Standard => "standard",
            Category::Paragraph => "paragraph",
            Category::Developer => "developer",
            Category::Daily => "daily",
            Category::Custom => "custom",
        }
    }

    /// Human-facing name of the challenge mode.
    pub fn display_name(&self) -> &'static str {
        match self {
            Category::Standard => "Standard A-Z",
            Category::Paragraph => "Paragraph Challenge",
            Category::Developer => "Developer Snippet",
            Category::Daily => "Global Daily Challenge",
            Category::Custom => "Custom Challenge",
        }
    }

    /// Whether a fresh attempt may be given a different text at random.
    pub fn is_randomized(&self) -> bool {
        matches!(
            self,
            Category::Standard | Category::Paragraph | Category::Developer
        )
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "standard" => Ok(Category::Standard),
            "paragraph" => Ok(Category::Paragraph),
            "developer" => Ok(Category::Developer),
            "daily" => Ok(Category::Daily),
            "custom" => Ok(Category::Custom),
            other => Err(UnknownCategory(other.to_string())),
        }
    }
}
