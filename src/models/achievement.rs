//! Achievement catalog and per-user unlocks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::UserId;

/// Identifier of a fixed achievement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AchievementId {
    FirstTest,
    #[serde(rename = "WPM_100_CLUB")]
    Wpm100Club,
    AccuracyKing,
    NightOwl,
    #[serde(rename = "VETERAN_50")]
    Veteran50,
    SpeedDevil,
}

/// Static definition shown to users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Achievement {
    pub id: AchievementId,
    pub title: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
}

/// The full achievement catalog, in display order.
pub const ACHIEVEMENTS: [Achievement; 6] = [
    Achievement {
        id: AchievementId::FirstTest,
        title: "First Steps",
        description: "Complete your first typing test.",
        icon: "Zap",
    },
    Achievement {
        id: AchievementId::Wpm100Club,
        title: "100 WPM Club",
        description: "Break the 100 WPM barrier.",
        icon: "Flame",
    },
    Achievement {
        id: AchievementId::AccuracyKing,
        title: "Flawless Victory",
        description: "Achieve 100% accuracy on a test.",
        icon: "Target",
    },
    Achievement {
        id: AchievementId::NightOwl,
        title: "Night Owl",
        description: "Complete 10 tests between midnight and 4AM.",
        icon: "Moon",
    },
    Achievement {
        id: AchievementId::Veteran50,
        title: "Veteran",
        description: "Complete 50 total typing tests.",
        icon: "Shield",
    },
    Achievement {
        id: AchievementId::SpeedDevil,
        title: "Speed Devil",
        description: "Achieve over 130 WPM.",
        icon: "Crown",
    },
];

impl AchievementId {
    pub fn definition(&self) -> &'static Achievement {
        let index = match self {
            AchievementId::FirstTest => 0,
            AchievementId::Wpm100Club => 1,
            AchievementId::AccuracyKing => 2,
            AchievementId::NightOwl => 3,
            AchievementId::Veteran50 => 4,
            AchievementId::SpeedDevil => 5,
        };
        &ACHIEVEMENTS[index]
    }
}

/// A user's unlock of one achievement. Never removed except with the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnlockedAchievement {
    pub user: UserId,
    pub achievement_id: AchievementId,
    pub unlocked_at: DateTime<Utc>,
}
