//! Typing result records.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Category, EntityId, ResultId, UserId};

/// Frequency map keyed by a lowercased character or cleaned word.
pub type MissFrequency = BTreeMap<String, u32>;

/// Per-session timing aggregates, in milliseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CadenceStats {
    pub avg_time_between_letters: f64,
    pub max_time_between_letters: u64,
    pub avg_time_between_words: f64,
    pub max_time_between_words: u64,
}

/// The metrics part of a result, as submitted at the writer boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultMetrics {
    pub wpm: u32,
    pub accuracy: u8,
    /// Elapsed time in whole seconds.
    pub time_taken: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub missed_chars: Option<MissFrequency>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub missed_words: Option<MissFrequency>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cadence: Option<CadenceStats>,
}

/// One completed typing attempt. Never mutated once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingResult {
    pub id: ResultId,
    pub user: UserId,
    #[serde(rename = "challengeType")]
    pub category: Category,
    #[serde(flatten)]
    pub metrics: ResultMetrics,
    pub created_at: DateTime<Utc>,
}

impl TypingResult {
    pub fn new(user: UserId, category: Category, metrics: ResultMetrics) -> Self {
        Self::recorded_at(user, category, metrics, Utc::now())
    }

    /// Create a result with an explicit creation time.
    pub fn recorded_at(
        user: UserId,
        category: Category,
        metrics: ResultMetrics,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: EntityId::random(),
            user,
            category,
            metrics,
            created_at,
        }
    }

    pub fn wpm(&self) -> u32 {
        self.metrics.wpm
    }

    pub fn accuracy(&self) -> u8 {
        self.metrics.accuracy
    }
}
