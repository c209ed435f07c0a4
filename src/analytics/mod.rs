//! Analytics aggregator.
//!
//! Recomputes a user's full statistics snapshot from all of their results on
//! every request. The only persisted state is the set of unlocked
//! achievements, which only ever grows.

pub mod achievements;
pub mod insights;

pub use insights::{infer_areas, AreaInference, CategoryDelta, TrainingInsights};

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::config::AnalyticsConfig;
use crate::models::{Achievement, Category, TypingResult, UnlockedAchievement, UserId, ACHIEVEMENTS};
use crate::storage::{RecordStore, StorageError};

/// Headline figures over the whole history.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSummary {
    pub total_tests: usize,
    pub avg_wpm: u32,
    pub highest_accuracy: u8,
    /// Seconds.
    pub total_time: u64,
    pub best_scores: BTreeMap<Category, u32>,
}

impl StatsSummary {
    pub fn from_results(results: &[TypingResult]) -> Self {
        let mut best_scores: BTreeMap<Category, u32> =
            Category::ALL.iter().map(|c| (*c, 0)).collect();
        let mut total_time = 0u64;
        let mut wpm_sum = 0u64;
        let mut highest_accuracy = 0u8;

        for r in results {
            total_time += r.metrics.time_taken as u64;
            wpm_sum += r.wpm() as u64;
            highest_accuracy = highest_accuracy.max(r.accuracy());
            let best = best_scores.entry(r.category).or_insert(0);
            *best = (*best).max(r.wpm());
        }

        let avg_wpm = if results.is_empty() {
            0
        } else {
            (wpm_sum as f64 / results.len() as f64).round() as u32
        };

        Self {
            total_tests: results.len(),
            avg_wpm,
            highest_accuracy,
            total_time,
            best_scores,
        }
    }
}

/// One point of the performance chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformancePoint {
    pub iso_date: DateTime<Utc>,
    /// Short local label, e.g. "Mar 7".
    pub date: String,
    pub wpm: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AchievementsView {
    pub unlocked: Vec<UnlockedAchievement>,
    pub all_definitions: Vec<Achievement>,
}

/// Everything the stats endpoint returns.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSnapshot {
    #[serde(flatten)]
    pub stats: StatsSummary,
    pub recent_tests: Vec<TypingResult>,
    /// Full history, oldest first. Windowing is left to the caller.
    pub performance_history: Vec<PerformancePoint>,
    pub achievements: AchievementsView,
    pub analytics: TrainingInsights,
}

/// Build a snapshot from a history and the already-persisted unlocks.
pub fn compute_snapshot(
    results: &[TypingResult],
    unlocked: &[UnlockedAchievement],
    offset: &FixedOffset,
    config: &AnalyticsConfig,
) -> StatsSnapshot {
    let mut chronological = results.to_vec();
    chronological.sort_by(|a, b| a.created_at.cmp(&b.created_at));

    let stats = StatsSummary::from_results(&chronological);

    let recent_tests: Vec<TypingResult> = chronological
        .iter()
        .rev()
        .take(config.recent_tests)
        .cloned()
        .collect();

    let performance_history = chronological
        .iter()
        .map(|r| PerformancePoint {
            iso_date: r.created_at,
            date: r.created_at.with_timezone(offset).format("%b %-d").to_string(),
            wpm: r.wpm(),
        })
        .collect();

    let analytics = if stats.total_tests >= config.insight_min_tests {
        insights::training_insights(&chronological, stats.avg_wpm)
    } else {
        TrainingInsights::default()
    };

    let mut unlocked = unlocked.to_vec();
    unlocked.sort_by(|a, b| a.unlocked_at.cmp(&b.unlocked_at));

    StatsSnapshot {
        stats,
        recent_tests,
        performance_history,
        achievements: AchievementsView {
            unlocked,
            all_definitions: ACHIEVEMENTS.to_vec(),
        },
        analytics,
    }
}

/// Loads history, persists newly satisfied achievements, then builds the
/// snapshot.
#[derive(Clone)]
pub struct StatsService {
    store: Arc<dyn RecordStore>,
    config: AnalyticsConfig,
}

impl StatsService {
    pub fn new(store: Arc<dyn RecordStore>, config: AnalyticsConfig) -> Self {
        Self { store, config }
    }

    pub async fn snapshot(&self, user: &UserId) -> Result<StatsSnapshot, StorageError> {
        self.snapshot_at(user, Utc::now()).await
    }

    /// As [`snapshot`](Self::snapshot), stamping new unlocks with `now`.
    pub async fn snapshot_at(
        &self,
        user: &UserId,
        now: DateTime<Utc>,
    ) -> Result<StatsSnapshot, StorageError> {
        let offset = self.config.offset();
        let results = self.store.results_for_user(user).await?;
        let mut unlocked = self.store.unlocked_achievements(user).await?;

        let fresh = achievements::newly_unlocked(&results, &unlocked, &offset);
        if !fresh.is_empty() {
            let inserted = self.store.unlock_achievements(user, &fresh, now).await?;
            if !inserted.is_empty() {
                info!(user = %user, unlocked = ?fresh, "New achievements");
            }
            // Re-read so a concurrent writer's timestamps win consistently.
            unlocked = self.store.unlocked_achievements(user).await?;
        }

        debug!(user = %user, results = results.len(), "Computed stats snapshot");
        Ok(compute_snapshot(&results, &unlocked, &offset, &self.config))
    }
}
