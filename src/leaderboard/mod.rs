//! Leaderboard ranker.
//!
//! Every registered user is ranked, including users with no qualifying
//! results in the window (they appear with zero figures). Pagination totals
//! therefore count users, not results.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::debug;

use crate::models::{Category, TypingResult, User, UserId};
use crate::storage::{RecordStore, StorageError};

/// Users with more qualifying results than this trend "up".
pub const TREND_UP_MIN_TESTS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TimeWindow {
    #[default]
    #[serde(rename = "daily")]
    Daily,
    #[serde(rename = "weekly")]
    Weekly,
    #[serde(rename = "all-time")]
    AllTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown leaderboard range: {0}")]
pub struct UnknownWindow(pub String);

impl TimeWindow {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeWindow::Daily => "daily",
            TimeWindow::Weekly => "weekly",
            TimeWindow::AllTime => "all-time",
        }
    }

    /// Earliest creation time that counts for this window.
    pub fn floor(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            TimeWindow::Daily => now - chrono::Duration::days(1),
            TimeWindow::Weekly => now - chrono::Duration::days(7),
            TimeWindow::AllTime => Utc
                .with_ymd_and_hms(2000, 1, 1, 0, 0, 0)
                .single()
                .unwrap_or(DateTime::<Utc>::MIN_UTC),
        }
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeWindow {
    type Err = UnknownWindow;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily" => Ok(TimeWindow::Daily),
            "weekly" => Ok(TimeWindow::Weekly),
            "all-time" => Ok(TimeWindow::AllTime),
            other => Err(UnknownWindow(other.to_string())),
        }
    }
}

/// Which board to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct LeaderboardQuery {
    pub window: TimeWindow,
    pub category: Option<Category>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardRow {
    /// 1-based position in the full ranking.
    pub rank: usize,
    pub id: UserId,
    pub user: String,
    pub top_speed: u32,
    pub avg_wpm: u32,
    pub accuracy: u8,
    pub test_count: usize,
    pub trend: &'static str,
}

#[derive(Default)]
struct Figures {
    top_speed: u32,
    wpm_sum: u64,
    accuracy: u8,
    count: usize,
}

/// Rank `users` by the given results, which must already be windowed and
/// filtered. Results of unknown users are ignored.
pub fn rank(users: &[User], results: &[TypingResult]) -> Vec<LeaderboardRow> {
    let mut figures: HashMap<&UserId, Figures> = HashMap::new();
    for r in results {
        let f = figures.entry(&r.user).or_default();
        f.top_speed = f.top_speed.max(r.wpm());
        f.wpm_sum += r.wpm() as u64;
        f.accuracy = f.accuracy.max(r.accuracy());
        f.count += 1;
    }

    let mut rows: Vec<LeaderboardRow> = users
        .iter()
        .map(|u| {
            let f = figures.remove(&u.id).unwrap_or_default();
            let avg_wpm = if f.count == 0 {
                0
            } else {
                (f.wpm_sum as f64 / f.count as f64).round() as u32
            };
            LeaderboardRow {
                rank: 0,
                id: u.id.clone(),
                user: u.name.clone(),
                top_speed: f.top_speed,
                avg_wpm,
                accuracy: f.accuracy,
                test_count: f.count,
                trend: if f.count > TREND_UP_MIN_TESTS { "up" } else { "flat" },
            }
        })
        .collect();

    rows.sort_by(|a, b| {
        b.top_speed
            .cmp(&a.top_speed)
            .then_with(|| a.user.cmp(&b.user))
            .then_with(|| a.id.cmp(&b.id))
    });
    for (i, row) in rows.iter_mut().enumerate() {
        row.rank = i + 1;
    }
    rows
}

/// Compute a board straight from the store.
pub async fn compute(
    store: &dyn RecordStore,
    query: LeaderboardQuery,
    now: DateTime<Utc>,
) -> Result<Vec<LeaderboardRow>, StorageError> {
    let users = store.list_users().await?;
    let results = store
        .results_since(query.window.floor(now), query.category)
        .await?;
    Ok(rank(&users, &results))
}

struct CachedBoard {
    computed_at: Instant,
    rows: Arc<Vec<LeaderboardRow>>,
}

/// Boards may be served up to `ttl` stale.
pub struct LeaderboardCache {
    ttl: Duration,
    boards: RwLock<HashMap<LeaderboardQuery, CachedBoard>>,
}

impl LeaderboardCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            boards: RwLock::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub async fn get_or_compute(
        &self,
        store: &dyn RecordStore,
        query: LeaderboardQuery,
    ) -> Result<Arc<Vec<LeaderboardRow>>, StorageError> {
        {
            let boards = self.boards.read().await;
            if let Some(board) = boards.get(&query) {
                if board.computed_at.elapsed() < self.ttl {
                    return Ok(Arc::clone(&board.rows));
                }
            }
        }

        let rows = Arc::new(compute(store, query, Utc::now()).await?);
        debug!(window = %query.window, category = ?query.category, rows = rows.len(), "Recomputed leaderboard");

        let mut boards = self.boards.write().await;
        boards.insert(
            query,
            CachedBoard {
                computed_at: Instant::now(),
                rows: Arc::clone(&rows),
            },
        );
        Ok(rows)
    }

    pub async fn invalidate(&self) {
        self.boards.write().await.clear();
    }
}
