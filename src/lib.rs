//! # Keysprint
//!
//! Typing-speed platform core: timed typing sessions, scoring, a persisted
//! history of results, per-user analytics with achievements, and leaderboards.
//!
//! ## Architecture
//!
//! - **models**: Core data structures (users, results, achievements, challenges)
//! - **challenges**: Built-in texts and custom-content normalization
//! - **session**: Session clock and input capture
//! - **scoring**: Pure scoring of a finished session
//! - **storage**: Record store over JSONL files
//! - **analytics**: Statistics snapshots, achievements and training insights
//! - **leaderboard**: Windowed, cached rankings
//! - **api**: REST API endpoints
//! - **config**: Configuration loading and validation

pub mod analytics;
pub mod api;
pub mod challenges;
pub mod config;
pub mod leaderboard;
pub mod models;
pub mod scoring;
pub mod session;
pub mod storage;

pub use models::*;

use std::time::Duration;

/// Parse a duration such as "2m", "90s" or "1h". Bare numbers are seconds.
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    let (num_str, multiplier) = if let Some(n) = s.strip_suffix('h') {
        (n, 3600)
    } else if let Some(n) = s.strip_suffix('m') {
        (n, 60)
    } else if let Some(n) = s.strip_suffix('s') {
        (n, 1)
    } else {
        (s, 1)
    };

    let num: u64 = num_str.parse().ok()?;
    Some(Duration::from_secs(num.checked_mul(multiplier)?))
}
