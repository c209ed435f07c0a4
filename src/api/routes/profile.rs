use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::analytics::StatsSummary;
use crate::api::state::AppState;
use crate::api::{require_user, ApiError};
use crate::models::{Achievement, UserId};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: UserId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicStats {
    pub total_tests: usize,
    pub avg_wpm: u32,
    pub highest_accuracy: u8,
}

/// An unlocked badge with its catalog definition.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Badge {
    #[serde(flatten)]
    pub definition: Achievement,
    pub unlocked_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct PublicProfile {
    pub user: PublicUser,
    pub stats: PublicStats,
    pub badges: Vec<Badge>,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub message: &'static str,
}

/// Look up a user by display name, case-insensitively.
pub async fn public_profile(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<PublicProfile>, ApiError> {
    let user = state
        .store
        .find_user_by_name(&username)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("User {}", username)))?;

    let results = state.store.results_for_user(&user.id).await?;
    let summary = StatsSummary::from_results(&results);

    let mut unlocked = state.store.unlocked_achievements(&user.id).await?;
    unlocked.sort_by(|a, b| a.unlocked_at.cmp(&b.unlocked_at));
    let badges = unlocked
        .into_iter()
        .map(|u| Badge {
            definition: *u.achievement_id.definition(),
            unlocked_at: u.unlocked_at,
        })
        .collect();

    Ok(Json(PublicProfile {
        user: PublicUser {
            id: user.id,
            name: user.name,
            created_at: user.created_at,
        },
        stats: PublicStats {
            total_tests: summary.total_tests,
            avg_wpm: summary.avg_wpm,
            highest_accuracy: summary.highest_accuracy,
        },
        badges,
    }))
}

/// Permanently delete the signed-in user and everything they own.
pub async fn delete_account(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<DeleteResponse>, ApiError> {
    let user_id = require_user(&headers)?;
    if !state.store.delete_user(&user_id).await? {
        return Err(ApiError::NotFound(format!("User {}", user_id)));
    }
    state.leaderboard.invalidate().await;
    info!(user = %user_id, "Deleted account");

    Ok(Json(DeleteResponse {
        success: true,
        message: "Account permanently deleted",
    }))
}
