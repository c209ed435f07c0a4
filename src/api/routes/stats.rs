use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;

use crate::analytics::StatsSnapshot;
use crate::api::state::AppState;
use crate::api::{require_user, ApiError};

/// The signed-in user's full statistics snapshot.
pub async fn user_stats(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<StatsSnapshot>, ApiError> {
    let user_id = require_user(&headers)?;
    if state.store.find_user(&user_id).await?.is_none() {
        return Err(ApiError::NotFound(format!("User {}", user_id)));
    }

    let snapshot = state.stats.snapshot(&user_id).await?;
    Ok(Json(snapshot))
}
