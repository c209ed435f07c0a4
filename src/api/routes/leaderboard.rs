use axum::extract::{Query, State};
use axum::http::header::CACHE_CONTROL;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::state::AppState;
use crate::api::{ApiError, Pagination, PaginationMeta};
use crate::leaderboard::{LeaderboardQuery, LeaderboardRow, TimeWindow};
use crate::models::Category;

#[derive(Debug, Deserialize)]
pub struct LeaderboardParams {
    pub range: Option<String>,
    pub category: Option<String>,
    /// Older clients send the category as `protocol`.
    pub protocol: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct LeaderboardResponse {
    pub data: Vec<LeaderboardRow>,
    pub pagination: PaginationMeta,
}

impl LeaderboardParams {
    fn query(&self) -> Result<LeaderboardQuery, ApiError> {
        let window = match self.range.as_deref() {
            None | Some("") => TimeWindow::default(),
            Some(range) => range
                .parse()
                .map_err(|e: crate::leaderboard::UnknownWindow| ApiError::BadRequest(e.to_string()))?,
        };
        let category = match self
            .category
            .as_deref()
            .or(self.protocol.as_deref())
            .filter(|c| !c.is_empty() && *c != "all")
        {
            None => None,
            Some(c) => Some(
                c.parse::<Category>()
                    .map_err(|e| ApiError::BadRequest(e.to_string()))?,
            ),
        };
        Ok(LeaderboardQuery { window, category })
    }
}

/// Ranked users for a window and optional category, paginated.
pub async fn get_leaderboard(
    State(state): State<AppState>,
    Query(params): Query<LeaderboardParams>,
) -> Result<Response, ApiError> {
    let query = params.query()?;
    let pagination = Pagination::new(
        params.page,
        params.limit,
        state.config.leaderboard.default_page_size,
        state.config.leaderboard.max_page_size,
    );

    let rows = state
        .leaderboard
        .get_or_compute(state.store.as_ref(), query)
        .await?;

    let meta = PaginationMeta::new(&pagination, rows.len() as u32);
    let body = LeaderboardResponse {
        data: pagination.slice(&rows).to_vec(),
        pagination: meta,
    };

    Ok((
        [(
            CACHE_CONTROL,
            "public, s-maxage=120, stale-while-revalidate=300",
        )],
        Json(body),
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use crate::api::routes::test_support::{get_json, send, setup_test_state};
    use crate::models::{Category, ResultMetrics, TypingResult, User};
    use crate::storage::RecordStore;
    use axum::http::StatusCode;

    async fn seed(store: &dyn RecordStore, name: &str, category: Category, wpm: u32) -> User {
        let user = store.insert_user(User::new(name).unwrap()).await.unwrap();
        let result = TypingResult::new(
            user.id.clone(),
            category,
            ResultMetrics {
                wpm,
                accuracy: 95,
                time_taken: 30,
                missed_chars: None,
                missed_words: None,
                cadence: None,
            },
        );
        store.append_result(&result).await.unwrap();
        user
    }

    #[tokio::test]
    async fn test_leaderboard_ranks_and_caches() {
        let tmp = tempfile::tempdir().unwrap();
        let (store, state) = setup_test_state(tmp.path());
        seed(store.as_ref(), "slow", Category::Standard, 40).await;
        seed(store.as_ref(), "fast", Category::Paragraph, 110).await;

        let (status, headers, json) = send(&state, "GET", "/api/leaderboard", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            headers.get("cache-control").unwrap(),
            "public, s-maxage=120, stale-while-revalidate=300"
        );
        assert_eq!(json["data"][0]["user"], "fast");
        assert_eq!(json["data"][0]["rank"], 1);
        assert_eq!(json["data"][0]["topSpeed"], 110);
        assert_eq!(json["data"][1]["user"], "slow");
        assert_eq!(json["pagination"]["total"], 2);
    }

    #[tokio::test]
    async fn test_leaderboard_category_and_pagination() {
        let tmp = tempfile::tempdir().unwrap();
        let (store, state) = setup_test_state(tmp.path());
        seed(store.as_ref(), "coder", Category::Developer, 60).await;
        seed(store.as_ref(), "writer", Category::Paragraph, 90).await;
        seed(store.as_ref(), "tester", Category::Developer, 75).await;

        let (status, json) = get_json(
            &state,
            "/api/leaderboard?range=weekly&protocol=developer&page=1&limit=2",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"].as_array().unwrap().len(), 2);
        assert_eq!(json["data"][0]["user"], "tester");
        assert_eq!(json["data"][1]["user"], "coder");
        assert_eq!(json["pagination"]["totalPages"], 2);
        assert_eq!(json["pagination"]["hasNext"], true);

        let (_, json) = get_json(
            &state,
            "/api/leaderboard?range=weekly&category=developer&page=2&limit=2",
            None,
        )
        .await;
        assert_eq!(json["data"][0]["user"], "writer");
        assert_eq!(json["data"][0]["topSpeed"], 0);
        assert_eq!(json["data"][0]["rank"], 3);
    }

    #[tokio::test]
    async fn test_leaderboard_rejects_unknown_filters() {
        let tmp = tempfile::tempdir().unwrap();
        let (_store, state) = setup_test_state(tmp.path());

        let (status, _) = get_json(&state, "/api/leaderboard?range=monthly", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = get_json(&state, "/api/leaderboard?category=morse", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, json) = get_json(&state, "/api/leaderboard?range=all-time&category=all", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["pagination"]["total"], 0);
    }
}
