//! REST API endpoints.
//!
//! Axum-based HTTP boundary for result submission, user statistics,
//! leaderboards, public profiles and challenges. The authenticated user id
//! arrives in the `x-user-id` header from the upstream identity service; its
//! absence means a guest.

pub mod routes;
pub mod state;

use axum::{
    extract::rejection::JsonRejection,
    http::{HeaderMap, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

use crate::models::{ChallengeError, UserId};
use crate::storage::StorageError;
use state::AppState;

/// Header carrying the authenticated user id.
pub const USER_ID_HEADER: &str = "x-user-id";

/// API error types.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            ApiError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        let body = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message: self.to_string(),
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<StorageError> for ApiError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::NotFound(what) => ApiError::NotFound(what),
            StorageError::Conflict(what) => ApiError::Conflict(what),
            other => {
                error!("Storage failure: {}", other);
                ApiError::Internal("Internal server error".to_string())
            }
        }
    }
}

impl From<ChallengeError> for ApiError {
    fn from(e: ChallengeError) -> Self {
        match e {
            ChallengeError::AlreadyReviewed => ApiError::Conflict(e.to_string()),
            other => ApiError::BadRequest(other.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(e: JsonRejection) -> Self {
        ApiError::BadRequest(e.body_text())
    }
}

/// The authenticated user, if any.
pub fn current_user(headers: &HeaderMap) -> Option<UserId> {
    headers
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(UserId::from)
}

/// Like [`current_user`] but for endpoints that need a signed-in user.
pub fn require_user(headers: &HeaderMap) -> Result<UserId, ApiError> {
    current_user(headers).ok_or_else(|| ApiError::Unauthorized("Sign in required".to_string()))
}

/// Pagination parameters.
#[derive(Debug, Clone)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self { page: 1, limit: 50 }
    }
}

impl Pagination {
    pub fn new(page: Option<u32>, limit: Option<u32>, default_limit: u32, max_limit: u32) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(default_limit).clamp(1, max_limit.max(1)),
        }
    }

    pub fn offset(&self) -> usize {
        (self.page as usize - 1) * self.limit as usize
    }

    /// The slice of `items` on this page; empty past the end.
    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let start = self.offset().min(items.len());
        let end = (start + self.limit as usize).min(items.len());
        &items[start..end]
    }
}

/// Pagination metadata in responses.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    pub total: u32,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u32,
    pub has_next: bool,
    pub has_prev: bool,
}

impl PaginationMeta {
    pub fn new(pagination: &Pagination, total: u32) -> Self {
        let total_pages = total.div_ceil(pagination.limit);
        Self {
            total,
            page: pagination.page,
            limit: pagination.limit,
            total_pages,
            has_next: pagination.page < total_pages,
            has_prev: pagination.page > 1,
        }
    }
}

fn cors_layer(origin: &str) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers(Any);
    if origin == "*" {
        return layer.allow_origin(Any);
    }
    match origin.parse::<HeaderValue>() {
        Ok(value) => layer.allow_origin(value),
        Err(_) => {
            warn!("Invalid CORS origin {:?}, allowing any", origin);
            layer.allow_origin(Any)
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.server.cors_origin);

    Router::new()
        .route("/api/results", post(routes::results::submit_result))
        .route("/api/user/stats", get(routes::stats::user_stats))
        .route(
            "/api/user/profile",
            axum::routing::delete(routes::profile::delete_account),
        )
        .route("/api/user/:username", get(routes::profile::public_profile))
        .route("/api/leaderboard", get(routes::leaderboard::get_leaderboard))
        .route(
            "/api/challenges/:category",
            get(routes::challenges::builtin_challenge),
        )
        .route(
            "/api/custom-challenges",
            get(routes::challenges::list_custom).post(routes::challenges::create_custom),
        )
        .route(
            "/api/custom-challenges/:id",
            get(routes::challenges::play_custom),
        )
        .route(
            "/api/custom-challenges/:id/review",
            post(routes::challenges::review_custom),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_default() {
        let p = Pagination::default();
        assert_eq!(p.page, 1);
        assert_eq!(p.limit, 50);
        assert_eq!(p.offset(), 0);
    }

    #[test]
    fn test_pagination_bounds() {
        let p = Pagination::new(Some(0), None, 50, 100);
        assert_eq!(p.page, 1);
        assert_eq!(p.limit, 50);

        let p = Pagination::new(Some(1), Some(500), 50, 100);
        assert_eq!(p.limit, 100);

        let p = Pagination::new(Some(3), Some(0), 50, 100);
        assert_eq!(p.limit, 1);
        assert_eq!(p.offset(), 2);
    }

    #[test]
    fn test_pagination_slice() {
        let items: Vec<u32> = (1..=25).collect();
        let p = Pagination::new(Some(3), Some(10), 50, 100);
        assert_eq!(p.slice(&items), &[21, 22, 23, 24, 25]);

        let past_end = Pagination::new(Some(9), Some(10), 50, 100);
        assert!(past_end.slice(&items).is_empty());
    }

    #[test]
    fn test_pagination_meta() {
        let p = Pagination::new(Some(2), Some(10), 50, 100);
        let meta = PaginationMeta::new(&p, 25);

        assert_eq!(meta.total_pages, 3);
        assert!(meta.has_next);
        assert!(meta.has_prev);

        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["totalPages"], 3);
        assert_eq!(json["total"], 25);
    }

    #[test]
    fn test_current_user_header() {
        let mut headers = HeaderMap::new();
        assert!(current_user(&headers).is_none());
        assert!(matches!(
            require_user(&headers),
            Err(ApiError::Unauthorized(_))
        ));

        headers.insert(USER_ID_HEADER, HeaderValue::from_static("  "));
        assert!(current_user(&headers).is_none());

        headers.insert(USER_ID_HEADER, HeaderValue::from_static("abc123"));
        assert_eq!(current_user(&headers), Some(UserId::from("abc123")));
    }

    #[test]
    fn test_storage_errors_map_to_status() {
        let not_found: ApiError = StorageError::NotFound("x".to_string()).into();
        assert_eq!(not_found.into_response().status(), StatusCode::NOT_FOUND);

        let conflict: ApiError = StorageError::Conflict("x".to_string()).into();
        assert_eq!(conflict.into_response().status(), StatusCode::CONFLICT);

        let io: ApiError = StorageError::Io(std::io::Error::other("disk")).into();
        assert_eq!(
            io.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
