use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::api::state::AppState;
use crate::api::{require_user, ApiError};
use crate::challenges::{catalog, new_custom_challenge};
use crate::models::{
    Category, Challenge, ChallengeError, ChallengeId, CustomChallenge, Rating, Review, User,
};

/// Newest custom challenges returned by the listing.
pub const CUSTOM_LIST_LIMIT: usize = 50;

#[derive(Debug, Serialize)]
pub struct DataResponse<T> {
    pub data: T,
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub count: usize,
    pub data: Vec<CustomChallenge>,
}

#[derive(Debug, Serialize)]
pub struct ReviewResponse {
    pub message: &'static str,
    pub data: Vec<Review>,
}

#[derive(Debug, Deserialize)]
pub struct CreateChallengeRequest {
    pub title: Option<String>,
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    pub rating: Option<String>,
    pub comment: Option<String>,
}

async fn signed_in_user(state: &AppState, headers: &HeaderMap) -> Result<User, ApiError> {
    let user_id = require_user(headers)?;
    state
        .store
        .find_user(&user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("User {}", user_id)))
}

/// A built-in challenge for a category. The daily text is fixed per local day.
pub async fn builtin_challenge(
    State(state): State<AppState>,
    Path(category): Path<String>,
) -> Result<Json<DataResponse<Challenge>>, ApiError> {
    let category: Category = category
        .parse()
        .map_err(|e: crate::models::UnknownCategory| ApiError::NotFound(e.to_string()))?;
    let today = Utc::now()
        .with_timezone(&state.config.analytics.offset())
        .date_naive();

    let challenge = {
        let mut rng = rand::thread_rng();
        catalog::pick(category, today, &mut rng)
    };
    challenge
        .map(|data| Json(DataResponse { data }))
        .ok_or_else(|| {
            ApiError::NotFound(format!(
                "No built-in texts for {}; use /api/custom-challenges",
                category
            ))
        })
}

pub async fn list_custom(State(state): State<AppState>) -> Result<Json<ListResponse>, ApiError> {
    let data = state.store.list_custom_challenges(CUSTOM_LIST_LIMIT).await?;
    Ok(Json(ListResponse {
        count: data.len(),
        data,
    }))
}

pub async fn create_custom(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<CreateChallengeRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<DataResponse<CustomChallenge>>), ApiError> {
    let creator = signed_in_user(&state, &headers).await?;
    let Json(payload) = payload?;

    let (Some(title), Some(content)) = (payload.title, payload.content) else {
        return Err(ChallengeError::MissingField.into());
    };
    let challenge = new_custom_challenge(&title, &content, &creator)?;
    state.store.insert_custom_challenge(&challenge).await?;
    info!(id = %challenge.id, creator = %creator.name, "Created custom challenge");

    Ok((StatusCode::CREATED, Json(DataResponse { data: challenge })))
}

/// Fetching a custom challenge for play counts as a play.
pub async fn play_custom(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DataResponse<CustomChallenge>>, ApiError> {
    let id = ChallengeId::from(id);
    let challenge = state
        .store
        .fetch_custom_challenge_for_play(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Challenge {}", id)))?;
    Ok(Json(DataResponse { data: challenge }))
}

pub async fn review_custom(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    payload: Result<Json<ReviewRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ReviewResponse>), ApiError> {
    let reviewer = signed_in_user(&state, &headers).await?;
    let Json(payload) = payload?;

    let rating: Rating = payload
        .rating
        .as_deref()
        .ok_or(ChallengeError::InvalidRating)?
        .parse()?;
    let review = Review::new(
        reviewer.id.clone(),
        reviewer.name.clone(),
        rating,
        payload.comment.as_deref().unwrap_or_default(),
    )?;

    let updated = state.store.add_review(&ChallengeId::from(id), review).await?;
    info!(id = %updated.id, reviewer = %reviewer.name, "Added review");

    Ok((
        StatusCode::CREATED,
        Json(ReviewResponse {
            message: "Review added successfully",
            data: updated.reviews,
        }),
    ))
}
