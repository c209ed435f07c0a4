use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::state::AppState;
use crate::api::{current_user, ApiError};
use crate::models::{CadenceStats, Category, MissFrequency, ResultMetrics, TypingResult};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResultRequest {
    #[serde(alias = "category")]
    pub challenge_type: Option<String>,
    pub wpm: Option<u32>,
    pub accuracy: Option<u32>,
    pub time_taken: Option<u32>,
    pub missed_chars: Option<MissFrequency>,
    pub missed_words: Option<MissFrequency>,
    #[serde(alias = "cadence")]
    pub cadence_stats: Option<CadenceStats>,
}

#[derive(Debug, Serialize)]
pub struct SubmitResultResponse {
    pub saved: bool,
    pub message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<TypingResult>,
}

impl SubmitResultRequest {
    /// Check the payload before anything is written.
    fn validate(self) -> Result<(Category, ResultMetrics), ApiError> {
        let (Some(kind), Some(wpm), Some(accuracy), Some(time_taken)) =
            (self.challenge_type, self.wpm, self.accuracy, self.time_taken)
        else {
            return Err(ApiError::BadRequest("Invalid payload data".to_string()));
        };
        let category: Category = kind
            .parse()
            .map_err(|e: crate::models::UnknownCategory| ApiError::BadRequest(e.to_string()))?;
        if accuracy > 100 {
            return Err(ApiError::BadRequest(format!(
                "Accuracy must be between 0 and 100 (got {})",
                accuracy
            )));
        }

        Ok((
            category,
            ResultMetrics {
                wpm,
                accuracy: accuracy as u8,
                time_taken,
                missed_chars: self.missed_chars,
                missed_words: self.missed_words,
                cadence: self.cadence_stats,
            },
        ))
    }
}

/// Persist a finished session's metrics. Guests are validated but not saved.
pub async fn submit_result(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<SubmitResultRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SubmitResultResponse>), ApiError> {
    let Json(payload) = payload?;
    let (category, metrics) = payload.validate()?;

    let Some(user_id) = current_user(&headers) else {
        debug!(%category, "Guest result processed locally");
        return Ok((
            StatusCode::OK,
            Json(SubmitResultResponse {
                saved: false,
                message: "Guest result processed locally",
                result: None,
            }),
        ));
    };

    if state.store.find_user(&user_id).await?.is_none() {
        return Err(ApiError::NotFound(format!("User {}", user_id)));
    }

    let result = TypingResult::new(user_id, category, metrics);
    state.store.append_result(&result).await?;

    Ok((
        StatusCode::CREATED,
        Json(SubmitResultResponse {
            saved: true,
            message: "Result saved",
            result: Some(result),
        }),
    ))
}
