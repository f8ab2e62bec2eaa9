//! Trigger route for card illustration generation.

use axum::{Router, extract::State, response::Json as ResponseJson, routing::post};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{AppState, auth::AuthUser, error::ApiError};

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct GenerateImageRequest {
    pub card_id: Uuid,
}

/// POST /api/generate-image
///
/// Runs the full generation flow for one owned card and reports the outcome.
/// Safe to call again for a card whose image never arrived: a card that
/// already has an illustration short-circuits to success.
pub async fn generate_card_image(
    State(state): State<AppState>,
    user: AuthUser,
    axum::Json(payload): axum::Json<GenerateImageRequest>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    state.card_image().process(payload.card_id, &user.id).await?;
    Ok(ResponseJson(ApiResponse::success(())))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/generate-image", post(generate_card_image))
}
