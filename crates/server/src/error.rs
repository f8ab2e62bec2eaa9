use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use services::services::card_image::CardImageError;
use thiserror::Error;
use tracing::error;
use utils::response::ApiResponse;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("unauthorized")]
    Unauthorized,
    #[error("{0}")]
    Validation(String),
    #[error("card not found")]
    CardNotFound,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("card image error: {0}")]
    CardImage(#[from] CardImageError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Users get a generic message; the detail stays in the log.
        let (status, message) = match &self {
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            ApiError::Validation(message) => (StatusCode::BAD_REQUEST, message.clone()),
            ApiError::CardNotFound => (StatusCode::NOT_FOUND, "Card not found".to_string()),
            ApiError::Database(e) => {
                error!(error = %e, "request failed on database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            ApiError::CardImage(CardImageError::NotFound) => {
                (StatusCode::NOT_FOUND, "Card not found".to_string())
            }
            ApiError::CardImage(e) => {
                error!(error = %e, "image generation request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Image generation failed".to_string(),
                )
            }
        };

        (status, Json(ApiResponse::<()>::error(message))).into_response()
    }
}
