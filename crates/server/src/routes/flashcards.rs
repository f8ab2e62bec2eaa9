//! Routes for flashcard CRUD and the study/player views.

use axum::{
    Router,
    extract::{Path, Query, State},
    response::Json as ResponseJson,
    response::sse::{Event, KeepAlive, Sse},
    routing::{get, put},
};
use db::models::flashcard::{CreateFlashcard, Flashcard, UpdateFlashcard};
use futures_util::{Stream, StreamExt};
use rand::seq::SliceRandom;
use serde::Deserialize;
use services::services::card_watch::CardListWatcher;
use tokio_stream::wrappers::WatchStream;
use tracing::info;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{AppState, auth::AuthUser, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct ListFlashcardsQuery {
    /// When set, cards come back in a shuffled study order instead of
    /// newest-first.
    #[serde(default)]
    pub shuffle: bool,
}

/// GET /api/flashcards
pub async fn list_flashcards(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ListFlashcardsQuery>,
) -> Result<ResponseJson<ApiResponse<Vec<Flashcard>>>, ApiError> {
    let mut cards = Flashcard::list_for_user(&state.db().pool, &user.id).await?;

    if query.shuffle {
        cards.shuffle(&mut rand::thread_rng());
    }

    Ok(ResponseJson(ApiResponse::success(cards)))
}

/// GET /api/flashcards/count
pub async fn flashcard_count(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<ResponseJson<ApiResponse<i64>>, ApiError> {
    let count = Flashcard::count_for_user(&state.db().pool, &user.id).await?;
    Ok(ResponseJson(ApiResponse::success(count)))
}

/// GET /api/flashcards/stream
///
/// Server-sent card-list snapshots, refreshed every five seconds while any
/// card is still waiting for its illustration. The stream ends once nothing
/// is pending.
pub async fn stream_flashcards(
    State(state): State<AppState>,
    user: AuthUser,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let (rx, _handle) = CardListWatcher::new(state.db().clone(), user.id).spawn();

    let stream = WatchStream::from_changes(rx)
        .map(|cards| Event::default().event("cards").json_data(&cards));

    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// POST /api/flashcards
///
/// Creates the card, then dispatches illustration generation in the
/// background: creation succeeds and returns whether or not the illustration
/// does.
pub async fn create_flashcard(
    State(state): State<AppState>,
    user: AuthUser,
    axum::Json(payload): axum::Json<CreateFlashcard>,
) -> Result<ResponseJson<ApiResponse<Flashcard>>, ApiError> {
    let (front, back) = validated_sides(&payload.front, &payload.back)?;

    let data = CreateFlashcard { front, back };
    let card = Flashcard::create(&state.db().pool, Uuid::new_v4(), &user.id, &data).await?;

    info!(card_id = %card.id, "created flashcard, dispatching illustration generation");
    state.card_image().spawn(card.id, user.id);

    Ok(ResponseJson(ApiResponse::success(card)))
}

/// PUT /api/flashcards/{card_id}
pub async fn update_flashcard(
    State(state): State<AppState>,
    user: AuthUser,
    Path(card_id): Path<Uuid>,
    axum::Json(payload): axum::Json<UpdateFlashcard>,
) -> Result<ResponseJson<ApiResponse<Flashcard>>, ApiError> {
    let (front, back) = validated_sides(&payload.front, &payload.back)?;

    let data = UpdateFlashcard { front, back };
    let card = Flashcard::update(&state.db().pool, card_id, &user.id, &data)
        .await?
        .ok_or(ApiError::CardNotFound)?;

    Ok(ResponseJson(ApiResponse::success(card)))
}

/// DELETE /api/flashcards/{card_id}
pub async fn delete_flashcard(
    State(state): State<AppState>,
    user: AuthUser,
    Path(card_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let deleted = Flashcard::delete(&state.db().pool, card_id, &user.id).await?;
    if deleted == 0 {
        return Err(ApiError::CardNotFound);
    }

    Ok(ResponseJson(ApiResponse::success(())))
}

fn validated_sides(front: &str, back: &str) -> Result<(String, String), ApiError> {
    let front = front.trim();
    if front.is_empty() {
        return Err(ApiError::Validation("Front side is required".to_string()));
    }
    let back = back.trim();
    if back.is_empty() {
        return Err(ApiError::Validation("Back side is required".to_string()));
    }
    Ok((front.to_string(), back.to_string()))
}

pub fn router() -> Router<AppState> {
    Router::new().nest(
        "/flashcards",
        Router::new()
            .route("/", get(list_flashcards).post(create_flashcard))
            .route("/count", get(flashcard_count))
            .route("/stream", get(stream_flashcards))
            .route("/{card_id}", put(update_flashcard).delete(delete_flashcard)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_trims_and_requires_both_sides() {
        let (front, back) = validated_sides("  Epidermis  ", " Outer skin layer ").unwrap();
        assert_eq!(front, "Epidermis");
        assert_eq!(back, "Outer skin layer");

        assert!(matches!(
            validated_sides("   ", "back"),
            Err(ApiError::Validation(_))
        ));
        assert!(matches!(
            validated_sides("front", "\t\n"),
            Err(ApiError::Validation(_))
        ));
    }
}
