//! Orchestrates illustration generation for a single flashcard.

use std::sync::Arc;

use db::{DBService, models::flashcard::Flashcard};
use thiserror::Error;
use tracing::{debug, error, info};
use uuid::Uuid;

use super::blob_store::{BlobStore, BlobStoreError};
use super::image_provider::{ImageProvider, ImageProviderError};
use super::prompt::build_image_prompt;

#[derive(Debug, Error)]
pub enum CardImageError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("card not found")]
    NotFound,
    #[error("image generation failed: {0}")]
    Generation(#[source] ImageProviderError),
    #[error("image upload failed: {0}")]
    Storage(#[source] BlobStoreError),
}

/// Ties prompt building, generation and storage together for one card.
///
/// Both capabilities are injected so tests (or another provider/store) can be
/// substituted without touching process-wide state.
#[derive(Clone)]
pub struct CardImageService {
    db: DBService,
    provider: Arc<dyn ImageProvider>,
    blob_store: Arc<dyn BlobStore>,
}

impl CardImageService {
    pub fn new(
        db: DBService,
        provider: Arc<dyn ImageProvider>,
        blob_store: Arc<dyn BlobStore>,
    ) -> Self {
        Self {
            db,
            provider,
            blob_store,
        }
    }

    /// Generate and persist an illustration for the given card.
    ///
    /// Linear sequence, each step a potential short-circuit: load the
    /// owner-scoped card, skip if an image already exists, build the prompt,
    /// generate, upload, persist the URL (owner-scoped again). Every failure
    /// comes back as a `CardImageError`; a failed run leaves the card row
    /// untouched, so re-invoking later is safe.
    pub async fn process(&self, card_id: Uuid, user_id: &str) -> Result<(), CardImageError> {
        let card = Flashcard::find_for_user(&self.db.pool, card_id, user_id)
            .await?
            .ok_or(CardImageError::NotFound)?;

        // A populated URL is final; a second invocation must not spend
        // another provider call.
        if card.image_url.is_some() {
            debug!(card_id = %card_id, "card already has an illustration, skipping");
            return Ok(());
        }

        let prompt = build_image_prompt(&card.back);

        let image = self
            .provider
            .generate_image(&prompt)
            .await
            .map_err(CardImageError::Generation)?;

        let url = self
            .blob_store
            .store_card_image(card_id, image)
            .await
            .map_err(CardImageError::Storage)?;

        Flashcard::set_image_url(&self.db.pool, card_id, user_id, &url).await?;

        info!(card_id = %card_id, url = %url, "stored card illustration");
        Ok(())
    }

    /// Dispatch `process` as a detached background task.
    ///
    /// The caller is not waiting on the outcome: card creation succeeds
    /// whether or not the illustration does, and failures only surface in
    /// the log.
    pub fn spawn(&self, card_id: Uuid, user_id: String) {
        let service = self.clone();
        tokio::spawn(async move {
            if let Err(e) = service.process(card_id, &user_id).await {
                error!(card_id = %card_id, error = %e, "background illustration generation failed");
            }
        });
    }
}
