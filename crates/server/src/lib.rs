pub mod auth;
pub mod config;
pub mod error;
pub mod routes;

use db::DBService;
use jsonwebtoken::DecodingKey;
use services::services::card_image::CardImageService;

use crate::config::ServerConfig;

#[derive(Clone)]
pub struct AppState {
    db: DBService,
    card_image: CardImageService,
    jwt_decoding_key: DecodingKey,
}

impl AppState {
    pub fn new(db: DBService, card_image: CardImageService, config: &ServerConfig) -> Self {
        Self {
            db,
            card_image,
            jwt_decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        }
    }

    pub fn db(&self) -> &DBService {
        &self.db
    }

    pub fn card_image(&self) -> &CardImageService {
        &self.card_image
    }

    pub fn jwt_decoding_key(&self) -> &DecodingKey {
        &self.jwt_decoding_key
    }
}
