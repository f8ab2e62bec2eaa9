//! Bearer-token authentication.
//!
//! Identity is delegated to an external provider; this extractor only
//! validates the signed token and yields the subject claim that scopes every
//! flashcard query.

use axum::{extract::FromRequestParts, http::header, http::request::Parts};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::Deserialize;

use crate::{AppState, error::ApiError};

#[derive(Debug, Deserialize)]
struct Claims {
    sub: String,
    #[allow(dead_code)]
    exp: usize,
}

/// The authenticated caller. All card access is scoped to `id`.
pub struct AuthUser {
    pub id: String,
}

fn decode_user_id(token: &str, key: &DecodingKey) -> Result<String, jsonwebtoken::errors::Error> {
    let data = decode::<Claims>(token, key, &Validation::new(Algorithm::HS256))?;
    Ok(data.claims.sub)
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(ApiError::Unauthorized)?;
        let token = header
            .strip_prefix("Bearer ")
            .ok_or(ApiError::Unauthorized)?;

        let id = decode_user_id(token, state.jwt_decoding_key())
            .map_err(|_| ApiError::Unauthorized)?;

        Ok(AuthUser { id })
    }
}

#[cfg(test)]
mod tests {
    use jsonwebtoken::{EncodingKey, Header, encode};
    use serde::Serialize;

    use super::*;

    #[derive(Serialize)]
    struct TestClaims {
        sub: String,
        exp: usize,
    }

    fn token(secret: &[u8], sub: &str) -> String {
        let claims = TestClaims {
            sub: sub.to_string(),
            exp: 4_102_444_800, // far future
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret),
        )
        .unwrap()
    }

    #[test]
    fn valid_token_yields_subject() {
        let secret = b"test-secret";
        let token = token(secret, "user-42");
        let id = decode_user_id(&token, &DecodingKey::from_secret(secret)).unwrap();
        assert_eq!(id, "user-42");
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let token = token(b"other-secret", "user-42");
        assert!(decode_user_id(&token, &DecodingKey::from_secret(b"test-secret")).is_err());
    }
}
