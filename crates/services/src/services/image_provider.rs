//! Text-to-image provider client.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use bytes::Bytes;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

const OPENAI_IMAGES_URL: &str = "https://api.openai.com/v1/images/generations";
const DEFAULT_MODEL: &str = "dall-e-3";

/// Retries after the first attempt: 3 attempts total, delays 1s then 2s.
const MAX_RETRIES: usize = 2;

#[derive(Debug, Clone, Error)]
pub enum ImageProviderError {
    #[error("network error: {0}")]
    Transport(String),
    #[error("timeout")]
    Timeout,
    #[error("http {status}: {body}")]
    Http { status: u16, body: String },
    #[error("rate limited")]
    RateLimited,
    #[error("invalid api key")]
    InvalidApiKey,
    #[error("json error: {0}")]
    Serde(String),
    #[error("no image url in provider response")]
    MissingImageUrl,
    #[error("image download failed: {0}")]
    Download(String),
    #[error("missing api key: OPENAI_API_KEY environment variable not set")]
    MissingApiKey,
}

/// Capability that turns a styled prompt into raw image bytes.
#[async_trait]
pub trait ImageProvider: Send + Sync {
    async fn generate_image(&self, prompt: &str) -> Result<Bytes, ImageProviderError>;
}

/// Request body for the images endpoint
#[derive(Debug, Serialize)]
struct ImageGenerationRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    n: u8,
    size: &'a str,
    quality: &'a str,
    response_format: &'a str,
}

/// Response from the images endpoint
#[derive(Debug, Deserialize)]
struct ImageGenerationResponse {
    data: Vec<GeneratedImage>,
}

#[derive(Debug, Deserialize)]
struct GeneratedImage {
    url: Option<String>,
}

/// OpenAI image generation client
#[derive(Debug, Clone)]
pub struct OpenAiImageProvider {
    http: Client,
    api_key: String,
    model: String,
}

impl OpenAiImageProvider {
    const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

    /// Create a new provider using the OPENAI_API_KEY environment variable
    pub fn from_env() -> Result<Self, ImageProviderError> {
        let api_key =
            std::env::var("OPENAI_API_KEY").map_err(|_| ImageProviderError::MissingApiKey)?;
        Self::new(api_key, None)
    }

    /// Create a new provider with the given API key
    pub fn new(api_key: String, model: Option<String>) -> Result<Self, ImageProviderError> {
        let http = Client::builder()
            .timeout(Self::REQUEST_TIMEOUT)
            .user_agent(concat!("cardbox/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ImageProviderError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            api_key,
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        })
    }

    /// One end-to-end attempt: request a generation, then download the bytes
    /// at the returned location.
    async fn attempt(&self, prompt: &str) -> Result<Bytes, ImageProviderError> {
        let request = ImageGenerationRequest {
            model: &self.model,
            prompt,
            n: 1,
            size: "1024x1024",
            quality: "standard",
            response_format: "url",
        };

        let res = self
            .http
            .post(OPENAI_IMAGES_URL)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let response = match res.status() {
            s if s.is_success() => res
                .json::<ImageGenerationResponse>()
                .await
                .map_err(|e| ImageProviderError::Serde(e.to_string()))?,
            StatusCode::UNAUTHORIZED => return Err(ImageProviderError::InvalidApiKey),
            StatusCode::TOO_MANY_REQUESTS => return Err(ImageProviderError::RateLimited),
            s => {
                let status = s.as_u16();
                let body = res.text().await.unwrap_or_default();
                return Err(ImageProviderError::Http { status, body });
            }
        };

        let image_url = response
            .data
            .first()
            .and_then(|image| image.url.as_deref())
            .ok_or(ImageProviderError::MissingImageUrl)?;

        self.download(image_url).await
    }

    async fn download(&self, url: &str) -> Result<Bytes, ImageProviderError> {
        let res = self.http.get(url).send().await.map_err(map_reqwest_error)?;
        if !res.status().is_success() {
            return Err(ImageProviderError::Download(format!(
                "http {}",
                res.status()
            )));
        }
        res.bytes()
            .await
            .map_err(|e| ImageProviderError::Download(e.to_string()))
    }
}

#[async_trait]
impl ImageProvider for OpenAiImageProvider {
    async fn generate_image(&self, prompt: &str) -> Result<Bytes, ImageProviderError> {
        retry_generation(|| self.attempt(prompt)).await
    }
}

/// Run `op` up to three times with 1s/2s backoff, surfacing the last error.
pub(crate) async fn retry_generation<F, Fut>(op: F) -> Result<Bytes, ImageProviderError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Bytes, ImageProviderError>>,
{
    op.retry(
        &ExponentialBuilder::default()
            .with_min_delay(Duration::from_secs(1))
            .with_max_times(MAX_RETRIES),
    )
    .notify(|e: &ImageProviderError, dur: Duration| {
        warn!(
            "image generation attempt failed, retrying after {:.2}s: {}",
            dur.as_secs_f64(),
            e
        )
    })
    .await
}

fn map_reqwest_error(e: reqwest::Error) -> ImageProviderError {
    if e.is_timeout() {
        ImageProviderError::Timeout
    } else {
        ImageProviderError::Transport(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn no_retry_after_first_success() {
        let attempts = AtomicUsize::new(0);

        let result = retry_generation(|| {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Ok(Bytes::from_static(b"png")) }
        })
        .await;

        assert!(result.is_ok());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_on_third_attempt() {
        let attempts = AtomicUsize::new(0);

        let result = retry_generation(|| {
            let n = attempts.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(ImageProviderError::Timeout)
                } else {
                    Ok(Bytes::from_static(b"png"))
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), Bytes::from_static(b"png"));
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_three_attempts_with_last_error() {
        let attempts = AtomicUsize::new(0);

        let result = retry_generation(|| {
            attempts.fetch_add(1, Ordering::SeqCst);
            async {
                Err(ImageProviderError::Http {
                    status: 500,
                    body: "server error".to_string(),
                })
            }
        })
        .await;

        assert_eq!(attempts.load(Ordering::SeqCst), 3);
        assert!(matches!(
            result,
            Err(ImageProviderError::Http { status: 500, .. })
        ));
    }
}
