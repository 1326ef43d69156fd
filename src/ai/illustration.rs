use super::gemini::{GeminiHttpClient, GeminiRestImage, GeminiStreamImage};
use super::retry::with_retries;
use super::{ImageBackend, ImageGenerator, ImageResult};
use crate::config::{Config, RetryPolicy};
use crate::Result;
use async_trait::async_trait;
use tracing::{error, info, warn};

/// Returned when no provider credentials are configured.
pub const PLACEHOLDER_IMAGE_URL: &str =
    "https://via.placeholder.com/1024x1024.png?text=Scary+Image";

/// Illustration generation, shaped like [`super::StoryClient`].
pub struct IllustrationClient {
    streaming: Box<dyn ImageBackend>,
    rest: Box<dyn ImageBackend>,
    retry: RetryPolicy,
    placeholder_mode: bool,
}

impl IllustrationClient {
    pub fn from_config(config: &Config, client: reqwest::Client) -> Self {
        let http = GeminiHttpClient::new_with_client(
            config.credentials.clone(),
            config.base_url.clone(),
            client,
        );

        let streaming = GeminiStreamImage::new(
            http.clone(),
            config.models.stream_image_model.clone(),
            config.models.stream_image_size(),
        );
        let rest = GeminiRestImage::new(
            http,
            config.models.rest_image_model.clone(),
            config.models.rest_image_size(),
            config.image_retry.attempt_timeout,
        );

        let mut illustration =
            Self::with_backends(Box::new(streaming), Box::new(rest), config.image_retry);
        illustration.placeholder_mode = !config.credentials.is_configured();
        illustration
    }

    pub fn with_backends(
        streaming: Box<dyn ImageBackend>,
        rest: Box<dyn ImageBackend>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            streaming,
            rest,
            retry,
            placeholder_mode: false,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.placeholder_mode
    }
}

#[async_trait]
impl ImageGenerator for IllustrationClient {
    async fn generate_image(&self, prompt: &str) -> Result<ImageResult> {
        if self.placeholder_mode {
            info!("No provider credentials configured, returning placeholder image");
            return Ok(ImageResult::Url(PLACEHOLDER_IMAGE_URL.to_string()));
        }

        match with_retries(self.retry, "image stream", || self.streaming.render(prompt)).await {
            Ok(image) => Ok(image),
            Err(e) => {
                warn!("Streaming image generation failed ({}), falling back to REST", e);
                self.rest.render(prompt).await.map_err(|e| {
                    error!("REST image generation failed: {}", e);
                    e
                })
            }
        }
    }
}
