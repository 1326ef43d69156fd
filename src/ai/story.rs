use super::gemini::{GeminiHttpClient, GeminiRestText, GeminiStreamText};
use super::retry::with_retries;
use super::{TextBackend, TextGenerator};
use crate::config::{Config, RetryPolicy};
use crate::{prompts, Result};
use async_trait::async_trait;
use tracing::{error, info, warn};

/// Story text generation: streaming first, REST as the fallback.
///
/// Without credentials the client runs in placeholder mode and never touches
/// the network.
pub struct StoryClient {
    streaming: Box<dyn TextBackend>,
    rest: Box<dyn TextBackend>,
    retry: RetryPolicy,
    placeholder_mode: bool,
}

impl StoryClient {
    pub fn from_config(config: &Config, client: reqwest::Client) -> Self {
        let http = GeminiHttpClient::new_with_client(
            config.credentials.clone(),
            config.base_url.clone(),
            client,
        );

        let streaming = GeminiStreamText::new(http.clone(), config.models.stream_text_model.clone());
        let rest = GeminiRestText::new(
            http,
            &config.models.rest_text_model,
            config.models.max_output_tokens,
            config.text_retry.attempt_timeout,
        );

        let mut story = Self::with_backends(Box::new(streaming), Box::new(rest), config.text_retry);
        story.placeholder_mode = !config.credentials.is_configured();
        story
    }

    pub fn with_backends(
        streaming: Box<dyn TextBackend>,
        rest: Box<dyn TextBackend>,
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
impl TextGenerator for StoryClient {
    async fn generate_text(&self, prompt: &str) -> Result<String> {
        if self.placeholder_mode {
            info!("No provider credentials configured, returning placeholder story");
            return Ok(prompts::placeholder_story(prompt));
        }

        let styled = prompts::styled_story_prompt(prompt);

        match with_retries(self.retry, "story stream", || self.streaming.complete(&styled)).await {
            Ok(story) => Ok(story),
            Err(e) => {
                warn!("Streaming story generation failed ({}), falling back to REST", e);
                self.rest.complete(&styled).await.map_err(|e| {
                    error!("REST story generation failed: {}", e);
                    e
                })
            }
        }
    }
}
