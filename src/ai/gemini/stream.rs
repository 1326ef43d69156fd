use super::client::GeminiHttpClient;
use super::types::{
    Content, GenerateContentRequest, GenerationConfig, ImageConfig, Part, ThinkingConfig,
};
use crate::ai::{ImageBackend, ImageResult, TextBackend};
use crate::{Error, Result};
use async_trait::async_trait;
use tracing::debug;

fn stream_path(model: &str) -> String {
    format!(
        "/v1beta/models/{}:streamGenerateContent?alt=sse",
        model.trim_start_matches("models/")
    )
}

/// Story text over `streamGenerateContent`, concatenating every text part.
pub struct GeminiStreamText {
    http: GeminiHttpClient,
    model: String,
}

impl GeminiStreamText {
    pub fn new(http: GeminiHttpClient, model: String) -> Self {
        Self { http, model }
    }
}

#[async_trait]
impl TextBackend for GeminiStreamText {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let request = GenerateContentRequest {
            contents: vec![Content::user_text(prompt)],
            generation_config: GenerationConfig {
                thinking_config: Some(ThinkingConfig {
                    thinking_budget: -1,
                }),
                ..Default::default()
            },
        };

        let mut reader = self
            .http
            .post_stream(&stream_path(&self.model), &request)
            .await?;

        let mut story = String::new();
        while let Some(chunk) = reader.next_chunk().await? {
            for part in chunk.parts() {
                if let Part::Text { text } = part {
                    story.push_str(text);
                }
            }
        }

        if story.is_empty() {
            return Err(Error::EmptyResponse(format!(
                "text stream from {} carried no text",
                self.model
            )));
        }

        debug!("Streamed {} chars of story text", story.chars().count());
        Ok(story)
    }
}

/// Illustration over `streamGenerateContent` with image and text modalities.
///
/// Returns as soon as the first inline image arrives; the rest of the stream
/// is dropped. A stream carrying only text yields that text as a data URL.
pub struct GeminiStreamImage {
    http: GeminiHttpClient,
    model: String,
    image_size: String,
}

impl GeminiStreamImage {
    pub fn new(http: GeminiHttpClient, model: String, image_size: String) -> Self {
        Self {
            http,
            model,
            image_size,
        }
    }
}

#[async_trait]
impl ImageBackend for GeminiStreamImage {
    async fn render(&self, prompt: &str) -> Result<ImageResult> {
        let request = GenerateContentRequest {
            contents: vec![Content::user_text(prompt)],
            generation_config: GenerationConfig {
                response_modalities: Some(vec!["IMAGE".to_string(), "TEXT".to_string()]),
                image_config: Some(ImageConfig {
                    image_size: self.image_size.clone(),
                }),
                ..Default::default()
            },
        };

        let mut reader = self
            .http
            .post_stream(&stream_path(&self.model), &request)
            .await?;

        let mut text = String::new();
        while let Some(chunk) = reader.next_chunk().await? {
            for part in chunk.parts() {
                match part {
                    Part::InlineData { inline_data } if !inline_data.data.is_empty() => {
                        debug!("Received inline image ({})", inline_data.mime_type);
                        return Ok(ImageResult::Base64(inline_data.data.clone()));
                    }
                    Part::Text { text: t } => text.push_str(t),
                    _ => {}
                }
            }
        }

        if text.is_empty() {
            return Err(Error::EmptyResponse(format!(
                "image stream from {} carried no image",
                self.model
            )));
        }

        Ok(ImageResult::from_text(&text))
    }
}
