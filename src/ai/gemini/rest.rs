use super::client::GeminiHttpClient;
use super::shapes::{parse_first, IMAGE_SHAPES, TEXT_SHAPES};
use crate::ai::{ImageBackend, ImageResult, TextBackend};
use crate::Result;
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

const TEMPERATURE: f32 = 0.45;

#[derive(Debug, Serialize)]
struct PromptText<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TextRequest<'a> {
    prompt: PromptText<'a>,
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ImageRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    size: &'a str,
}

/// `models/text-bison-001` and `text-bison-001` address the same model.
fn with_models_prefix(model: &str) -> String {
    if model.starts_with("models/") {
        model.to_string()
    } else {
        format!("models/{}", model)
    }
}

/// Single-shot text generation over `v1/{model}:generate`.
pub struct GeminiRestText {
    http: GeminiHttpClient,
    model: String,
    max_output_tokens: u32,
    timeout: Duration,
}

impl GeminiRestText {
    pub fn new(
        http: GeminiHttpClient,
        model: &str,
        max_output_tokens: u32,
        timeout: Duration,
    ) -> Self {
        Self {
            http,
            model: with_models_prefix(model),
            max_output_tokens,
            timeout,
        }
    }
}

#[async_trait]
impl TextBackend for GeminiRestText {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let request = TextRequest {
            prompt: PromptText { text: prompt },
            temperature: TEMPERATURE,
            max_output_tokens: self.max_output_tokens,
        };

        let path = format!("/v1/{}:generate", self.model);
        let body = self.http.post_json(&path, &request, self.timeout).await?;
        parse_first(TEXT_SHAPES, &body)
    }
}

/// Single-shot image generation over `v1/images:generate`.
pub struct GeminiRestImage {
    http: GeminiHttpClient,
    model: String,
    size: String,
    timeout: Duration,
}

impl GeminiRestImage {
    pub fn new(http: GeminiHttpClient, model: String, size: String, timeout: Duration) -> Self {
        Self {
            http,
            model,
            size,
            timeout,
        }
    }
}

#[async_trait]
impl ImageBackend for GeminiRestImage {
    async fn render(&self, prompt: &str) -> Result<ImageResult> {
        let request = ImageRequest {
            model: &self.model,
            prompt,
            size: &self.size,
        };

        let body = self
            .http
            .post_json("/v1/images:generate", &request, self.timeout)
            .await?;
        parse_first(IMAGE_SHAPES, &body)
    }
}
