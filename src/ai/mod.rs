//! AI service integration for story and image generation
//!
//! The generation clients wrap a streaming primary path and a REST fallback
//! of the Gemini API behind retry, timeout and placeholder-mode policies.

pub mod gemini;
pub mod illustration;
pub mod mime;
pub mod mock;
pub mod retry;
pub mod story;

pub use illustration::{IllustrationClient, PLACEHOLDER_IMAGE_URL};
pub use mock::{MockImageGenerator, MockTextGenerator};
pub use story::StoryClient;

use crate::Result;
use async_trait::async_trait;
use base64::Engine as _;

/// Image produced by the provider, before normalization for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageResult {
    Url(String),
    Base64(String),
}

impl ImageResult {
    /// Wrap text the provider returned in place of an image.
    pub fn from_text(text: &str) -> Self {
        ImageResult::Url(format!(
            "data:text/plain;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(text)
        ))
    }

    /// A reference the client can put straight into an `<img src>`.
    pub fn into_display_url(self) -> String {
        match self {
            ImageResult::Url(url) => url,
            ImageResult::Base64(data) => mime::image_data_url(&data),
        }
    }
}

/// Produces story text for a prompt.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate_text(&self, prompt: &str) -> Result<String>;
}

/// Produces an illustration for a prompt.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate_image(&self, prompt: &str) -> Result<ImageResult>;
}

/// One transport for text generation (streaming or REST).
#[async_trait]
pub trait TextBackend: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// One transport for image generation (streaming or REST).
#[async_trait]
pub trait ImageBackend: Send + Sync {
    async fn render(&self, prompt: &str) -> Result<ImageResult>;
}
