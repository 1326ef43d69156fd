//! Application orchestration: story first, then its illustration.

use crate::ai::{IllustrationClient, ImageGenerator, StoryClient, TextGenerator};
use crate::config::Config;
use crate::keywords::KeywordSet;
use crate::models::GeneratedStory;
use crate::{prompts, Result};
use std::sync::Arc;
use tracing::{error, info};

/// Runs one generation: story prompt, story text, image prompt, image.
///
/// Cheap to clone; every request handler shares the same clients.
#[derive(Clone)]
pub struct App {
    text: Arc<dyn TextGenerator>,
    image: Arc<dyn ImageGenerator>,
}

/// Injectable service bundle used to construct [`App`] in tests/harnesses.
pub struct AppServices {
    pub text: Arc<dyn TextGenerator>,
    pub image: Arc<dyn ImageGenerator>,
}

impl App {
    pub fn with_services(services: AppServices) -> Self {
        Self {
            text: services.text,
            image: services.image,
        }
    }

    /// Build the Gemini-backed clients from configuration.
    pub fn from_config(config: &Config) -> Self {
        // Reuse one HTTP connection pool across provider clients.
        let http_client = reqwest::Client::new();

        let text = StoryClient::from_config(config, http_client.clone());
        let image = IllustrationClient::from_config(config, http_client);

        if text.is_placeholder() {
            info!("No provider credentials found, running in placeholder mode");
        } else {
            info!(
                "Text models: {} (stream), {} (REST)",
                config.models.stream_text_model, config.models.rest_text_model
            );
            info!(
                "Image models: {} (stream), {} (REST)",
                config.models.stream_image_model, config.models.rest_image_model
            );
        }

        Self::with_services(AppServices {
            text: Arc::new(text),
            image: Arc::new(image),
        })
    }

    pub async fn generate(&self, keywords: &KeywordSet) -> Result<GeneratedStory> {
        info!("Generating story for {} keyword(s): {}", keywords.len(), keywords.join(", "));

        let story_prompt = prompts::story_prompt(keywords);
        let content = self.text.generate_text(&story_prompt).await.map_err(|e| {
            error!("Story generation failed: {}", e);
            e
        })?;
        info!("Generated story ({} chars)", content.chars().count());

        let image_prompt = prompts::image_prompt(&content);
        let image = self.image.generate_image(&image_prompt).await.map_err(|e| {
            error!("Image generation failed: {}", e);
            e
        })?;
        info!("Generated illustration");

        Ok(GeneratedStory {
            title: prompts::title_for(keywords),
            content,
            image_url: image.into_display_url(),
        })
    }
}
