//! Data models exchanged between the service, its HTTP layer and the client
//!
//! `GenerateResponse` is the wire shape of `POST /api/generate`; the client
//! deserializes the same type.

use serde::{Deserialize, Serialize};

/// Generated story with its illustration, as produced by [`crate::app::App`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedStory {
    pub title: String,
    pub content: String,
    /// Absolute URL or `data:` URI.
    pub image_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl GenerateResponse {
    pub fn success(story: GeneratedStory) -> Self {
        Self {
            success: true,
            title: Some(story.title),
            content: Some(story.content),
            image_url: Some(story.image_url),
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            title: None,
            content: None,
            image_url: None,
            error: Some(message.into()),
        }
    }

    /// The story carried by a successful response.
    pub fn into_story(self) -> Option<GeneratedStory> {
        if !self.success {
            return None;
        }
        Some(GeneratedStory {
            title: self.title.unwrap_or_default(),
            content: self.content?,
            image_url: self.image_url.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InfoResponse {
    pub ok: bool,
    pub info: String,
}
