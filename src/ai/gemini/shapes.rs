//! Response shapes accepted from the REST endpoints.
//!
//! The endpoints have answered in several layouts over time. Each layout is
//! a named parser; they are tried in order and the first match wins. A body
//! no parser recognizes is an [`Error::UnrecognizedResponse`].

use crate::ai::ImageResult;
use crate::{Error, Result};
use serde_json::Value;

const BODY_PREVIEW_CHARS: usize = 200;

pub struct Shape<T> {
    pub name: &'static str,
    pub parse: fn(&Value) -> Option<T>,
}

pub const TEXT_SHAPES: &[Shape<String>] = &[
    Shape {
        name: "candidates[0].content",
        parse: candidate_content_string,
    },
    Shape {
        name: "candidates[0].content.parts[].text",
        parse: candidate_content_parts,
    },
    Shape {
        name: "output[0].content",
        parse: output_content,
    },
    Shape {
        name: "text",
        parse: top_level_text,
    },
];

pub const IMAGE_SHAPES: &[Shape<ImageResult>] = &[
    Shape {
        name: "data[0].b64_json",
        parse: data_b64_json,
    },
    Shape {
        name: "artifacts[0].base64",
        parse: artifacts_base64,
    },
    Shape {
        name: "images[0]",
        parse: first_image,
    },
    Shape {
        name: "predictions[0].bytesBase64Encoded",
        parse: prediction_bytes,
    },
    Shape {
        name: "imageUrl",
        parse: image_url_camel,
    },
    Shape {
        name: "image_url",
        parse: image_url_snake,
    },
    Shape {
        name: "b64_json",
        parse: top_level_b64_json,
    },
];

/// Apply `shapes` in order; the first parser that matches wins.
pub fn parse_first<T>(shapes: &[Shape<T>], body: &Value) -> Result<T> {
    for shape in shapes {
        if let Some(value) = (shape.parse)(body) {
            tracing::debug!("Matched provider response shape {}", shape.name);
            return Ok(value);
        }
    }

    let preview: String = body.to_string().chars().take(BODY_PREVIEW_CHARS).collect();
    Err(Error::UnrecognizedResponse(preview))
}

fn non_empty(value: &Value) -> Option<String> {
    value
        .as_str()
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn candidate_content_string(body: &Value) -> Option<String> {
    non_empty(&body["candidates"][0]["content"])
}

fn candidate_content_parts(body: &Value) -> Option<String> {
    let parts = body["candidates"][0]["content"]["parts"].as_array()?;
    let text: String = parts.iter().filter_map(|p| p["text"].as_str()).collect();
    (!text.is_empty()).then_some(text)
}

fn output_content(body: &Value) -> Option<String> {
    non_empty(&body["output"][0]["content"])
}

fn top_level_text(body: &Value) -> Option<String> {
    non_empty(&body["text"])
}

fn data_b64_json(body: &Value) -> Option<ImageResult> {
    non_empty(&body["data"][0]["b64_json"]).map(ImageResult::Base64)
}

fn artifacts_base64(body: &Value) -> Option<ImageResult> {
    non_empty(&body["artifacts"][0]["base64"]).map(ImageResult::Base64)
}

fn first_image(body: &Value) -> Option<ImageResult> {
    let first = non_empty(&body["images"][0])?;
    if first.starts_with("http") {
        Some(ImageResult::Url(first))
    } else {
        Some(ImageResult::Base64(first))
    }
}

fn prediction_bytes(body: &Value) -> Option<ImageResult> {
    non_empty(&body["predictions"][0]["bytesBase64Encoded"]).map(ImageResult::Base64)
}

fn image_url_camel(body: &Value) -> Option<ImageResult> {
    non_empty(&body["imageUrl"]).map(ImageResult::Url)
}

fn image_url_snake(body: &Value) -> Option<ImageResult> {
    non_empty(&body["image_url"]).map(ImageResult::Url)
}

fn top_level_b64_json(body: &Value) -> Option<ImageResult> {
    non_empty(&body["b64_json"]).map(ImageResult::Base64)
}
