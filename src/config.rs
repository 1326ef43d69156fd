//! Service configuration assembled once at startup.
//!
//! Every tunable is read here and handed to the generation clients
//! explicitly; nothing else in the crate reads the environment.

use crate::{Error, Result};
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

const DEFAULT_STREAM_TEXT_MODEL: &str = "gemini-flash-latest";
const DEFAULT_REST_TEXT_MODEL: &str = "models/text-bison-001";
const DEFAULT_STREAM_IMAGE_MODEL: &str = "gemini-2.5-flash-image";
const DEFAULT_REST_IMAGE_MODEL: &str = "models/image-bison-001";
const DEFAULT_TEXT_TIMEOUT_MS: u64 = 15_000;
const DEFAULT_IMAGE_TIMEOUT_MS: u64 = 20_000;
const DEFAULT_RETRIES: u32 = 2;
const DEFAULT_BASE_DELAY_MS: u64 = 500;
const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 800;
const DEFAULT_CORS_METHODS: &str = "GET,HEAD,PUT,PATCH,POST,DELETE";
const DEFAULT_CORS_HEADERS: &str = "Content-Type,Authorization";

/// Provider credentials. Either one is enough to leave placeholder mode.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub api_key: Option<String>,
    pub bearer_token: Option<String>,
}

impl Credentials {
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some() || self.bearer_token.is_some()
    }
}

/// Bounded retry with exponential backoff and a hard per-attempt timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub retries: u32,
    pub base_delay: Duration,
    pub attempt_timeout: Duration,
}

/// Model names for the streaming (primary) and REST (fallback) paths.
#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub stream_text_model: String,
    pub rest_text_model: String,
    pub stream_image_model: String,
    pub rest_image_model: String,
    /// Raw `GOOGLE_IMAGE_SIZE`, if set.
    pub image_size: Option<String>,
    pub max_output_tokens: u32,
}

impl ModelConfig {
    /// Size hint for the streaming image request (`1K`, `2K`, ...).
    pub fn stream_image_size(&self) -> String {
        match self.image_size.as_deref() {
            None | Some("1024x1024") => "1K".to_string(),
            Some(size) => size.to_string(),
        }
    }

    /// Size for the REST image request.
    pub fn rest_image_size(&self) -> String {
        self.image_size
            .clone()
            .unwrap_or_else(|| "1024x1024".to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsConfig {
    /// `None` allows any origin.
    pub allowed_origins: Option<Vec<String>>,
    pub allowed_methods: Vec<String>,
    pub allowed_headers: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub base_url: String,
    pub credentials: Credentials,
    pub models: ModelConfig,
    pub text_retry: RetryPolicy,
    pub image_retry: RetryPolicy,
    pub cors: CorsConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from any key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let credentials = Credentials {
            api_key: get("GOOGLE_API_KEY").or_else(|| get("GEMINI_API_KEY")),
            bearer_token: get("GOOGLE_GEMINI_BEARER"),
        };

        let models = ModelConfig {
            stream_text_model: get("GOOGLE_SDK_MODEL")
                .or_else(|| get("GOOGLE_TEXT_MODEL"))
                .unwrap_or_else(|| DEFAULT_STREAM_TEXT_MODEL.to_string()),
            rest_text_model: get("GOOGLE_TEXT_MODEL")
                .unwrap_or_else(|| DEFAULT_REST_TEXT_MODEL.to_string()),
            stream_image_model: get("GOOGLE_SDK_IMAGE_MODEL")
                .or_else(|| get("GOOGLE_IMAGE_MODEL"))
                .unwrap_or_else(|| DEFAULT_STREAM_IMAGE_MODEL.to_string()),
            rest_image_model: get("GOOGLE_IMAGE_MODEL")
                .unwrap_or_else(|| DEFAULT_REST_IMAGE_MODEL.to_string()),
            image_size: get("GOOGLE_IMAGE_SIZE"),
            max_output_tokens: parse_or(
                get("GOOGLE_MAX_OUTPUT_TOKENS"),
                "GOOGLE_MAX_OUTPUT_TOKENS",
                DEFAULT_MAX_OUTPUT_TOKENS,
            )?,
        };

        let timeout_override: Option<u64> = get("GENAI_SDK_TIMEOUT_MS")
            .map(|v| parse_value(&v, "GENAI_SDK_TIMEOUT_MS"))
            .transpose()?;
        let retries = parse_or(get("GENAI_SDK_RETRIES"), "GENAI_SDK_RETRIES", DEFAULT_RETRIES)?;
        let base_delay = Duration::from_millis(parse_or(
            get("GENAI_RETRY_BASE_DELAY_MS"),
            "GENAI_RETRY_BASE_DELAY_MS",
            DEFAULT_BASE_DELAY_MS,
        )?);

        let retry_policy = |default_timeout_ms: u64| RetryPolicy {
            retries,
            base_delay,
            attempt_timeout: Duration::from_millis(timeout_override.unwrap_or(default_timeout_ms)),
        };

        Ok(Self {
            port: parse_or(get("PORT"), "PORT", DEFAULT_PORT)?,
            base_url: get("GENAI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            credentials,
            models,
            text_retry: retry_policy(DEFAULT_TEXT_TIMEOUT_MS),
            image_retry: retry_policy(DEFAULT_IMAGE_TIMEOUT_MS),
            cors: CorsConfig {
                allowed_origins: parse_origins(get("CORS_ALLOWED_ORIGINS").as_deref()),
                allowed_methods: split_list(
                    get("CORS_ALLOWED_METHODS").as_deref().unwrap_or(DEFAULT_CORS_METHODS),
                ),
                allowed_headers: split_list(
                    get("CORS_ALLOWED_HEADERS").as_deref().unwrap_or(DEFAULT_CORS_HEADERS),
                ),
            },
        })
    }
}

fn parse_value<T: FromStr>(value: &str, key: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| Error::Config(format!("{} has an invalid value: '{}'", key, value)))
}

fn parse_or<T: FromStr>(value: Option<String>, key: &str, default: T) -> Result<T> {
    match value {
        Some(v) => parse_value(&v, key),
        None => Ok(default),
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// `*` or an empty value means any origin; wrapping quotes are stripped.
fn parse_origins(raw: Option<&str>) -> Option<Vec<String>> {
    let raw = raw.unwrap_or("*").trim();
    let unquoted = raw
        .trim_start_matches(['\'', '"'])
        .trim_end_matches(['\'', '"'])
        .trim();

    if unquoted.is_empty() || unquoted == "*" {
        None
    } else {
        Some(split_list(unquoted))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert!(!config.credentials.is_configured());
        assert_eq!(config.models.stream_text_model, "gemini-flash-latest");
        assert_eq!(config.models.rest_text_model, "models/text-bison-001");
        assert_eq!(config.models.stream_image_model, "gemini-2.5-flash-image");
        assert_eq!(config.models.rest_image_model, "models/image-bison-001");
        assert_eq!(config.models.max_output_tokens, 800);
        assert_eq!(config.text_retry.retries, 2);
        assert_eq!(config.text_retry.base_delay, Duration::from_millis(500));
        assert_eq!(config.text_retry.attempt_timeout, Duration::from_secs(15));
        assert_eq!(config.image_retry.attempt_timeout, Duration::from_secs(20));
        assert_eq!(config.cors.allowed_origins, None);
        assert_eq!(
            config.cors.allowed_methods,
            vec!["GET", "HEAD", "PUT", "PATCH", "POST", "DELETE"]
        );
        assert_eq!(
            config.cors.allowed_headers,
            vec!["Content-Type", "Authorization"]
        );
    }

    #[test]
    fn test_text_model_feeds_both_paths() {
        let config = config_from(&[("GOOGLE_TEXT_MODEL", "gemini-2.5-pro")]).unwrap();
        assert_eq!(config.models.stream_text_model, "gemini-2.5-pro");
        assert_eq!(config.models.rest_text_model, "gemini-2.5-pro");

        let config = config_from(&[
            ("GOOGLE_TEXT_MODEL", "models/text-bison-001"),
            ("GOOGLE_SDK_MODEL", "gemini-flash-latest"),
        ])
        .unwrap();
        assert_eq!(config.models.stream_text_model, "gemini-flash-latest");
        assert_eq!(config.models.rest_text_model, "models/text-bison-001");
    }

    #[test]
    fn test_credentials_from_any_source() {
        let config = config_from(&[("GEMINI_API_KEY", "k1")]).unwrap();
        assert_eq!(config.credentials.api_key.as_deref(), Some("k1"));

        let config = config_from(&[("GOOGLE_API_KEY", "k2"), ("GEMINI_API_KEY", "k1")]).unwrap();
        assert_eq!(config.credentials.api_key.as_deref(), Some("k2"));

        let config = config_from(&[("GOOGLE_GEMINI_BEARER", "tok")]).unwrap();
        assert!(config.credentials.is_configured());
        assert!(config.credentials.api_key.is_none());
    }

    #[test]
    fn test_blank_values_are_unset() {
        let config = config_from(&[("GOOGLE_API_KEY", "  "), ("PORT", "")]).unwrap();
        assert!(!config.credentials.is_configured());
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn test_timeout_override_applies_to_both_clients() {
        let config = config_from(&[
            ("GENAI_SDK_TIMEOUT_MS", "1000"),
            ("GENAI_SDK_RETRIES", "4"),
            ("GENAI_RETRY_BASE_DELAY_MS", "50"),
        ])
        .unwrap();
        assert_eq!(config.text_retry.attempt_timeout, Duration::from_secs(1));
        assert_eq!(config.image_retry.attempt_timeout, Duration::from_secs(1));
        assert_eq!(config.image_retry.retries, 4);
        assert_eq!(config.image_retry.base_delay, Duration::from_millis(50));
    }

    #[test]
    fn test_invalid_number_is_config_error() {
        let err = config_from(&[("GENAI_SDK_RETRIES", "lots")]).unwrap_err();
        assert!(matches!(err, Error::Config(msg) if msg.contains("GENAI_SDK_RETRIES")));
    }

    #[test]
    fn test_cors_origins_strip_quotes() {
        let config = config_from(&[(
            "CORS_ALLOWED_ORIGINS",
            "\"https://a.example, https://b.example\"",
        )])
        .unwrap();
        assert_eq!(
            config.cors.allowed_origins,
            Some(vec![
                "https://a.example".to_string(),
                "https://b.example".to_string()
            ])
        );

        let config = config_from(&[("CORS_ALLOWED_ORIGINS", "'*'")]).unwrap();
        assert_eq!(config.cors.allowed_origins, None);
    }

    #[test]
    fn test_image_size_mapping() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.models.stream_image_size(), "1K");
        assert_eq!(config.models.rest_image_size(), "1024x1024");

        let config = config_from(&[("GOOGLE_IMAGE_SIZE", "1024x1024")]).unwrap();
        assert_eq!(config.models.stream_image_size(), "1K");

        let config = config_from(&[("GOOGLE_IMAGE_SIZE", "2K")]).unwrap();
        assert_eq!(config.models.stream_image_size(), "2K");
        assert_eq!(config.models.rest_image_size(), "2K");
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let config = config_from(&[("GENAI_BASE_URL", "http://127.0.0.1:9999/")]).unwrap();
        assert_eq!(config.base_url, "http://127.0.0.1:9999");
    }
}
