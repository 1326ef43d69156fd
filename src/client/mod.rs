//! Client side of the ad-gated submission.
//!
//! Collects keywords, gates the request behind an ad, calls the backend and
//! joins both outcomes into the screen to show.

pub mod ads;
pub mod api;
pub mod flow;
pub mod keywords;

use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_API_URL: &str = "http://localhost:8080";

const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 90_000;
const DEFAULT_RETRY_LIMIT: u32 = 3;
const DEFAULT_RETRY_DELAY_MS: u64 = 3_000;

/// Shown when the backend fails without saying why.
pub const GENERIC_FAILURE: &str = "스토리를 생성할 수 없어요. 다시 시도해주세요";

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("요청 시간이 너무 오래 걸려 중단되었어요. 잠시 후 다시 시도해주세요.")]
    Timeout,

    #[error("{0}")]
    Server(String),

    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    #[error("키워드를 다시 입력해주세요")]
    EmptyKeywords,

    #[error("최소 1개 이상의 키워드를 입력해주세요")]
    EmptyBoard,

    #[error("키워드는 최대 10개까지 입력할 수 있습니다")]
    TooManyKeywords,

    #[error("이미 추가된 키워드입니다")]
    DuplicateKeyword,
}

impl ClientError {
    /// Message for the UI. Anything but a timeout is shown as reported.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Server(message) if message.trim().is_empty() => {
                GENERIC_FAILURE.to_string()
            }
            other => other.to_string(),
        }
    }
}

/// Where the backend lives and how patiently to wait for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_url: String,
    pub request_timeout: Duration,
    pub retry_limit: u32,
    pub retry_delay: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl ClientConfig {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Numeric values that are not finite and non-negative fall back to the
    /// default instead of failing.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_url = lookup("STORY_API_URL")
            .map(|v| v.trim().trim_end_matches('/').to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        Self {
            api_url,
            request_timeout: Duration::from_millis(number_or(
                lookup("STORY_REQUEST_TIMEOUT_MS"),
                DEFAULT_REQUEST_TIMEOUT_MS,
            )),
            retry_limit: number_or(lookup("STORY_REQUEST_RETRY_LIMIT"), DEFAULT_RETRY_LIMIT as u64)
                .min(u32::MAX as u64) as u32,
            retry_delay: Duration::from_millis(number_or(
                lookup("STORY_REQUEST_RETRY_DELAY_MS"),
                DEFAULT_RETRY_DELAY_MS,
            )),
        }
    }
}

fn number_or(value: Option<String>, fallback: u64) -> u64 {
    value
        .and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|n| n.is_finite() && *n >= 0.0)
        .map(|n| n as u64)
        .unwrap_or(fallback)
}
