//! Error handling and custom error types
//!
//! Provides unified error handling across the service using thiserror.

use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    PayloadTooLarge(String),

    #[error("Provider call timed out after {0:?}")]
    Timeout(Duration),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Provider API error (status {status}): {message}")]
    ProviderStatus { status: u16, message: String },

    #[error("Provider error: {0}")]
    AiProvider(String),

    #[error("Empty response from provider: {0}")]
    EmptyResponse(String),

    #[error("Unrecognized response format from provider: {0}")]
    UnrecognizedResponse(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Whether a failed provider attempt may succeed if tried again.
    ///
    /// Timeouts, connection failures, rate limits, server-side errors and
    /// empty streams are transient. Authentication failures and malformed or
    /// unrecognized responses are not.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Timeout(_) | Error::EmptyResponse(_) => true,
            Error::Http(e) => !e.is_decode() && !e.is_builder(),
            Error::ProviderStatus { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
