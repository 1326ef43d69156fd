use super::sse::SseReader;
use crate::config::Credentials;
use crate::{Error, Result};
use futures::stream::BoxStream;
use futures::StreamExt;
use reqwest::{Client, RequestBuilder, Response};
use serde::Serialize;
use std::time::Duration;

pub type ByteStream = BoxStream<'static, reqwest::Result<Vec<u8>>>;

/// Lightweight Gemini REST client shared by the streaming and REST backends.
#[derive(Clone)]
pub struct GeminiHttpClient {
    pub(crate) client: Client,
    credentials: Credentials,
    pub(crate) base_url: String,
}

/// Where the API key travels on a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyPlacement {
    Header,
    Query,
}

impl GeminiHttpClient {
    pub fn new(credentials: Credentials, base_url: String) -> Self {
        Self::new_with_client(credentials, base_url, Client::new())
    }

    pub fn new_with_client(credentials: Credentials, base_url: String, client: Client) -> Self {
        Self {
            client,
            credentials,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn authorize(&self, builder: RequestBuilder, placement: KeyPlacement) -> RequestBuilder {
        let mut builder = builder.header("Content-Type", "application/json");
        if let Some(token) = &self.credentials.bearer_token {
            builder = builder.bearer_auth(token);
        }
        if let Some(key) = &self.credentials.api_key {
            builder = match placement {
                KeyPlacement::Header => builder.header("x-goog-api-key", key),
                KeyPlacement::Query => builder.query(&[("key", key)]),
            };
        }
        builder
    }

    async fn send<Req: Serialize>(
        &self,
        path: &str,
        request: &Req,
        placement: KeyPlacement,
        timeout: Option<Duration>,
    ) -> Result<Response> {
        let url = format!("{}{}", self.base_url, path);
        let mut builder = self.authorize(self.client.post(&url), placement).json(request);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await.map_err(|e| {
            tracing::error!("Failed to send request to Gemini: {}", e);
            e
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            tracing::error!("Gemini API error (status {}): {}", status, error_text);
            return Err(Error::ProviderStatus {
                status: status.as_u16(),
                message: error_text,
            });
        }

        Ok(response)
    }

    /// POST a JSON request and return the raw JSON body.
    pub async fn post_json<Req: Serialize>(
        &self,
        path: &str,
        request: &Req,
        timeout: Duration,
    ) -> Result<serde_json::Value> {
        let response = self
            .send(path, request, KeyPlacement::Query, Some(timeout))
            .await?;

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::error!("Failed to parse Gemini response: {}\nBody: {}", e, body);
            Error::UnrecognizedResponse(format!("response is not JSON: {}", e))
        })
    }

    /// POST a request to a server-sent-events endpoint and return a chunk reader.
    ///
    /// No request timeout is set here; callers bound the whole stream.
    pub async fn post_stream<Req: Serialize>(
        &self,
        path: &str,
        request: &Req,
    ) -> Result<SseReader<ByteStream>> {
        let response = self
            .send(path, request, KeyPlacement::Header, None)
            .await?;

        let bytes = response
            .bytes_stream()
            .map(|chunk| chunk.map(|b| b.to_vec()))
            .boxed();
        Ok(SseReader::new(bytes))
    }
}
