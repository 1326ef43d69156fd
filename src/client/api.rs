use super::{ClientConfig, ClientError, GENERIC_FAILURE};
use crate::models::{GenerateResponse, GeneratedStory};
use async_trait::async_trait;
use serde::Serialize;
use tokio_retry::strategy::FixedInterval;
use tokio_retry::RetryIf;
use tracing::{error, warn};

/// Anything that can turn keywords into a story.
#[async_trait]
pub trait StoryRequester: Send + Sync {
    async fn request_story(&self, keywords: &[String]) -> Result<GeneratedStory, ClientError>;
}

#[derive(Debug, Serialize)]
struct GenerateBody {
    keyword: String,
}

/// Calls `POST {api_url}/api/generate`.
///
/// Only timeouts are retried, with a fixed delay; every other failure
/// surfaces immediately.
pub struct StoryApiClient {
    client: reqwest::Client,
    config: ClientConfig,
}

impl StoryApiClient {
    pub fn new(config: ClientConfig) -> Self {
        Self::new_with_client(config, reqwest::Client::new())
    }

    pub fn new_with_client(config: ClientConfig, client: reqwest::Client) -> Self {
        Self { client, config }
    }

    async fn send(&self, body: &GenerateBody) -> Result<reqwest::Response, ClientError> {
        let url = format!("{}/api/generate", self.config.api_url);
        let request = self.client.post(&url).json(body).send();

        match tokio::time::timeout(self.config.request_timeout, request).await {
            Ok(response) => Ok(response?),
            Err(_) => Err(ClientError::Timeout),
        }
    }

    async fn send_with_retries(&self, body: &GenerateBody) -> Result<reqwest::Response, ClientError> {
        let strategy =
            FixedInterval::new(self.config.retry_delay).take(self.config.retry_limit as usize);
        let mut attempt = 0u32;

        RetryIf::spawn(
            strategy,
            || {
                attempt += 1;
                let current = attempt;
                async move {
                    let result = self.send(body).await;
                    if matches!(result, Err(ClientError::Timeout)) {
                        warn!(
                            "Story request timed out (attempt {}/{})",
                            current,
                            self.config.retry_limit + 1
                        );
                    }
                    result
                }
            },
            |e: &ClientError| matches!(e, ClientError::Timeout),
        )
        .await
    }
}

#[async_trait]
impl StoryRequester for StoryApiClient {
    async fn request_story(&self, keywords: &[String]) -> Result<GeneratedStory, ClientError> {
        if keywords.is_empty() {
            return Err(ClientError::EmptyKeywords);
        }

        let body = GenerateBody {
            keyword: keywords.join(", "),
        };

        let response = self.send_with_retries(&body).await.map_err(|e| {
            error!("Story request failed: {}", e);
            e
        })?;

        let status = response.status();
        let text = response.text().await?;
        let parsed: Option<GenerateResponse> = serde_json::from_str(&text).ok();

        if !status.is_success() {
            let message = parsed
                .and_then(|r| r.error)
                .unwrap_or_else(|| GENERIC_FAILURE.to_string());
            error!("Backend answered {}: {}", status, message);
            return Err(ClientError::Server(message));
        }

        let parsed = parsed.ok_or_else(|| ClientError::Server(GENERIC_FAILURE.to_string()))?;
        if !parsed.success {
            return Err(ClientError::Server(
                parsed.error.unwrap_or_else(|| GENERIC_FAILURE.to_string()),
            ));
        }

        parsed
            .into_story()
            .ok_or_else(|| ClientError::Server(GENERIC_FAILURE.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer, timeout_ms: u64, retry_limit: u32) -> StoryApiClient {
        StoryApiClient::new(ClientConfig {
            api_url: server.uri(),
            request_timeout: Duration::from_millis(timeout_ms),
            retry_limit,
            retry_delay: Duration::from_millis(10),
        })
    }

    fn keywords(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|k| k.to_string()).collect()
    }

    #[tokio::test]
    async fn test_posts_joined_keyword_string() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .and(body_json(serde_json::json!({"keyword": "학교, 거울"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "title": "학교에 관한 이야기",
                "content": "ST1",
                "imageUrl": "https://img.example/1.png"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let story = client(&server, 5_000, 3)
            .request_story(&keywords(&["학교", "거울"]))
            .await
            .unwrap();

        assert_eq!(story.title, "학교에 관한 이야기");
        assert_eq!(story.content, "ST1");
        assert_eq!(story.image_url, "https://img.example/1.png");
    }

    #[tokio::test]
    async fn test_empty_keywords_are_rejected_locally() {
        let server = MockServer::start().await;
        let err = client(&server, 5_000, 3).request_story(&[]).await.unwrap_err();
        assert_eq!(err.user_message(), "키워드를 다시 입력해주세요");
    }

    #[tokio::test]
    async fn test_server_error_message_is_shown_verbatim() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(500)
                    .set_body_json(serde_json::json!({"success": false, "error": "quota exceeded"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let err = client(&server, 5_000, 3)
            .request_story(&keywords(&["숲"]))
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), "quota exceeded");
    }

    #[tokio::test]
    async fn test_error_without_message_uses_generic_text() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
            .mount(&server)
            .await;

        let err = client(&server, 5_000, 3)
            .request_story(&keywords(&["숲"]))
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), GENERIC_FAILURE);
    }

    #[tokio::test]
    async fn test_unsuccessful_body_with_ok_status() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"success": false})),
            )
            .mount(&server)
            .await;

        let err = client(&server, 5_000, 3)
            .request_story(&keywords(&["숲"]))
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), GENERIC_FAILURE);
    }

    #[tokio::test]
    async fn test_connection_failure_shows_transport_message() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let api = StoryApiClient::new(ClientConfig {
            api_url: format!("http://127.0.0.1:{}", port),
            request_timeout: Duration::from_secs(5),
            retry_limit: 3,
            retry_delay: Duration::from_millis(10),
        });
        let err = api.request_story(&keywords(&["숲"])).await.unwrap_err();

        assert!(matches!(err, ClientError::Transport(_)));
        assert_eq!(err.user_message(), err.to_string());
        assert_ne!(err.user_message(), GENERIC_FAILURE);
        assert!(!err.user_message().is_empty());
    }

    #[tokio::test]
    async fn test_timeouts_are_retried_up_to_the_limit() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"success": true, "content": "late"}))
                    .set_delay(Duration::from_millis(500)),
            )
            .expect(3)
            .mount(&server)
            .await;

        let err = client(&server, 50, 2)
            .request_story(&keywords(&["숲"]))
            .await
            .unwrap_err();

        assert!(matches!(err, ClientError::Timeout));
        assert_eq!(
            err.user_message(),
            "요청 시간이 너무 오래 걸려 중단되었어요. 잠시 후 다시 시도해주세요."
        );
    }

    #[tokio::test]
    async fn test_server_errors_are_not_retried() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(
                serde_json::json!({"success": false, "error": "keywords must be provided"}),
            ))
            .expect(1)
            .mount(&server)
            .await;

        let result = client(&server, 5_000, 3)
            .request_story(&keywords(&["숲"]))
            .await;
        assert!(matches!(result, Err(ClientError::Server(_))));
    }
}
