//! HTTP surface: router, CORS and server lifecycle.

pub mod handlers;

use crate::app::App;
use crate::config::{Config, CorsConfig};
use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderName, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

/// Request bodies above this size are rejected with `413`.
pub const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub app: App,
}

pub fn build_router(app: App, cors: &CorsConfig) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health_check))
        .route("/api/generate", post(handlers::generate))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(cors_layer(cors))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { app })
}

pub fn cors_layer(cors: &CorsConfig) -> CorsLayer {
    let origin = match &cors.allowed_origins {
        None => AllowOrigin::mirror_request(),
        Some(origins) => {
            let origins: Vec<HeaderValue> = origins
                .iter()
                .filter_map(|o| match o.parse::<HeaderValue>() {
                    Ok(value) => Some(value),
                    Err(e) => {
                        tracing::warn!("Ignoring invalid CORS origin '{}': {}", o, e);
                        None
                    }
                })
                .collect();
            AllowOrigin::list(origins)
        }
    };

    let methods: Vec<Method> = cors
        .allowed_methods
        .iter()
        .filter_map(|m| Method::from_bytes(m.to_ascii_uppercase().as_bytes()).ok())
        .collect();
    let headers: Vec<HeaderName> = cors
        .allowed_headers
        .iter()
        .filter_map(|h| HeaderName::from_bytes(h.as_bytes()).ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(methods)
        .allow_headers(headers)
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
}

impl Application {
    /// Build the application with the given configuration.
    ///
    /// Port 0 binds a random free port.
    pub async fn build(config: Config) -> std::io::Result<Self> {
        let app = App::from_config(&config);
        let router = build_router(app, &config.cors);

        let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind HTTP listener to {}: {}", addr, e);
            e
        })?;
        let port = listener.local_addr()?.port();

        Ok(Self {
            port,
            listener,
            router,
        })
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Run the application until a shutdown signal arrives.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        tracing::info!("Scary story backend listening on port {}", self.port);

        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use tower::ServiceExt;

    fn config(pairs: &'static [(&'static str, &'static str)]) -> Config {
        Config::from_lookup(|key| {
            pairs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        })
        .unwrap()
    }

    async fn preflight(router: Router, origin: &str) -> axum::response::Response {
        router
            .oneshot(
                Request::builder()
                    .method("OPTIONS")
                    .uri("/api/generate")
                    .header(header::ORIGIN, origin)
                    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_wildcard_cors_mirrors_origin() {
        let config = config(&[]);
        let router = build_router(App::from_config(&config), &config.cors);

        let response = preflight(router, "https://app.example").await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "https://app.example"
        );
    }

    #[tokio::test]
    async fn test_origin_list_rejects_unknown_origin() {
        let config = config(&[("CORS_ALLOWED_ORIGINS", "\"https://app.example\"")]);
        let router = build_router(App::from_config(&config), &config.cors);

        let allowed = preflight(router.clone(), "https://app.example").await;
        assert_eq!(
            allowed.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "https://app.example"
        );

        let denied = preflight(router, "https://evil.example").await;
        assert!(denied
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .is_none());
    }

    #[tokio::test]
    async fn test_oversized_body_is_rejected() {
        let config = config(&[]);
        let router = build_router(App::from_config(&config), &config.cors);
        let body = format!("{{\"keyword\":\"{}\"}}", "a".repeat(MAX_BODY_BYTES));

        let response = router
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/generate")
                    .header(header::CONTENT_TYPE, "application/json")
                    .header(header::CONTENT_LENGTH, body.len())
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_oversized_chunked_body_is_rejected() {
        let config = config(&[]);
        let router = build_router(App::from_config(&config), &config.cors);
        let mut chunks = vec!["{\"keyword\":\"".to_string()];
        chunks.extend((0..3).map(|_| "a".repeat(MAX_BODY_BYTES / 2)));
        chunks.push("\"}".to_string());
        let chunks = chunks.into_iter().map(Ok::<_, std::io::Error>);

        let response = router
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/generate")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from_stream(futures::stream::iter(chunks)))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().unwrap().contains("length limit"));
    }

    #[tokio::test]
    async fn test_preflight_lists_configured_methods_and_headers() {
        let config = config(&[
            ("CORS_ALLOWED_METHODS", "get, POST"),
            ("CORS_ALLOWED_HEADERS", "Content-Type,X-Client-Id"),
        ]);
        let router = build_router(App::from_config(&config), &config.cors);

        let response = preflight(router, "https://app.example").await;

        let listed = |name: header::HeaderName| -> Vec<String> {
            response.headers()[name]
                .to_str()
                .unwrap()
                .split(',')
                .map(|v| v.trim().to_ascii_lowercase())
                .collect()
        };
        assert_eq!(listed(header::ACCESS_CONTROL_ALLOW_METHODS), vec!["get", "post"]);
        assert_eq!(
            listed(header::ACCESS_CONTROL_ALLOW_HEADERS),
            vec!["content-type", "x-client-id"]
        );
    }

    #[tokio::test]
    async fn test_default_preflight_methods() {
        let config = config(&[]);
        let router = build_router(App::from_config(&config), &config.cors);

        let response = preflight(router, "https://app.example").await;

        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_METHODS],
            "GET,HEAD,PUT,PATCH,POST,DELETE"
        );
    }

    #[tokio::test]
    async fn test_build_binds_random_port() {
        let config = config(&[("PORT", "0")]);
        let application = Application::build(config).await.unwrap();
        assert_ne!(application.port(), 0);
    }
}
