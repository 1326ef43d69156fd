use super::AppState;
use crate::keywords::{GenerateRequest, KeywordSet};
use crate::models::{GenerateResponse, HealthResponse, InfoResponse};
use crate::Error;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::Instrument;
use uuid::Uuid;

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match &self {
            Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Error::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(GenerateResponse::failure(self.to_string()))).into_response()
    }
}

pub async fn index() -> Json<InfoResponse> {
    Json(InfoResponse {
        ok: true,
        info: "Scary Story Generator Backend".to_string(),
    })
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// `POST /api/generate`: keywords in, story and illustration out.
pub async fn generate(
    State(state): State<AppState>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<Json<GenerateResponse>, Error> {
    let request_id = Uuid::new_v4();
    let span = tracing::info_span!("generate", request_id = %request_id);

    async move {
        let Json(request) = payload.map_err(|rejection| {
            tracing::warn!("Rejected request body: {}", rejection.body_text());
            // Chunked bodies only hit the size limit while being buffered.
            if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
                Error::PayloadTooLarge(rejection.body_text())
            } else {
                Error::InvalidInput(rejection.body_text())
            }
        })?;

        let keywords = KeywordSet::from_request(&request).map_err(|e| {
            tracing::warn!("Rejected request: {}", e);
            e
        })?;

        let story = state.app.generate(&keywords).await.map_err(|e| {
            tracing::error!("Generation failed: {}", e);
            e
        })?;

        tracing::info!("Generation complete");
        Ok(Json(GenerateResponse::success(story)))
    }
    .instrument(span)
    .await
}
