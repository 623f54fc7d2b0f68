//! HTTP surface of the `james-voice` sidecar.
//!
//! ```text
//! GET  /health  → {"status":"ok","models":["james","julia"]}
//! POST /tts     → audio/wav
//! ```
//!
//! Failures are answered with 500 and `{"status":"error","detail":...}`.

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

use super::{SpeechRequest, Voice, VoiceError, VoiceGateway};

pub fn build_router(gateway: VoiceGateway) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/tts",    post(tts))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(gateway)
}

fn error_response(e: &VoiceError) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "status": "error", "detail": e.to_string() })),
    )
        .into_response()
}

async fn health(State(gateway): State<VoiceGateway>) -> Response {
    match gateway.status() {
        Ok(()) => {
            let models: Vec<&str> = Voice::ALL.iter().map(|v| v.as_str()).collect();
            Json(json!({ "status": "ok", "models": models })).into_response()
        }
        Err(e) => error_response(&e),
    }
}

async fn tts(
    State(gateway): State<VoiceGateway>,
    body: Result<Json<SpeechRequest>, JsonRejection>,
) -> Response {
    let req = match body {
        Ok(Json(req)) => req,
        Err(rejection) => {
            let e = VoiceError::Synthesis(format!("invalid request body: {}", rejection.body_text()));
            warn!(error = %e, "tts request rejected");
            return error_response(&e);
        }
    };
    match gateway.synthesize(&req).await {
        Ok(wav) => ([(header::CONTENT_TYPE, "audio/wav")], wav).into_response(),
        Err(e) => {
            warn!(error = %e, "tts request failed");
            error_response(&e)
        }
    }
}
