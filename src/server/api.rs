//! JSON handlers: `/remember` and `/api/health`.

use std::time::Duration;

use axum::{
    Json,
    extract::{Multipart, State, multipart::MultipartRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::{info, warn};

use crate::memory::MemoryRecord;

use super::AppState;

// ── Helpers ───────────────────────────────────────────────────────────────────

fn json_status(status: StatusCode, outcome: &str, msg: impl std::fmt::Display) -> Response {
    (status, Json(json!({ "status": outcome, "message": format!("{msg}") }))).into_response()
}

fn bad_request(msg: impl std::fmt::Display) -> Response {
    json_status(StatusCode::BAD_REQUEST, "error", msg)
}

#[derive(Default)]
struct RememberForm {
    what: Option<String>,
    who: Option<String>,
    user_id: Option<String>,
    filename: Option<String>,
}

async fn read_form(mut multipart: Multipart) -> Result<RememberForm, String> {
    let mut form = RememberForm::default();
    while let Some(field) = multipart.next_field().await.map_err(|e| e.to_string())? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                // Only the original name is kept; the body is discarded.
                form.filename = field.file_name().map(str::to_string).filter(|n| !n.is_empty());
            }
            "what" | "who" | "user_id" => {
                let text = field.text().await.map_err(|e| e.to_string())?;
                let value = Some(text.trim().to_string()).filter(|t| !t.is_empty());
                match name.as_str() {
                    "what" => form.what = value,
                    "who" => form.who = value,
                    _ => form.user_id = value,
                }
            }
            _ => {}
        }
    }
    Ok(form)
}

// ── Handlers ──────────────────────────────────────────────────────────────────

/// `POST /remember`: multipart `what`, `who`, optional `file` and `user_id`.
pub(super) async fn remember(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let multipart = match multipart {
        Ok(m) => m,
        Err(e) => return bad_request(e.body_text()),
    };
    let form = match read_form(multipart).await {
        Ok(f) => f,
        Err(e) => return bad_request(format!("malformed form data: {e}")),
    };
    let Some(what) = form.what else {
        return bad_request("missing field: what");
    };
    let Some(who) = form.who else {
        return bad_request("missing field: who");
    };
    let user_id = form.user_id.unwrap_or_else(|| state.default_user_id.to_string());

    let record = MemoryRecord::new(what, who, user_id, form.filename);
    match state.memory.append(&record).await {
        Ok(()) => {
            info!(who = %record.who, user_id = %record.user_id, "memory stored");
            json_status(StatusCode::OK, "ok", "Memory stored.")
        }
        Err(e) => {
            warn!(error = %e, "memory append failed");
            json_status(StatusCode::INTERNAL_SERVER_ERROR, "error", e)
        }
    }
}

/// GET /api/health
pub(super) async fn health(State(state): State<AppState>) -> Response {
    let upstream = match tokio::time::timeout(Duration::from_secs(5), state.relay.ping()).await {
        Ok(Ok(())) => "reachable",
        Ok(Err(e)) => {
            warn!(error = %e, "upstream ping failed");
            "unreachable"
        }
        Err(_) => "unreachable",
    };
    let body = json!({
        "status": "ok",
        "bot_name": &*state.bot_name,
        "relay_mode": state.relay.mode().to_string(),
        "upstream": upstream,
    });
    (StatusCode::OK, Json(body)).into_response()
}
