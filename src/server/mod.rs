//! Web server: static front-end, memory intake, WebSocket chat relay.
//!
//! ## URL layout
//!
//! ```text
//! GET  /              → {static_dir}/index.html
//! GET  /static/*path  → {static_dir}/*path
//! POST /remember      → append a memory record (multipart)
//! GET  /ws            → WebSocket chat relay
//! GET  /api/health
//! ```
//!
//! `serve()` drives the axum event loop; the [`CancellationToken`] is wired to
//! axum's graceful shutdown.

mod api;
mod ui;
mod ws;

use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::Config;
use crate::error::AppError;
use crate::llm::providers::PersonaProviders;
use crate::memory::MemoryLog;
use crate::prompts::Personas;
use crate::relay::ChatRelay;
use crate::workflow::Workflow;

// ── Shared request state ──────────────────────────────────────────────────────

/// Router state injected into every handler via [`axum::extract::State`].
///
/// Cheap to clone; all fields are reference-counted.
#[derive(Clone)]
pub struct AppState {
    pub bot_name: Arc<str>,
    pub relay: Arc<ChatRelay>,
    pub memory: MemoryLog,
    /// `user_id` recorded when `/remember` does not supply one.
    pub default_user_id: Arc<str>,
}

impl AppState {
    pub fn new(
        bot_name: impl Into<Arc<str>>,
        relay: ChatRelay,
        memory: MemoryLog,
        default_user_id: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            bot_name: bot_name.into(),
            relay: Arc::new(relay),
            memory,
            default_user_id: default_user_id.into(),
        }
    }

    /// Wire providers, personas, workflow and memory from `config`.
    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        let providers = PersonaProviders::build(&config.llm, config.llm_api_key.clone())?;
        let personas = Personas::load(&config.prompts.dir);
        let memory = MemoryLog::new(&config.memory.path);

        let chat_model = providers.chat.model().to_string();
        let workflow = Workflow::from_providers(&providers, personas.clone());
        let relay = ChatRelay::new(
            config.relay.mode,
            providers.chat,
            personas.chat,
            workflow,
            memory.clone(),
            config.relay.attach_memory,
        );

        info!(
            relay_mode = %config.relay.mode,
            %chat_model,
            memory_path = %config.memory.path.display(),
            "application state ready"
        );
        Ok(Self::new(
            config.bot_name.as_str(),
            relay,
            memory,
            config.memory.default_user_id.as_str(),
        ))
    }
}

// ── Router ────────────────────────────────────────────────────────────────────

pub fn build_router(state: AppState, static_dir: impl Into<PathBuf>) -> Router {
    let static_dir = static_dir.into();
    Router::new()
        .route("/api/health", get(api::health))
        .route("/remember",   post(api::remember))
        .route("/ws",         get(ws::upgrade))
        .route_service("/",   ui::index(&static_dir))
        .nest_service("/static", ui::assets(&static_dir))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ── Server loop ───────────────────────────────────────────────────────────────

pub async fn bind(bind_addr: &str) -> Result<TcpListener, AppError> {
    TcpListener::bind(bind_addr)
        .await
        .map_err(|e| AppError::Server(format!("bind failed on {bind_addr}: {e}")))
}

/// Serve `router` on `listener` until `shutdown` is cancelled.
pub async fn serve(
    listener: TcpListener,
    router: Router,
    shutdown: CancellationToken,
) -> Result<(), AppError> {
    let local = listener
        .local_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| "<unknown>".into());
    info!(bind_addr = %local, "listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| AppError::Server(format!("server error: {e}")))?;

    info!(bind_addr = %local, "server shut down");
    Ok(())
}
