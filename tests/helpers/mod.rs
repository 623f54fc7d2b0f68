#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    Json, Router,
    body::Body,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::post,
};
use futures_util::{SinkExt, StreamExt, stream};
use james::config::{self, Config, Overrides};
use james::server::{self, AppState};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::sync::Notify;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, tungstenite::Message};
use tokio_util::sync::CancellationToken;

pub const CHAT_MODEL: &str = "chat-model";
pub const COORDINATOR_MODEL: &str = "coord-model";
pub const SCOUT_MODEL: &str = "scout-model";
pub const TRAINED_MODEL: &str = "trained-model";

pub fn prompts_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("config/prompts")
}

// ── Mock model server ─────────────────────────────────────────────────────────

/// One scripted answer from the mock completions endpoint.
#[derive(Debug, Clone)]
pub enum MockReply {
    /// A normal answer; streamed word by word when the request asks for it.
    Text(String),
    /// Stream these deltas, then drop the connection.
    Drop(Vec<String>),
    /// Send this exact event-stream body.
    Raw(String),
    /// Answer with an HTTP error status and an OpenAI-style error body.
    Fail(u16, String),
    /// Stream this delta, then never finish. Dropping the body notifies
    /// [`MockLlm::body_dropped`].
    Stall(String),
}

pub fn text(s: &str) -> MockReply {
    MockReply::Text(s.to_string())
}

/// What the mock saw for one request.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub model: String,
    pub stream: bool,
    pub messages: Vec<Value>,
}

impl RecordedCall {
    pub fn content(&self, idx: usize) -> &str {
        self.messages[idx]["content"].as_str().unwrap_or_default()
    }

    pub fn role(&self, idx: usize) -> &str {
        self.messages[idx]["role"].as_str().unwrap_or_default()
    }
}

#[derive(Clone)]
struct MockState {
    scripts: Arc<HashMap<String, Vec<MockReply>>>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
    dropped: Arc<Notify>,
}

/// Signals when a stalled response body is dropped by the server.
struct DropSignal(Arc<Notify>);

impl Drop for DropSignal {
    fn drop(&mut self) {
        self.0.notify_one();
    }
}

/// A local OpenAI-compatible server. Replies are scripted per model; the
/// n-th call for a model gets the n-th reply (the last one repeats).
pub struct MockLlm {
    pub api_base: String,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
    dropped: Arc<Notify>,
}

impl MockLlm {
    pub async fn start(scripts: Vec<(&str, Vec<MockReply>)>) -> Self {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let dropped = Arc::new(Notify::new());
        let state = MockState {
            scripts: Arc::new(scripts.into_iter().map(|(m, r)| (m.to_string(), r)).collect()),
            calls: calls.clone(),
            dropped: dropped.clone(),
        };
        let router = Router::new()
            .route("/v1/chat/completions", post(completions))
            .with_state(state);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        Self { api_base: format!("http://{addr}/v1"), calls, dropped }
    }

    /// Wait until a `Stall` body has been dropped, i.e. the client hung up.
    pub async fn body_dropped(&self, within: Duration) -> bool {
        tokio::time::timeout(within, self.dropped.notified()).await.is_ok()
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn models_called(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.model).collect()
    }
}

fn sse_chunk(delta: &str) -> String {
    format!("data: {}\n\n", json!({ "choices": [{ "delta": { "content": delta } }] }))
}

async fn completions(State(state): State<MockState>, Json(body): Json<Value>) -> Response {
    let model = body["model"].as_str().unwrap_or_default().to_string();
    let streaming = body["stream"].as_bool().unwrap_or(false);
    let messages = body["messages"].as_array().cloned().unwrap_or_default();

    let index = {
        let mut calls = state.calls.lock().unwrap();
        let n = calls.iter().filter(|c| c.model == model).count();
        calls.push(RecordedCall { model: model.clone(), stream: streaming, messages });
        n
    };

    let Some(replies) = state.scripts.get(&model).filter(|r| !r.is_empty()) else {
        let err = json!({ "error": { "message": format!("model '{model}' not found") } });
        return (StatusCode::NOT_FOUND, Json(err)).into_response();
    };

    match replies[index.min(replies.len() - 1)].clone() {
        MockReply::Text(text) if streaming => {
            let mut body: String = text.split_inclusive(' ').map(sse_chunk).collect();
            body.push_str("data: [DONE]\n\n");
            ([(header::CONTENT_TYPE, "text/event-stream")], body).into_response()
        }
        MockReply::Text(text) => Json(json!({
            "choices": [{ "message": { "role": "assistant", "content": text } }]
        }))
        .into_response(),
        MockReply::Drop(parts) => {
            let chunks: Vec<Result<String, std::io::Error>> = parts
                .iter()
                .map(|p| Ok(sse_chunk(p)))
                .chain(std::iter::once(Err(std::io::Error::new(
                    std::io::ErrorKind::ConnectionReset,
                    "upstream dropped",
                ))))
                .collect();
            Response::builder()
                .header(header::CONTENT_TYPE, "text/event-stream")
                .body(Body::from_stream(stream::iter(chunks)))
                .unwrap()
        }
        MockReply::Raw(body) => ([(header::CONTENT_TYPE, "text/event-stream")], body).into_response(),
        MockReply::Stall(first) => {
            let signal = DropSignal(state.dropped.clone());
            let chunks = stream::once(async move { Ok::<_, std::io::Error>(sse_chunk(&first)) })
                .chain(stream::pending())
                .map(move |chunk| {
                    let _signal = &signal;
                    chunk
                });
            Response::builder()
                .header(header::CONTENT_TYPE, "text/event-stream")
                .body(Body::from_stream(chunks))
                .unwrap()
        }
        MockReply::Fail(status, message) => (
            StatusCode::from_u16(status).unwrap(),
            Json(json!({ "error": { "message": message } })),
        )
            .into_response(),
    }
}

// ── App under test ────────────────────────────────────────────────────────────

/// Write a config file into `dir` and load it. `static_dir` and the memory
/// file live inside `dir`; prompts come from the repository.
pub fn test_config(dir: &Path, provider: &str, api_base: &str, mode: &str, attach_memory: bool) -> Config {
    let toml = format!(
        r#"
[app]
bot_name = "james-test"
log_level = "warn"

[server]
bind = "127.0.0.1:0"
static_dir = '{static_dir}'

[relay]
mode = "{mode}"
attach_memory = {attach_memory}

[memory]
path = '{memory}'

[llm]
default = "{provider}"
api_base = "{api_base}"
timeout_seconds = 10

[llm.chat]
model = "{CHAT_MODEL}"
temperature = 0.3

[llm.coordinator]
model = "{COORDINATOR_MODEL}"
temperature = 0.7

[llm.scout]
model = "{SCOUT_MODEL}"
temperature = 0.3

[llm.trained]
model = "{TRAINED_MODEL}"
temperature = 0.8

[prompts]
dir = '{prompts}'
"#,
        static_dir = dir.join("static").display(),
        memory = dir.join("memory.jsonl").display(),
        prompts = prompts_dir().display(),
    );
    let path = dir.join("test.toml");
    std::fs::write(&path, toml).unwrap();
    config::load_from(&path, &Overrides::default()).unwrap()
}

pub fn test_router(config: &Config) -> Router {
    let state = AppState::from_config(config).unwrap();
    server::build_router(state, &config.server.static_dir)
}

/// Serve the app on an ephemeral port.
pub async fn spawn_app(config: &Config) -> SocketAddr {
    let router = test_router(config);
    let listener = server::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(server::serve(listener, router, CancellationToken::new()));
    addr
}

// ── WebSocket client ──────────────────────────────────────────────────────────

pub type WsClient = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

pub async fn ws_connect(addr: SocketAddr) -> WsClient {
    let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/ws")).await.unwrap();
    ws
}

/// Send one frame and collect text frames up to and including the terminal
/// `[Done]` or `[Error] ...` frame.
pub async fn exchange(ws: &mut WsClient, frame: &str) -> Vec<String> {
    ws.send(Message::Text(frame.to_string())).await.unwrap();
    read_exchange(ws).await
}

pub async fn read_exchange(ws: &mut WsClient) -> Vec<String> {
    let mut frames = Vec::new();
    loop {
        let next = tokio::time::timeout(Duration::from_secs(10), ws.next())
            .await
            .expect("timed out waiting for a frame");
        match next {
            Some(Ok(Message::Text(text))) => {
                let terminal = text == "[Done]" || text.starts_with("[Error]");
                frames.push(text);
                if terminal {
                    return frames;
                }
            }
            Some(Ok(Message::Close(_))) | None => return frames,
            Some(Ok(_)) => {}
            Some(Err(e)) => panic!("websocket error: {e}"),
        }
    }
}

pub fn prompt_frame(prompt: &str) -> String {
    json!({ "prompt": prompt }).to_string()
}

/// Concatenate the non-terminal frames.
pub fn reply_text(frames: &[String]) -> String {
    frames
        .iter()
        .filter(|f| f.as_str() != "[Done]" && !f.starts_with("[Error]"))
        .map(String::as_str)
        .collect()
}

// ── Multipart ─────────────────────────────────────────────────────────────────

pub const BOUNDARY: &str = "james-test-boundary";

/// Build a `multipart/form-data` body. `file` is `(filename, contents)`.
pub fn multipart_body(fields: &[(&str, &str)], file: Option<(&str, &str)>) -> Vec<u8> {
    let mut body = String::new();
    for (name, value) in fields {
        body.push_str(&format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
        ));
    }
    if let Some((filename, contents)) = file {
        body.push_str(&format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n\
             Content-Type: text/plain\r\n\r\n{contents}\r\n"
        ));
    }
    body.push_str(&format!("--{BOUNDARY}--\r\n"));
    body.into_bytes()
}

pub fn multipart_content_type() -> String {
    format!("multipart/form-data; boundary={BOUNDARY}")
}
