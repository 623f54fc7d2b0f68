//! Public configuration types.
//!
//! These are the resolved, ready-to-use structs the server, relay and voice
//! sidecar consume. Raw TOML deserialization types live in `raw.rs`.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::AppError;

/// Fully resolved configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub bot_name: String,
    pub log_level: String,
    pub server: ServerConfig,
    pub relay: RelayConfig,
    pub memory: MemoryConfig,
    pub llm: LlmConfig,
    pub prompts: PromptsConfig,
    pub voice: VoiceConfig,
    /// Bearer token for the completion endpoint. Sourced from `LLM_API_KEY`
    /// only, never from TOML. `None` for keyless local servers.
    pub llm_api_key: Option<String>,
}

// ── Server / relay ───────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address the web server binds to.
    pub bind: String,
    /// Directory holding `index.html` and the `/static` assets.
    pub static_dir: PathBuf,
}

/// How `/ws` answers a prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayMode {
    /// Stream tokens straight from the chat persona.
    Direct,
    /// Run the routed specialist workflow and send its final reply.
    Workflow,
}

impl FromStr for RelayMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "direct" => Ok(RelayMode::Direct),
            "workflow" => Ok(RelayMode::Workflow),
            other => Err(AppError::Config(format!(
                "unknown relay mode '{other}' (expected \"direct\" or \"workflow\")"
            ))),
        }
    }
}

impl fmt::Display for RelayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelayMode::Direct => f.write_str("direct"),
            RelayMode::Workflow => f.write_str("workflow"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub mode: RelayMode,
    /// Attach the memory log as context to every prompt.
    pub attach_memory: bool,
}

// ── Memory ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct MemoryConfig {
    /// JSON-lines file the memory log appends to.
    pub path: PathBuf,
    /// `user_id` recorded when `/remember` does not supply one.
    pub default_user_id: String,
}

// ── LLM ──────────────────────────────────────────────────────────────────────

/// Model name and sampling temperature for one persona.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelConfig {
    pub model: String,
    pub temperature: f32,
}

#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Provider backend: `"openai-compatible"` or `"dummy"`.
    pub provider: String,
    /// Base URL of the OpenAI-compatible API, e.g. `http://localhost:11434/v1`.
    pub api_base: String,
    pub timeout_seconds: u64,
    /// Persona used by the direct chat relay.
    pub chat: ModelConfig,
    pub coordinator: ModelConfig,
    pub scout: ModelConfig,
    pub trained: ModelConfig,
}

impl LlmConfig {
    /// Full chat completions URL derived from `api_base`.
    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.api_base.trim_end_matches('/'))
    }
}

// ── Prompts ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct PromptsConfig {
    pub dir: PathBuf,
}

// ── Voice ────────────────────────────────────────────────────────────────────

/// Speech backend for one voice.
#[derive(Debug, Clone, PartialEq)]
pub enum VoiceBackendConfig {
    /// Coqui-compatible TTS server reachable at `url`.
    Http { url: String },
    /// Offline tone generator at `sample_rate`.
    Tone { sample_rate: u32 },
}

#[derive(Debug, Clone)]
pub struct VoiceModelConfig {
    pub backend: VoiceBackendConfig,
    /// Default speaker id passed to multi-speaker models.
    pub speaker_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct VoiceConfig {
    pub bind: String,
    pub james: VoiceModelConfig,
    pub julia: VoiceModelConfig,
}
