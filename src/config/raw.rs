//! Raw TOML deserialization types.
//!
//! These structs mirror the TOML file shape and use `serde` defaults.
//! The `load` module converts them into the public `types` structs.

use serde::Deserialize;

// ── Top-level ────────────────────────────────────────────────────────────────

/// Raw TOML shape, the serde target before resolution.
///
/// Every section is optional so an empty document resolves to the built-in
/// defaults.
#[derive(Deserialize, Default)]
pub(super) struct RawConfig {
    #[serde(default)]
    pub app: RawApp,
    #[serde(default)]
    pub server: RawServer,
    #[serde(default)]
    pub relay: RawRelay,
    #[serde(default)]
    pub memory: RawMemory,
    #[serde(default)]
    pub llm: RawLlm,
    #[serde(default)]
    pub prompts: RawPrompts,
    #[serde(default)]
    pub voice: RawVoice,
}

#[derive(Deserialize)]
pub(super) struct RawApp {
    #[serde(default = "default_bot_name")]
    pub bot_name: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for RawApp {
    fn default() -> Self {
        Self {
            bot_name: default_bot_name(),
            log_level: default_log_level(),
        }
    }
}

// ── Server / relay ───────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub(super) struct RawServer {
    #[serde(default = "default_server_bind")]
    pub bind: String,
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
}

impl Default for RawServer {
    fn default() -> Self {
        Self {
            bind: default_server_bind(),
            static_dir: default_static_dir(),
        }
    }
}

#[derive(Deserialize)]
pub(super) struct RawRelay {
    #[serde(default = "default_relay_mode")]
    pub mode: String,
    #[serde(default = "default_true")]
    pub attach_memory: bool,
}

impl Default for RawRelay {
    fn default() -> Self {
        Self {
            mode: default_relay_mode(),
            attach_memory: true,
        }
    }
}

// ── Memory ───────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub(super) struct RawMemory {
    #[serde(default = "default_memory_path")]
    pub path: String,
    #[serde(default = "default_user_id")]
    pub default_user_id: String,
}

impl Default for RawMemory {
    fn default() -> Self {
        Self {
            path: default_memory_path(),
            default_user_id: default_user_id(),
        }
    }
}

// ── LLM ─────────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub(super) struct RawLlm {
    #[serde(rename = "default", default = "default_llm_provider")]
    pub provider: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default = "default_chat_model")]
    pub chat: RawModel,
    #[serde(default = "default_coordinator_model")]
    pub coordinator: RawModel,
    #[serde(default = "default_scout_model")]
    pub scout: RawModel,
    #[serde(default = "default_trained_model")]
    pub trained: RawModel,
}

impl Default for RawLlm {
    fn default() -> Self {
        Self {
            provider: default_llm_provider(),
            api_base: default_api_base(),
            timeout_seconds: default_timeout_seconds(),
            chat: default_chat_model(),
            coordinator: default_coordinator_model(),
            scout: default_scout_model(),
            trained: default_trained_model(),
        }
    }
}

/// One persona's model settings. Both keys are required inside a table that
/// is present; absent tables fall back to the per-persona defaults.
#[derive(Deserialize, Clone)]
pub(super) struct RawModel {
    pub model: String,
    pub temperature: f32,
}

// ── Prompts ──────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub(super) struct RawPrompts {
    #[serde(default = "default_prompts_dir")]
    pub dir: String,
}

impl Default for RawPrompts {
    fn default() -> Self {
        Self { dir: default_prompts_dir() }
    }
}

// ── Voice sidecar ────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub(super) struct RawVoice {
    #[serde(default = "default_voice_bind")]
    pub bind: String,
    #[serde(default = "default_james_voice")]
    pub james: RawVoiceModel,
    #[serde(default = "default_julia_voice")]
    pub julia: RawVoiceModel,
}

impl Default for RawVoice {
    fn default() -> Self {
        Self {
            bind: default_voice_bind(),
            james: default_james_voice(),
            julia: default_julia_voice(),
        }
    }
}

#[derive(Deserialize)]
pub(super) struct RawVoiceModel {
    #[serde(default = "default_voice_backend")]
    pub backend: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
    #[serde(default)]
    pub speaker_id: Option<String>,
}

// ── Default functions (used by serde) ────────────────────────────────────────

fn default_true() -> bool {
    true
}

fn default_bot_name() -> String {
    "james".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

pub(super) fn default_server_bind() -> String {
    "0.0.0.0:8000".to_string()
}

fn default_static_dir() -> String {
    "static".to_string()
}

fn default_relay_mode() -> String {
    "direct".to_string()
}

pub(super) fn default_memory_path() -> String {
    "data/memory.jsonl".to_string()
}

fn default_user_id() -> String {
    "default".to_string()
}

fn default_llm_provider() -> String {
    "openai-compatible".to_string()
}

pub(super) fn default_api_base() -> String {
    "http://localhost:11434/v1".to_string()
}

fn default_timeout_seconds() -> u64 {
    120
}

fn default_chat_model() -> RawModel {
    RawModel { model: "qwen2.5:7b".to_string(), temperature: 0.3 }
}

fn default_coordinator_model() -> RawModel {
    RawModel { model: "qwen2.5:7b".to_string(), temperature: 0.7 }
}

fn default_scout_model() -> RawModel {
    RawModel { model: "llama3.2:3b".to_string(), temperature: 0.3 }
}

fn default_trained_model() -> RawModel {
    RawModel { model: "qwen2.5:7b".to_string(), temperature: 0.8 }
}

fn default_prompts_dir() -> String {
    "config/prompts".to_string()
}

pub(super) fn default_voice_bind() -> String {
    "0.0.0.0:5002".to_string()
}

fn default_voice_backend() -> String {
    "tone".to_string()
}

fn default_sample_rate() -> u32 {
    22_050
}

fn default_james_voice() -> RawVoiceModel {
    RawVoiceModel {
        backend: default_voice_backend(),
        url: None,
        sample_rate: default_sample_rate(),
        speaker_id: Some("p236".to_string()),
    }
}

fn default_julia_voice() -> RawVoiceModel {
    RawVoiceModel {
        backend: default_voice_backend(),
        url: None,
        sample_rate: default_sample_rate(),
        speaker_id: None,
    }
}
