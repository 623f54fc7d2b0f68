//! Configuration loading with env-var overrides.
//!
//! Reads TOML files, supports `[meta] base = "..."` inheritance chains,
//! and applies `JAMES_LOG_LEVEL`, `JAMES_MEMORY_PATH` and `OLLAMA_API_BASE`
//! env overrides.

use std::collections::HashSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::AppError;

use super::raw::{RawConfig, RawVoiceModel};
use super::types::*;

/// Values that take precedence over anything in the TOML files.
///
/// Tests build this directly instead of mutating process env vars.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub log_level: Option<String>,
    pub memory_path: Option<String>,
    pub api_base: Option<String>,
}

impl Overrides {
    /// Collect overrides from the process environment.
    pub fn from_env() -> Self {
        Self {
            log_level: env::var("JAMES_LOG_LEVEL").ok(),
            memory_path: env::var("JAMES_MEMORY_PATH").ok(),
            api_base: env::var("OLLAMA_API_BASE").ok(),
        }
    }
}

/// Deep-merge two TOML values.
/// Tables are merged recursively; the overlay only needs to specify keys that
/// differ from the base. For every other type (string, integer, array, …)
/// the overlay value replaces the base value wholesale.
fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_tbl), toml::Value::Table(overlay_tbl)) => {
            for (key, ov_val) in overlay_tbl {
                let merged = match base_tbl.remove(&key) {
                    Some(base_val) => merge_toml(base_val, ov_val),
                    None => ov_val,
                };
                base_tbl.insert(key, merged);
            }
            toml::Value::Table(base_tbl)
        }
        (_, overlay) => overlay,
    }
}

/// Read a config file, follow any `[meta] base = "..."` chain, and return the
/// fully merged `toml::Value`. `visited` carries canonicalized paths already
/// seen in this chain so circular references are caught early.
fn load_raw_merged(path: &Path, visited: &mut HashSet<PathBuf>) -> Result<toml::Value, AppError> {
    let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    if !visited.insert(canonical) {
        return Err(AppError::Config(format!(
            "circular base reference detected at: {}",
            path.display()
        )));
    }

    let raw = fs::read_to_string(path)
        .map_err(|e| AppError::Config(format!("cannot read {}: {e}", path.display())))?;

    let overlay_val: toml::Value = toml::from_str(&raw)
        .map_err(|e| AppError::Config(format!("parse error in {}: {e}", path.display())))?;

    if let Some(base_str) = overlay_val
        .get("meta")
        .and_then(|m| m.get("base"))
        .and_then(|b| b.as_str())
    {
        let base_path = if Path::new(base_str).is_absolute() {
            PathBuf::from(base_str)
        } else {
            path.parent().unwrap_or(Path::new(".")).join(base_str)
        };
        let base_val = load_raw_merged(&base_path, visited)?;
        Ok(merge_toml(base_val, overlay_val))
    } else {
        Ok(overlay_val)
    }
}

/// Load config from the given path, or `config/default.toml`, then apply env-var overrides.
/// If no path is given and `config/default.toml` does not exist, the built-in
/// defaults are used.
pub fn load(config_path: Option<&str>) -> Result<Config, AppError> {
    let overrides = Overrides::from_env();

    if let Some(path) = config_path {
        return load_from(Path::new(path), &overrides);
    }

    let default_path = Path::new("config/default.toml");
    if default_path.exists() {
        load_from(default_path, &overrides)
    } else {
        resolve(RawConfig::default(), &overrides)
    }
}

/// Internal loader. Accepts an explicit path and overrides.
/// Follows `[meta] base = "..."` inheritance chains before resolving.
pub fn load_from(path: &Path, overrides: &Overrides) -> Result<Config, AppError> {
    let merged_val = load_raw_merged(path, &mut HashSet::new())?;

    let parsed: RawConfig = Deserialize::deserialize(merged_val).map_err(|e: toml::de::Error| {
        AppError::Config(format!("config error in {}: {e}", path.display()))
    })?;

    resolve(parsed, overrides)
}

fn resolve(parsed: RawConfig, overrides: &Overrides) -> Result<Config, AppError> {
    let s = parsed.app;
    let log_level = overrides.log_level.clone().unwrap_or(s.log_level);

    let memory_path = overrides
        .memory_path
        .clone()
        .unwrap_or(parsed.memory.path);
    let api_base = overrides.api_base.clone().unwrap_or(parsed.llm.api_base);

    if parsed.llm.timeout_seconds == 0 {
        return Err(AppError::Config("llm.timeout_seconds must be greater than zero".into()));
    }

    Ok(Config {
        bot_name: s.bot_name,
        log_level,
        server: ServerConfig {
            bind: parsed.server.bind,
            static_dir: expand_home(&parsed.server.static_dir),
        },
        relay: RelayConfig {
            mode: parsed.relay.mode.parse()?,
            attach_memory: parsed.relay.attach_memory,
        },
        memory: MemoryConfig {
            path: expand_home(&memory_path),
            default_user_id: parsed.memory.default_user_id,
        },
        llm: LlmConfig {
            provider: parsed.llm.provider,
            api_base,
            timeout_seconds: parsed.llm.timeout_seconds,
            chat: model(parsed.llm.chat),
            coordinator: model(parsed.llm.coordinator),
            scout: model(parsed.llm.scout),
            trained: model(parsed.llm.trained),
        },
        prompts: PromptsConfig {
            dir: expand_home(&parsed.prompts.dir),
        },
        voice: VoiceConfig {
            bind: parsed.voice.bind,
            james: voice_model("james", parsed.voice.james)?,
            julia: voice_model("julia", parsed.voice.julia)?,
        },
        llm_api_key: env::var("LLM_API_KEY").ok(),
    })
}

fn model(raw: super::raw::RawModel) -> ModelConfig {
    ModelConfig {
        model: raw.model,
        temperature: raw.temperature,
    }
}

fn voice_model(name: &str, raw: RawVoiceModel) -> Result<VoiceModelConfig, AppError> {
    let backend = match raw.backend.as_str() {
        "http" => {
            let url = raw.url.filter(|u| !u.trim().is_empty()).ok_or_else(|| {
                AppError::Config(format!("voice.{name}: backend \"http\" requires a url"))
            })?;
            VoiceBackendConfig::Http { url }
        }
        "tone" => {
            if raw.sample_rate == 0 {
                return Err(AppError::Config(format!(
                    "voice.{name}: sample_rate must be greater than zero"
                )));
            }
            VoiceBackendConfig::Tone { sample_rate: raw.sample_rate }
        }
        other => {
            return Err(AppError::Config(format!(
                "voice.{name}: unknown backend '{other}' (expected \"http\" or \"tone\")"
            )));
        }
    };

    Ok(VoiceModelConfig {
        backend,
        speaker_id: raw.speaker_id,
    })
}

/// Expand a leading `~` to the user's home directory.
/// Absolute or relative paths without `~` are returned unchanged.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}
