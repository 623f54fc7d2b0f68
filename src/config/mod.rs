//! Configuration loading with env-var overrides.
//!
//! Reads `config/default.toml` relative to the current working directory,
//! then applies `JAMES_LOG_LEVEL`, `JAMES_MEMORY_PATH` and `OLLAMA_API_BASE`
//! env overrides.
//!
//! # Module layout
//!
//! - **types**: Public configuration structs (`Config`, `LlmConfig`,
//!   `VoiceConfig`, etc.).
//! - **raw**: Raw TOML deserialization types. These mirror the file shape
//!   and use serde defaults; kept private.
//! - **load**: Loading logic: `merge_toml`, `load_raw_merged`, `load`,
//!   `load_from`, `expand_home`.

mod load;
mod raw;
mod types;

pub use load::{Overrides, expand_home, load, load_from};
pub use types::*;
