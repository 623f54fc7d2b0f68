//! James: personal assistant backend.
//!
//! A WebSocket chat relay in front of an OpenAI-compatible model server, an
//! append-only memory log, a routed specialist workflow, and a speech
//! synthesis sidecar (`james-voice`).

pub mod cli;
pub mod config;
pub mod error;
pub mod llm;
pub mod logger;
pub mod memory;
pub mod prompts;
pub mod relay;
pub mod server;
pub mod voice;
pub mod workflow;
