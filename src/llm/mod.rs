//! LLM provider abstraction.
//!
//! `LlmProvider` is an enum over concrete provider implementations.
//! Add a new variant + module in `providers/` for each additional backend.
//!
//! Provider instances are shared immutable capabilities; clone them freely.
//! Both the one-shot [`complete`](LlmProvider::complete) and the incremental
//! [`stream`](LlmProvider::stream) calls are `async fn` on the enum so callers
//! need no trait-object machinery.

pub mod providers;
pub mod sse;

use std::pin::Pin;

use futures_util::Stream;
use serde::Serialize;
use thiserror::Error;

// ── Error ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("unknown provider: {0}")]
    UnknownProvider(String),
    /// Transport failure, HTTP error status, or an unusable response body.
    #[error("provider request failed: {0}")]
    Request(String),
    /// A streamed chunk that was not valid JSON. The stream skips these.
    #[error("malformed stream chunk: {0}")]
    MalformedChunk(String),
}

// ── Messages ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One chat message, serialized exactly as the completions API expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

/// Incremental text fragments from a streaming completion.
pub type CompletionStream = Pin<Box<dyn Stream<Item = Result<String, ProviderError>> + Send>>;

// ── Provider enum ─────────────────────────────────────────────────────────────

/// All available provider backends.
///
/// Enum dispatch avoids `dyn` trait objects and the `async-trait` dependency.
/// Adding a backend = new module + new variant + new match arms.
#[derive(Debug, Clone)]
pub enum LlmProvider {
    Dummy(providers::dummy::DummyProvider),
    OpenAiCompatible(providers::openai_compatible::OpenAiCompatibleProvider),
}

impl LlmProvider {
    /// Send `messages` and return the full text reply.
    pub async fn complete(&self, messages: &[ChatMessage]) -> Result<String, ProviderError> {
        match self {
            LlmProvider::Dummy(p) => p.complete(messages).await,
            LlmProvider::OpenAiCompatible(p) => p.complete(messages).await,
        }
    }

    /// Send `messages` and return the reply as a stream of text fragments.
    pub async fn stream(&self, messages: &[ChatMessage]) -> Result<CompletionStream, ProviderError> {
        match self {
            LlmProvider::Dummy(p) => p.stream(messages).await,
            LlmProvider::OpenAiCompatible(p) => p.stream(messages).await,
        }
    }

    /// Check that the backend is reachable.
    pub async fn ping(&self) -> Result<(), ProviderError> {
        match self {
            LlmProvider::Dummy(_) => Ok(()),
            LlmProvider::OpenAiCompatible(p) => p.ping().await,
        }
    }

    /// Model identifier, used in log fields.
    pub fn model(&self) -> &str {
        match self {
            LlmProvider::Dummy(_) => "dummy",
            LlmProvider::OpenAiCompatible(p) => p.model(),
        }
    }
}
