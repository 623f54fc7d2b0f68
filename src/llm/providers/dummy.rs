//! Dummy LLM provider. Echoes the last user message back prefixed with `[echo]`.
//! Used for exercising the relay and workflow without a model server.

use futures_util::stream;

use crate::llm::{ChatMessage, CompletionStream, ProviderError, Role};

#[derive(Debug, Clone)]
pub struct DummyProvider;

impl DummyProvider {
    pub async fn complete(&self, messages: &[ChatMessage]) -> Result<String, ProviderError> {
        Ok(format!("[echo] {}", last_user(messages)))
    }

    /// Streams the echo one word at a time, keeping the separating spaces.
    pub async fn stream(&self, messages: &[ChatMessage]) -> Result<CompletionStream, ProviderError> {
        let reply = self.complete(messages).await?;
        let fragments: Vec<Result<String, ProviderError>> = reply
            .split_inclusive(' ')
            .map(|w| Ok(w.to_string()))
            .collect();
        Ok(Box::pin(stream::iter(fragments)))
    }
}

fn last_user(messages: &[ChatMessage]) -> &str {
    messages
        .iter()
        .rev()
        .find(|m| m.role == Role::User)
        .map(|m| m.content.as_str())
        .unwrap_or("")
}
