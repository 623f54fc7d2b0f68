//! Chat relay core.
//!
//! One exchange = one `{"prompt": "..."}` frame in, zero or more text
//! fragments out, then exactly one terminal frame: `[Done]` on success or a
//! single `[Error] ...` diagnostic. The transport (WebSocket) lives in
//! `server::ws`; this module only produces [`Fragment`]s into a channel.

use futures_util::StreamExt;
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::RelayMode;
use crate::llm::{ChatMessage, LlmProvider, ProviderError};
use crate::memory::MemoryLog;
use crate::workflow::{Workflow, WorkflowError};

pub const DONE_FRAME: &str = "[Done]";
pub const ERROR_PREFIX: &str = "[Error]";

/// One unit of relay output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    Text(String),
    Done,
    Error(String),
}

impl Fragment {
    /// Text of the WebSocket frame carrying this fragment.
    pub fn into_frame(self) -> String {
        match self {
            Fragment::Text(text) => text,
            Fragment::Done => DONE_FRAME.to_string(),
            Fragment::Error(detail) => {
                format!("{ERROR_PREFIX} A server-side error occurred: {detail}")
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("invalid request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Upstream(#[from] ProviderError),

    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    /// The receiving side went away. Not reported to anyone.
    #[error("client disconnected")]
    Disconnected,
}

#[derive(Debug, Deserialize)]
struct PromptRequest {
    prompt: String,
}

/// Extract the prompt from a client frame.
pub fn parse_prompt(frame: &str) -> Result<String, RelayError> {
    let req: PromptRequest = serde_json::from_str(frame)
        .map_err(|e| RelayError::BadRequest(format!("expected {{\"prompt\": string}}: {e}")))?;
    let prompt = req.prompt.trim();
    if prompt.is_empty() {
        return Err(RelayError::BadRequest("prompt is empty".into()));
    }
    Ok(prompt.to_string())
}

/// Shared relay: cloned into every connection.
#[derive(Debug, Clone)]
pub struct ChatRelay {
    mode: RelayMode,
    chat: LlmProvider,
    persona: String,
    workflow: Workflow,
    memory: MemoryLog,
    attach_memory: bool,
}

impl ChatRelay {
    pub fn new(
        mode: RelayMode,
        chat: LlmProvider,
        persona: String,
        workflow: Workflow,
        memory: MemoryLog,
        attach_memory: bool,
    ) -> Self {
        Self { mode, chat, persona, workflow, memory, attach_memory }
    }

    pub fn mode(&self) -> RelayMode {
        self.mode
    }

    /// Reachability of the model server behind the chat persona.
    pub async fn ping(&self) -> Result<(), ProviderError> {
        self.chat.ping().await
    }

    /// Handle one raw client frame, always ending with a terminal fragment
    /// unless the receiver is gone.
    pub async fn handle_frame(&self, frame: &str, tx: &mpsc::Sender<Fragment>) {
        let result = match parse_prompt(frame) {
            Ok(prompt) => self.exchange(&prompt, tx).await,
            Err(e) => Err(e),
        };
        finish(result, tx).await;
    }

    async fn exchange(&self, prompt: &str, tx: &mpsc::Sender<Fragment>) -> Result<(), RelayError> {
        let context = self.memory_context().await;
        info!(mode = %self.mode, chars = prompt.len(), memory = context.is_some(), "relaying prompt");

        match self.mode {
            RelayMode::Direct => {
                let messages = self.compose_messages(prompt, context.as_deref());
                let mut stream = self.chat.stream(&messages).await?;
                let mut fragments = 0usize;
                while let Some(item) = stream.next().await {
                    send(tx, Fragment::Text(item?)).await?;
                    fragments += 1;
                }
                debug!(fragments, "upstream stream finished");
            }
            RelayMode::Workflow => {
                let outcome = self.workflow.run(prompt, context).await?;
                send(tx, Fragment::Text(outcome.reply)).await?;
            }
        }
        Ok(())
    }

    /// Persona, optional memory context, then the user prompt.
    pub fn compose_messages(&self, prompt: &str, context: Option<&str>) -> Vec<ChatMessage> {
        let mut messages = vec![ChatMessage::system(self.persona.clone())];
        if let Some(ctx) = context {
            messages.push(ChatMessage::system(format!(
                "Things the user asked you to remember:\n{ctx}"
            )));
        }
        messages.push(ChatMessage::user(prompt));
        messages
    }

    async fn memory_context(&self) -> Option<String> {
        if !self.attach_memory {
            return None;
        }
        match self.memory.read_all().await {
            Ok(history) => history.to_context(),
            Err(e) => {
                warn!(error = %e, "memory read failed, continuing without context");
                None
            }
        }
    }
}

async fn send(tx: &mpsc::Sender<Fragment>, fragment: Fragment) -> Result<(), RelayError> {
    tx.send(fragment).await.map_err(|_| RelayError::Disconnected)
}

async fn finish(result: Result<(), RelayError>, tx: &mpsc::Sender<Fragment>) {
    let terminal = match result {
        Ok(()) => Fragment::Done,
        Err(RelayError::Disconnected) => {
            debug!("receiver dropped before the exchange finished");
            return;
        }
        Err(e) => {
            warn!(error = %e, "relay exchange failed");
            Fragment::Error(e.to_string())
        }
    };
    let _ = tx.send(terminal).await;
}
