//! Decoding of streamed chat completions.
//!
//! OpenAI-compatible servers answer `stream: true` requests with server-sent
//! events: `data: {json}` lines separated by blank lines, terminated by
//! `data: [DONE]`. Network chunks do not align with lines, so [`SseDecoder`]
//! buffers bytes and only parses complete lines. Splitting on `\n` before
//! UTF-8 decoding keeps multi-byte characters intact across chunk boundaries.

use std::collections::VecDeque;

use futures_util::{Stream, StreamExt, stream};
use serde::Deserialize;
use tracing::warn;

use super::ProviderError;

/// One decoded event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseEvent {
    /// A non-empty text delta.
    Delta(String),
    /// `data: [DONE]`: the upstream finished normally.
    Done,
    /// An error object sent in-band by the upstream.
    Failed(String),
    /// A line that was not valid JSON.
    Malformed(String),
}

/// Incremental line decoder for the completion event stream.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buf: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one network chunk; returns the events of every line it completed.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        self.buf.extend_from_slice(chunk);
        let mut events = Vec::new();
        while let Some(pos) = self.buf.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buf.drain(..=pos).collect();
            if let Some(event) = parse_line(&line) {
                events.push(event);
            }
        }
        events
    }

    /// Flush a trailing line that was not newline-terminated.
    pub fn finish(&mut self) -> Option<SseEvent> {
        if self.buf.is_empty() {
            return None;
        }
        let line = std::mem::take(&mut self.buf);
        parse_line(&line)
    }
}

#[derive(Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
    #[serde(default)]
    error: Option<StreamError>,
}

#[derive(Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: Option<Delta>,
}

#[derive(Deserialize)]
struct Delta {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct StreamError {
    message: String,
}

fn parse_line(raw: &[u8]) -> Option<SseEvent> {
    let line = String::from_utf8_lossy(raw);
    let line = line.trim();
    if line.is_empty() || line.starts_with(':') {
        return None;
    }

    let data = match line.strip_prefix("data:") {
        Some(rest) => rest.trim_start(),
        // Other SSE fields carry nothing we use.
        None if line.starts_with("event:") || line.starts_with("id:") || line.starts_with("retry:") => {
            return None;
        }
        // Bare JSON lines (NDJSON-style servers).
        None => line,
    };

    if data == "[DONE]" {
        return Some(SseEvent::Done);
    }

    match serde_json::from_str::<StreamChunk>(data) {
        Ok(chunk) => {
            if let Some(err) = chunk.error {
                return Some(SseEvent::Failed(err.message));
            }
            chunk
                .choices
                .into_iter()
                .next()
                .and_then(|c| c.delta)
                .and_then(|d| d.content)
                .filter(|s| !s.is_empty())
                .map(SseEvent::Delta)
        }
        Err(_) => Some(SseEvent::Malformed(data.to_string())),
    }
}

struct DeltaState<S> {
    body: S,
    decoder: SseDecoder,
    pending: VecDeque<Result<String, ProviderError>>,
    finished: bool,
}

impl<S> DeltaState<S> {
    fn absorb(&mut self, event: SseEvent) {
        match event {
            SseEvent::Delta(text) => self.pending.push_back(Ok(text)),
            SseEvent::Done => self.finished = true,
            SseEvent::Failed(message) => {
                self.pending
                    .push_back(Err(ProviderError::Request(format!("upstream error: {message}"))));
                self.finished = true;
            }
            SseEvent::Malformed(raw) => {
                let err = ProviderError::MalformedChunk(raw);
                warn!(error = %err, "skipping non-JSON stream chunk");
            }
        }
    }
}

/// Turn a raw response body into a stream of text deltas.
///
/// Malformed chunks are skipped. A transport error ends the stream with a
/// single `Err` item; `[DONE]` or end of body ends it normally.
pub fn deltas<S, B, E>(body: S) -> impl Stream<Item = Result<String, ProviderError>> + Send
where
    S: Stream<Item = Result<B, E>> + Send + Unpin + 'static,
    B: AsRef<[u8]> + Send,
    E: std::fmt::Display + Send,
{
    let state = DeltaState {
        body,
        decoder: SseDecoder::new(),
        pending: VecDeque::new(),
        finished: false,
    };

    stream::unfold(state, |mut st| async move {
        loop {
            if let Some(item) = st.pending.pop_front() {
                return Some((item, st));
            }
            if st.finished {
                return None;
            }
            match st.body.next().await {
                Some(Ok(chunk)) => {
                    for event in st.decoder.push(chunk.as_ref()) {
                        st.absorb(event);
                        if st.finished {
                            break;
                        }
                    }
                }
                Some(Err(e)) => {
                    st.finished = true;
                    st.pending
                        .push_back(Err(ProviderError::Request(format!("stream interrupted: {e}"))));
                }
                None => {
                    st.finished = true;
                    if let Some(event) = st.decoder.finish() {
                        st.absorb(event);
                    }
                }
            }
        }
    })
}
