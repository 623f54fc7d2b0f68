//! WebSocket transport for the chat relay.
//!
//! Each connection runs a writer task that forwards relay [`Fragment`]s to the
//! socket, while the handler keeps reading the socket during an exchange. A
//! close frame or disconnect drops the in-flight exchange, which aborts the
//! upstream request. Prompts that arrive mid-exchange are queued, up to
//! `MAX_QUEUED_PROMPTS`; each prompt past that is answered with its own
//! `[Error]` frame in arrival order.

use std::collections::VecDeque;

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::relay::Fragment;

use super::AppState;

const FRAGMENT_BUFFER: usize = 64;
const MAX_QUEUED_PROMPTS: usize = 8;

/// GET /ws
pub(super) async fn upgrade(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// What the socket delivered while we were waiting.
enum Incoming {
    Prompt(String),
    Closed,
    Ignored,
}

fn classify(msg: Option<Result<Message, axum::Error>>) -> Incoming {
    match msg {
        Some(Ok(Message::Text(text))) => Incoming::Prompt(text.as_str().to_owned()),
        Some(Ok(Message::Close(_))) | None => Incoming::Closed,
        Some(Err(e)) => {
            debug!(error = %e, "websocket read failed");
            Incoming::Closed
        }
        Some(Ok(_)) => Incoming::Ignored,
    }
}

/// A prompt waiting behind the current exchange, or a run of prompts that
/// arrived while the queue was full.
#[derive(Debug, PartialEq, Eq)]
enum Queued {
    Prompt(String),
    Rejected(usize),
}

fn enqueue(queue: &mut VecDeque<Queued>, frame: String) {
    let waiting = queue.iter().filter(|q| matches!(q, Queued::Prompt(_))).count();
    if waiting < MAX_QUEUED_PROMPTS {
        queue.push_back(Queued::Prompt(frame));
        return;
    }
    warn!(limit = MAX_QUEUED_PROMPTS, "prompt queue full, rejecting prompt");
    match queue.back_mut() {
        Some(Queued::Rejected(n)) => *n += 1,
        _ => queue.push_back(Queued::Rejected(1)),
    }
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    info!("websocket connected");
    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::channel::<Fragment>(FRAGMENT_BUFFER);

    let writer = tokio::spawn(async move {
        while let Some(fragment) = rx.recv().await {
            if sink.send(Message::Text(fragment.into_frame().into())).await.is_err() {
                break;
            }
        }
        let _ = sink.close().await;
    });

    let mut queued: VecDeque<Queued> = VecDeque::new();
    'connection: loop {
        let frame = match queued.pop_front() {
            Some(Queued::Prompt(frame)) => frame,
            Some(Queued::Rejected(n)) => {
                for _ in 0..n {
                    let busy = Fragment::Error("too many prompts queued, prompt dropped".into());
                    if tx.send(busy).await.is_err() {
                        break 'connection;
                    }
                }
                continue;
            }
            None => match classify(stream.next().await) {
                Incoming::Prompt(frame) => frame,
                Incoming::Closed => break,
                Incoming::Ignored => continue,
            },
        };

        let exchange = state.relay.handle_frame(&frame, &tx);
        tokio::pin!(exchange);
        loop {
            tokio::select! {
                _ = &mut exchange => break,
                msg = stream.next() => match classify(msg) {
                    Incoming::Prompt(next) => enqueue(&mut queued, next),
                    Incoming::Closed => {
                        info!("client disconnected mid-exchange, cancelling upstream");
                        break 'connection;
                    }
                    Incoming::Ignored => {}
                },
            }
        }
    }

    drop(tx);
    let _ = writer.await;
    info!("websocket closed");
}
