//! End-to-end chat relay over a real WebSocket.

mod helpers;

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use helpers::{
    CHAT_MODEL, COORDINATOR_MODEL, MockLlm, MockReply, exchange, prompt_frame, reply_text, spawn_app,
    test_config, text, ws_connect,
};
use james::memory::{MemoryLog, MemoryRecord};
use tokio_tungstenite::tungstenite::Message;

#[tokio::test]
async fn streams_fragments_then_done() {
    let mock = MockLlm::start(vec![(CHAT_MODEL, vec![text("Shaken, not stirred.")])]).await;
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path(), "openai-compatible", &mock.api_base, "direct", false);
    let addr = spawn_app(&config).await;

    let mut ws = ws_connect(addr).await;
    let frames = exchange(&mut ws, &prompt_frame("How do you take it?")).await;

    assert_eq!(frames.last().map(String::as_str), Some("[Done]"));
    assert!(frames.len() > 2, "expected several fragments, got {frames:?}");
    assert_eq!(reply_text(&frames), "Shaken, not stirred.");

    let call = &mock.calls()[0];
    assert!(call.stream);
    assert_eq!(call.role(0), "system");
    assert_eq!(call.role(1), "user");
    assert_eq!(call.content(1), "How do you take it?");
}

#[tokio::test]
async fn upstream_disconnect_yields_one_error_and_no_done() {
    let mock = MockLlm::start(vec![(
        CHAT_MODEL,
        vec![
            MockReply::Drop(vec!["Hel".into(), "lo".into()]),
            text("Second time lucky."),
        ],
    )])
    .await;
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path(), "openai-compatible", &mock.api_base, "direct", false);
    let addr = spawn_app(&config).await;
    let mut ws = ws_connect(addr).await;

    let frames = exchange(&mut ws, &prompt_frame("hello")).await;
    let errors = frames.iter().filter(|f| f.starts_with("[Error]")).count();
    assert_eq!(errors, 1, "frames: {frames:?}");
    assert!(frames.last().is_some_and(|f| f.starts_with("[Error]")));
    assert!(!frames.iter().any(|f| f == "[Done]"));

    // The connection survives; the next exchange starts clean, so no
    // stray terminal frame was left behind by the failed one.
    let frames = exchange(&mut ws, &prompt_frame("again")).await;
    assert_eq!(reply_text(&frames), "Second time lucky.");
    assert_eq!(frames.last().map(String::as_str), Some("[Done]"));
}

#[tokio::test]
async fn malformed_chunks_are_skipped() {
    let raw = concat!(
        "data: {\"choices\":[{\"delta\":{\"content\":\"Good \"}}]}\n\n",
        "data: this is not json\n\n",
        ": keep-alive\n\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\"evening.\"}}]}\n\n",
        "data: [DONE]\n\n",
    );
    let mock = MockLlm::start(vec![(CHAT_MODEL, vec![MockReply::Raw(raw.into())])]).await;
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path(), "openai-compatible", &mock.api_base, "direct", false);
    let addr = spawn_app(&config).await;
    let mut ws = ws_connect(addr).await;

    let frames = exchange(&mut ws, &prompt_frame("hi")).await;
    assert_eq!(frames, vec!["Good ", "evening.", "[Done]"]);
}

#[tokio::test]
async fn http_error_status_is_reported_once() {
    let mock = MockLlm::start(vec![(CHAT_MODEL, vec![MockReply::Fail(500, "model not loaded".into())])]).await;
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path(), "openai-compatible", &mock.api_base, "direct", false);
    let addr = spawn_app(&config).await;
    let mut ws = ws_connect(addr).await;

    let frames = exchange(&mut ws, &prompt_frame("hi")).await;
    assert_eq!(frames.len(), 1);
    assert!(frames[0].starts_with("[Error]"));
    assert!(frames[0].contains("model not loaded"));
}

#[tokio::test]
async fn invalid_frame_keeps_connection_open() {
    let mock = MockLlm::start(vec![(CHAT_MODEL, vec![text("Still here.")])]).await;
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path(), "openai-compatible", &mock.api_base, "direct", false);
    let addr = spawn_app(&config).await;
    let mut ws = ws_connect(addr).await;

    let frames = exchange(&mut ws, "not json at all").await;
    assert_eq!(frames.len(), 1);
    assert!(frames[0].starts_with("[Error]"));
    assert!(mock.calls().is_empty());

    let frames = exchange(&mut ws, &prompt_frame("   ")).await;
    assert!(frames[0].starts_with("[Error]"));

    let frames = exchange(&mut ws, &prompt_frame("hello")).await;
    assert_eq!(reply_text(&frames), "Still here.");
}

#[tokio::test]
async fn workflow_mode_sends_final_reply() {
    let mock = MockLlm::start(vec![(COORDINATOR_MODEL, vec![text("Good evening.")])]).await;
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path(), "openai-compatible", &mock.api_base, "workflow", false);
    let addr = spawn_app(&config).await;
    let mut ws = ws_connect(addr).await;

    let frames = exchange(&mut ws, &prompt_frame("Hello James")).await;
    assert_eq!(frames, vec!["Good evening.", "[Done]"]);
    assert_eq!(mock.models_called(), vec![COORDINATOR_MODEL]);
}

#[tokio::test]
async fn memory_is_attached_as_context() {
    let mock = MockLlm::start(vec![(CHAT_MODEL, vec![text("Friday at nine.")])]).await;
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path(), "openai-compatible", &mock.api_base, "direct", true);

    MemoryLog::new(&config.memory.path)
        .append(&MemoryRecord::new("dentist Friday 9am", "alice", "default", None))
        .await
        .unwrap();

    let addr = spawn_app(&config).await;
    let mut ws = ws_connect(addr).await;
    let frames = exchange(&mut ws, &prompt_frame("When is my appointment?")).await;
    assert_eq!(reply_text(&frames), "Friday at nine.");

    let call = &mock.calls()[0];
    assert_eq!(call.messages.len(), 3);
    assert_eq!(call.role(1), "system");
    assert!(call.content(1).contains("alice: dentist Friday 9am"));
    assert_eq!(call.content(2), "When is my appointment?");
}

#[tokio::test]
async fn prompts_sent_back_to_back_are_answered_in_order() {
    let mock = MockLlm::start(vec![(CHAT_MODEL, vec![text("first"), text("second")])]).await;
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path(), "openai-compatible", &mock.api_base, "direct", false);
    let addr = spawn_app(&config).await;
    let mut ws = ws_connect(addr).await;

    ws.send(Message::Text(prompt_frame("one"))).await.unwrap();
    ws.send(Message::Text(prompt_frame("two"))).await.unwrap();

    let a = helpers::read_exchange(&mut ws).await;
    let b = helpers::read_exchange(&mut ws).await;
    assert_eq!(reply_text(&a), "first");
    assert_eq!(reply_text(&b), "second");
    assert_eq!(b.last().map(String::as_str), Some("[Done]"));
}

#[tokio::test]
async fn client_close_cancels_upstream_stream() {
    let mock = MockLlm::start(vec![(
        CHAT_MODEL,
        vec![MockReply::Stall("Good ".into()), text("Still here.")],
    )])
    .await;
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path(), "openai-compatible", &mock.api_base, "direct", false);
    let addr = spawn_app(&config).await;

    let mut ws = ws_connect(addr).await;
    ws.send(Message::Text(prompt_frame("Tell me a long story"))).await.unwrap();
    let first = tokio::time::timeout(Duration::from_secs(10), ws.next())
        .await
        .expect("timed out waiting for the first fragment");
    assert!(matches!(first, Some(Ok(Message::Text(ref t))) if t == "Good "));

    ws.close(None).await.unwrap();
    assert!(
        mock.body_dropped(Duration::from_secs(5)).await,
        "upstream response was not dropped after the client left"
    );

    // The server keeps serving new connections.
    let mut ws = ws_connect(addr).await;
    let frames = exchange(&mut ws, &prompt_frame("hello again")).await;
    assert_eq!(reply_text(&frames), "Still here.");
}
