//! Façade behaviour against recorded app-server conversations.

use std::sync::Arc;
use std::time::Duration;

use codex_protocol::types::ClientInfo;
use codex_sdk::{
    AutoApproveHandler, Codex, Options, SdkError, ThreadResumeOptions, ThreadStartOptions, TurnOptions,
};
use codex_transport::{LineTransport, ReplayTransport, Transcript, TransportError};
use pretty_assertions::assert_eq;
use serde_json::json;

const TURN_START: &str = r#"{"id":3,"method":"turn/start","params":{"threadId":"thr_123","input":[{"type":"text","text":"hello"}]}}"#;

/// Initialize handshake followed by a `thread/start` that yields `thr_123`.
fn session() -> Transcript {
    Transcript::new()
        .write(r#"{"id":1,"method":"initialize","params":{"clientInfo":{"name":"sdk-test","version":"1.0.0"}}}"#)
        .read(r#"{"id":1,"result":{"userAgent":"codex/0.0.0"}}"#)
        .write(r#"{"method":"initialized"}"#)
        .write(r#"{"id":2,"method":"thread/start","params":{"model":"gpt-5"}}"#)
        .read(r#"{"id":2,"result":{"thread":{"id":"thr_123"}}}"#)
}

fn options(replay: &Arc<ReplayTransport>) -> Options {
    Options::default()
        .with_transport(replay.clone())
        .with_client_info(ClientInfo::new("sdk-test", "1.0.0"))
}

async fn start(replay: &Arc<ReplayTransport>) -> (Codex, codex_sdk::Thread) {
    let codex = Codex::connect(options(replay)).await.unwrap();
    let thread = codex
        .start_thread(ThreadStartOptions::default().with_model("gpt-5"))
        .await
        .unwrap();
    assert_eq!(thread.id(), "thr_123");
    (codex, thread)
}

#[tokio::test]
async fn test_run_collects_the_turn() {
    let replay = Arc::new(ReplayTransport::new(
        session()
            .write(TURN_START)
            .read(r#"{"id":3,"result":{"turn":{"id":"turn_1"}}}"#)
            .read(r#"{"method":"turn/started","params":{"threadId":"thr_123","turn":{"id":"turn_1","status":"inProgress"}}}"#)
            .read(r#"{"method":"item/completed","params":{"threadId":"thr_other","item":{"text":"not ours"}}}"#)
            .read(r#"{"method":"account/rateLimits/updated","params":{"primary":{}}}"#)
            .read(r#"{"method":"item/completed","params":{"threadId":"thr_123","item":{"agentMessage":{"text":"hi there"}}}}"#)
            .read(r#"{"method":"turn/completed","params":{"threadId":"thr_123","turn":{"id":"turn_1","status":"completed"}}}"#),
    ));
    let (codex, thread) = start(&replay).await;

    let result = thread.run("hello", None).await.unwrap();

    assert_eq!(result.turn_id, "turn_1");
    assert_eq!(result.final_response, "hi there");
    assert_eq!(result.items, vec![json!({"agentMessage": {"text": "hi there"}})]);
    let methods: Vec<_> = result.notifications.iter().map(|n| n.method.as_str()).collect();
    assert_eq!(
        methods,
        vec!["turn/started", "account/rateLimits/updated", "item/completed", "turn/completed"]
    );
    assert!(replay.is_finished());
    codex.close().await.unwrap();
}

#[tokio::test]
async fn test_turn_failed_surfaces_its_message() {
    let replay = Arc::new(ReplayTransport::new(
        session()
            .write(TURN_START)
            .read(r#"{"id":3,"result":{}}"#)
            .read(r#"{"method":"turn/failed","params":{"threadId":"thr_123","turn":{"id":"turn_1","status":"failed","error":{"message":"boom"}}}}"#),
    ));
    let (_codex, thread) = start(&replay).await;

    let err = thread.run("hello", None).await.unwrap_err();
    assert!(matches!(err, SdkError::TurnFailed(_)));
    assert_eq!(err.to_string(), "boom");
}

#[tokio::test]
async fn test_retried_errors_do_not_end_the_turn() {
    let replay = Arc::new(ReplayTransport::new(
        session()
            .write(TURN_START)
            .read(r#"{"id":3,"result":{}}"#)
            .read(r#"{"method":"error","params":{"threadId":"thr_123","willRetry":true,"error":{"message":"stream disconnected"}}}"#)
            .read(r#"{"method":"turn/completed","params":{"threadId":"thr_123","turn":{"id":"turn_1","status":"completed"}}}"#)
            .write(r#"{"id":4,"method":"turn/start","params":{"threadId":"thr_123","input":[{"type":"text","text":"again"}],"effort":"low"}}"#)
            .read(r#"{"id":4,"result":{}}"#)
            .read(r#"{"method":"error","params":{"threadId":"thr_123","error":{"message":"usage limit reached"}}}"#),
    ));
    let (_codex, thread) = start(&replay).await;

    let first = thread.run("hello", None).await.unwrap();
    assert_eq!(first.notifications.len(), 2);
    assert_eq!(first.turn_id, "turn_1");

    let options = TurnOptions::default().with_effort("low");
    let err = thread.run("again", Some(&options)).await.unwrap_err();
    assert_eq!(err.to_string(), "usage limit reached");
}

#[tokio::test]
async fn test_completed_with_failed_status_is_a_failure() {
    let replay = Arc::new(ReplayTransport::new(
        session()
            .write(TURN_START)
            .read(r#"{"id":3,"result":{}}"#)
            .read(r#"{"method":"turn/completed","params":{"threadId":"thr_123","turn":{"id":"turn_1","status":"failed"}}}"#),
    ));
    let (_codex, thread) = start(&replay).await;

    let err = thread.run("hello", None).await.unwrap_err();
    assert_eq!(err.to_string(), "turn failed");
}

#[tokio::test]
async fn test_streamed_turn_yields_only_this_thread() {
    let replay = Arc::new(ReplayTransport::new(
        session()
            .write(TURN_START)
            .read(r#"{"id":3,"result":{}}"#)
            .read(r#"{"method":"turn/started","params":{"threadId":"thr_other","turn":{"id":"x"}}}"#)
            .read(r#"{"method":"turn/started","params":{"threadId":"thr_123","turn":{"id":"turn_1"}}}"#),
    ));
    let (_codex, thread) = start(&replay).await;

    let mut stream = thread
        .run_streamed(vec![codex_sdk::Input::text("hello")], None)
        .await
        .unwrap();
    let note = stream.next().await.unwrap();
    assert_eq!(note.thread_id(), Some("thr_123"));
    assert_eq!(stream.thread_id(), "thr_123");

    stream.close();
    assert!(stream.next().await.is_err());
}

#[tokio::test]
async fn test_resume_uses_flat_thread_id_and_requires_one() {
    let replay = Arc::new(ReplayTransport::new(
        Transcript::new()
            .write(r#"{"id":1,"method":"initialize","params":{"clientInfo":{"name":"sdk-test","version":"1.0.0"}}}"#)
            .read(r#"{"id":1,"result":{}}"#)
            .write(r#"{"method":"initialized"}"#)
            .write(r#"{"id":2,"method":"thread/resume","params":{"threadId":"thr_9"}}"#)
            .read(r#"{"id":2,"result":{"threadId":"thr_9","thread":{"id":"ignored"}}}"#)
            .write(r#"{"id":3,"method":"thread/resume","params":{"threadId":"thr_gone"}}"#)
            .read(r#"{"id":3,"result":{"thread":{"id":""}}}"#),
    ));
    let codex = Codex::connect(options(&replay)).await.unwrap();

    let thread = codex.resume_thread(ThreadResumeOptions::thread("thr_9")).await.unwrap();
    assert_eq!(thread.id(), "thr_9");

    let err = codex
        .resume_thread(ThreadResumeOptions::thread("thr_gone"))
        .await
        .unwrap_err();
    assert!(matches!(err, SdkError::MissingThreadId));
    assert_eq!(err.to_string(), "thread id not found in response");
}

#[tokio::test]
async fn test_rejected_initialize_closes_the_client() {
    let replay = Arc::new(ReplayTransport::new(
        Transcript::new()
            .write(r#"{"id":1,"method":"initialize","params":{"clientInfo":{"name":"sdk-test","version":"1.0.0"}}}"#)
            .read(r#"{"id":1,"error":{"code":-32600,"message":"already initialized"}}"#),
    ));

    let err = Codex::connect(options(&replay)).await.unwrap_err();
    match err {
        SdkError::Client(e) => assert_eq!(e.response().unwrap().message(), "already initialized"),
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(replay.is_finished());
    assert!(matches!(replay.read_line().await, Err(TransportError::Closed)));
}

#[tokio::test]
async fn test_silent_server_hits_the_init_timeout() {
    let replay = Arc::new(ReplayTransport::new(
        Transcript::new()
            .write(r#"{"id":1,"method":"initialize","params":{"clientInfo":{"name":"sdk-test","version":"1.0.0"}}}"#),
    ));

    let err = Codex::connect(options(&replay).with_init_timeout(Some(Duration::from_millis(20))))
        .await
        .unwrap_err();
    assert!(matches!(err, SdkError::InitTimeout(d) if d == Duration::from_millis(20)));
}

#[tokio::test]
async fn test_auto_approve_answers_during_a_turn() {
    let replay = Arc::new(ReplayTransport::new(
        session()
            .write(TURN_START)
            .read(r#"{"id":3,"result":{}}"#)
            .read(r#"{"id":"apr-1","method":"item/commandExecution/requestApproval","params":{"threadId":"thr_123","turnId":"turn_1","itemId":"cmd_1","command":"cargo test"}}"#)
            .write(r#"{"id":"apr-1","result":{"decision":"accept"}}"#)
            .read(r#"{"method":"turn/completed","params":{"threadId":"thr_123","turn":{"id":"turn_1","status":"completed"}}}"#),
    ));
    let codex = Codex::connect(options(&replay).with_approval_handler(Arc::new(AutoApproveHandler)))
        .await
        .unwrap();
    let thread = codex
        .start_thread(ThreadStartOptions::default().with_model("gpt-5"))
        .await
        .unwrap();

    let result = thread.run("hello", None).await.unwrap();
    assert_eq!(result.turn_id, "turn_1");
    assert!(replay.is_finished());
}

#[tokio::test]
async fn test_spawn_failure_is_reported() {
    let options = Options::default().with_spawn(
        codex_sdk::SpawnOptions::default().with_codex_path("/nonexistent/codex-binary-for-tests"),
    );
    let err = Codex::connect(options).await.unwrap_err();
    assert!(matches!(err, SdkError::Spawn(_)));
}
