//! Integration tests for the line transports.

use std::sync::Arc;
use std::time::Duration;

use codex_transport::{
    ConnConfig, ConnTransport, LineTransport, RecordTransport, ReplayTransport, Transcript,
    TransportError,
};
use pretty_assertions::assert_eq;
use tokio::io::AsyncWriteExt;

#[tokio::test]
async fn test_conn_round_trips_lines_both_ways() {
    let (a, b) = tokio::io::duplex(1024);
    let client = ConnTransport::new(a);
    let peer = ConnTransport::new(b);

    client.write_line(r#"{"method":"initialized"}"#).await.unwrap();
    assert_eq!(peer.read_line().await.unwrap(), r#"{"method":"initialized"}"#);

    peer.write_line("{\"id\":1,\"result\":{}}\n").await.unwrap();
    assert_eq!(client.read_line().await.unwrap(), r#"{"id":1,"result":{}}"#);
}

#[tokio::test]
async fn test_conn_strips_crlf_and_delivers_trailing_partial_line() {
    let (a, mut b) = tokio::io::duplex(1024);
    let client = ConnTransport::new(a);

    b.write_all(b"{\"a\":1}\r\n{\"b\":2}").await.unwrap();
    drop(b);

    assert_eq!(client.read_line().await.unwrap(), r#"{"a":1}"#);
    assert_eq!(client.read_line().await.unwrap(), r#"{"b":2}"#);
    assert!(matches!(client.read_line().await, Err(TransportError::Eof)));
}

#[tokio::test]
async fn test_conn_skips_overlong_lines() {
    let (a, mut b) = tokio::io::duplex(1024);
    let client = ConnTransport::with_config(a, ConnConfig { max_line_length: 8 });

    b.write_all(b"0123456789abcdef\n{}\n").await.unwrap();

    let err = client.read_line().await.unwrap_err();
    assert!(err.is_recoverable());
    assert_eq!(client.read_line().await.unwrap(), "{}");

    b.write_all(b"another line that is too long\n{\"a\":1}\n").await.unwrap();
    drop(b);
    assert!(client.read_line().await.unwrap_err().is_recoverable());
    assert_eq!(client.read_line().await.unwrap(), r#"{"a":1}"#);
    assert!(matches!(client.read_line().await, Err(TransportError::Eof)));
}

#[tokio::test]
async fn test_conn_close_unblocks_reader() {
    let (a, _b) = tokio::io::duplex(1024);
    let client = Arc::new(ConnTransport::new(a));

    let reader = {
        let client = client.clone();
        tokio::spawn(async move { client.read_line().await })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;
    client.close().await.unwrap();

    let result = tokio::time::timeout(Duration::from_secs(1), reader)
        .await
        .expect("read did not return after close")
        .unwrap();
    assert!(matches!(result, Err(TransportError::Closed)));
    assert!(matches!(client.write_line("{}").await, Err(TransportError::Closed)));
}

#[tokio::test]
async fn test_conn_against_scripted_stream() {
    let mock = tokio_test::io::Builder::new()
        .read(b"{\"id\":1,\"result\":{}}\n")
        .write(b"{\"method\":\"initialized\"}\n")
        .build();
    let client = ConnTransport::new(mock);

    assert_eq!(client.read_line().await.unwrap(), r#"{"id":1,"result":{}}"#);
    client.write_line(r#"{"method":"initialized"}"#).await.unwrap();
}

#[cfg(unix)]
#[tokio::test]
async fn test_process_echoes_through_cat() {
    use codex_transport::{ProcessConfig, ProcessTransport, StderrSink};

    let transport =
        ProcessTransport::spawn(ProcessConfig::new("/bin/cat").with_stderr(StderrSink::Discard))
            .unwrap();
    assert!(transport.pid().is_some());

    transport.write_line(r#"{"id":1,"method":"ping"}"#).await.unwrap();
    assert_eq!(transport.read_line().await.unwrap(), r#"{"id":1,"method":"ping"}"#);

    transport.close().await.unwrap();
    assert!(!transport.is_running().await);
    assert!(matches!(transport.read_line().await, Err(TransportError::Closed)));
    // idempotent
    transport.close().await.unwrap();
}

#[cfg(target_os = "linux")]
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_closes_both_wait_for_the_child() {
    use codex_transport::{ProcessConfig, ProcessTransport, StderrSink};

    let transport = Arc::new(
        ProcessTransport::spawn(
            ProcessConfig::new("/bin/sleep")
                .with_args(["30"])
                .with_stderr(StderrSink::Discard),
        )
        .unwrap(),
    );
    let pid = transport.pid().unwrap();
    let proc_entry = format!("/proc/{pid}");

    let other = {
        let transport = transport.clone();
        let proc_entry = proc_entry.clone();
        tokio::spawn(async move {
            transport.close().await.unwrap();
            std::path::Path::new(&proc_entry).exists()
        })
    };
    transport.close().await.unwrap();
    assert!(!std::path::Path::new(&proc_entry).exists());
    assert!(!other.await.unwrap(), "second close returned before the child was reaped");
}

#[tokio::test]
async fn test_replay_matches_writes_by_json_value() {
    let replay = ReplayTransport::new(
        Transcript::new()
            .write(r#"{"id":1,"method":"initialize","params":{"clientInfo":{"name":"t","version":"1"}}}"#)
            .read(r#"{"id":1,"result":{}}"#),
    );

    replay
        .write_line(r#"{"params":{"clientInfo":{"version":"1","name":"t"}},"method":"initialize","id":1}"#)
        .await
        .unwrap();
    assert_eq!(replay.read_line().await.unwrap(), r#"{"id":1,"result":{}}"#);
    assert!(replay.is_finished());
}

#[tokio::test]
async fn test_replay_mismatch_reports_both_lines() {
    let replay = ReplayTransport::new(Transcript::new().write(r#"{"method":"initialized"}"#));

    let err = replay.write_line(r#"{"method":"initialize"}"#).await.unwrap_err();
    match &err {
        TransportError::TranscriptMismatch { expected, actual } => {
            assert_eq!(expected, r#"{"method":"initialized"}"#);
            assert_eq!(actual, r#"{"method":"initialize"}"#);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    let message = err.to_string();
    assert!(message.contains("initialized") && message.contains("initialize"));
    assert_eq!(replay.remaining(), 1);
}

#[tokio::test]
async fn test_replay_read_blocks_until_closed_when_exhausted() {
    let replay = Arc::new(ReplayTransport::new(Transcript::new()));

    let reader = {
        let replay = replay.clone();
        tokio::spawn(async move { replay.read_line().await })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(!reader.is_finished());

    replay.close().await.unwrap();
    let result = tokio::time::timeout(Duration::from_secs(1), reader)
        .await
        .expect("read did not return after close")
        .unwrap();
    assert!(matches!(result, Err(TransportError::Closed)));
    assert!(matches!(replay.write_line("{}").await, Err(TransportError::Closed)));
}

#[tokio::test]
async fn test_record_then_replay() {
    let script = Transcript::new()
        .write(r#"{"id":1,"method":"thread/start","params":{}}"#)
        .read(r#"{"id":1,"result":{"thread":{"id":"thr_123"}}}"#)
        .read(r#"{"method":"turn/started","params":{"threadId":"thr_123"}}"#);

    let recorder = RecordTransport::new(ReplayTransport::new(script.clone()));
    recorder.write_line("{\"id\":1,\"method\":\"thread/start\",\"params\":{}}\n").await.unwrap();
    recorder.read_line().await.unwrap();
    recorder.read_line().await.unwrap();
    assert!(recorder.inner().is_finished());

    let recorded = recorder.transcript();
    assert_eq!(recorded, script);

    let replay = ReplayTransport::new(recorded);
    replay.write_line(r#"{"id":1,"method":"thread/start","params":{}}"#).await.unwrap();
    assert_eq!(
        replay.read_line().await.unwrap(),
        r#"{"id":1,"result":{"thread":{"id":"thr_123"}}}"#
    );
}

#[tokio::test]
async fn test_record_skips_failed_writes() {
    let recorder = RecordTransport::new(ReplayTransport::new(Transcript::new()));
    assert!(recorder.write_line("{}").await.is_err());
    assert!(recorder.transcript().is_empty());
}
