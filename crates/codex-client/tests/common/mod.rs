#![allow(dead_code)]

use std::time::Duration;

use codex_transport::{ConnTransport, LineTransport};
use serde_json::Value;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A client-side transport plus the peer end a test scripts by hand.
pub fn duplex_pair() -> (ConnTransport, ConnTransport) {
    let (a, b) = tokio::io::duplex(64 * 1024);
    (ConnTransport::new(a), ConnTransport::new(b))
}

pub async fn read_json(peer: &ConnTransport) -> Value {
    let line = peer.read_line().await.expect("peer read");
    serde_json::from_str(&line).expect("peer got invalid json")
}

pub async fn write_json(peer: &ConnTransport, value: Value) {
    peer.write_line(&value.to_string()).await.expect("peer write");
}

/// Poll `cond` until it holds or a second passes.
pub async fn wait_until(mut cond: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(1), async {
        while !cond() {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}
