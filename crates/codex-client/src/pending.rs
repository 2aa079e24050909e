//! Correlation table for in-flight requests.

use std::collections::HashMap;

use codex_protocol::RequestId;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::oneshot;
use tracing::trace;

use crate::error::ClientError;

pub(crate) type Outcome = Result<Value, ClientError>;

/// Request id key → single-slot delivery channel.
///
/// The lock is only held for insert, remove and drain.
#[derive(Debug, Default)]
pub(crate) struct PendingTable {
    waiters: Mutex<HashMap<String, oneshot::Sender<Outcome>>>,
}

impl PendingTable {
    /// Insert a slot for `id`. The returned guard removes it again on drop.
    pub(crate) fn register(
        &self,
        id: &RequestId,
    ) -> (PendingGuard<'_>, oneshot::Receiver<Outcome>) {
        let (tx, rx) = oneshot::channel();
        let key = id.key();
        self.waiters.lock().insert(key.clone(), tx);
        trace!(%key, "registered response waiter");
        (PendingGuard { table: self, key }, rx)
    }

    /// Deliver `outcome` to the waiter for `id`. Returns false when nobody waits.
    pub(crate) fn resolve(&self, id: &RequestId, outcome: Outcome) -> bool {
        let Some(tx) = self.waiters.lock().remove(&id.key()) else {
            return false;
        };
        // The receiver may have been dropped a moment ago; that is a late response too.
        tx.send(outcome).is_ok()
    }

    /// Resolve every waiter with `ClientError::Closed(reason)`.
    pub(crate) fn fail_all(&self, reason: &str) {
        let drained: Vec<_> = self.waiters.lock().drain().map(|(_, tx)| tx).collect();
        for tx in drained {
            let _ = tx.send(Err(ClientError::Closed(reason.to_string())));
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.waiters.lock().len()
    }
}

/// Removes a pending slot when the call finishes, times out, or is dropped.
#[derive(Debug)]
pub(crate) struct PendingGuard<'a> {
    table: &'a PendingTable,
    key: String,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.table.waiters.lock().remove(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_resolve_delivers_once() {
        let table = PendingTable::default();
        let id = RequestId::Number(1);
        let (_guard, rx) = table.register(&id);

        assert!(table.resolve(&id, Ok(json!({"ok": true}))));
        assert!(!table.resolve(&id, Ok(json!(null))));
        assert_eq!(rx.await.unwrap().unwrap(), json!({"ok": true}));
    }

    #[test]
    fn test_guard_drop_releases_slot() {
        let table = PendingTable::default();
        let (guard, _rx) = table.register(&RequestId::Number(7));
        assert_eq!(table.len(), 1);
        drop(guard);
        assert_eq!(table.len(), 0);
        assert!(!table.resolve(&RequestId::Number(7), Ok(Value::Null)));
    }

    #[tokio::test]
    async fn test_fail_all_carries_reason() {
        let table = PendingTable::default();
        let (_a, rx_a) = table.register(&RequestId::Number(1));
        let (_b, rx_b) = table.register(&RequestId::String("1".into()));
        assert_eq!(table.len(), 2);

        table.fail_all("connection closed");
        for rx in [rx_a, rx_b] {
            let err = rx.await.unwrap().unwrap_err();
            assert_eq!(err.to_string(), "connection closed");
        }
        assert_eq!(table.len(), 0);
    }
}
