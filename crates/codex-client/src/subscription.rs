//! Notification fan-out.
//!
//! Every subscription owns an unbounded queue. The read loop appends to each
//! live queue under a short lock and moves on, so a consumer that never calls
//! [`NotificationStream::next`] cannot stall the read loop or other consumers.

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use codex_protocol::Notification;
use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::error::{ClientError, ClientResult};

#[derive(Debug, Clone)]
enum Closed {
    ByOwner,
    Terminated(String),
}

#[derive(Debug)]
struct QueueState {
    items: VecDeque<Notification>,
    closed: Option<Closed>,
}

#[derive(Debug)]
struct Queue {
    state: Mutex<QueueState>,
    ready: Notify,
}

impl Queue {
    fn new(capacity: usize) -> Self {
        Self {
            state: Mutex::new(QueueState {
                items: VecDeque::with_capacity(capacity),
                closed: None,
            }),
            ready: Notify::new(),
        }
    }

    fn push(&self, note: Notification) {
        {
            let mut state = self.state.lock();
            if state.closed.is_some() {
                return;
            }
            state.items.push_back(note);
        }
        self.ready.notify_one();
    }

    fn close(&self, how: Closed) {
        {
            let mut state = self.state.lock();
            if state.closed.is_some() {
                return;
            }
            if matches!(how, Closed::ByOwner) {
                state.items.clear();
            }
            state.closed = Some(how);
        }
        self.ready.notify_one();
    }

    /// Queued items are still handed out after termination; only an owner
    /// close discards them.
    fn try_pop(&self) -> Option<ClientResult<Notification>> {
        let mut state = self.state.lock();
        if let Some(note) = state.items.pop_front() {
            return Some(Ok(note));
        }
        state.closed.as_ref().map(|closed| {
            Err(match closed {
                Closed::ByOwner => ClientError::SubscriptionClosed,
                Closed::Terminated(reason) => ClientError::Closed(reason.clone()),
            })
        })
    }
}

/// Registry of live subscriptions, owned by the client.
#[derive(Debug, Default)]
pub(crate) struct Subscribers {
    next_id: AtomicU64,
    queues: Mutex<HashMap<u64, Arc<Queue>>>,
}

impl Subscribers {
    pub(crate) fn subscribe(self: &Arc<Self>, capacity: usize) -> NotificationStream {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let queue = Arc::new(Queue::new(capacity));
        self.queues.lock().insert(id, queue.clone());
        trace!(subscription = id, "subscribed to notifications");
        NotificationStream {
            id,
            queue,
            registry: self.clone(),
        }
    }

    /// Append `note` to every live subscription.
    pub(crate) fn publish(&self, note: &Notification) {
        let queues: Vec<Arc<Queue>> = self.queues.lock().values().cloned().collect();
        for queue in queues {
            queue.push(note.clone());
        }
    }

    /// Close every subscription with the termination reason and forget them.
    pub(crate) fn close_all(&self, reason: &str) {
        let queues: Vec<Arc<Queue>> = self.queues.lock().drain().map(|(_, q)| q).collect();
        for queue in queues {
            queue.close(Closed::Terminated(reason.to_string()));
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.queues.lock().len()
    }

    fn remove(&self, id: u64) {
        self.queues.lock().remove(&id);
    }
}

/// An ordered stream of server notifications.
///
/// Created by [`Client::subscribe_notifications`](crate::Client::subscribe_notifications).
/// Only notifications read after the subscription was created are observed.
/// Dropping the stream unsubscribes it.
pub struct NotificationStream {
    id: u64,
    queue: Arc<Queue>,
    registry: Arc<Subscribers>,
}

impl NotificationStream {
    /// Wait for the next notification.
    ///
    /// # Errors
    ///
    /// [`ClientError::Closed`] once the client has terminated and the queue is
    /// drained, [`ClientError::SubscriptionClosed`] after [`close`](Self::close).
    pub async fn next(&mut self) -> ClientResult<Notification> {
        loop {
            if let Some(result) = self.queue.try_pop() {
                return result;
            }
            self.queue.ready.notified().await;
        }
    }

    /// As [`next`](Self::next), giving up with [`ClientError::Cancelled`]
    /// when `cancel` fires first.
    pub async fn next_until(&mut self, cancel: &CancellationToken) -> ClientResult<Notification> {
        tokio::select! {
            biased;
            result = self.next() => result,
            () = cancel.cancelled() => Err(ClientError::Cancelled),
        }
    }

    /// Non-blocking poll: `None` when nothing is queued yet.
    pub fn try_next(&mut self) -> Option<ClientResult<Notification>> {
        self.queue.try_pop()
    }

    /// Detach from the client and discard anything queued. Idempotent.
    pub fn close(&self) {
        self.registry.remove(self.id);
        self.queue.close(Closed::ByOwner);
    }

    pub(crate) fn close_terminated(&self, reason: &str) {
        self.registry.remove(self.id);
        self.queue.close(Closed::Terminated(reason.to_string()));
    }
}

impl Drop for NotificationStream {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for NotificationStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationStream")
            .field("id", &self.id)
            .field("queued", &self.queue.state.lock().items.len())
            .finish()
    }
}
