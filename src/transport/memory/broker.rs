// src/transport/memory/broker.rs

use bytes::Bytes;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::{mpsc, RwLock};

use crate::{
    // ---
    Endpoint,
    EndpointResolver,
    MessagePublisher,
    PublisherPtr,
    QoS,
    ResolverPtr,
    Result,
    SimError,
    Topic,
};

const INBOX_CAPACITY: usize = 64;

/// Messages retained by [`MemoryBroker::new`].
pub const DEFAULT_JOURNAL_CAPACITY: usize = 256;

/// One message accepted by the in-memory broker.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublishedMessage {
    pub endpoint: Endpoint,
    pub topic: Topic,
    pub qos: QoS,
    pub payload: Bytes,
}

/// In-process broker acting as both endpoint resolver and publisher.
///
/// Always handled through an `Arc`; [`resolver`](Self::resolver) and
/// [`publisher`](Self::publisher) hand out trait pointers to the same
/// instance, so a test can drive a loop and inspect the broker afterwards.
pub struct MemoryBroker {
    // ---
    subscriptions: RwLock<HashMap<Topic, Vec<mpsc::Sender<PublishedMessage>>>>,
    journal: Mutex<VecDeque<PublishedMessage>>,
    journal_capacity: usize,
    accepted: AtomicU64,

    fail_resolves: AtomicU32,
    fail_publishes: AtomicU32,
    resolve_calls: AtomicU64,
    publish_calls: AtomicU64,
}

/// Acquire mutex guard, ignoring poisoning
fn lock_ignore_poison<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    match m.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Decrement a pending-failure counter; true if a failure was consumed.
fn take_failure(counter: &AtomicU32) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

impl MemoryBroker {
    /// Create an empty broker retaining the last
    /// [`DEFAULT_JOURNAL_CAPACITY`] messages.
    pub fn new() -> Arc<Self> {
        Self::with_journal_capacity(DEFAULT_JOURNAL_CAPACITY)
    }

    /// Create an empty broker retaining at most the last `capacity` messages.
    pub fn with_journal_capacity(capacity: usize) -> Arc<Self> {
        // ---
        Arc::new(Self {
            subscriptions: RwLock::new(HashMap::new()),
            journal: Mutex::new(VecDeque::with_capacity(capacity.min(DEFAULT_JOURNAL_CAPACITY))),
            journal_capacity: capacity,
            accepted: AtomicU64::new(0),
            fail_resolves: AtomicU32::new(0),
            fail_publishes: AtomicU32::new(0),
            resolve_calls: AtomicU64::new(0),
            publish_calls: AtomicU64::new(0),
        })
    }

    /// This broker as an endpoint resolver.
    pub fn resolver(self: &Arc<Self>) -> ResolverPtr {
        Arc::clone(self) as ResolverPtr
    }

    /// This broker as a message publisher.
    pub fn publisher(self: &Arc<Self>) -> PublisherPtr {
        Arc::clone(self) as PublisherPtr
    }

    /// Make the next `n` endpoint lookups fail.
    pub fn fail_next_resolves(&self, n: u32) {
        self.fail_resolves.store(n, Ordering::SeqCst);
    }

    /// Make the next `n` publish calls fail.
    pub fn fail_next_publishes(&self, n: u32) {
        self.fail_publishes.store(n, Ordering::SeqCst);
    }

    /// Register an exact-match subscription.
    ///
    /// Messages published after this returns are delivered to the inbox.
    pub async fn subscribe(&self, topic: impl Into<Topic>) -> mpsc::Receiver<PublishedMessage> {
        // ---
        let (tx, rx) = mpsc::channel(INBOX_CAPACITY);

        let mut subs = self.subscriptions.write().await;
        subs.entry(topic.into()).or_default().push(tx);

        rx
    }

    /// Copy of the most recently accepted messages, oldest first.
    ///
    /// At most the journal capacity; older messages have been evicted.
    pub fn published(&self) -> Vec<PublishedMessage> {
        lock_ignore_poison(&self.journal).iter().cloned().collect()
    }

    /// Number of messages accepted since creation, evicted ones included.
    pub fn published_count(&self) -> u64 {
        self.accepted.load(Ordering::SeqCst)
    }

    /// Number of endpoint lookups, failed ones included.
    pub fn resolve_calls(&self) -> u64 {
        self.resolve_calls.load(Ordering::SeqCst)
    }

    /// Number of publish calls, failed ones included.
    pub fn publish_calls(&self) -> u64 {
        self.publish_calls.load(Ordering::SeqCst)
    }

    /// Drop every subscription.
    pub async fn clear_subscriptions(&self) {
        self.subscriptions.write().await.clear();
    }
}

#[async_trait::async_trait]
impl EndpointResolver for MemoryBroker {
    // ---
    async fn resolve_data_endpoint(&self, region: &str) -> Result<Endpoint> {
        // ---
        self.resolve_calls.fetch_add(1, Ordering::SeqCst);

        if take_failure(&self.fail_resolves) {
            return Err(SimError::EndpointResolution(format!(
                "injected lookup failure for region {region}"
            )));
        }

        Ok(Endpoint::from(format!("memory://{region}")))
    }
}

#[async_trait::async_trait]
impl MessagePublisher for MemoryBroker {
    // ---
    async fn publish(
        &self,
        endpoint: &Endpoint,
        topic: &Topic,
        qos: QoS,
        payload: Bytes,
    ) -> Result<()> {
        // ---
        self.publish_calls.fetch_add(1, Ordering::SeqCst);

        if take_failure(&self.fail_publishes) {
            return Err(SimError::Publish(format!("injected publish failure on {topic}")));
        }

        let message = PublishedMessage {
            endpoint: endpoint.clone(),
            topic: topic.clone(),
            qos,
            payload,
        };

        self.accepted.fetch_add(1, Ordering::SeqCst);
        if self.journal_capacity > 0 {
            let mut journal = lock_ignore_poison(&self.journal);
            if journal.len() == self.journal_capacity {
                journal.pop_front();
            }
            journal.push_back(message.clone());
        }

        let subs = self.subscriptions.read().await;
        if let Some(senders) = subs.get(topic) {
            for sender in senders {
                // A full or closed inbox belongs to a slow or dropped subscriber.
                if let Err(_err) = sender.try_send(message.clone()) {
                    crate::log_debug!("memory broker: delivery to {topic} skipped: {_err}");
                }
            }
        }

        Ok(())
    }

    /// For the in-memory broker, this clears all subscriptions.
    async fn close(&self) -> Result<()> {
        self.clear_subscriptions().await;
        Ok(())
    }
}
