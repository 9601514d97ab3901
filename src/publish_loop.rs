//! The telemetry publish loop.
//!
//! One loop instance drives one simulated device. Each cycle walks the same
//! fixed sequence of stages:
//!
//! ```text
//! Selecting → Generating → Resolving → Publishing → Recording → Waiting
//!     ↑                                                            │
//!     └────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **Selecting**: the [`TopicRotator`] yields the topic for this cycle.
//! - **Generating**: the [`ReadingGenerator`] produces a fresh reading.
//! - **Resolving**: the [`EndpointResolver`](crate::EndpointResolver) is asked
//!   for the broker endpoint (every attempt, unless
//!   [`EndpointPolicy::CacheAfterFirst`] is configured). A failure skips
//!   Publishing.
//! - **Publishing**: the reading is encoded as compact UTF-8 JSON and handed
//!   to the [`MessagePublisher`](crate::MessagePublisher) with QoS 1.
//! - **Recording**: successes bump the counter; every outcome is logged and
//!   forwarded to the optional status channel.
//! - **Waiting**: a fixed interval, raced against cancellation.
//!
//! No failure inside a cycle stops the loop. It ends only when its
//! [`CancellationToken`] fires (even mid-cycle) or the configured cycle limit
//! is reached, and it always finishes by emitting a [`RunSummary`].
//!
//! There is exactly one writer of the counters and the rotation index (the
//! loop itself, through `&mut self`), so no locking is involved.

use bytes::Bytes;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::generator::{Reading, ReadingGenerator};
use crate::{
    // ---
    CycleOutcome,
    Endpoint,
    EndpointPolicy,
    FailureKind,
    PublisherPtr,
    QoS,
    ResolverPtr,
    Result,
    RunSummary,
    StatusReport,
    Topic,
    TopicRotator,
};

/// Publish QoS used for every reading.
pub const PUBLISH_QOS: QoS = QoS::AtLeastOnce;

/// Cancellable publish loop for one simulated device.
///
/// Built with [`PublishLoopBuilder`](crate::PublishLoopBuilder).
pub struct PublishLoop {
    // ---
    region: String,
    interval: Duration,
    max_cycles: Option<u64>,
    endpoint_policy: EndpointPolicy,

    rotator: TopicRotator,
    generator: Box<dyn ReadingGenerator>,
    resolver: ResolverPtr,
    publisher: PublisherPtr,
    reporter: Option<mpsc::Sender<StatusReport>>,

    // Only populated under EndpointPolicy::CacheAfterFirst
    cached_endpoint: Option<Endpoint>,
    summary: RunSummary,
}

impl PublishLoop {
    /// Create a new loop (internal use by PublishLoopBuilder).
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        region: String,
        interval: Duration,
        max_cycles: Option<u64>,
        endpoint_policy: EndpointPolicy,
        rotator: TopicRotator,
        generator: Box<dyn ReadingGenerator>,
        resolver: ResolverPtr,
        publisher: PublisherPtr,
        reporter: Option<mpsc::Sender<StatusReport>>,
    ) -> Self {
        Self {
            region,
            interval,
            max_cycles,
            endpoint_policy,
            rotator,
            generator,
            resolver,
            publisher,
            reporter,
            cached_endpoint: None,
            summary: RunSummary::default(),
        }
    }

    /// Counters accumulated so far.
    pub fn summary(&self) -> RunSummary {
        self.summary
    }

    /// Run cycles until `cancel` fires or the cycle limit is reached.
    ///
    /// Cancellation is raced against every cycle and against the inter-cycle
    /// wait, so a cancelled loop stops immediately, even while a resolver or
    /// publisher call is outstanding. The returned summary is also logged and
    /// sent on the status channel.
    pub async fn run(&mut self, cancel: CancellationToken) -> RunSummary {
        // ---
        crate::log_info!(
            "publish loop starting: region={} topics={:?} interval={:?} policy={:?}",
            self.region,
            self.rotator.topics(),
            self.interval,
            self.endpoint_policy
        );

        loop {
            if cancel.is_cancelled() || self.limit_reached() {
                break;
            }

            // An abandoned cycle is neither counted nor reported.
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    crate::log_info!("publish loop cancelled mid-cycle");
                    break;
                }
                _ = self.run_cycle() => {}
            }

            if self.limit_reached() {
                break;
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }

        self.finish()
    }

    /// Execute one Selecting → Recording pass without waiting afterwards.
    pub async fn run_cycle(&mut self) -> CycleOutcome {
        // ---
        let cycle = self.summary.cycles + 1;
        let topic = self.rotator.next();
        let reading = self.generator.generate(&topic);

        crate::log_info!(
            "message #{cycle} from {} → {topic}: {}",
            reading.device_id(),
            reading.summary()
        );

        let result = self.attempt(&topic, &reading).await;
        let outcome = self.record(topic, result);

        self.report(StatusReport::Cycle {
            cycle,
            outcome: outcome.clone(),
        });
        outcome
    }

    /// Resolving + Publishing for one reading.
    async fn attempt(&mut self, topic: &Topic, reading: &Reading) -> Result<()> {
        // ---
        let endpoint = self.resolve().await?;
        crate::log_debug!("endpoint for {}: {endpoint}", self.region);

        let payload = Bytes::from(serde_json::to_vec(reading)?);

        let published = self
            .publisher
            .publish(&endpoint, topic, PUBLISH_QOS, payload)
            .await;

        if published.is_err() && self.cached_endpoint.take().is_some() {
            crate::log_warn!("dropping cached endpoint {endpoint} after publish failure");
        }
        published
    }

    async fn resolve(&mut self) -> Result<Endpoint> {
        // ---
        match self.endpoint_policy {
            EndpointPolicy::ResolveEveryAttempt => {
                self.resolver.resolve_data_endpoint(&self.region).await
            }
            EndpointPolicy::CacheAfterFirst => {
                if let Some(endpoint) = &self.cached_endpoint {
                    return Ok(endpoint.clone());
                }
                let endpoint = self.resolver.resolve_data_endpoint(&self.region).await?;
                self.cached_endpoint = Some(endpoint.clone());
                Ok(endpoint)
            }
        }
    }

    /// Fold a stage result into the counters and log it.
    fn record(&mut self, topic: Topic, result: Result<()>) -> CycleOutcome {
        // ---
        self.summary.cycles += 1;

        match result {
            Ok(()) => {
                self.summary.successes += 1;
                let total = self.summary.successes;
                crate::log_info!("published to {topic}; {total} messages sent in total");
                CycleOutcome::Published { topic, total }
            }
            Err(err) => {
                self.summary.failures += 1;
                let kind = FailureKind::from(&err);
                crate::log_error!("message to {topic} failed ({kind}): {err}");
                CycleOutcome::Failed {
                    topic,
                    kind,
                    reason: err.to_string(),
                }
            }
        }
    }

    fn limit_reached(&self) -> bool {
        matches!(self.max_cycles, Some(max) if self.summary.cycles >= max)
    }

    fn finish(&mut self) -> RunSummary {
        // ---
        let summary = self.summary;
        crate::log_info!("publish loop stopped: {summary}");
        self.report(StatusReport::Stopped(summary));
        summary
    }

    /// Forward a report without ever blocking the loop.
    fn report(&self, report: StatusReport) {
        // ---
        let Some(tx) = &self.reporter else {
            return;
        };

        if let Err(_err) = tx.try_send(report) {
            crate::log_debug!("status report dropped: {_err}");
        }
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::generator::SensorGenerator;
    use crate::{EndpointResolver, MessagePublisher, SimError};
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    struct FixedResolver {
        calls: AtomicU64,
    }

    #[async_trait::async_trait]
    impl EndpointResolver for FixedResolver {
        async fn resolve_data_endpoint(&self, region: &str) -> Result<Endpoint> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Endpoint::from(format!("test://{region}")))
        }
    }

    /// Fails every call whose 1-based index is listed.
    struct ScriptedPublisher {
        calls: AtomicU64,
        fail_on: Vec<u64>,
    }

    #[async_trait::async_trait]
    impl MessagePublisher for ScriptedPublisher {
        async fn publish(
            &self,
            _endpoint: &Endpoint,
            _topic: &Topic,
            qos: QoS,
            _payload: Bytes,
        ) -> Result<()> {
            assert_eq!(qos, QoS::AtLeastOnce);
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if self.fail_on.contains(&n) {
                Err(SimError::Publish(format!("scripted failure {n}")))
            } else {
                Ok(())
            }
        }
    }

    fn make_loop(
        policy: EndpointPolicy,
        fail_on: Vec<u64>,
    ) -> (PublishLoop, Arc<FixedResolver>, Arc<ScriptedPublisher>) {
        // ---
        let resolver = Arc::new(FixedResolver {
            calls: AtomicU64::new(0),
        });
        let publisher = Arc::new(ScriptedPublisher {
            calls: AtomicU64::new(0),
            fail_on,
        });

        let publish_loop = PublishLoop::new(
            "test-region".into(),
            Duration::from_secs(1),
            None,
            policy,
            TopicRotator::single("topic/test"),
            Box::new(SensorGenerator::with_seed("dev-1", 1)),
            resolver.clone(),
            publisher.clone(),
            None,
        );
        (publish_loop, resolver, publisher)
    }

    #[tokio::test]
    async fn test_resolve_every_attempt() {
        // ---
        let (mut publish_loop, resolver, _publisher) =
            make_loop(EndpointPolicy::ResolveEveryAttempt, vec![]);

        for _ in 0..4 {
            assert!(publish_loop.run_cycle().await.is_success());
        }
        assert_eq!(resolver.calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_cached_endpoint_invalidated_by_publish_failure() {
        // ---
        let (mut publish_loop, resolver, _publisher) =
            make_loop(EndpointPolicy::CacheAfterFirst, vec![2]);

        publish_loop.run_cycle().await; // resolves
        publish_loop.run_cycle().await; // cached, publish fails, cache dropped
        publish_loop.run_cycle().await; // resolves again
        publish_loop.run_cycle().await; // cached

        assert_eq!(resolver.calls.load(Ordering::SeqCst), 2);
        assert_eq!(publish_loop.summary().successes, 3);
    }

    #[tokio::test]
    async fn test_publish_failure_is_recorded_not_counted() {
        // ---
        let (mut publish_loop, _resolver, _publisher) =
            make_loop(EndpointPolicy::ResolveEveryAttempt, vec![1]);

        let outcome = publish_loop.run_cycle().await;
        assert!(matches!(
            outcome,
            CycleOutcome::Failed {
                kind: FailureKind::Publish,
                ..
            }
        ));

        let outcome = publish_loop.run_cycle().await;
        assert_eq!(
            outcome,
            CycleOutcome::Published {
                topic: Topic::from("topic/test"),
                total: 1
            }
        );
        assert_eq!(
            publish_loop.summary(),
            RunSummary {
                cycles: 2,
                successes: 1,
                failures: 1
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_cycle_limit_stops_without_trailing_wait() {
        // ---
        let (mut publish_loop, _resolver, publisher) =
            make_loop(EndpointPolicy::ResolveEveryAttempt, vec![]);
        publish_loop.max_cycles = Some(3);

        let start = tokio::time::Instant::now();
        let summary = publish_loop.run(CancellationToken::new()).await;

        assert_eq!(summary.cycles, 3);
        assert_eq!(publisher.calls.load(Ordering::SeqCst), 3);
        // Two waits between three cycles.
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(2), "elapsed too short: {elapsed:?}");
        assert!(elapsed < Duration::from_secs(3), "elapsed too long: {elapsed:?}");
    }

    #[tokio::test]
    async fn test_cancelled_before_start_runs_nothing() {
        // ---
        let (mut publish_loop, resolver, _publisher) =
            make_loop(EndpointPolicy::ResolveEveryAttempt, vec![]);

        let cancel = CancellationToken::new();
        cancel.cancel();

        let summary = publish_loop.run(cancel).await;
        assert_eq!(summary, RunSummary::default());
        assert_eq!(resolver.calls.load(Ordering::SeqCst), 0);
    }
}
