//! Publish loop builder.
//!
//! Provides a fluent builder API for assembling a [`PublishLoop`] from a
//! [`SimConfig`], the two broker collaborators, and optional overrides.

use std::time::Duration;
use tokio::sync::mpsc;

use crate::generator::ReadingGenerator;
use crate::{
    // ---
    EndpointPolicy,
    PublishLoop,
    PublisherPtr,
    ResolverPtr,
    Result,
    SimConfig,
    StatusReport,
    TopicRotator,
};

/// Builder for creating publish loop instances.
///
/// Everything not overridden is taken from the [`SimConfig`]: the rotator
/// from its topic list, the generator from its mode and seed, and the
/// interval, cycle limit and endpoint policy as configured.
///
/// # Examples
///
/// ## Vehicle rotation against the in-memory broker
/// ```no_run
/// use iot_telemetry_sim::{MemoryBroker, PublishLoopBuilder, SimConfig};
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> iot_telemetry_sim::Result<()> {
/// let config = SimConfig::vehicle().with_max_cycles(6);
/// let broker = MemoryBroker::new();
///
/// let mut publish_loop = PublishLoopBuilder::new(&config, broker.resolver(), broker.publisher())
///     .build()?;
///
/// let summary = publish_loop.run(CancellationToken::new()).await;
/// assert_eq!(summary.cycles, 6);
/// # Ok(())
/// # }
/// ```
pub struct PublishLoopBuilder<'a> {
    // ---
    config: &'a SimConfig,
    resolver: ResolverPtr,
    publisher: PublisherPtr,

    // Overrides (all optional)
    rotator: Option<TopicRotator>,
    generator: Option<Box<dyn ReadingGenerator>>,
    interval: Option<Duration>,
    max_cycles: Option<u64>,
    endpoint_policy: Option<EndpointPolicy>,
    reporter: Option<mpsc::Sender<StatusReport>>,
}

impl<'a> PublishLoopBuilder<'a> {
    /// Create a new builder over `config` and the broker collaborators.
    pub fn new(config: &'a SimConfig, resolver: ResolverPtr, publisher: PublisherPtr) -> Self {
        // ---
        Self {
            config,
            resolver,
            publisher,
            rotator: None,
            generator: None,
            interval: None,
            max_cycles: None,
            endpoint_policy: None,
            reporter: None,
        }
    }

    /// Use an explicit rotator, e.g. one with a non-zero start index.
    pub fn rotator(mut self, rotator: TopicRotator) -> Self {
        self.rotator = Some(rotator);
        self
    }

    /// Use a custom reading generator.
    pub fn generator(mut self, generator: Box<dyn ReadingGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Override the wait between cycles.
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = Some(interval);
        self
    }

    /// Stop after `cycles` cycles.
    pub fn max_cycles(mut self, cycles: u64) -> Self {
        self.max_cycles = Some(cycles);
        self
    }

    /// Override the endpoint resolution policy.
    pub fn endpoint_policy(mut self, policy: EndpointPolicy) -> Self {
        self.endpoint_policy = Some(policy);
        self
    }

    /// Forward per-cycle and final reports to `tx`.
    ///
    /// Reports are sent with `try_send`; a full or closed channel drops them
    /// and never stalls the loop.
    pub fn status_reporter(mut self, tx: mpsc::Sender<StatusReport>) -> Self {
        self.reporter = Some(tx);
        self
    }

    /// Build the publish loop (consumes self).
    ///
    /// # Errors
    ///
    /// Returns the configuration error from [`SimConfig::validate`] when no
    /// rotator override is given and the config is invalid.
    pub fn build(self) -> Result<PublishLoop> {
        // ---
        let rotator = match self.rotator {
            Some(rotator) => rotator,
            None => {
                self.config.validate()?;
                self.config.rotator()?
            }
        };

        let generator = self
            .generator
            .unwrap_or_else(|| self.config.generator());

        Ok(PublishLoop::new(
            self.config.region.clone(),
            self.interval.unwrap_or(self.config.interval),
            self.max_cycles.or(self.config.max_cycles),
            self.endpoint_policy.unwrap_or(self.config.endpoint_policy),
            rotator,
            generator,
            self.resolver,
            self.publisher,
            self.reporter,
        ))
    }
}
