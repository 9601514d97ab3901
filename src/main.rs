//! Command-line entry point for the telemetry simulator.
//!
//! ```text
//! iot-telemetry-sim                      # publish until Ctrl+C
//! iot-telemetry-sim --mode vehicle       # rotate truck / sedan / suv
//! iot-telemetry-sim --test               # one message per topic, exit 1 on failure
//! iot-telemetry-sim --mode vehicle --sample
//! ```

use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use tokio_util::sync::CancellationToken;

use iot_telemetry_sim::{
    // ---
    run_self_test,
    sample_payloads,
    EndpointPolicy,
    PublishLoopBuilder,
    SimConfig,
    SimMode,
    TransportBuilder,
};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Mode {
    Sensor,
    Vehicle,
}

impl From<Mode> for SimMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Sensor => SimMode::Sensor,
            Mode::Vehicle => SimMode::Vehicle,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "iot-telemetry-sim")]
#[command(about = "Publish simulated sensor or vehicle telemetry to a message broker")]
#[command(long_about = None)]
struct Cli {
    /// Publish one message per topic and exit
    #[arg(long, conflicts_with = "sample")]
    test: bool,

    /// Print one sample payload per topic without publishing (vehicle mode)
    #[arg(long)]
    sample: bool,

    /// Device class to simulate
    #[arg(long, value_enum, default_value = "sensor", env = "IOT_SIM_MODE")]
    mode: Mode,

    /// Broker region used for endpoint lookup
    #[arg(long, env = "IOT_SIM_REGION")]
    region: Option<String>,

    /// Device identifier stamped on every reading
    #[arg(long, env = "IOT_SIM_DEVICE_ID")]
    device_id: Option<String>,

    /// Topic to publish to; repeat for a rotation (vehicle mode)
    #[arg(long = "topic", value_name = "TOPIC", env = "IOT_SIM_TOPICS", value_delimiter = ',')]
    topics: Vec<String>,

    /// Wait between messages, in milliseconds
    #[arg(long, env = "IOT_SIM_INTERVAL_MS")]
    interval_ms: Option<u64>,

    /// Stop after this many messages
    #[arg(long, env = "IOT_SIM_COUNT")]
    count: Option<u64>,

    /// Seed for reproducible readings
    #[arg(long, env = "IOT_SIM_SEED")]
    seed: Option<u64>,

    /// Broker endpoint template, e.g. mqtts://iot.{region}.example.com:8883
    #[arg(long, env = "IOT_SIM_ENDPOINT")]
    endpoint: Option<String>,

    /// Transport implementation
    #[arg(long, value_parser = ["memory", "rumqttc"], env = "IOT_SIM_TRANSPORT")]
    transport: Option<String>,

    /// Broker keep-alive in seconds
    #[arg(long, env = "IOT_SIM_KEEP_ALIVE_SECS")]
    keep_alive_secs: Option<u16>,

    /// Resolve the endpoint once and reuse it until a publish fails
    #[arg(long, env = "IOT_SIM_CACHE_ENDPOINT")]
    cache_endpoint: bool,
}

impl Cli {
    fn sim_config(&self) -> SimConfig {
        // ---
        let mut config = SimConfig::new(self.mode.into());

        if let Some(region) = &self.region {
            config = config.with_region(region);
        }
        if let Some(device_id) = &self.device_id {
            config = config.with_device_id(device_id);
        }
        if !self.topics.is_empty() {
            config = config.with_topics(self.topics.iter().map(String::as_str));
        }
        if let Some(ms) = self.interval_ms {
            config = config.with_interval(Duration::from_millis(ms));
        }
        if let Some(count) = self.count {
            config = config.with_max_cycles(count);
        }
        if let Some(seed) = self.seed {
            config = config.with_seed(seed);
        }
        if self.cache_endpoint {
            config = config.with_endpoint_policy(EndpointPolicy::CacheAfterFirst);
        }

        config
    }

    fn transport(&self, config: &SimConfig) -> TransportBuilder {
        // ---
        let mut builder = TransportBuilder::new().client_id_for_device(&config.device_id);

        if let Some(endpoint) = &self.endpoint {
            builder = builder.endpoint(endpoint);
        }
        if let Some(transport) = &self.transport {
            builder = builder.transport_type(transport);
        }
        if let Some(secs) = self.keep_alive_secs {
            builder = builder.keep_alive_secs(secs);
        }

        builder
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // ---
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.sim_config();
    config.validate().context("invalid configuration")?;

    if cli.sample {
        for (topic, json) in sample_payloads(&config)? {
            println!("{} sample on {topic}:", topic.last_segment().to_uppercase());
            println!("{json}");
            println!("{}", "-".repeat(60));
        }
        return Ok(ExitCode::SUCCESS);
    }

    let handles = cli
        .transport(&config)
        .build()
        .await
        .context("failed to create transport")?;

    if cli.test {
        let report = run_self_test(&config, handles.resolver, handles.publisher.clone()).await?;
        handles.publisher.close().await?;

        println!("self test: {report}");
        return Ok(if report.all_passed() {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        });
    }

    let mut publish_loop =
        PublishLoopBuilder::new(&config, handles.resolver, handles.publisher.clone()).build()?;

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received, stopping");
            on_signal.cancel();
        }
    });

    let summary = publish_loop.run(cancel).await;
    handles.publisher.close().await?;

    println!("stopped: {summary}");
    Ok(ExitCode::SUCCESS)
}
