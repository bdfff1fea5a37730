//! Monitor - decode a live sensor stream and report on a consumer timer.
//!
//! This example demonstrates:
//! - Loading a `SourceConfig` from JSON
//! - Running a pipeline with an `ArrayCodec<f32>`
//! - Polling the latest record every 50 ms, the way a UI refresh timer would
//!
//! # Running against the simulator
//!
//! ```text
//! cargo run --example simulator -- 127.0.0.1:9750 200 25 &
//! cargo run --example monitor -- monitor.json
//! ```
//!
//! with `monitor.json`:
//!
//! ```json
//! {
//!   "transport": { "type": "tcp", "addr": "127.0.0.1:9750" },
//!   "format": { "payload_multiple": 4 }
//! }
//! ```
//!
//! Without an argument the monitor connects to `127.0.0.1:9750` with the
//! same settings.

use std::time::Duration;

use sensorwire::codec::ArrayCodec;
use sensorwire::protocol::{ByteOrder, FrameFormat};
use sensorwire::transport::TransportConfig;
use sensorwire::{Pipeline, PipelineSettings, SourceConfig};
use tracing_subscriber::EnvFilter;

/// Consumer refresh interval.
const TICK: Duration = Duration::from_millis(50);

/// Ticks between statistics reports.
const REPORT_EVERY: u32 = 20;

fn default_config() -> SourceConfig {
    SourceConfig {
        transport: TransportConfig::Tcp {
            addr: "127.0.0.1:9750".to_string(),
        },
        format: FrameFormat::checksummed().with_payload_multiple(4),
        pipeline: PipelineSettings::default(),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => SourceConfig::from_path(path)?,
        None => default_config(),
    };
    tracing::info!(transport = ?config.transport, "Opening source");

    let codec = ArrayCodec::<f32>::new(ByteOrder::Little);
    let pipeline = Pipeline::open(&config, codec).await?;
    let subscriber = pipeline.subscriber();

    let mut ticker = tokio::time::interval(TICK);
    let mut ticks = 0u32;
    while !pipeline.is_finished() {
        ticker.tick().await;
        ticks += 1;

        if let Some(samples) = subscriber.take() {
            let peak = samples
                .values()
                .iter()
                .fold(f32::NEG_INFINITY, |a, b| a.max(*b));
            tracing::info!(
                samples = samples.len(),
                first_row = ?samples.row(0),
                peak,
                "Latest record"
            );
        }

        if ticks % REPORT_EVERY == 0 {
            tracing::info!(
                fps = format_args!("{:.1}", subscriber.current_rate()),
                update_hz = format_args!("{:.1}", subscriber.update_rate()),
                stats = %serde_json::to_string(&subscriber.stats())?,
                "Pipeline status"
            );
        }
    }

    let reason = pipeline.join().await?;
    tracing::info!(?reason, "Pipeline finished");
    Ok(())
}
