//! # sensorwire
//!
//! Streaming binary frame decoder for sensor telemetry links.
//!
//! Turns a raw, possibly corrupted byte stream from a serial port or socket
//! into validated frames, decodes their payloads, and hands the newest
//! record to consumers that poll on their own schedule.
//!
//! ## Architecture
//!
//! - **Protocol**: frame layout, capped accumulator, decoder state machine
//! - **Codec**: payload bytes to typed records
//! - **Pipeline**: one tokio task per transport reading, draining and publishing
//! - **Bus**: latest-value cell between the task and consumers
//!
//! ```text
//! transport ─► FrameBuffer ─► PayloadCodec ─► FrameBus ◄─ Subscriber::take()
//!                   │                                        RateTracker
//!                   └──────────────► PipelineStats ◄──────────┘
//! ```
//!
//! ## Example
//!
//! ```
//! use sensorwire::codec::RawCodec;
//! use sensorwire::protocol::FrameFormat;
//! use sensorwire::Pipeline;
//! use tokio::io::AsyncWriteExt;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let (mut device, link) = tokio::io::duplex(256);
//! let pipeline = Pipeline::builder()
//!     .format(FrameFormat::marker_terminated())
//!     .spawn(link, RawCodec)
//!     .unwrap();
//!
//! device.write_all(&[0xAA, 0x04, 0x00, 1, 2, 3, 4, 0x55]).await.unwrap();
//! drop(device);
//!
//! let subscriber = pipeline.subscriber();
//! pipeline.join().await.unwrap();
//! assert_eq!(&subscriber.take().unwrap()[..], &[1, 2, 3, 4]);
//! # }
//! ```

pub mod codec;
pub mod config;
pub mod error;
pub mod protocol;
pub mod transport;

mod bus;
mod pipeline;
mod rate;

pub use bus::FrameBus;
pub use config::{PipelineSettings, SourceConfig};
pub use error::{PayloadError, Result, SensorwireError};
pub use pipeline::{Pipeline, PipelineBuilder, PipelineStats, StopReason, Subscriber};
pub use rate::{RateTracker, DEFAULT_RATE_WINDOW};
