//! Pipeline builder and read loop.
//!
//! The [`PipelineBuilder`] provides a fluent API for configuring the frame
//! layout and read loop. [`Pipeline`] manages the lifecycle:
//! 1. Spawn the read loop on the current tokio runtime
//! 2. Read, accumulate and drain frames until stopped or the transport ends
//! 3. Decode each frame's payload and publish the newest record
//!
//! Consumers poll a [`Subscriber`] on their own schedule.
//!
//! # Example
//!
//! ```no_run
//! use sensorwire::codec::ArrayCodec;
//! use sensorwire::protocol::{ByteOrder, FrameFormat};
//! use sensorwire::transport::connect_tcp;
//! use sensorwire::Pipeline;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let stream = connect_tcp("192.168.4.1:8080").await?;
//!     let pipeline = Pipeline::builder()
//!         .format(FrameFormat::checksummed().with_payload_multiple(4))
//!         .spawn(stream, ArrayCodec::<f32>::new(ByteOrder::Little).with_shape(6, 4))?;
//!
//!     let mut ticker = tokio::time::interval(std::time::Duration::from_millis(50));
//!     loop {
//!         ticker.tick().await;
//!         if let Some(grid) = pipeline.take() {
//!             println!("{:?} @ {:.1} Hz", grid.row(0), pipeline.current_rate());
//!         }
//!     }
//! }
//! ```

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use parking_lot::Mutex;
use serde::Serialize;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::task::JoinHandle;

use crate::bus::FrameBus;
use crate::codec::PayloadCodec;
use crate::config::{PipelineSettings, SourceConfig};
use crate::error::{Result, SensorwireError};
use crate::protocol::{Frame, FrameBuffer, FrameFormat, FramingStats};
use crate::rate::RateTracker;

/// Why the read loop ended without an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StopReason {
    /// The owner raised the stop flag.
    Stopped,
    /// The transport reported end of stream.
    EndOfStream,
}

/// Snapshot of the pipeline counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PipelineStats {
    /// Bytes read from the transport.
    pub bytes_received: u64,
    /// Frames that passed trailer validation.
    pub frames_decoded: u64,
    /// Records handed to the bus.
    pub frames_published: u64,
    /// Records dropped before a consumer took them.
    pub frames_coalesced: u64,
    /// Candidates rejected for a bad end marker or checksum.
    pub trailer_rejects: u64,
    /// Candidates rejected for an implausible length.
    pub length_rejects: u64,
    /// Bytes discarded while seeking or resyncing.
    pub garbage_bytes: u64,
    /// Accumulator resets.
    pub overflows: u64,
    /// Frames whose payload failed to decode.
    pub payload_errors: u64,
    /// Partial frames dropped after a pause.
    pub stale_flushes: u64,
    /// Decoded payloads that differed from the previous one.
    pub distinct_updates: u64,
}

#[derive(Debug, Default)]
struct Counters {
    bytes_received: AtomicU64,
    frames_decoded: AtomicU64,
    frames_published: AtomicU64,
    frames_coalesced: AtomicU64,
    trailer_rejects: AtomicU64,
    length_rejects: AtomicU64,
    garbage_bytes: AtomicU64,
    overflows: AtomicU64,
    payload_errors: AtomicU64,
    stale_flushes: AtomicU64,
    distinct_updates: AtomicU64,
}

impl Counters {
    #[inline]
    fn add(counter: &AtomicU64, n: u64) {
        counter.fetch_add(n, Ordering::Relaxed);
    }

    /// Mirror the frame buffer's cumulative counters.
    fn store_framing(&self, framing: &FramingStats) {
        self.frames_decoded.store(framing.frames, Ordering::Relaxed);
        self.trailer_rejects
            .store(framing.trailer_rejects, Ordering::Relaxed);
        self.length_rejects
            .store(framing.length_rejects, Ordering::Relaxed);
        self.garbage_bytes
            .store(framing.garbage_bytes, Ordering::Relaxed);
        self.overflows.store(framing.overflows, Ordering::Relaxed);
    }

    fn snapshot(&self) -> PipelineStats {
        let get = |c: &AtomicU64| c.load(Ordering::Relaxed);
        PipelineStats {
            bytes_received: get(&self.bytes_received),
            frames_decoded: get(&self.frames_decoded),
            frames_published: get(&self.frames_published),
            frames_coalesced: get(&self.frames_coalesced),
            trailer_rejects: get(&self.trailer_rejects),
            length_rejects: get(&self.length_rejects),
            garbage_bytes: get(&self.garbage_bytes),
            overflows: get(&self.overflows),
            payload_errors: get(&self.payload_errors),
            stale_flushes: get(&self.stale_flushes),
            distinct_updates: get(&self.distinct_updates),
        }
    }
}

/// State shared between the read loop and every subscriber.
struct Shared<R> {
    bus: FrameBus<R>,
    frame_rate: Mutex<RateTracker>,
    update_rate: Mutex<RateTracker>,
    counters: Counters,
}

/// Builder for configuring and spawning a pipeline.
#[derive(Debug, Clone, Default)]
pub struct PipelineBuilder {
    format: FrameFormat,
    settings: PipelineSettings,
}

impl PipelineBuilder {
    /// Create a builder with the checksummed format and default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a loaded source configuration.
    pub fn from_config(config: &SourceConfig) -> Self {
        Self {
            format: config.format.clone(),
            settings: config.pipeline.clone(),
        }
    }

    /// Set the frame layout.
    pub fn format(mut self, format: FrameFormat) -> Self {
        self.format = format;
        self
    }

    /// Replace all read loop settings at once.
    pub fn settings(mut self, settings: PipelineSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Set the accumulator ceiling.
    ///
    /// Default: 4096 bytes
    pub fn buffer_ceiling(mut self, bytes: usize) -> Self {
        self.settings.buffer_ceiling = bytes;
        self
    }

    /// Set how many bytes a single transport read may return.
    ///
    /// Default: 1024 bytes
    pub fn read_buffer_size(mut self, bytes: usize) -> Self {
        self.settings.read_buffer_size = bytes;
        self
    }

    /// Set the upper bound on a single read wait.
    ///
    /// This bounds how long [`Pipeline::stop`] takes to be observed.
    /// Default: 100 ms
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.settings.read_timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Set how many timestamps each rate tracker keeps.
    ///
    /// Default: 30
    pub fn rate_window(mut self, stamps: usize) -> Self {
        self.settings.rate_window = stamps;
        self
    }

    /// Drop buffered partial frames after this much silence.
    ///
    /// `Duration::ZERO` disables the flush. Default: 5 seconds
    pub fn stale_after(mut self, pause: Duration) -> Self {
        self.settings.stale_after_ms = pause.as_millis() as u64;
        self
    }

    /// Validate the configuration and spawn the read loop.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn<T, C>(self, reader: T, codec: C) -> Result<Pipeline<C::Record>>
    where
        T: AsyncRead + Unpin + Send + 'static,
        C: PayloadCodec,
    {
        self.settings.validate()?;
        let frames = FrameBuffer::with_ceiling(self.format, self.settings.buffer_ceiling)?;

        let shared = Arc::new(Shared {
            bus: FrameBus::new(),
            frame_rate: Mutex::new(RateTracker::new(self.settings.rate_window)),
            update_rate: Mutex::new(RateTracker::new(self.settings.rate_window)),
            counters: Counters::default(),
        });
        let stop = Arc::new(AtomicBool::new(false));

        let read_loop = ReadLoop {
            frames,
            codec,
            settings: self.settings,
            shared: Arc::clone(&shared),
            stop: Arc::clone(&stop),
        };
        let task = tokio::spawn(read_loop.run(reader));

        Ok(Pipeline {
            subscriber: Subscriber { shared },
            stop,
            task: Some(task),
        })
    }
}

/// A running pipeline.
///
/// Dropping the handle raises the stop flag; the read loop exits on its next
/// iteration.
pub struct Pipeline<R> {
    subscriber: Subscriber<R>,
    stop: Arc<AtomicBool>,
    task: Option<JoinHandle<Result<StopReason>>>,
}

impl Pipeline<()> {
    /// Create a new pipeline builder.
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }
}

impl<R: Send + 'static> Pipeline<R> {
    /// Open the configured transport and spawn a pipeline over it.
    pub async fn open<C>(config: &SourceConfig, codec: C) -> Result<Self>
    where
        C: PayloadCodec<Record = R>,
    {
        config.validate()?;
        let reader = config.transport.open().await?;
        PipelineBuilder::from_config(config).spawn(reader, codec)
    }

    /// A cloneable consumer handle.
    pub fn subscriber(&self) -> Subscriber<R> {
        self.subscriber.clone()
    }

    /// Take the newest record, if any arrived since the last take.
    pub fn take(&self) -> Option<R> {
        self.subscriber.take()
    }

    /// Frames per second over the rate window.
    pub fn current_rate(&self) -> f64 {
        self.subscriber.current_rate()
    }

    /// Distinct payloads per second over the rate window.
    pub fn update_rate(&self) -> f64 {
        self.subscriber.update_rate()
    }

    /// Counter snapshot.
    pub fn stats(&self) -> PipelineStats {
        self.subscriber.stats()
    }

    /// Whether the read loop has exited.
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, |task| task.is_finished())
    }

    /// Raise the stop flag and wait for the read loop to exit.
    pub async fn stop(self) -> Result<StopReason> {
        self.stop.store(true, Ordering::Release);
        self.join().await
    }

    /// Wait for the read loop to exit on its own.
    ///
    /// Transport failures come back as [`SensorwireError::Io`].
    pub async fn join(mut self) -> Result<StopReason> {
        let Some(task) = self.task.take() else {
            return Ok(StopReason::Stopped);
        };
        match task.await {
            Ok(result) => result,
            Err(e) => Err(SensorwireError::Task(e.to_string())),
        }
    }
}

impl<R> Drop for Pipeline<R> {
    fn drop(&mut self) {
        if self.task.is_some() {
            self.stop.store(true, Ordering::Release);
        }
    }
}

impl<R> fmt::Debug for Pipeline<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("stopping", &self.stop.load(Ordering::Relaxed))
            .field("stats", &self.subscriber.stats())
            .finish()
    }
}

/// Consumer handle onto a running pipeline.
///
/// Every clone reads from the same single slot, so a record is delivered to
/// whichever subscriber takes it first.
pub struct Subscriber<R> {
    shared: Arc<Shared<R>>,
}

impl<R> Subscriber<R> {
    /// Take the newest record. Never blocks.
    #[inline]
    pub fn take(&self) -> Option<R> {
        self.shared.bus.take()
    }

    /// Whether a record is waiting.
    pub fn has_pending(&self) -> bool {
        self.shared.bus.has_pending()
    }

    /// Frames per second over the rate window.
    pub fn current_rate(&self) -> f64 {
        self.shared.frame_rate.lock().rate()
    }

    /// Distinct payloads per second over the rate window.
    pub fn update_rate(&self) -> f64 {
        self.shared.update_rate.lock().rate()
    }

    /// Counter snapshot.
    pub fn stats(&self) -> PipelineStats {
        self.shared.counters.snapshot()
    }
}

impl<R> Clone for Subscriber<R> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<R> fmt::Debug for Subscriber<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscriber")
            .field("pending", &self.has_pending())
            .finish()
    }
}

/// Everything the producer task owns exclusively.
struct ReadLoop<C: PayloadCodec> {
    frames: FrameBuffer,
    codec: C,
    settings: PipelineSettings,
    shared: Arc<Shared<C::Record>>,
    stop: Arc<AtomicBool>,
}

impl<C: PayloadCodec> ReadLoop<C> {
    /// Main read loop - reads bytes, drains frames, publishes the newest record.
    async fn run<T: AsyncRead + Unpin>(mut self, mut reader: T) -> Result<StopReason> {
        let mut buf = vec![0u8; self.settings.read_buffer_size];
        let mut burst: Vec<Frame> = Vec::new();
        let mut last_payload: Option<Bytes> = None;
        let mut last_rx = Instant::now();
        let read_timeout = self.settings.read_timeout();
        let stale_after = self.settings.stale_after();

        tracing::debug!(format = ?self.frames.format(), "Read loop started");

        loop {
            if self.stop.load(Ordering::Acquire) {
                tracing::debug!("Stop requested, leaving read loop");
                return Ok(StopReason::Stopped);
            }

            let n = match tokio::time::timeout(read_timeout, reader.read(&mut buf)).await {
                Err(_) => continue, // Read timeout, re-check the stop flag
                Ok(Ok(0)) => {
                    tracing::info!("Transport reached end of stream");
                    return Ok(StopReason::EndOfStream);
                }
                Ok(Ok(n)) => n,
                Ok(Err(e)) => {
                    tracing::error!("Transport read failed: {}", e);
                    return Err(SensorwireError::Io(e));
                }
            };

            let now = Instant::now();
            if let Some(stale_after) = stale_after {
                if now.duration_since(last_rx) > stale_after && !self.frames.is_empty() {
                    let dropped = self.frames.clear();
                    Counters::add(&self.shared.counters.stale_flushes, 1);
                    tracing::debug!(dropped, "Discarding stale partial frame");
                }
            }
            last_rx = now;
            Counters::add(&self.shared.counters.bytes_received, n as u64);

            burst.clear();
            let overflows_before = self.frames.stats().overflows;
            self.frames.push_into(&buf[..n], &mut burst);

            let framing = self.frames.stats();
            self.shared.counters.store_framing(&framing);
            if framing.overflows > overflows_before {
                tracing::warn!(
                    ceiling = self.frames.ceiling(),
                    "Buffer overflow, resyncing"
                );
            }

            if burst.is_empty() {
                continue;
            }

            self.shared
                .frame_rate
                .lock()
                .record_events(burst.len() as u64, now);

            self.publish_burst(&burst, &mut last_payload, now);
        }
    }

    /// Decode every frame of a burst and publish only the newest record.
    fn publish_burst(&self, burst: &[Frame], last_payload: &mut Option<Bytes>, now: Instant) {
        let counters = &self.shared.counters;
        let mut newest = None;
        let mut skipped = 0u64;
        let mut distinct = 0u64;

        for frame in burst {
            let record = match self.codec.decode(&frame.payload) {
                Ok(record) => record,
                Err(e) => {
                    Counters::add(&counters.payload_errors, 1);
                    tracing::debug!(len = frame.payload_len(), "Payload decode failed: {}", e);
                    continue;
                }
            };

            if last_payload.as_ref() != Some(&frame.payload) {
                distinct += 1;
                *last_payload = Some(frame.payload_bytes());
            }

            if newest.replace(record).is_some() {
                skipped += 1;
            }
        }

        if distinct > 0 {
            Counters::add(&counters.distinct_updates, distinct);
            self.shared.update_rate.lock().record_events(distinct, now);
        }

        let Some(record) = newest else {
            return;
        };
        if self.shared.bus.publish(record) {
            skipped += 1;
        }
        Counters::add(&counters.frames_published, 1);
        Counters::add(&counters.frames_coalesced, skipped);
    }
}
