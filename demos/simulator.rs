//! Simulator - a fake stretch-sensor glove serving frames over TCP.
//!
//! Streams a 6x4 grid of little-endian `f32` values in the checksummed
//! layout (`[AA][u16 LE len][payload][XOR]`), optionally corrupting every
//! Nth frame so the monitor's resync counters have something to show.
//!
//! # Running
//!
//! ```text
//! cargo run --example simulator -- 127.0.0.1:9750 200 25
//!                                  addr           Hz  corrupt every N frames (0 = never)
//! ```

use std::time::Duration;

use sensorwire::codec::ArrayCodec;
use sensorwire::protocol::{encode_frame, ByteOrder, FrameFormat};
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tracing_subscriber::EnvFilter;

const ROWS: usize = 6;
const COLS: usize = 4;

/// What to do to a frame before sending it.
#[derive(Debug, Clone, Copy)]
enum Corruption {
    None,
    FlipTrailer,
    FlipPayload,
    LeadingNoise,
    Truncate,
}

impl Corruption {
    fn for_frame(seq: u64, every: u64) -> Self {
        if every == 0 || seq == 0 || seq % every != 0 {
            return Corruption::None;
        }
        match (seq / every) % 4 {
            0 => Corruption::FlipTrailer,
            1 => Corruption::FlipPayload,
            2 => Corruption::LeadingNoise,
            _ => Corruption::Truncate,
        }
    }

    fn apply(self, frame: &mut Vec<u8>) {
        match self {
            Corruption::None => {}
            Corruption::FlipTrailer => {
                if let Some(last) = frame.last_mut() {
                    *last ^= 0xFF;
                }
            }
            Corruption::FlipPayload => frame[5] ^= 0x10,
            Corruption::LeadingNoise => {
                *frame = [&[0x13, 0x37, 0x00, 0x42][..], &frame[..]].concat();
            }
            Corruption::Truncate => frame.truncate(frame.len() / 2),
        }
    }
}

/// Send interval for `hz` frames per second, never zero.
fn tick_period(hz: u64) -> Duration {
    Duration::from_micros((1_000_000 / hz.max(1)).max(1))
}

fn grid(seq: u64) -> Vec<f32> {
    let t = seq as f32 * 0.05;
    (0..ROWS * COLS)
        .map(|i| (t + i as f32 * 0.3).sin() * 100.0)
        .collect()
}

async fn serve(
    mut socket: TcpStream,
    hz: u64,
    corrupt_every: u64,
) -> Result<(), Box<dyn std::error::Error>> {
    let format = FrameFormat::checksummed().with_payload_multiple(4);
    let codec = ArrayCodec::<f32>::new(ByteOrder::Little).with_shape(ROWS, COLS);
    let mut ticker = tokio::time::interval(tick_period(hz));

    for seq in 0u64.. {
        ticker.tick().await;

        let mut frame = encode_frame(&format, &codec.encode(&grid(seq)))?;
        let corruption = Corruption::for_frame(seq, corrupt_every);
        if !matches!(corruption, Corruption::None) {
            tracing::debug!(seq, ?corruption, "Corrupting frame");
        }
        corruption.apply(&mut frame);

        socket.write_all(&frame).await?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let mut args = std::env::args().skip(1);
    let addr = args.next().unwrap_or_else(|| "127.0.0.1:9750".to_string());
    let hz: u64 = args.next().map(|s| s.parse()).transpose()?.unwrap_or(100);
    let corrupt_every: u64 = args.next().map(|s| s.parse()).transpose()?.unwrap_or(0);

    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(%addr, hz, corrupt_every, "Simulator listening");

    loop {
        let (socket, peer) = listener.accept().await?;
        socket.set_nodelay(true)?;
        tracing::info!(%peer, "Monitor connected");

        tokio::spawn(async move {
            if let Err(e) = serve(socket, hz, corrupt_every).await {
                tracing::info!(%peer, "Monitor disconnected: {}", e);
            }
        });
    }
}
