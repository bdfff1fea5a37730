//! Transport module - byte sources feeding a pipeline.
//!
//! Provides:
//! - TCP client streams
//! - UDP datagram sockets adapted to `AsyncRead`
//! - Serial ports (with the `serial` feature)
//!
//! Every transport is just an `AsyncRead`; the pipeline never needs to know
//! which one it is reading from.

mod serial;
mod tcp;
mod udp;

use serde::{Deserialize, Serialize};
use tokio::io::AsyncRead;

use crate::error::Result;

pub use serial::open_serial;
pub use tcp::connect_tcp;
pub use udp::{bind_udp, DatagramStream};

/// Type-erased transport reader.
pub type BoxedReader = Box<dyn AsyncRead + Send + Unpin>;

/// Which transport a data source uses.
///
/// Serialized with a `type` tag, e.g. `{ "type": "tcp", "addr": "..." }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TransportConfig {
    /// Connect to a TCP server.
    Tcp { addr: String },

    /// Bind a UDP socket and read datagrams.
    Udp { bind_addr: String },

    /// Open a serial port (e.g. /dev/ttyUSB0 on Linux, COM3 on Windows).
    Serial { path: String, baud_rate: u32 },
}

impl TransportConfig {
    /// Open the transport.
    pub async fn open(&self) -> Result<BoxedReader> {
        tracing::debug!(transport = ?self, "Opening transport");

        let reader: BoxedReader = match self {
            TransportConfig::Tcp { addr } => Box::new(connect_tcp(addr).await?),
            TransportConfig::Udp { bind_addr } => Box::new(bind_udp(bind_addr).await?),
            TransportConfig::Serial { path, baud_rate } => open_serial(path, *baud_rate)?,
        };
        Ok(reader)
    }
}
