//! TCP transport.
//!
//! Used for Wi-Fi bridges and simulators that stream frames over a socket.
//! The connected stream is read directly as an `AsyncRead`.

use tokio::net::{TcpStream, ToSocketAddrs};

use crate::error::Result;

/// Connect to a device or bridge that streams frames over TCP.
///
/// Nagle is disabled; the link carries small frames at a high rate.
pub async fn connect_tcp(addr: impl ToSocketAddrs) -> Result<TcpStream> {
    let stream = TcpStream::connect(addr).await?;
    stream.set_nodelay(true)?;

    if let Ok(peer) = stream.peer_addr() {
        tracing::info!(%peer, "TCP transport connected");
    }
    Ok(stream)
}
