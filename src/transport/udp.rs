//! UDP transport.
//!
//! Each `poll_read` delivers at most one datagram. Frames are not required
//! to line up with datagram boundaries; the frame buffer reassembles them
//! like any other byte stream. A datagram larger than the read buffer is
//! truncated by the OS, so size `read_buffer_size` for the largest packet.

use std::io;
use std::net::SocketAddr;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, ReadBuf};
use tokio::net::{ToSocketAddrs, UdpSocket};

use crate::error::Result;

/// A bound UDP socket read as a byte stream.
#[derive(Debug)]
pub struct DatagramStream {
    socket: UdpSocket,
}

impl DatagramStream {
    /// Wrap an already bound socket.
    pub fn new(socket: UdpSocket) -> Self {
        Self { socket }
    }

    /// Address the socket is bound to.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Unwrap the underlying socket.
    pub fn into_inner(self) -> UdpSocket {
        self.socket
    }
}

impl AsyncRead for DatagramStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        self.socket.poll_recv(cx, buf)
    }
}

/// Bind a UDP socket that receives sensor datagrams.
pub async fn bind_udp(addr: impl ToSocketAddrs) -> Result<DatagramStream> {
    let socket = UdpSocket::bind(addr).await?;
    tracing::info!(local = ?socket.local_addr().ok(), "UDP transport bound");
    Ok(DatagramStream::new(socket))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    #[tokio::test]
    async fn test_one_datagram_per_read() {
        let mut stream = bind_udp("127.0.0.1:0").await.unwrap();
        let target = stream.local_addr().unwrap();

        let sender = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        sender.send_to(&[0xAA, 0x01], target).await.unwrap();
        sender.send_to(&[0x00, 0x07, 0x07], target).await.unwrap();

        let mut buf = [0u8; 64];
        let n = stream.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], &[0xAA, 0x01]);

        let n = stream.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], &[0x00, 0x07, 0x07]);
    }
}
