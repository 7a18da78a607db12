//! The owned socket a [`crate::net`] worker reads from and writes to.
//!
//! Deliberately thin: raw bytes in, raw bytes out. Line framing (the CRLF
//! split and partial-fragment carry-over) is the network worker's
//! responsibility, not the transport's.

use std::time::Duration;

use socket2::{SockRef, TcpKeepalive};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio_rustls::client::TlsStream;

/// Size of each raw read, matching the original bot's 4 KiB chunking.
pub const READ_CHUNK_SIZE: usize = 4096;

/// A connected socket, optionally wrapped in TLS.
pub enum Transport {
    /// Plain TCP.
    Tcp {
        reader: OwnedReadHalf,
        writer: OwnedWriteHalf,
    },
    /// TLS over TCP.
    Tls {
        reader: tokio::io::ReadHalf<TlsStream<TcpStream>>,
        writer: tokio::io::WriteHalf<TlsStream<TcpStream>>,
    },
}

impl Transport {
    /// Wrap a freshly connected plain-TCP stream.
    pub fn tcp(stream: TcpStream) -> Self {
        if let Err(e) = enable_keepalive(&stream) {
            tracing::warn!("failed to enable TCP keepalive: {e}");
        }
        let (reader, writer) = stream.into_split();
        Transport::Tcp { reader, writer }
    }

    /// Wrap a freshly completed TLS handshake.
    pub fn tls(stream: TlsStream<TcpStream>) -> Self {
        let (reader, writer) = tokio::io::split(stream);
        Transport::Tls { reader, writer }
    }

    /// Read up to `buf.len()` bytes. `Ok(0)` means the peer closed the
    /// connection (the caller treats this like a fatal socket error and
    /// emits the disconnect sentinel).
    pub async fn read_chunk(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self {
            Transport::Tcp { reader, .. } => reader.read(buf).await,
            Transport::Tls { reader, .. } => reader.read(buf).await,
        }
    }

    /// Write a single already-CRLF-terminated line. Partial-write retry of
    /// the same bytes (without re-dequeuing from the write queue) is the
    /// caller's job, see [`crate::net`].
    pub async fn write_line(&mut self, line: &[u8]) -> std::io::Result<()> {
        match self {
            Transport::Tcp { writer, .. } => {
                writer.write_all(line).await?;
                writer.flush().await
            }
            Transport::Tls { writer, .. } => {
                writer.write_all(line).await?;
                writer.flush().await
            }
        }
    }
}

fn enable_keepalive(stream: &TcpStream) -> std::io::Result<()> {
    let sock = SockRef::from(stream);
    let keepalive = TcpKeepalive::new()
        .with_time(Duration::from_secs(120))
        .with_interval(Duration::from_secs(30));
    sock.set_tcp_keepalive(&keepalive)
}
