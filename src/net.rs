//! The network worker: owns the one TCP (optionally TLS) socket, splits
//! incoming bytes on CRLF, and drains the outbound queue.
//!
//! Both queues are bounded `tokio::sync::mpsc` channels, giving backpressure
//! without the manual ~33 ms `select()` polling cadence the original Python
//! implementation needed for its blocking-free, non-blocking socket; under
//! tokio, `AsyncRead`/`AsyncWrite` already give non-blocking, backpressured
//! I/O for free.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rustls_pki_types::ServerName;
use tokio::net::{TcpSocket, TcpStream};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::command::Command;
use crate::transport::{Transport, READ_CHUNK_SIZE};

/// Capacity of the inbound (parsed `Command`) queue.
pub const INBOUND_QUEUE_CAPACITY: usize = 1024;
/// Capacity of the outbound (raw line) queue.
pub const OUTBOUND_QUEUE_CAPACITY: usize = 256;

/// Handle returned by [`spawn`]; owns the sending half of the outbound
/// queue and lets the supervisor request a graceful stop.
pub struct NetHandle {
    outbound: mpsc::Sender<String>,
    stopping: Arc<AtomicBool>,
    join: JoinHandle<()>,
}

impl NetHandle {
    /// True while the worker task is still running.
    pub fn is_alive(&self) -> bool {
        !self.join.is_finished()
    }

    /// Clone the outbound sender so the supervisor's long-lived [`crate::api::Api`]
    /// can keep sending through whichever connection is current.
    pub fn outbound_sender(&self) -> mpsc::Sender<String> {
        self.outbound.clone()
    }

    /// Enqueue a line (without trailing CRLF) for sending.
    pub async fn send(&self, line: String) {
        if self.outbound.send(line).await.is_err() {
            warn!("network worker already gone, dropping outbound line");
        }
    }

    /// Request a graceful shutdown: the worker drains its write queue,
    /// closes the socket, and exits.
    pub async fn stop(self) {
        self.stopping.store(true, Ordering::SeqCst);
        let _ = self.join.await;
    }
}

/// Resolve `host:port`, bind the local address (family inferred from the
/// presence of `:` in `bind_addr`), connect, optionally perform a TLS
/// handshake, and spawn the worker loop.
pub async fn spawn(
    host: &str,
    port: u16,
    bind_addr: &str,
    use_tls: bool,
) -> std::io::Result<(NetHandle, mpsc::Receiver<Option<Command>>)> {
    let transport = connect(host, port, bind_addr, use_tls).await?;
    info!(host, port, use_tls, "connected to IRC server");

    let (outbound_tx, outbound_rx) = mpsc::channel(OUTBOUND_QUEUE_CAPACITY);
    let (inbound_tx, inbound_rx) = mpsc::channel(INBOUND_QUEUE_CAPACITY);
    let stopping = Arc::new(AtomicBool::new(false));

    let worker = Worker {
        transport,
        outbound_rx,
        inbound_tx,
        stopping: stopping.clone(),
    };
    let join = tokio::spawn(worker.run());

    Ok((
        NetHandle {
            outbound: outbound_tx,
            stopping,
            join,
        },
        inbound_rx,
    ))
}

async fn connect(
    host: &str,
    port: u16,
    bind_addr: &str,
    use_tls: bool,
) -> std::io::Result<Transport> {
    let local: std::net::IpAddr = bind_addr
        .parse()
        .unwrap_or(std::net::IpAddr::V4(std::net::Ipv4Addr::UNSPECIFIED));

    let socket = if local.is_ipv6() {
        TcpSocket::new_v6()?
    } else {
        TcpSocket::new_v4()?
    };
    socket.bind(std::net::SocketAddr::new(local, 0))?;

    let target = tokio::net::lookup_host((host, port))
        .await?
        .find(|addr| addr.is_ipv6() == local.is_ipv6())
        .ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::AddrNotAvailable,
                format!("no address for {host}:{port} matching bind family"),
            )
        })?;

    let stream = socket.connect(target).await?;

    if use_tls {
        Ok(Transport::tls(tls_handshake(host, stream).await?))
    } else {
        Ok(Transport::tcp(stream))
    }
}

async fn tls_handshake(
    host: &str,
    stream: TcpStream,
) -> std::io::Result<tokio_rustls::client::TlsStream<TcpStream>> {
    let mut roots = rustls::RootCertStore::empty();
    roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
    let config = rustls::ClientConfig::builder()
        .with_root_certificates(roots)
        .with_no_client_auth();
    let connector = tokio_rustls::TlsConnector::from(Arc::new(config));
    let server_name = ServerName::try_from(host.to_string())
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;
    connector.connect(server_name, stream).await
}

struct Worker {
    transport: Transport,
    outbound_rx: mpsc::Receiver<String>,
    inbound_tx: mpsc::Sender<Option<Command>>,
    stopping: Arc<AtomicBool>,
}

impl Worker {
    async fn run(mut self) {
        let mut read_buf = vec![0u8; READ_CHUNK_SIZE];
        let mut pending: Vec<u8> = Vec::new();
        let mut outbound_open = true;

        loop {
            if self.stopping.load(Ordering::SeqCst) && self.outbound_rx.is_empty() {
                debug!("network worker stopping, write queue drained");
                break;
            }

            tokio::select! {
                biased;

                line = self.outbound_rx.recv(), if outbound_open => {
                    match line {
                        Some(line) => {
                            let bytes = format!("{line}\r\n");
                            if let Err(e) = self.transport.write_line(bytes.as_bytes()).await {
                                error!("write error, disconnecting: {e}");
                                let _ = self.inbound_tx.send(None).await;
                                return;
                            }
                        }
                        None => outbound_open = false,
                    }
                }

                result = self.transport.read_chunk(&mut read_buf) => {
                    match result {
                        Ok(0) => {
                            error!("socket closed unexpectedly");
                            let _ = self.inbound_tx.send(None).await;
                            return;
                        }
                        Ok(n) => {
                            pending.extend_from_slice(&read_buf[..n]);
                            for line in drain_complete_lines(&mut pending) {
                                match String::from_utf8(line) {
                                    Ok(text) => match Command::parse(&text) {
                                        Ok(cmd) => {
                                            if self.inbound_tx.send(Some(cmd)).await.is_err() {
                                                return;
                                            }
                                        }
                                        Err(e) => warn!("dropping unparseable line {text:?}: {e}"),
                                    },
                                    Err(e) => warn!("dropping non-UTF-8 line: {e}"),
                                }
                            }
                        }
                        Err(e) => {
                            error!("socket read error, disconnecting: {e}");
                            let _ = self.inbound_tx.send(None).await;
                            return;
                        }
                    }
                }
            }
        }
    }
}

/// Split `buf` on CRLF, returning each complete line (CRLF stripped) and
/// leaving the trailing partial fragment, if any, in `buf`.
fn drain_complete_lines(buf: &mut Vec<u8>) -> Vec<Vec<u8>> {
    let mut lines = Vec::new();
    while let Some(pos) = buf.windows(2).position(|w| w == b"\r\n") {
        let rest = buf.split_off(pos + 2);
        let mut line = std::mem::replace(buf, rest);
        line.truncate(pos);
        lines.push(line);
    }
    lines
}
