//! Loopback script listener.
//!
//! One exchange per connection: read until the request ends with the
//! terminator (or the peer closes), run it, write one response, close.
//! Connections are served strictly one at a time.

use std::io;
use std::net::{IpAddr, SocketAddr};

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use crate::config::NetworkConfig;
use crate::engine::Engine;

/// Outcome of one connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Exchange {
    /// Non-loopback peer; nothing was read or written.
    Rejected,
    /// The request exceeded the size limit and was not executed.
    Oversized { response_bytes: usize },
    Answered { request_bytes: usize, response_bytes: usize },
}

pub fn is_loopback(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => v4.is_loopback(),
        IpAddr::V6(v6) => v6.to_ipv4_mapped().map_or(v6.is_loopback(), |v4| v4.is_loopback()),
    }
}

pub struct ScriptListener {
    listener: TcpListener,
    config: NetworkConfig,
}

impl ScriptListener {
    /// Bind the first free port in `first_port..=last_port` on `bind_host`.
    pub async fn bind(config: NetworkConfig) -> io::Result<Self> {
        let mut last_error = None;
        for port in config.first_port..=config.last_port {
            let bound = TcpListener::bind((config.bind_host.as_str(), port)).await;
            match bound {
                Ok(listener) => {
                    info!(addr = %listener.local_addr()?, "script listener bound");
                    return Ok(Self { listener, config });
                }
                Err(err) => {
                    debug!(port, %err, "port unavailable");
                    last_error = Some(err);
                }
            }
        }
        Err(last_error.unwrap_or_else(|| {
            io::Error::new(io::ErrorKind::AddrNotAvailable, "empty port range")
        }))
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept and serve a single connection.
    pub async fn accept_one(&self, engine: &mut Engine) -> io::Result<Exchange> {
        let (stream, peer) = self.listener.accept().await?;
        handle_connection(stream, peer, engine, &self.config).await
    }

    /// Serve connections until accepting fails. An I/O error on one
    /// connection is logged and the next connection is accepted.
    pub async fn run(&self, engine: &mut Engine) -> io::Result<()> {
        loop {
            let (stream, peer) = self.listener.accept().await?;
            match handle_connection(stream, peer, engine, &self.config).await {
                Ok(exchange) => debug!(%peer, ?exchange, "connection closed"),
                Err(err) => warn!(%peer, %err, "connection failed"),
            }
        }
    }
}

/// Serve one exchange on an already accepted stream.
pub async fn handle_connection<S>(
    mut stream: S,
    peer: SocketAddr,
    engine: &mut Engine,
    config: &NetworkConfig,
) -> io::Result<Exchange>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    if !is_loopback(peer.ip()) {
        warn!(%peer, "rejected non-loopback connection");
        stream.shutdown().await?;
        return Ok(Exchange::Rejected);
    }

    let terminator = config.terminator.as_bytes();
    let mut request = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        request.extend_from_slice(&chunk[..n]);
        if request.len() > config.max_request_bytes {
            warn!(%peer, limit = config.max_request_bytes, "request too large");
            let response = format!("request exceeds {} bytes", config.max_request_bytes);
            stream.write_all(response.as_bytes()).await?;
            stream.shutdown().await?;
            return Ok(Exchange::Oversized { response_bytes: response.len() });
        }
        if request.ends_with(terminator) {
            break;
        }
    }

    let text = String::from_utf8_lossy(&request);
    let response = engine.execute_network(&text);
    stream.write_all(response.as_bytes()).await?;
    stream.shutdown().await?;
    debug!(%peer, request_bytes = request.len(), response_bytes = response.len(), "request served");
    Ok(Exchange::Answered {
        request_bytes: request.len(),
        response_bytes: response.len(),
    })
}
