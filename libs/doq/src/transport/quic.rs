use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::Arc;

use quinn::crypto::rustls::QuicClientConfig;
use quinn::{Endpoint, RecvStream, SendStream};
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::transport::{Connection, Transport};

/// QUIC transport backed by quinn
///
/// Each dial binds its own UDP endpoint matching the remote address family.
#[derive(Debug, Clone, Copy, Default)]
pub struct QuicTransport;

impl QuicTransport {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl Transport for QuicTransport {
    type Connection = QuicConnection;

    async fn dial(&self, addr: &str, tls: Arc<rustls::ClientConfig>) -> Result<QuicConnection> {
        let server_name = server_name(addr)?;
        let remote = tokio::net::lookup_host(addr)
            .await
            .map_err(Error::connect)?
            .next()
            .ok_or_else(|| Error::InvalidAddress(format!("{} did not resolve", addr)))?;

        let crypto = QuicClientConfig::try_from(tls).map_err(|e| Error::Tls(e.to_string()))?;
        let config = quinn::ClientConfig::new(Arc::new(crypto));

        let bind: SocketAddr = if remote.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };
        let endpoint = Endpoint::client(bind).map_err(Error::connect)?;

        trace!(%remote, server_name, "dialing");
        let connecting = endpoint
            .connect_with(config, remote, server_name)
            .map_err(Error::connect)?;

        // full handshake only, a rejected 0-RTT resets the first stream
        let connection = connecting.await.map_err(Error::connect)?;
        debug!(%remote, "connection established");

        Ok(QuicConnection { connection })
    }
}

/// Established QUIC connection
///
/// The connection keeps its endpoint driver running until the last clone
/// is dropped.
#[derive(Debug, Clone)]
pub struct QuicConnection {
    connection: quinn::Connection,
}

#[async_trait::async_trait]
impl Connection for QuicConnection {
    type SendStream = SendStream;
    type RecvStream = RecvStream;

    fn is_healthy(&self) -> bool {
        self.connection.close_reason().is_none()
    }

    async fn open_stream(&self) -> Result<(SendStream, RecvStream)> {
        self.connection.open_bi().await.map_err(Error::stream)
    }
}

/// Host part of `host:port`, used as the TLS server name
fn server_name(addr: &str) -> Result<&str> {
    let (host, port) = addr
        .rsplit_once(':')
        .ok_or_else(|| Error::InvalidAddress(format!("{} is missing a port", addr)))?;
    if host.is_empty() || port.parse::<u16>().is_err() {
        return Err(Error::InvalidAddress(addr.to_string()));
    }
    Ok(host.trim_start_matches('[').trim_end_matches(']'))
}
