use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite};

use crate::error::Result;

pub mod quic;

pub use self::quic::{QuicConnection, QuicTransport};

/// Transport trait for establishing secure multiplexed connections
///
/// A transport is stateless from the client's point of view; every call to
/// [`Transport::dial`] yields a brand new connection.
#[async_trait::async_trait]
pub trait Transport: Send + Sync + 'static {
    type Connection: Connection;

    /// Establish a connection to `addr` using the given TLS configuration
    async fn dial(&self, addr: &str, tls: Arc<rustls::ClientConfig>) -> Result<Self::Connection>;
}

/// Connection trait for a live session carrying many independent streams
///
/// Handles are cheap to clone and all clones refer to the same session.
#[async_trait::async_trait]
pub trait Connection: Clone + Send + Sync + 'static {
    /// Send half of a stream, shutting it down signals end of request
    type SendStream: AsyncWrite + Send + Unpin + 'static;

    /// Receive half of a stream
    type RecvStream: AsyncRead + Send + Unpin + 'static;

    /// Non-blocking liveness query
    fn is_healthy(&self) -> bool;

    /// Open a new bidirectional stream
    async fn open_stream(&self) -> Result<(Self::SendStream, Self::RecvStream)>;
}
