use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tracing::{instrument, trace};

use crate::codec::{Codec, DnsCodec};
use crate::config::{non_zero, Options};
use crate::connection::ConnectionManager;
use crate::context::{bounded, cancellable, Context};
use crate::error::{Phase, Result};
use crate::frame;
use crate::transport::{Connection, QuicTransport, Transport};

/// Client exchanging framed messages over one shared connection
///
/// Safe to share between tasks. Every [`Client::send`] opens its own
/// stream on the shared connection, so concurrent requests never wait on
/// each other.
pub struct Client<C: Codec = DnsCodec, T: Transport = QuicTransport> {
    connections: ConnectionManager<T>,
    codec: C,
    write_timeout: Option<Duration>,
    read_timeout: Option<Duration>,
}

impl Client {
    /// Create a DNS over QUIC client with default options
    pub fn new(addr: impl Into<String>) -> Result<Self> {
        Self::builder(addr).build()
    }

    /// Create a builder for configuring the client
    pub fn builder(addr: impl Into<String>) -> ClientBuilder {
        ClientBuilder::new(addr)
    }
}

impl<C: Codec, T: Transport> Client<C, T> {
    pub fn addr(&self) -> &str {
        self.connections.addr()
    }

    /// Number of connections established over the client's lifetime
    pub fn generation(&self) -> u64 {
        self.connections.generation()
    }

    /// Send a request on a fresh stream and wait for its response
    #[instrument(skip_all, fields(addr = %self.connections.addr()))]
    pub async fn send(&self, ctx: &Context, request: &C::Request) -> Result<C::Response> {
        let connection = self.connections.ensure_connection(ctx).await?;
        let (mut send, mut recv) = cancellable(ctx, connection.open_stream()).await?;

        let payload = self.codec.encode(request)?;
        let request_frame = frame::encode(&payload)?;
        trace!(len = payload.len(), "writing request");

        bounded(ctx, Phase::Write, self.write_timeout, async {
            let written = send.write_all(&request_frame).await;
            // the remote answers once it sees the end of the request
            let closed = send.shutdown().await;
            written?;
            closed?;
            Ok(())
        })
        .await?;

        let bytes = bounded(
            ctx,
            Phase::Read,
            self.read_timeout,
            frame::read_frame(&mut recv),
        )
        .await?;
        trace!(len = bytes.len(), "read response");

        self.codec.decode(&bytes)
    }
}

/// Builder for configuring a [`Client`]
pub struct ClientBuilder<C = DnsCodec, T = QuicTransport> {
    addr: String,
    options: Options,
    codec: C,
    transport: T,
}

impl ClientBuilder {
    /// Create a new builder for a DNS over QUIC client
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            options: Options::default(),
            codec: DnsCodec,
            transport: QuicTransport::new(),
        }
    }
}

impl<C: Codec, T: Transport> ClientBuilder<C, T> {
    /// Replace all options at once
    pub fn options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    /// Set the TLS configuration, its ALPN is always overridden to `doq`
    pub fn tls_config(mut self, config: rustls::ClientConfig) -> Self {
        self.options.tls_config = Some(config);
        self
    }

    /// Set the connection timeout
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.options.connect_timeout = non_zero(timeout);
        self
    }

    /// Set the write timeout
    pub fn write_timeout(mut self, timeout: Duration) -> Self {
        self.options.write_timeout = non_zero(timeout);
        self
    }

    /// Set the read timeout
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.options.read_timeout = non_zero(timeout);
        self
    }

    /// Use a different message codec
    pub fn codec<C2: Codec>(self, codec: C2) -> ClientBuilder<C2, T> {
        ClientBuilder {
            addr: self.addr,
            options: self.options,
            codec,
            transport: self.transport,
        }
    }

    /// Use a different transport
    pub fn transport<T2: Transport>(self, transport: T2) -> ClientBuilder<C, T2> {
        ClientBuilder {
            addr: self.addr,
            options: self.options,
            codec: self.codec,
            transport,
        }
    }

    /// Build the client, no connection is made until the first send
    pub fn build(self) -> Result<Client<C, T>> {
        let tls = self.options.tls()?;
        Ok(Client {
            connections: ConnectionManager::new(
                self.transport,
                self.addr,
                tls,
                self.options.connect_timeout.and_then(non_zero),
            ),
            codec: self.codec,
            write_timeout: self.options.write_timeout.and_then(non_zero),
            read_timeout: self.options.read_timeout.and_then(non_zero),
        })
    }
}
