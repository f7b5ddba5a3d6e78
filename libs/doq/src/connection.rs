//! Shared connection management
//!
//! The [`ConnectionManager`] owns the single connection every exchange runs
//! on. It is dialed lazily, checked before each use, and re-dialed once per
//! failure episode no matter how many callers notice the failure together.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::context::{bounded, cancellable, Context};
use crate::error::{Error, Phase, Result};
use crate::transport::{Connection, Transport};

struct Installed<C> {
    connection: C,
    generation: u64,
}

/// Single-slot holder for the shared connection
pub struct ConnectionManager<T: Transport> {
    transport: Arc<T>,
    addr: String,
    tls: Arc<rustls::ClientConfig>,
    connect_timeout: Option<Duration>,
    slot: RwLock<Option<Installed<T::Connection>>>,
    generation: AtomicU64,
}

impl<T: Transport> ConnectionManager<T> {
    pub fn new(
        transport: T,
        addr: impl Into<String>,
        tls: Arc<rustls::ClientConfig>,
        connect_timeout: Option<Duration>,
    ) -> Self {
        Self {
            transport: Arc::new(transport),
            addr: addr.into(),
            tls,
            connect_timeout,
            slot: RwLock::new(None),
            generation: AtomicU64::new(0),
        }
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Number of connections installed so far
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Return a healthy connection, dialing a new one if needed
    pub async fn ensure_connection(&self, ctx: &Context) -> Result<T::Connection> {
        if let Some(connection) = self.healthy(ctx).await? {
            return Ok(connection);
        }
        self.dial(ctx).await
    }

    /// Fast path, shared with every other caller finding the slot healthy
    async fn healthy(&self, ctx: &Context) -> Result<Option<T::Connection>> {
        let slot = cancellable(ctx, async { Ok(self.slot.read().await) }).await?;
        Ok(slot
            .as_ref()
            .filter(|installed| installed.connection.is_healthy())
            .map(|installed| installed.connection.clone()))
    }

    async fn dial(&self, ctx: &Context) -> Result<T::Connection> {
        let mut slot = cancellable(ctx, async { Ok(self.slot.write().await) }).await?;

        match slot.as_ref() {
            Some(installed) if installed.connection.is_healthy() => {
                // another caller re-established it while we waited
                return Ok(installed.connection.clone());
            }
            Some(installed) => {
                warn!(
                    addr = %self.addr,
                    generation = installed.generation,
                    "connection unhealthy, redialing"
                );
            }
            None => debug!(addr = %self.addr, "dialing"),
        }

        // The dial runs detached so an expired attempt is abandoned rather
        // than joined; its late result is dropped with the join handle.
        let transport = Arc::clone(&self.transport);
        let addr = self.addr.clone();
        let tls = Arc::clone(&self.tls);
        let attempt = tokio::spawn(async move { transport.dial(&addr, tls).await });

        let connection = bounded(ctx, Phase::Connect, self.connect_timeout, async {
            attempt.await.map_err(Error::connect)?
        })
        .await
        .inspect_err(|e| debug!(addr = %self.addr, error = %e, "dial failed"))?;

        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        debug!(addr = %self.addr, generation, "connection installed");
        *slot = Some(Installed {
            connection: connection.clone(),
            generation,
        });
        Ok(connection)
    }
}
