use std::sync::Arc;
use std::time::Duration;

use rustls::RootCertStore;

use crate::error::{Error, Result};

/// ALPN identifier negotiated for DNS over QUIC
pub const DOQ_ALPN: &[u8] = b"doq";

/// Client options applied once at construction
///
/// Unset timeouts leave the phase bounded only by the caller's context.
#[derive(Debug, Clone, Default)]
pub struct Options {
    /// TLS configuration replacing the default one
    pub tls_config: Option<rustls::ClientConfig>,

    /// Bound on establishing the shared connection
    pub connect_timeout: Option<Duration>,

    /// Bound on writing a request
    pub write_timeout: Option<Duration>,

    /// Bound on reading a response
    pub read_timeout: Option<Duration>,
}

impl Options {
    /// Resolve the TLS configuration, forcing the DoQ protocol identifier
    ///
    /// Certificates, roots and verification stay under the caller's control.
    pub fn tls(&self) -> Result<Arc<rustls::ClientConfig>> {
        let mut config = match &self.tls_config {
            Some(config) => config.clone(),
            None => default_tls_config()?,
        };
        config.alpn_protocols = vec![DOQ_ALPN.to_vec()];
        Ok(Arc::new(config))
    }
}

/// Zero durations count as unset
pub(crate) fn non_zero(timeout: Duration) -> Option<Duration> {
    (!timeout.is_zero()).then_some(timeout)
}

fn default_tls_config() -> Result<rustls::ClientConfig> {
    let mut roots = RootCertStore::empty();
    roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let config = rustls::ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .map_err(|e| Error::Tls(e.to_string()))?
        .with_root_certificates(roots)
        .with_no_client_auth();
    Ok(config)
}
