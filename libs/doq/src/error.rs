use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Boxed source error carried by transport failures
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Phase of an exchange bounded by its own timeout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Connect,
    Write,
    Read,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Connect => f.write_str("connect"),
            Phase::Write => f.write_str("write"),
            Phase::Read => f.write_str("read"),
        }
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Connect error: {0}")]
    Connect(#[source] BoxError),

    #[error("Stream error: {0}")]
    Stream(#[source] BoxError),

    #[error("Encode error: {0}")]
    Encode(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Frame too large: {size} bytes exceeds maximum of {max}")]
    FrameTooLarge { size: usize, max: usize },

    #[error("Stream closed before the full frame arrived")]
    ShortRead,

    #[error("{phase} timeout exceeded after {after:?}")]
    Timeout { phase: Phase, after: Duration },

    #[error("Context cancelled")]
    Cancelled,

    #[error("Context deadline exceeded")]
    DeadlineExceeded,

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("TLS configuration error: {0}")]
    Tls(String),
}

impl Error {
    pub(crate) fn connect(err: impl Into<BoxError>) -> Self {
        Self::Connect(err.into())
    }

    pub(crate) fn stream(err: impl Into<BoxError>) -> Self {
        Self::Stream(err.into())
    }

    /// True when a fixed timeout or the caller's deadline elapsed
    pub fn is_deadline_exceeded(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::DeadlineExceeded)
    }

    /// True when the caller cancelled the context
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// True for violations of the length-prefixed wire framing
    pub fn is_framing(&self) -> bool {
        matches!(self, Self::FrameTooLarge { .. } | Self::ShortRead)
    }

    /// True when establishing the shared connection failed or timed out
    pub fn is_connect(&self) -> bool {
        matches!(
            self,
            Self::Connect(_)
                | Self::Timeout {
                    phase: Phase::Connect,
                    ..
                }
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
