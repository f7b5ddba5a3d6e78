//! DNS over QUIC client
//!
//! One long-lived QUIC connection carries every query, each on its own
//! stream. Messages are framed with a 2-byte big-endian length prefix, and
//! the connect, write and read phases each take an optional timeout on top
//! of the caller's [`Context`].
//!
//! # Example
//!
//! ```no_run
//! use doq::{Client, Context};
//! use hickory_proto::op::{Message, Query};
//! use hickory_proto::rr::{Name, RecordType};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Client::builder("dns.adguard-dns.com:853")
//!     .connect_timeout(Duration::from_secs(5))
//!     .read_timeout(Duration::from_secs(2))
//!     .build()?;
//!
//! let mut query = Message::new();
//! query.add_query(Query::query(Name::from_ascii("www.google.com.")?, RecordType::A));
//!
//! let ctx = Context::background().with_timeout(Duration::from_secs(10));
//! let response = client.send(&ctx, &query).await?;
//! println!("{}", response.response_code());
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod codec;
pub mod config;
pub mod connection;
pub mod context;
pub mod error;
pub mod frame;
pub mod request;
pub mod transport;

// Re-exports for convenience
pub use client::{Client, ClientBuilder};
pub use config::Options;
pub use context::Context;
pub use error::{Error, Phase, Result};
