use crate::error::Result;

pub mod bincode;
pub mod dns;
pub mod raw;

pub use self::bincode::BincodeCodec;
pub use self::dns::DnsCodec;
pub use self::raw::RawCodec;

/// Codec trait for serializing requests and deserializing responses
///
/// The codec only produces and consumes message payloads; the length
/// prefix is applied by the exchange.
pub trait Codec: Send + Sync + 'static {
    /// Message sent to the remote
    type Request: Send + Sync;

    /// Message received from the remote
    type Response: Send;

    /// Encode a request into bytes
    fn encode(&self, request: &Self::Request) -> Result<Vec<u8>>;

    /// Decode bytes into a response
    fn decode(&self, bytes: &[u8]) -> Result<Self::Response>;
}
