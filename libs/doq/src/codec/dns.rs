use hickory_proto::op::Message;
use hickory_proto::serialize::binary::BinEncodable;

use crate::codec::Codec;
use crate::error::{Error, Result};

/// DNS wire-format codec
#[derive(Debug, Clone, Copy, Default)]
pub struct DnsCodec;

impl Codec for DnsCodec {
    type Request = Message;
    type Response = Message;

    fn encode(&self, request: &Message) -> Result<Vec<u8>> {
        request.to_bytes().map_err(|e| Error::Encode(e.to_string()))
    }

    fn decode(&self, bytes: &[u8]) -> Result<Message> {
        Message::from_vec(bytes).map_err(|e| Error::Decode(e.to_string()))
    }
}
