use crate::codec::Codec;
use crate::error::Result;

/// Raw codec that passes bytes through untouched
#[derive(Debug, Clone, Copy, Default)]
pub struct RawCodec;

impl Codec for RawCodec {
    type Request = Vec<u8>;
    type Response = Vec<u8>;

    fn encode(&self, request: &Vec<u8>) -> Result<Vec<u8>> {
        Ok(request.clone())
    }

    fn decode(&self, bytes: &[u8]) -> Result<Vec<u8>> {
        Ok(bytes.to_vec())
    }
}
