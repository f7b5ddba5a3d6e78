use std::fmt;
use std::marker::PhantomData;

use serde::{Deserialize, Serialize};

use crate::codec::Codec;
use crate::error::{Error, Result};

/// Bincode codec for binary serialization of serde types
pub struct BincodeCodec<Req, Res> {
    _marker: PhantomData<fn(Req) -> Res>,
}

impl<Req, Res> BincodeCodec<Req, Res> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<Req, Res> Default for BincodeCodec<Req, Res> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Req, Res> Clone for BincodeCodec<Req, Res> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<Req, Res> fmt::Debug for BincodeCodec<Req, Res> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BincodeCodec")
    }
}

impl<Req, Res> Codec for BincodeCodec<Req, Res>
where
    Req: Serialize + Send + Sync + 'static,
    Res: for<'de> Deserialize<'de> + Send + 'static,
{
    type Request = Req;
    type Response = Res;

    fn encode(&self, request: &Req) -> Result<Vec<u8>> {
        bincode::serialize(request).map_err(|e| Error::Encode(e.to_string()))
    }

    fn decode(&self, bytes: &[u8]) -> Result<Res> {
        bincode::deserialize(bytes).map_err(|e| Error::Decode(e.to_string()))
    }
}
