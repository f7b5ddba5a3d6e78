//! Length-prefixed message framing
//!
//! Every message on a stream is a 2-byte big-endian length followed by
//! exactly that many bytes of codec output.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{Error, Result};

/// Size of the length prefix in bytes
pub const PREFIX_LEN: usize = 2;

/// Largest payload the prefix can describe
pub const MAX_PAYLOAD_LEN: usize = u16::MAX as usize;

/// Prefix `payload` with its length, rejecting payloads that do not fit
pub fn encode(payload: &[u8]) -> Result<Vec<u8>> {
    let len = u16::try_from(payload.len()).map_err(|_| Error::FrameTooLarge {
        size: payload.len(),
        max: MAX_PAYLOAD_LEN,
    })?;

    let mut frame = Vec::with_capacity(PREFIX_LEN + payload.len());
    frame.extend_from_slice(&len.to_be_bytes());
    frame.extend_from_slice(payload);
    Ok(frame)
}

/// Write one framed message
pub async fn write_frame<W>(writer: &mut W, payload: &[u8]) -> Result<()>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    let frame = encode(payload)?;
    writer.write_all(&frame).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one framed message
pub async fn read_frame<R>(reader: &mut R) -> Result<Vec<u8>>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let len = reader.read_u16().await.map_err(short_read)? as usize;

    let mut buf = vec![0u8; len];
    reader.read_exact(&mut buf).await.map_err(short_read)?;
    Ok(buf)
}

fn short_read(err: std::io::Error) -> Error {
    if err.kind() == std::io::ErrorKind::UnexpectedEof {
        Error::ShortRead
    } else {
        err.into()
    }
}
