//! Newline-framed JSON codec.
//!
//! A frame is one compact JSON document followed by `\n`. Compact JSON never
//! contains a raw newline, so the delimiter is unambiguous and the reader does
//! not depend on the writer closing the stream. Writers flush after every
//! frame.

use crate::{Envelope, ProtocolError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Maximum frame size in bytes (16 MB), delimiter excluded.
pub const MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024;

/// Encodes a value as one frame.
///
/// # Errors
///
/// Returns an error if the value cannot be serialized or is too large.
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let mut bytes =
        serde_json::to_vec(value).map_err(|e| ProtocolError::Serialization(e.to_string()))?;
    if bytes.len() > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::TooLarge {
            max: MAX_MESSAGE_SIZE,
        });
    }
    bytes.push(b'\n');
    Ok(bytes)
}

/// Decodes one frame. A trailing delimiter is optional.
///
/// # Errors
///
/// Returns [`ProtocolError::Malformed`] if the bytes are not a valid `T`.
pub fn decode<T: DeserializeOwned>(frame: &[u8]) -> Result<T> {
    serde_json::from_slice(frame).map_err(|e| ProtocolError::Malformed(e.to_string()))
}

/// Writes one frame and flushes.
///
/// # Errors
///
/// Returns an error if encoding or the write fails.
pub async fn write_frame<W, T>(writer: &mut W, value: &T) -> Result<()>
where
    W: AsyncWrite + Unpin + ?Sized,
    T: Serialize,
{
    let bytes = encode(value)?;
    writer.write_all(&bytes).await?;
    writer.flush().await?;
    Ok(())
}

/// Reads one frame.
///
/// # Errors
///
/// Returns [`ProtocolError::Closed`] if the stream ends before any byte
/// arrives, [`ProtocolError::TooLarge`] if no delimiter shows up within
/// [`MAX_MESSAGE_SIZE`] bytes, and [`ProtocolError::Malformed`] if the frame
/// does not parse.
pub async fn read_frame<R, T>(reader: &mut R) -> Result<T>
where
    R: AsyncBufRead + Unpin + ?Sized,
    T: DeserializeOwned,
{
    let mut buf = Vec::new();
    let limit = MAX_MESSAGE_SIZE as u64 + 1;
    let read = (&mut *reader).take(limit).read_until(b'\n', &mut buf).await?;

    if read == 0 {
        return Err(ProtocolError::Closed);
    }
    if buf.last() != Some(&b'\n') && buf.len() > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::TooLarge {
            max: MAX_MESSAGE_SIZE,
        });
    }

    decode(&buf)
}

/// Writes one envelope and flushes.
///
/// # Errors
///
/// See [`write_frame`].
pub async fn write_message<W>(writer: &mut W, envelope: &Envelope) -> Result<()>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    write_frame(writer, envelope).await
}

/// Reads one envelope.
///
/// # Errors
///
/// See [`read_frame`].
pub async fn read_message<R>(reader: &mut R) -> Result<Envelope>
where
    R: AsyncBufRead + Unpin + ?Sized,
{
    read_frame(reader).await
}
