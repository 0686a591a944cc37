//! Wire framing (C9): a 4-byte little-endian payload length followed by an
//! 8-byte little-endian sequence id, then the payload itself. Grounded on
//! `common.go`'s `PayLoadLenBufLength`/`ReadPayload` and `duplex/srv.go` and
//! `duplex/trans.go`'s header layout (`seqIdHeaderLength` appended after the
//! length prefix).
//!
//! The source's `ReadPayload` takes a `notHalt` flag but, read closely,
//! returns a deadline-exceeded error unconditionally regardless of its
//! value — only the log line differs. `TransConf.IdleTimeout`'s own doc
//! comment says the opposite ("exceeding it only logs, it does not
//! interrupt the connection"), which the header-read call sites don't
//! actually honor. This module follows the documented intent rather than
//! the letter of that one function: an idle timeout while waiting for the
//! next frame header is routine and does not end the connection, while any
//! timeout once a frame has started (reading its body) is fatal.

use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};

use crate::error::NFourError;

pub const LEN_HEADER_SIZE: usize = 4;
pub const SEQ_ID_HEADER_SIZE: usize = 8;
pub const FRAME_HEADER_SIZE: usize = LEN_HEADER_SIZE + SEQ_ID_HEADER_SIZE;

/// A decoded frame header: payload length and sequence id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub payload_len: u32,
    pub seq_id: u64,
}

pub fn encode_header(payload_len: u32, seq_id: u64) -> [u8; FRAME_HEADER_SIZE] {
    let mut buf = [0u8; FRAME_HEADER_SIZE];
    buf[..LEN_HEADER_SIZE].copy_from_slice(&payload_len.to_le_bytes());
    buf[LEN_HEADER_SIZE..].copy_from_slice(&seq_id.to_le_bytes());
    buf
}

pub fn decode_header(buf: &[u8; FRAME_HEADER_SIZE]) -> FrameHeader {
    let mut len_bytes = [0u8; 4];
    len_bytes.copy_from_slice(&buf[..LEN_HEADER_SIZE]);
    let mut seq_bytes = [0u8; 8];
    seq_bytes.copy_from_slice(&buf[LEN_HEADER_SIZE..]);
    FrameHeader {
        payload_len: u32::from_le_bytes(len_bytes),
        seq_id: u64::from_le_bytes(seq_bytes),
    }
}

/// Reads `buf.len()` bytes off `reader`, racing each read against
/// `deadline`. `idle` selects how a deadline-exceeded is reported: when
/// `true` (waiting for the next frame's header) it comes back as
/// `IdleTimeout`, a condition callers treat as routine; when `false`
/// (reading a frame's payload, or any read after the first byte has
/// already arrived) it comes back as `ReadTimeout`, which callers treat as
/// fatal.
pub async fn read_exact_with_deadline<R>(
    reader: &mut R,
    buf: &mut [u8],
    deadline: Duration,
    idle: bool,
) -> Result<(), NFourError>
where
    R: tokio::io::AsyncRead + Unpin,
{
    let mut read = 0;
    while read < buf.len() {
        let fut = reader.read(&mut buf[read..]);
        let n = match tokio::time::timeout(deadline, fut).await {
            Ok(Ok(0)) => return Err(NFourError::PeerClosed),
            Ok(Ok(n)) => n,
            Ok(Err(e)) => return Err(NFourError::Io(e)),
            Err(_elapsed) => {
                return if idle && read == 0 {
                    Err(NFourError::IdleTimeout)
                } else {
                    Err(NFourError::ReadTimeout)
                }
            }
        };
        read += n;
    }
    Ok(())
}

/// Reads one frame header, waiting indefinitely (up to `idle_timeout`
/// per attempt) for the next request to arrive.
pub async fn read_header<R>(
    reader: &mut R,
    idle_timeout: Duration,
) -> Result<FrameHeader, NFourError>
where
    R: tokio::io::AsyncRead + Unpin,
{
    let mut buf = [0u8; FRAME_HEADER_SIZE];
    read_exact_with_deadline(reader, &mut buf, idle_timeout, true).await?;
    Ok(decode_header(&buf))
}

/// Reads a frame's payload of `len` bytes; any deadline hit here is fatal.
pub async fn read_payload<R>(
    reader: &mut R,
    len: u32,
    read_timeout: Duration,
) -> Result<Vec<u8>, NFourError>
where
    R: tokio::io::AsyncRead + Unpin,
{
    let mut buf = vec![0u8; len as usize];
    read_exact_with_deadline(reader, &mut buf, read_timeout, false).await?;
    Ok(buf)
}

/// Writes a full frame (header followed by payload) before `write_timeout`
/// elapses.
pub async fn write_frame<W>(
    writer: &mut W,
    seq_id: u64,
    payload: &[u8],
    write_timeout: Duration,
) -> Result<(), NFourError>
where
    W: tokio::io::AsyncWrite + Unpin,
{
    let header = encode_header(payload.len() as u32, seq_id);
    let fut = async {
        writer.write_all(&header).await?;
        writer.write_all(payload).await?;
        writer.flush().await
    };
    match tokio::time::timeout(write_timeout, fut).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(NFourError::Io(e)),
        Err(_elapsed) => Err(NFourError::WriteTimeout),
    }
}
