// Frame-level I/O over a byte stream. The session splits its transport
// into halves: a FrameReader that buffers and parses inbound PDUs, and a
// FrameWriter that serializes outbound bytes, the single point where PDU
// octets reach the socket.
//
// Recoverable decode failures (unknown id, bad field, bad TLV) skip the
// offending PDU and keep reading; implausible framing poisons the stream
// and surfaces as an I/O error so the session reconnects.

use crate::codec::CodecError;
use crate::frame::Frame;
use bytes::{Buf, BytesMut};
use std::io::{self, Cursor};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufWriter};

fn poisoned(err: CodecError) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, err)
}

/// Buffered PDU reader over the read half of a transport.
#[derive(Debug)]
pub struct FrameReader<R> {
    read: R,
    buffer: BytesMut,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    pub fn new(read: R) -> Self {
        Self {
            read,
            buffer: BytesMut::with_capacity(4 * 1024),
        }
    }

    /// Read the next parseable frame.
    ///
    /// Returns `Ok(None)` on clean EOF (the peer closed between PDUs).
    /// EOF in the middle of a PDU, or an unrecoverable framing failure,
    /// is an error.
    pub async fn read_frame(&mut self) -> io::Result<Option<Frame>> {
        loop {
            if let Some(frame) = self.parse_buffered()? {
                return Ok(Some(frame));
            }

            if 0 == self.read.read_buf(&mut self.buffer).await? {
                if self.buffer.is_empty() {
                    return Ok(None);
                }
                return Err(io::Error::new(
                    io::ErrorKind::ConnectionReset,
                    "connection reset by peer mid-PDU",
                ));
            }
        }
    }

    /// Try to produce a frame from already-buffered bytes, skipping PDUs
    /// that fail to decode recoverably.
    fn parse_buffered(&mut self) -> io::Result<Option<Frame>> {
        loop {
            let (result, consumed) = {
                let mut cursor = Cursor::new(&self.buffer[..]);
                match Frame::check(&mut cursor).map_err(poisoned)? {
                    None => return Ok(None),
                    Some(len) => {
                        cursor.set_position(0);
                        (Frame::parse(&mut cursor), len)
                    }
                }
            };

            match result {
                Ok(frame) => {
                    self.buffer.advance(consumed);
                    return Ok(Some(frame));
                }
                Err(err) if err.is_recoverable() => {
                    tracing::warn!(%err, octets = consumed, "skipping undecodable PDU");
                    self.buffer.advance(consumed);
                }
                Err(err) => return Err(poisoned(err)),
            }
        }
    }
}

/// Buffered writer half. All outbound PDU bytes funnel through here, one
/// `write_bytes` call per PDU, so octets of distinct PDUs never interleave.
#[derive(Debug)]
pub struct FrameWriter<W> {
    write: BufWriter<W>,
}

impl<W: AsyncWrite + Unpin> FrameWriter<W> {
    pub fn new(write: W) -> Self {
        Self {
            write: BufWriter::new(write),
        }
    }

    pub async fn write_bytes(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.write.write_all(bytes).await?;
        self.write.flush().await
    }

    pub async fn write_frame(&mut self, frame: &Frame) -> io::Result<()> {
        self.write_bytes(&frame.to_bytes()).await
    }

    /// Flush and shut down the write half.
    pub async fn shutdown(&mut self) -> io::Result<()> {
        self.write.shutdown().await
    }
}
