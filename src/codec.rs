// SMPP v3.4 wire codec: the 16-octet PDU header, the Encodable/Decodable
// traits every PDU body implements, and the field-level helpers (C-strings,
// fixed-width integers, short-message payloads) the body parsers are built
// from.
//
// Framing invariant: command_length covers the whole PDU including the
// header, and decoding a PDU consumes exactly command_length octets.

use crate::datatypes::{CommandId, CommandStatus};
use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::io::Cursor;
use thiserror::Error;

/// Largest PDU accepted off the wire. Anything bigger is treated as a
/// framing failure, not a recoverable decode error.
pub const MAX_PDU_SIZE: u32 = 4096;

/// SMPP v3.4 PDU header (Section 2.2.1), common to every PDU.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PduHeader {
    pub command_length: u32,
    pub command_id: CommandId,
    pub command_status: CommandStatus,
    pub sequence_number: u32,
}

impl PduHeader {
    pub const SIZE: usize = 16;

    /// Decode and validate a header. The caller must have checked that at
    /// least `SIZE` bytes are available.
    pub fn decode(buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        if buf.remaining() < Self::SIZE {
            return Err(CodecError::ShortPdu {
                needed: Self::SIZE,
                available: buf.remaining(),
            });
        }

        let command_length = buf.get_u32();
        if command_length < Self::SIZE as u32 {
            return Err(CodecError::ShortPdu {
                needed: Self::SIZE,
                available: command_length as usize,
            });
        }
        if command_length > MAX_PDU_SIZE {
            return Err(CodecError::OversizedPdu(command_length));
        }

        let command_id_raw = buf.get_u32();
        let command_id = CommandId::try_from(command_id_raw)
            .map_err(|_| CodecError::UnknownCommandId(command_id_raw))?;

        // Vendor-reserved status values decode to UnknownError rather than
        // failing the whole PDU; the raw value is only useful for logs.
        let status_raw = buf.get_u32();
        let command_status = CommandStatus::try_from(status_raw).unwrap_or_else(|_| {
            tracing::warn!(status = status_raw, "unrecognized command_status");
            CommandStatus::UnknownError
        });

        let sequence_number = buf.get_u32();

        Ok(PduHeader {
            command_length,
            command_id,
            command_status,
            sequence_number,
        })
    }

    pub fn encode(&self, buf: &mut BytesMut) {
        buf.put_u32(self.command_length);
        buf.put_u32(self.command_id as u32);
        buf.put_u32(self.command_status as u32);
        buf.put_u32(self.sequence_number);
    }
}

/// A PDU that can be serialized to wire bytes.
pub trait Encodable {
    fn command_id(&self) -> CommandId;

    fn command_status(&self) -> CommandStatus {
        CommandStatus::Ok
    }

    fn sequence_number(&self) -> u32;

    /// Write the PDU body (everything after the header).
    fn encode_body(&self, buf: &mut BytesMut);

    /// Serialize header + body, patching command_length afterwards.
    fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(64);
        let header = PduHeader {
            command_length: 0,
            command_id: self.command_id(),
            command_status: self.command_status(),
            sequence_number: self.sequence_number(),
        };
        header.encode(&mut buf);
        self.encode_body(&mut buf);

        let length = buf.len() as u32;
        buf[0..4].copy_from_slice(&length.to_be_bytes());
        buf.freeze()
    }
}

/// A PDU body that can be parsed from wire bytes.
///
/// `decode_body` receives a cursor scoped to exactly the body octets
/// (`command_length - 16` of them) and must consume them all.
pub trait Decodable: Sized {
    fn command_id() -> CommandId;

    fn decode_body(header: &PduHeader, buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError>;
}

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("PDU ends early: needed {needed} bytes, {available} available")]
    ShortPdu { needed: usize, available: usize },

    #[error("PDU length {0} exceeds the {MAX_PDU_SIZE} octet limit")]
    OversizedPdu(u32),

    #[error("unknown command_id {0:#010x}")]
    UnknownCommandId(u32),

    #[error("command {0:?} is not supported by this engine")]
    Unsupported(CommandId),

    #[error("field '{field}' truncated or missing terminator")]
    TruncatedField { field: &'static str },

    #[error("TLV straddles the end of the PDU")]
    TruncatedTlv,

    #[error("field '{field}' is not valid UTF-8")]
    Utf8 { field: &'static str },

    #[error("sm_length {0} exceeds the 254 octet maximum")]
    InvalidSmLength(u8),
}

impl CodecError {
    /// Whether the reader can skip the offending PDU and keep the
    /// connection. Framing-level failures poison the byte stream.
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            CodecError::ShortPdu { .. } | CodecError::OversizedPdu(_)
        )
    }
}

/// Read a null-terminated C-string of at most `max_len` octets including
/// the terminator. Empty fields are a single zero byte on the wire.
pub(crate) fn get_cstring(
    buf: &mut Cursor<&[u8]>,
    max_len: usize,
    field: &'static str,
) -> Result<String, CodecError> {
    let start = buf.position() as usize;
    let data = buf.get_ref();
    let window = &data[start..data.len().min(start + max_len)];

    let nul = window
        .iter()
        .position(|&b| b == 0)
        .ok_or(CodecError::TruncatedField { field })?;

    let value = std::str::from_utf8(&window[..nul])
        .map_err(|_| CodecError::Utf8 { field })?
        .to_owned();
    buf.advance(nul + 1);
    Ok(value)
}

/// Write a C-string: the bytes followed by a single NUL. Content is
/// truncated to `max_len - 1` octets so the terminator always fits.
pub(crate) fn put_cstring(buf: &mut BytesMut, value: &str, max_len: usize) {
    let bytes = value.as_bytes();
    let len = bytes.len().min(max_len - 1);
    buf.put_slice(&bytes[..len]);
    buf.put_u8(0);
}

pub(crate) fn get_u8(buf: &mut Cursor<&[u8]>, field: &'static str) -> Result<u8, CodecError> {
    if buf.remaining() < 1 {
        return Err(CodecError::TruncatedField { field });
    }
    Ok(buf.get_u8())
}

/// Read the short-message payload: an `sm_length` octet (0..254) followed
/// by that many octets of data.
pub(crate) fn get_short_message(buf: &mut Cursor<&[u8]>) -> Result<Bytes, CodecError> {
    let sm_length = get_u8(buf, "sm_length")?;
    if sm_length > 254 {
        return Err(CodecError::InvalidSmLength(sm_length));
    }
    if buf.remaining() < sm_length as usize {
        return Err(CodecError::TruncatedField {
            field: "short_message",
        });
    }
    Ok(buf.copy_to_bytes(sm_length as usize))
}

pub(crate) fn put_short_message(buf: &mut BytesMut, message: &[u8]) {
    debug_assert!(message.len() <= 254);
    buf.put_u8(message.len() as u8);
    buf.put_slice(message);
}
