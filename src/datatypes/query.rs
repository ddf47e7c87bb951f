// query_sm / query_sm_resp (SMPP v3.4 Section 4.8): interrogate the state
// of a previously submitted message.

use crate::codec::{
    CodecError, Decodable, Encodable, PduHeader, get_cstring, get_u8, put_cstring,
};
use crate::datatypes::{CommandId, CommandStatus};
use bytes::{Buf, BufMut, BytesMut};
use num_enum::TryFromPrimitive;
use std::io::Cursor;

/// Message states returned by query_sm and the message_state TLV.
#[derive(TryFromPrimitive)]
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MessageState {
    Scheduled = 0,
    Enroute = 1,
    Delivered = 2,
    Expired = 3,
    Deleted = 4,
    Undeliverable = 5,
    Accepted = 6,
    Unknown = 7,
    Rejected = 8,
}

impl MessageState {
    /// Whether the SMSC will make no further delivery attempts.
    pub fn is_final(self) -> bool {
        !matches!(
            self,
            MessageState::Scheduled | MessageState::Enroute | MessageState::Accepted
        )
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct QuerySm {
    pub sequence_number: u32,
    pub message_id: String,
    pub source_addr_ton: u8,
    pub source_addr_npi: u8,
    pub source_addr: String,
}

impl Encodable for QuerySm {
    fn command_id(&self) -> CommandId {
        CommandId::QuerySm
    }

    fn sequence_number(&self) -> u32 {
        self.sequence_number
    }

    fn encode_body(&self, buf: &mut BytesMut) {
        put_cstring(buf, &self.message_id, 65);
        buf.put_u8(self.source_addr_ton);
        buf.put_u8(self.source_addr_npi);
        put_cstring(buf, &self.source_addr, 21);
    }
}

impl Decodable for QuerySm {
    fn command_id() -> CommandId {
        CommandId::QuerySm
    }

    fn decode_body(header: &PduHeader, buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        Ok(QuerySm {
            sequence_number: header.sequence_number,
            message_id: get_cstring(buf, 65, "message_id")?,
            source_addr_ton: get_u8(buf, "source_addr_ton")?,
            source_addr_npi: get_u8(buf, "source_addr_npi")?,
            source_addr: get_cstring(buf, 21, "source_addr")?,
        })
    }
}

/// query_sm_resp (Section 4.8.2). `final_date` is empty while the message
/// is still in flight.
#[derive(Clone, Debug, PartialEq)]
pub struct QuerySmResp {
    pub command_status: CommandStatus,
    pub sequence_number: u32,
    pub message_id: String,
    pub final_date: String,
    pub message_state: MessageState,
    pub error_code: u8,
}

impl Encodable for QuerySmResp {
    fn command_id(&self) -> CommandId {
        CommandId::QuerySmResp
    }

    fn command_status(&self) -> CommandStatus {
        self.command_status
    }

    fn sequence_number(&self) -> u32 {
        self.sequence_number
    }

    fn encode_body(&self, buf: &mut BytesMut) {
        put_cstring(buf, &self.message_id, 65);
        put_cstring(buf, &self.final_date, 17);
        buf.put_u8(self.message_state as u8);
        buf.put_u8(self.error_code);
    }
}

impl Decodable for QuerySmResp {
    fn command_id() -> CommandId {
        CommandId::QuerySmResp
    }

    fn decode_body(header: &PduHeader, buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        if !buf.has_remaining() {
            // Failed queries may come back as a bare header.
            return Ok(QuerySmResp {
                command_status: header.command_status,
                sequence_number: header.sequence_number,
                message_id: String::new(),
                final_date: String::new(),
                message_state: MessageState::Unknown,
                error_code: 0,
            });
        }

        let message_id = get_cstring(buf, 65, "message_id")?;
        let final_date = get_cstring(buf, 17, "final_date")?;
        let state_raw = get_u8(buf, "message_state")?;
        let message_state = MessageState::try_from(state_raw).unwrap_or(MessageState::Unknown);
        let error_code = get_u8(buf, "error_code")?;

        Ok(QuerySmResp {
            command_status: header.command_status,
            sequence_number: header.sequence_number,
            message_id,
            final_date,
            message_state,
            error_code,
        })
    }
}
