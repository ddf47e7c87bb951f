// Bind handshake PDUs (SMPP v3.4 Section 4.1). The three bind operations
// share one body layout and differ only in command id, so a single
// role-parameterized request/response pair covers transmitter, receiver,
// and transceiver binds.

use crate::codec::{
    CodecError, Encodable, PduHeader, get_cstring, get_u8, put_cstring,
};
use crate::datatypes::tlv::{Tlv, decode_tlvs, encode_tlvs, find_tlv, tags};
use crate::datatypes::{CommandId, CommandStatus, NumericPlanIndicator, TypeOfNumber};
use bytes::{Buf, BufMut, BytesMut};
use std::io::Cursor;

/// Interface version advertised in every bind request.
pub const INTERFACE_VERSION: u8 = 0x34;

/// The three session roles of the bind handshake.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BindRole {
    /// Send-only: submit_sm and query_sm
    Transmitter,
    /// Receive-only: deliver_sm and alert traffic
    Receiver,
    /// Bidirectional
    Transceiver,
}

impl BindRole {
    pub fn request_id(self) -> CommandId {
        match self {
            BindRole::Transmitter => CommandId::BindTransmitter,
            BindRole::Receiver => CommandId::BindReceiver,
            BindRole::Transceiver => CommandId::BindTransceiver,
        }
    }

    pub fn response_id(self) -> CommandId {
        match self {
            BindRole::Transmitter => CommandId::BindTransmitterResp,
            BindRole::Receiver => CommandId::BindReceiverResp,
            BindRole::Transceiver => CommandId::BindTransceiverResp,
        }
    }

    pub fn from_request_id(id: CommandId) -> Option<Self> {
        match id {
            CommandId::BindTransmitter => Some(BindRole::Transmitter),
            CommandId::BindReceiver => Some(BindRole::Receiver),
            CommandId::BindTransceiver => Some(BindRole::Transceiver),
            _ => None,
        }
    }

    pub fn from_response_id(id: CommandId) -> Option<Self> {
        match id {
            CommandId::BindTransmitterResp => Some(BindRole::Transmitter),
            CommandId::BindReceiverResp => Some(BindRole::Receiver),
            CommandId::BindTransceiverResp => Some(BindRole::Transceiver),
            _ => None,
        }
    }

    /// Whether this role may submit messages.
    pub fn can_transmit(self) -> bool {
        matches!(self, BindRole::Transmitter | BindRole::Transceiver)
    }

    /// Whether this role may receive deliver_sm traffic.
    pub fn can_receive(self) -> bool {
        matches!(self, BindRole::Receiver | BindRole::Transceiver)
    }
}

/// bind_transmitter / bind_receiver / bind_transceiver (Section 4.1.1).
#[derive(Clone, Debug, PartialEq)]
pub struct BindRequest {
    pub role: BindRole,
    pub sequence_number: u32,
    pub system_id: String,
    pub password: String,
    pub system_type: String,
    pub interface_version: u8,
    pub addr_ton: TypeOfNumber,
    pub addr_npi: NumericPlanIndicator,
    pub address_range: String,
}

impl BindRequest {
    pub fn decode_body(
        role: BindRole,
        header: &PduHeader,
        buf: &mut Cursor<&[u8]>,
    ) -> Result<Self, CodecError> {
        let system_id = get_cstring(buf, 16, "system_id")?;
        let password = get_cstring(buf, 9, "password")?;
        let system_type = get_cstring(buf, 13, "system_type")?;
        let interface_version = get_u8(buf, "interface_version")?;
        let addr_ton = TypeOfNumber::try_from(get_u8(buf, "addr_ton")?)
            .unwrap_or(TypeOfNumber::Unknown);
        let addr_npi = NumericPlanIndicator::try_from(get_u8(buf, "addr_npi")?)
            .unwrap_or(NumericPlanIndicator::Unknown);
        let address_range = get_cstring(buf, 41, "address_range")?;

        Ok(BindRequest {
            role,
            sequence_number: header.sequence_number,
            system_id,
            password,
            system_type,
            interface_version,
            addr_ton,
            addr_npi,
            address_range,
        })
    }
}

impl Encodable for BindRequest {
    fn command_id(&self) -> CommandId {
        self.role.request_id()
    }

    fn sequence_number(&self) -> u32 {
        self.sequence_number
    }

    fn encode_body(&self, buf: &mut BytesMut) {
        put_cstring(buf, &self.system_id, 16);
        put_cstring(buf, &self.password, 9);
        put_cstring(buf, &self.system_type, 13);
        buf.put_u8(self.interface_version);
        buf.put_u8(self.addr_ton as u8);
        buf.put_u8(self.addr_npi as u8);
        put_cstring(buf, &self.address_range, 41);
    }
}

/// bind_*_resp (Section 4.1.2). Error responses may arrive with an empty
/// body; the system_id is then empty.
#[derive(Clone, Debug, PartialEq)]
pub struct BindResponse {
    pub role: BindRole,
    pub command_status: CommandStatus,
    pub sequence_number: u32,
    pub system_id: String,
    pub tlvs: Vec<Tlv>,
}

impl BindResponse {
    pub fn decode_body(
        role: BindRole,
        header: &PduHeader,
        buf: &mut Cursor<&[u8]>,
    ) -> Result<Self, CodecError> {
        let system_id = if buf.has_remaining() {
            get_cstring(buf, 16, "system_id")?
        } else {
            String::new()
        };
        let tlvs = decode_tlvs(buf)?;

        Ok(BindResponse {
            role,
            command_status: header.command_status,
            sequence_number: header.sequence_number,
            system_id,
            tlvs,
        })
    }

    /// The SMSC's advertised interface version, when present.
    pub fn sc_interface_version(&self) -> Option<u8> {
        find_tlv(&self.tlvs, tags::SC_INTERFACE_VERSION).and_then(Tlv::as_u8)
    }
}

impl Encodable for BindResponse {
    fn command_id(&self) -> CommandId {
        self.role.response_id()
    }

    fn command_status(&self) -> CommandStatus {
        self.command_status
    }

    fn sequence_number(&self) -> u32 {
        self.sequence_number
    }

    fn encode_body(&self, buf: &mut BytesMut) {
        put_cstring(buf, &self.system_id, 16);
        encode_tlvs(buf, &self.tlvs);
    }
}
