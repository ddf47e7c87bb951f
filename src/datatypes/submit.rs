// submit_sm / submit_sm_resp (SMPP v3.4 Section 4.4): the workhorse
// message-submission operation.
//
// Addresses keep their raw TON/NPI octets here; typed numbering lives in
// the client API. short_message is binary (the data_coding octet says how
// to read it) and optional parameters stay in wire order.

use crate::codec::{
    CodecError, Decodable, Encodable, PduHeader, get_cstring, get_short_message, get_u8,
    put_cstring, put_short_message,
};
use crate::datatypes::tlv::{Tlv, decode_tlvs, encode_tlvs, find_tlv, tags};
use crate::datatypes::{CommandId, CommandStatus, esm};
use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::io::Cursor;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SubmitSm {
    pub sequence_number: u32,

    pub service_type: String,
    pub source_addr_ton: u8,
    pub source_addr_npi: u8,
    pub source_addr: String,
    pub dest_addr_ton: u8,
    pub dest_addr_npi: u8,
    pub destination_addr: String,
    pub esm_class: u8,
    pub protocol_id: u8,
    pub priority_flag: u8,
    pub schedule_delivery_time: String,
    pub validity_period: String,
    pub registered_delivery: u8,
    pub replace_if_present_flag: u8,
    pub data_coding: u8,
    pub sm_default_msg_id: u8,
    pub short_message: Bytes,

    pub tlvs: Vec<Tlv>,
}

impl SubmitSm {
    /// Whether the short message starts with a user data header.
    pub fn has_udh(&self) -> bool {
        self.esm_class & esm::UDH_INDICATOR != 0
    }

    /// The message_payload TLV, used when the payload exceeds the 254
    /// octet short_message limit.
    pub fn message_payload(&self) -> Option<&Bytes> {
        find_tlv(&self.tlvs, tags::MESSAGE_PAYLOAD).map(|t| &t.value)
    }
}

impl Encodable for SubmitSm {
    fn command_id(&self) -> CommandId {
        CommandId::SubmitSm
    }

    fn sequence_number(&self) -> u32 {
        self.sequence_number
    }

    fn encode_body(&self, buf: &mut BytesMut) {
        put_cstring(buf, &self.service_type, 6);
        buf.put_u8(self.source_addr_ton);
        buf.put_u8(self.source_addr_npi);
        put_cstring(buf, &self.source_addr, 21);
        buf.put_u8(self.dest_addr_ton);
        buf.put_u8(self.dest_addr_npi);
        put_cstring(buf, &self.destination_addr, 21);
        buf.put_u8(self.esm_class);
        buf.put_u8(self.protocol_id);
        buf.put_u8(self.priority_flag);
        put_cstring(buf, &self.schedule_delivery_time, 17);
        put_cstring(buf, &self.validity_period, 17);
        buf.put_u8(self.registered_delivery);
        buf.put_u8(self.replace_if_present_flag);
        buf.put_u8(self.data_coding);
        buf.put_u8(self.sm_default_msg_id);
        put_short_message(buf, &self.short_message);
        encode_tlvs(buf, &self.tlvs);
    }
}

impl Decodable for SubmitSm {
    fn command_id() -> CommandId {
        CommandId::SubmitSm
    }

    fn decode_body(header: &PduHeader, buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        let service_type = get_cstring(buf, 6, "service_type")?;
        let source_addr_ton = get_u8(buf, "source_addr_ton")?;
        let source_addr_npi = get_u8(buf, "source_addr_npi")?;
        let source_addr = get_cstring(buf, 21, "source_addr")?;
        let dest_addr_ton = get_u8(buf, "dest_addr_ton")?;
        let dest_addr_npi = get_u8(buf, "dest_addr_npi")?;
        let destination_addr = get_cstring(buf, 21, "destination_addr")?;
        let esm_class = get_u8(buf, "esm_class")?;
        let protocol_id = get_u8(buf, "protocol_id")?;
        let priority_flag = get_u8(buf, "priority_flag")?;
        let schedule_delivery_time = get_cstring(buf, 17, "schedule_delivery_time")?;
        let validity_period = get_cstring(buf, 17, "validity_period")?;
        let registered_delivery = get_u8(buf, "registered_delivery")?;
        let replace_if_present_flag = get_u8(buf, "replace_if_present_flag")?;
        let data_coding = get_u8(buf, "data_coding")?;
        let sm_default_msg_id = get_u8(buf, "sm_default_msg_id")?;
        let short_message = get_short_message(buf)?;
        let tlvs = decode_tlvs(buf)?;

        Ok(SubmitSm {
            sequence_number: header.sequence_number,
            service_type,
            source_addr_ton,
            source_addr_npi,
            source_addr,
            dest_addr_ton,
            dest_addr_npi,
            destination_addr,
            esm_class,
            protocol_id,
            priority_flag,
            schedule_delivery_time,
            validity_period,
            registered_delivery,
            replace_if_present_flag,
            data_coding,
            sm_default_msg_id,
            short_message,
            tlvs,
        })
    }
}

/// submit_sm_resp (Section 4.4.2). On error the body may be empty.
#[derive(Clone, Debug, PartialEq)]
pub struct SubmitSmResp {
    pub command_status: CommandStatus,
    pub sequence_number: u32,
    pub message_id: String,
}

impl Encodable for SubmitSmResp {
    fn command_id(&self) -> CommandId {
        CommandId::SubmitSmResp
    }

    fn command_status(&self) -> CommandStatus {
        self.command_status
    }

    fn sequence_number(&self) -> u32 {
        self.sequence_number
    }

    fn encode_body(&self, buf: &mut BytesMut) {
        put_cstring(buf, &self.message_id, 65);
    }
}

impl Decodable for SubmitSmResp {
    fn command_id() -> CommandId {
        CommandId::SubmitSmResp
    }

    fn decode_body(header: &PduHeader, buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        let message_id = if buf.has_remaining() {
            get_cstring(buf, 65, "message_id")?
        } else {
            String::new()
        };

        Ok(SubmitSmResp {
            command_status: header.command_status,
            sequence_number: header.sequence_number,
            message_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SubmitSm {
        SubmitSm {
            sequence_number: 1,
            source_addr_ton: 0x01,
            source_addr_npi: 0x01,
            source_addr: "1234567890".into(),
            dest_addr_ton: 0x01,
            dest_addr_npi: 0x01,
            destination_addr: "0987654321".into(),
            short_message: Bytes::from_static(b"Hello World"),
            ..Default::default()
        }
    }

    #[test]
    fn wire_layout() {
        let bytes = sample().to_bytes();
        let expected: Vec<u8> = vec![
            0x00, 0x00, 0x00, 0x40, // command_length (64)
            0x00, 0x00, 0x00, 0x04, // submit_sm
            0x00, 0x00, 0x00, 0x00, //
            0x00, 0x00, 0x00, 0x01, //
            0x00, // service_type
            0x01, 0x01, // source ton/npi
            b'1', b'2', b'3', b'4', b'5', b'6', b'7', b'8', b'9', b'0', 0x00,
            0x01, 0x01, // dest ton/npi
            b'0', b'9', b'8', b'7', b'6', b'5', b'4', b'3', b'2', b'1', 0x00,
            0x00, // esm_class
            0x00, // protocol_id
            0x00, // priority_flag
            0x00, // schedule_delivery_time
            0x00, // validity_period
            0x00, // registered_delivery
            0x00, // replace_if_present_flag
            0x00, // data_coding
            0x00, // sm_default_msg_id
            0x0B, // sm_length
            b'H', b'e', b'l', b'l', b'o', b' ', b'W', b'o', b'r', b'l', b'd',
        ];
        assert_eq!(bytes.as_ref(), expected.as_slice());
    }

    #[test]
    fn roundtrip_with_tlvs() {
        let mut original = sample();
        original.registered_delivery = 1;
        original.tlvs = vec![
            Tlv::from_u16(tags::USER_MESSAGE_REFERENCE, 0x0001),
            Tlv::new(0xFF01, vec![0xDE, 0xAD]), // vendor tag survives
        ];

        let bytes = original.to_bytes();
        let mut cursor = Cursor::new(bytes.as_ref());
        let header = PduHeader::decode(&mut cursor).unwrap();
        assert_eq!(header.command_length as usize, bytes.len());

        let decoded = SubmitSm::decode_body(&header, &mut cursor).unwrap();
        assert_eq!(decoded, original);
        assert_eq!(decoded.to_bytes(), bytes);
    }

    #[test]
    fn empty_short_message_with_payload_tlv() {
        let mut original = sample();
        original.short_message = Bytes::new();
        original.tlvs = vec![Tlv::new(tags::MESSAGE_PAYLOAD, vec![0x41; 300])];

        let bytes = original.to_bytes();
        let mut cursor = Cursor::new(bytes.as_ref());
        let header = PduHeader::decode(&mut cursor).unwrap();
        let decoded = SubmitSm::decode_body(&header, &mut cursor).unwrap();

        assert!(decoded.short_message.is_empty());
        assert_eq!(decoded.message_payload().unwrap().len(), 300);
    }

    #[test]
    fn response_roundtrip() {
        let original = SubmitSmResp {
            command_status: CommandStatus::Ok,
            sequence_number: 1,
            message_id: "MSG0001".into(),
        };

        let bytes = original.to_bytes();
        let mut cursor = Cursor::new(bytes.as_ref());
        let header = PduHeader::decode(&mut cursor).unwrap();
        let decoded = SubmitSmResp::decode_body(&header, &mut cursor).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn error_response_with_bare_header() {
        let data: Vec<u8> = vec![
            0x00, 0x00, 0x00, 0x10, //
            0x80, 0x00, 0x00, 0x04, //
            0x00, 0x00, 0x00, 0x58, // throttled
            0x00, 0x00, 0x00, 0x01,
        ];
        let mut cursor = Cursor::new(data.as_slice());
        let header = PduHeader::decode(&mut cursor).unwrap();
        let decoded = SubmitSmResp::decode_body(&header, &mut cursor).unwrap();
        assert_eq!(decoded.command_status, CommandStatus::Throttled);
        assert!(decoded.message_id.is_empty());
    }

    #[test]
    fn truncated_body_is_rejected() {
        let mut bytes = sample().to_bytes().to_vec();
        bytes.truncate(30);
        // Patch the length so the header itself stays plausible.
        let len = bytes.len() as u32;
        bytes[0..4].copy_from_slice(&len.to_be_bytes());

        let mut cursor = Cursor::new(bytes.as_slice());
        let header = PduHeader::decode(&mut cursor).unwrap();
        assert!(matches!(
            SubmitSm::decode_body(&header, &mut cursor),
            Err(CodecError::TruncatedField { .. })
        ));
    }
}
