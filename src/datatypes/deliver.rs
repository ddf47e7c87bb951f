// deliver_sm / deliver_sm_resp (SMPP v3.4 Section 4.6): SMSC-originated
// traffic, both mobile-originated messages and delivery receipts. The body
// layout mirrors submit_sm.

use crate::codec::{
    CodecError, Decodable, Encodable, PduHeader, get_cstring, get_short_message, get_u8,
    put_cstring, put_short_message,
};
use crate::datatypes::tlv::{Tlv, decode_tlvs, encode_tlvs, find_tlv, tags};
use crate::datatypes::{CommandId, CommandStatus, MessageState, esm};
use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::io::Cursor;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct DeliverSm {
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

impl DeliverSm {
    /// Whether the short message starts with a user data header.
    pub fn has_udh(&self) -> bool {
        self.esm_class & esm::UDH_INDICATOR != 0
    }

    /// Whether this PDU carries a delivery receipt for an earlier submit.
    pub fn is_delivery_receipt(&self) -> bool {
        self.esm_class & esm::DELIVERY_RECEIPT != 0
    }

    /// The receipted_message_id TLV, when the SMSC provides it alongside
    /// the receipt text.
    pub fn receipted_message_id(&self) -> Option<&str> {
        find_tlv(&self.tlvs, tags::RECEIPTED_MESSAGE_ID).and_then(Tlv::as_cstring)
    }

    /// The message_state TLV, when present.
    pub fn message_state(&self) -> Option<MessageState> {
        find_tlv(&self.tlvs, tags::MESSAGE_STATE)
            .and_then(Tlv::as_u8)
            .and_then(|v| MessageState::try_from(v).ok())
    }

    pub fn message_payload(&self) -> Option<&Bytes> {
        find_tlv(&self.tlvs, tags::MESSAGE_PAYLOAD).map(|t| &t.value)
    }
}

impl Encodable for DeliverSm {
    fn command_id(&self) -> CommandId {
        CommandId::DeliverSm
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

impl Decodable for DeliverSm {
    fn command_id() -> CommandId {
        CommandId::DeliverSm
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

        Ok(DeliverSm {
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

/// deliver_sm_resp (Section 4.6.2). The message_id field is unused and
/// encodes as a single NUL.
#[derive(Clone, Debug, PartialEq)]
pub struct DeliverSmResp {
    pub command_status: CommandStatus,
    pub sequence_number: u32,
}

impl DeliverSmResp {
    pub fn ok(sequence_number: u32) -> Self {
        Self {
            command_status: CommandStatus::Ok,
            sequence_number,
        }
    }
}

impl Encodable for DeliverSmResp {
    fn command_id(&self) -> CommandId {
        CommandId::DeliverSmResp
    }

    fn command_status(&self) -> CommandStatus {
        self.command_status
    }

    fn sequence_number(&self) -> u32 {
        self.sequence_number
    }

    fn encode_body(&self, buf: &mut BytesMut) {
        buf.put_u8(0); // message_id, always NULL
    }
}

impl Decodable for DeliverSmResp {
    fn command_id() -> CommandId {
        CommandId::DeliverSmResp
    }

    fn decode_body(header: &PduHeader, buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        if buf.has_remaining() {
            get_cstring(buf, 65, "message_id")?;
        }
        Ok(DeliverSmResp {
            command_status: header.command_status,
            sequence_number: header.sequence_number,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inbound(esm_class: u8, short_message: &'static [u8]) -> DeliverSm {
        DeliverSm {
            sequence_number: 9,
            source_addr: "5511999999999".into(),
            destination_addr: "1234".into(),
            esm_class,
            short_message: Bytes::from_static(short_message),
            ..Default::default()
        }
    }

    #[test]
    fn roundtrip() {
        let original = inbound(0x00, b"inbound text");
        let bytes = original.to_bytes();

        let mut cursor = Cursor::new(bytes.as_ref());
        let header = PduHeader::decode(&mut cursor).unwrap();
        assert_eq!(header.command_id, CommandId::DeliverSm);
        let decoded = DeliverSm::decode_body(&header, &mut cursor).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn udh_and_receipt_bits() {
        assert!(inbound(0x40, b"").has_udh());
        assert!(!inbound(0x40, b"").is_delivery_receipt());
        assert!(inbound(0x04, b"").is_delivery_receipt());
        assert!(inbound(0x44, b"").has_udh());
    }

    #[test]
    fn receipt_tlv_accessors() {
        let mut pdu = inbound(0x04, b"id:MSG0001 stat:DELIVRD err:000");
        pdu.tlvs = vec![
            Tlv::from_cstring(tags::RECEIPTED_MESSAGE_ID, "MSG0001"),
            Tlv::from_u8(tags::MESSAGE_STATE, 2),
        ];

        assert_eq!(pdu.receipted_message_id(), Some("MSG0001"));
        assert_eq!(pdu.message_state(), Some(MessageState::Delivered));
    }

    #[test]
    fn resp_wire_layout() {
        let bytes = DeliverSmResp::ok(9).to_bytes();
        assert_eq!(
            bytes.as_ref(),
            &[
                0x00, 0x00, 0x00, 0x11, //
                0x80, 0x00, 0x00, 0x05, //
                0x00, 0x00, 0x00, 0x00, //
                0x00, 0x00, 0x00, 0x09, //
                0x00, // message_id
            ]
        );
    }
}
