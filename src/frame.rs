//! One SMPP PDU as a typed value, plus the framing checks used by the
//! connection reader. Each variant carries the typed body for its command
//! id; dispatch is a plain match, so there is no runtime registry.

use crate::codec::{CodecError, Decodable, Encodable, PduHeader};
use crate::datatypes::{
    BindRequest, BindResponse, BindRole, CommandId, CommandStatus, DeliverSm, DeliverSmResp,
    EnquireLink, EnquireLinkResp, GenericNack, QuerySm, QuerySmResp, SubmitMulti,
    SubmitMultiResp, SubmitSm, SubmitSmResp, Unbind, UnbindResp,
};
use bytes::{Buf, Bytes};
use core::fmt;
use std::io::Cursor;

#[derive(Clone, Debug, PartialEq)]
pub enum Frame {
    BindRequest(BindRequest),
    BindResponse(BindResponse),
    EnquireLink(EnquireLink),
    EnquireLinkResp(EnquireLinkResp),
    Unbind(Unbind),
    UnbindResp(UnbindResp),
    GenericNack(GenericNack),
    SubmitSm(Box<SubmitSm>),
    SubmitSmResp(SubmitSmResp),
    SubmitMulti(Box<SubmitMulti>),
    SubmitMultiResp(SubmitMultiResp),
    DeliverSm(Box<DeliverSm>),
    DeliverSmResp(DeliverSmResp),
    QuerySm(QuerySm),
    QuerySmResp(QuerySmResp),
}

impl Frame {
    /// Check whether `src` holds one complete PDU.
    ///
    /// Returns `Ok(Some(len))` when `len` octets of a full PDU are
    /// buffered, `Ok(None)` when more data is needed, and `Err` when the
    /// claimed length is implausible (the stream cannot be resynced).
    pub fn check(src: &mut Cursor<&[u8]>) -> Result<Option<usize>, CodecError> {
        if src.remaining() < 4 {
            return Ok(None);
        }

        let pos = src.position();
        let command_length = src.get_u32() as usize;
        src.set_position(pos);

        if command_length < PduHeader::SIZE {
            return Err(CodecError::ShortPdu {
                needed: PduHeader::SIZE,
                available: command_length,
            });
        }
        if command_length > crate::codec::MAX_PDU_SIZE as usize {
            return Err(CodecError::OversizedPdu(command_length as u32));
        }

        Ok((src.remaining() >= command_length).then_some(command_length))
    }

    /// Parse one PDU. `check` must have confirmed a complete PDU is
    /// buffered. On success the cursor sits exactly `command_length`
    /// octets past where it started, whatever the body parser consumed.
    pub fn parse(src: &mut Cursor<&[u8]>) -> Result<Frame, CodecError> {
        let start = src.position() as usize;
        let header = PduHeader::decode(src)?;

        let body_len = header.command_length as usize - PduHeader::SIZE;
        let data: &[u8] = src.get_ref();
        let body_start = src.position() as usize;
        if data.len() - body_start < body_len {
            return Err(CodecError::ShortPdu {
                needed: body_len,
                available: data.len() - body_start,
            });
        }

        let mut body = Cursor::new(&data[body_start..body_start + body_len]);
        let frame = Self::parse_body(&header, &mut body)?;

        if body.has_remaining() {
            tracing::warn!(
                command_id = ?header.command_id,
                trailing = body.remaining(),
                "PDU body has trailing octets past the last parsed field"
            );
        }

        src.set_position((start + header.command_length as usize) as u64);
        Ok(frame)
    }

    fn parse_body(header: &PduHeader, body: &mut Cursor<&[u8]>) -> Result<Frame, CodecError> {
        let frame = match header.command_id {
            CommandId::BindTransmitter | CommandId::BindReceiver | CommandId::BindTransceiver => {
                let role = BindRole::from_request_id(header.command_id).expect("bind request id");
                Frame::BindRequest(BindRequest::decode_body(role, header, body)?)
            }
            CommandId::BindTransmitterResp
            | CommandId::BindReceiverResp
            | CommandId::BindTransceiverResp => {
                let role =
                    BindRole::from_response_id(header.command_id).expect("bind response id");
                Frame::BindResponse(BindResponse::decode_body(role, header, body)?)
            }
            CommandId::EnquireLink => {
                Frame::EnquireLink(EnquireLink::decode_body(header, body)?)
            }
            CommandId::EnquireLinkResp => {
                Frame::EnquireLinkResp(EnquireLinkResp::decode_body(header, body)?)
            }
            CommandId::Unbind => Frame::Unbind(Unbind::decode_body(header, body)?),
            CommandId::UnbindResp => Frame::UnbindResp(UnbindResp::decode_body(header, body)?),
            CommandId::GenericNack => {
                Frame::GenericNack(GenericNack::decode_body(header, body)?)
            }
            CommandId::SubmitSm => {
                Frame::SubmitSm(Box::new(SubmitSm::decode_body(header, body)?))
            }
            CommandId::SubmitSmResp => {
                Frame::SubmitSmResp(SubmitSmResp::decode_body(header, body)?)
            }
            CommandId::SubmitMulti => {
                Frame::SubmitMulti(Box::new(SubmitMulti::decode_body(header, body)?))
            }
            CommandId::SubmitMultiResp => {
                Frame::SubmitMultiResp(SubmitMultiResp::decode_body(header, body)?)
            }
            CommandId::DeliverSm => {
                Frame::DeliverSm(Box::new(DeliverSm::decode_body(header, body)?))
            }
            CommandId::DeliverSmResp => {
                Frame::DeliverSmResp(DeliverSmResp::decode_body(header, body)?)
            }
            CommandId::QuerySm => Frame::QuerySm(QuerySm::decode_body(header, body)?),
            CommandId::QuerySmResp => Frame::QuerySmResp(QuerySmResp::decode_body(header, body)?),

            // Valid v3.4 ids this engine does not operate on.
            id => return Err(CodecError::Unsupported(id)),
        };
        Ok(frame)
    }

    pub fn command_id(&self) -> CommandId {
        match self {
            Frame::BindRequest(pdu) => pdu.role.request_id(),
            Frame::BindResponse(pdu) => pdu.role.response_id(),
            Frame::EnquireLink(_) => CommandId::EnquireLink,
            Frame::EnquireLinkResp(_) => CommandId::EnquireLinkResp,
            Frame::Unbind(_) => CommandId::Unbind,
            Frame::UnbindResp(_) => CommandId::UnbindResp,
            Frame::GenericNack(_) => CommandId::GenericNack,
            Frame::SubmitSm(_) => CommandId::SubmitSm,
            Frame::SubmitSmResp(_) => CommandId::SubmitSmResp,
            Frame::SubmitMulti(_) => CommandId::SubmitMulti,
            Frame::SubmitMultiResp(_) => CommandId::SubmitMultiResp,
            Frame::DeliverSm(_) => CommandId::DeliverSm,
            Frame::DeliverSmResp(_) => CommandId::DeliverSmResp,
            Frame::QuerySm(_) => CommandId::QuerySm,
            Frame::QuerySmResp(_) => CommandId::QuerySmResp,
        }
    }

    pub fn sequence_number(&self) -> u32 {
        match self {
            Frame::BindRequest(pdu) => pdu.sequence_number,
            Frame::BindResponse(pdu) => pdu.sequence_number,
            Frame::EnquireLink(pdu) => pdu.sequence_number,
            Frame::EnquireLinkResp(pdu) => pdu.sequence_number,
            Frame::Unbind(pdu) => pdu.sequence_number,
            Frame::UnbindResp(pdu) => pdu.sequence_number,
            Frame::GenericNack(pdu) => pdu.sequence_number,
            Frame::SubmitSm(pdu) => pdu.sequence_number,
            Frame::SubmitSmResp(pdu) => pdu.sequence_number,
            Frame::SubmitMulti(pdu) => pdu.sequence_number,
            Frame::SubmitMultiResp(pdu) => pdu.sequence_number,
            Frame::DeliverSm(pdu) => pdu.sequence_number,
            Frame::DeliverSmResp(pdu) => pdu.sequence_number,
            Frame::QuerySm(pdu) => pdu.sequence_number,
            Frame::QuerySmResp(pdu) => pdu.sequence_number,
        }
    }

    /// The command_status of a response frame; requests are always `Ok`.
    pub fn command_status(&self) -> CommandStatus {
        match self {
            Frame::BindResponse(pdu) => pdu.command_status,
            Frame::EnquireLinkResp(pdu) => pdu.command_status,
            Frame::UnbindResp(pdu) => pdu.command_status,
            Frame::GenericNack(pdu) => pdu.command_status,
            Frame::SubmitSmResp(pdu) => pdu.command_status,
            Frame::SubmitMultiResp(pdu) => pdu.command_status,
            Frame::DeliverSmResp(pdu) => pdu.command_status,
            Frame::QuerySmResp(pdu) => pdu.command_status,
            _ => CommandStatus::Ok,
        }
    }

    pub fn is_response(&self) -> bool {
        self.command_id().is_response()
    }

    /// Serialize this frame to wire bytes.
    pub fn to_bytes(&self) -> Bytes {
        match self {
            Frame::BindRequest(pdu) => pdu.to_bytes(),
            Frame::BindResponse(pdu) => pdu.to_bytes(),
            Frame::EnquireLink(pdu) => pdu.to_bytes(),
            Frame::EnquireLinkResp(pdu) => pdu.to_bytes(),
            Frame::Unbind(pdu) => pdu.to_bytes(),
            Frame::UnbindResp(pdu) => pdu.to_bytes(),
            Frame::GenericNack(pdu) => pdu.to_bytes(),
            Frame::SubmitSm(pdu) => pdu.to_bytes(),
            Frame::SubmitSmResp(pdu) => pdu.to_bytes(),
            Frame::SubmitMulti(pdu) => pdu.to_bytes(),
            Frame::SubmitMultiResp(pdu) => pdu.to_bytes(),
            Frame::DeliverSm(pdu) => pdu.to_bytes(),
            Frame::DeliverSmResp(pdu) => pdu.to_bytes(),
            Frame::QuerySm(pdu) => pdu.to_bytes(),
            Frame::QuerySmResp(pdu) => pdu.to_bytes(),
        }
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?} seq={} status={:?}",
            self.command_id(),
            self.sequence_number(),
            self.command_status()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datatypes::{INTERFACE_VERSION, NumericPlanIndicator, TypeOfNumber};

    fn roundtrip(frame: Frame) {
        let bytes = frame.to_bytes();
        let mut cursor = Cursor::new(bytes.as_ref());
        assert_eq!(
            Frame::check(&mut cursor).unwrap(),
            Some(bytes.len()),
            "check must see a complete PDU"
        );
        let parsed = Frame::parse(&mut cursor).unwrap();
        assert_eq!(parsed, frame);
        assert_eq!(cursor.position() as usize, bytes.len());
        // Re-encoding reproduces the wire octets.
        assert_eq!(parsed.to_bytes(), bytes);
    }

    #[test]
    fn roundtrip_every_supported_pdu() {
        roundtrip(Frame::BindRequest(BindRequest {
            role: BindRole::Transceiver,
            sequence_number: 1,
            system_id: "esme01".into(),
            password: "secret".into(),
            system_type: "VMS".into(),
            interface_version: INTERFACE_VERSION,
            addr_ton: TypeOfNumber::International,
            addr_npi: NumericPlanIndicator::Isdn,
            address_range: String::new(),
        }));
        roundtrip(Frame::BindResponse(BindResponse {
            role: BindRole::Transceiver,
            command_status: CommandStatus::Ok,
            sequence_number: 1,
            system_id: "SMSC".into(),
            tlvs: vec![],
        }));
        roundtrip(Frame::EnquireLink(EnquireLink::new(2)));
        roundtrip(Frame::EnquireLinkResp(EnquireLinkResp::ok(2)));
        roundtrip(Frame::Unbind(Unbind::new(3)));
        roundtrip(Frame::UnbindResp(UnbindResp::ok(3)));
        roundtrip(Frame::GenericNack(GenericNack::error(
            4,
            CommandStatus::InvalidCmdId,
        )));
        roundtrip(Frame::SubmitSm(Box::new(SubmitSm {
            sequence_number: 5,
            source_addr: "1234".into(),
            destination_addr: "5678".into(),
            short_message: Bytes::from_static(b"hi"),
            ..Default::default()
        })));
        roundtrip(Frame::SubmitSmResp(SubmitSmResp {
            command_status: CommandStatus::Ok,
            sequence_number: 5,
            message_id: "MSG0001".into(),
        }));
        roundtrip(Frame::DeliverSm(Box::new(DeliverSm {
            sequence_number: 6,
            source_addr: "5678".into(),
            destination_addr: "1234".into(),
            short_message: Bytes::from_static(b"pong"),
            ..Default::default()
        })));
        roundtrip(Frame::DeliverSmResp(DeliverSmResp::ok(6)));
        roundtrip(Frame::QuerySm(QuerySm {
            sequence_number: 7,
            message_id: "MSG0001".into(),
            source_addr_ton: 1,
            source_addr_npi: 1,
            source_addr: "1234".into(),
        }));
        roundtrip(Frame::QuerySmResp(QuerySmResp {
            command_status: CommandStatus::Ok,
            sequence_number: 7,
            message_id: "MSG0001".into(),
            final_date: String::new(),
            message_state: crate::datatypes::MessageState::Enroute,
            error_code: 0,
        }));
        roundtrip(Frame::SubmitMulti(Box::new(SubmitMulti {
            sequence_number: 8,
            source_addr: "1234".into(),
            dest_addresses: vec![crate::datatypes::DestAddress::Sme {
                ton: 1,
                npi: 1,
                addr: "5678".into(),
            }],
            short_message: Bytes::from_static(b"fanout"),
            ..Default::default()
        })));
        roundtrip(Frame::SubmitMultiResp(SubmitMultiResp {
            command_status: CommandStatus::Ok,
            sequence_number: 8,
            message_id: "MSG0002".into(),
            unsuccess: vec![],
        }));
    }

    #[test]
    fn check_incomplete_buffer() {
        let bytes = EnquireLink::new(1).to_bytes();
        let mut cursor = Cursor::new(&bytes.as_ref()[..10]);
        assert_eq!(Frame::check(&mut cursor).unwrap(), None);
    }

    #[test]
    fn check_rejects_implausible_length() {
        let data: &[u8] = &[
            0x00, 0x00, 0x00, 0x04, // shorter than a header
            0x00, 0x00, 0x00, 0x15, //
        ];
        let mut cursor = Cursor::new(data);
        assert!(matches!(
            Frame::check(&mut cursor),
            Err(CodecError::ShortPdu { .. })
        ));

        let data: &[u8] = &[0xFF, 0xFF, 0xFF, 0xFF, 0x00, 0x00, 0x00, 0x15];
        let mut cursor = Cursor::new(data);
        assert!(matches!(
            Frame::check(&mut cursor),
            Err(CodecError::OversizedPdu(_))
        ));
    }

    #[test]
    fn parse_unsupported_command_is_recoverable() {
        // replace_sm: a valid v3.4 id outside the supported set.
        let data: Vec<u8> = vec![
            0x00, 0x00, 0x00, 0x10, //
            0x00, 0x00, 0x00, 0x07, //
            0x00, 0x00, 0x00, 0x00, //
            0x00, 0x00, 0x00, 0x01,
        ];
        let mut cursor = Cursor::new(data.as_slice());
        let err = Frame::parse(&mut cursor).unwrap_err();
        assert!(matches!(err, CodecError::Unsupported(CommandId::ReplaceSm)));
        assert!(err.is_recoverable());
    }

    #[test]
    fn parse_unknown_command_is_recoverable() {
        let data: Vec<u8> = vec![
            0x00, 0x00, 0x00, 0x10, //
            0x00, 0x00, 0x00, 0x99, // reserved id
            0x00, 0x00, 0x00, 0x00, //
            0x00, 0x00, 0x00, 0x01,
        ];
        let mut cursor = Cursor::new(data.as_slice());
        let err = Frame::parse(&mut cursor).unwrap_err();
        assert!(matches!(err, CodecError::UnknownCommandId(0x99)));
        assert!(err.is_recoverable());
    }

    #[test]
    fn parse_two_pdus_back_to_back() {
        let mut data = EnquireLink::new(1).to_bytes().to_vec();
        data.extend_from_slice(&Unbind::new(2).to_bytes());

        let mut cursor = Cursor::new(data.as_slice());
        let first = Frame::parse(&mut cursor).unwrap();
        let second = Frame::parse(&mut cursor).unwrap();
        assert!(matches!(first, Frame::EnquireLink(_)));
        assert!(matches!(second, Frame::Unbind(_)));
    }
}
