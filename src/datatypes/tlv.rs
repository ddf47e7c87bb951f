// Optional parameters (TLVs): tag/length/value triplets trailing a PDU
// body. Unknown tags round-trip untouched so a decoded PDU re-encodes to
// the identical octets.

use crate::codec::CodecError;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::io::Cursor;

/// Standard TLV tags per SMPP v3.4 Section 5.3.2.
pub mod tags {
    pub const DEST_ADDR_SUBUNIT: u16 = 0x0005;
    pub const SOURCE_ADDR_SUBUNIT: u16 = 0x000D;
    pub const ADDITIONAL_STATUS_INFO_TEXT: u16 = 0x001D;
    pub const RECEIPTED_MESSAGE_ID: u16 = 0x001E;
    pub const PAYLOAD_TYPE: u16 = 0x0019;
    pub const PRIVACY_INDICATOR: u16 = 0x0201;
    pub const SOURCE_SUBADDRESS: u16 = 0x0202;
    pub const DEST_SUBADDRESS: u16 = 0x0203;
    pub const USER_MESSAGE_REFERENCE: u16 = 0x0204;
    pub const USER_RESPONSE_CODE: u16 = 0x0205;
    pub const SOURCE_PORT: u16 = 0x020A;
    pub const DESTINATION_PORT: u16 = 0x020B;
    pub const SAR_MSG_REF_NUM: u16 = 0x020C;
    pub const LANGUAGE_INDICATOR: u16 = 0x020D;
    pub const SAR_TOTAL_SEGMENTS: u16 = 0x020E;
    pub const SAR_SEGMENT_SEQNUM: u16 = 0x020F;
    pub const SC_INTERFACE_VERSION: u16 = 0x0210;
    pub const CALLBACK_NUM_PRES_IND: u16 = 0x0302;
    pub const CALLBACK_NUM_ATAG: u16 = 0x0303;
    pub const NUMBER_OF_MESSAGES: u16 = 0x0304;
    pub const CALLBACK_NUM: u16 = 0x0381;
    pub const DPF_RESULT: u16 = 0x0420;
    pub const SET_DPF: u16 = 0x0421;
    pub const MS_AVAILABILITY_STATUS: u16 = 0x0422;
    pub const NETWORK_ERROR_CODE: u16 = 0x0423;
    pub const MESSAGE_PAYLOAD: u16 = 0x0424;
    pub const DELIVERY_FAILURE_REASON: u16 = 0x0425;
    pub const MORE_MESSAGES_TO_SEND: u16 = 0x0426;
    pub const MESSAGE_STATE: u16 = 0x0427;
    pub const USSD_SERVICE_OP: u16 = 0x0501;
    pub const DISPLAY_TIME: u16 = 0x1201;
    pub const SMS_SIGNAL: u16 = 0x1203;
    pub const MS_VALIDITY: u16 = 0x1204;
    pub const ALERT_ON_MESSAGE_DELIVERY: u16 = 0x130C;
    pub const ITS_REPLY_TYPE: u16 = 0x1380;
    pub const ITS_SESSION_INFO: u16 = 0x1383;
}

/// One optional parameter. The wire length field is derived from the value
/// on encode, so a TLV can never claim more octets than it carries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tlv {
    pub tag: u16,
    pub value: Bytes,
}

impl Tlv {
    pub fn new(tag: u16, value: impl Into<Bytes>) -> Self {
        Self {
            tag,
            value: value.into(),
        }
    }

    /// A single-octet TLV, the most common shape.
    pub fn from_u8(tag: u16, value: u8) -> Self {
        Self::new(tag, vec![value])
    }

    pub fn from_u16(tag: u16, value: u16) -> Self {
        Self::new(tag, value.to_be_bytes().to_vec())
    }

    /// C-string payload (NUL terminated on the wire).
    pub fn from_cstring(tag: u16, value: &str) -> Self {
        let mut bytes = Vec::with_capacity(value.len() + 1);
        bytes.extend_from_slice(value.as_bytes());
        bytes.push(0);
        Self::new(tag, bytes)
    }

    pub fn as_u8(&self) -> Option<u8> {
        (self.value.len() == 1).then(|| self.value[0])
    }

    /// The value as a string, trailing NUL stripped.
    pub fn as_cstring(&self) -> Option<&str> {
        let end = self
            .value
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(self.value.len());
        std::str::from_utf8(&self.value[..end]).ok()
    }

    pub fn encode(&self, buf: &mut BytesMut) {
        buf.put_u16(self.tag);
        buf.put_u16(self.value.len() as u16);
        buf.put_slice(&self.value);
    }

    pub fn decode(buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        if buf.remaining() < 4 {
            return Err(CodecError::TruncatedTlv);
        }
        let tag = buf.get_u16();
        let length = buf.get_u16() as usize;
        if buf.remaining() < length {
            return Err(CodecError::TruncatedTlv);
        }
        let value = buf.copy_to_bytes(length);
        Ok(Self { tag, value })
    }
}

/// Parse the optional-parameter run at the end of a PDU body, preserving
/// wire order.
pub(crate) fn decode_tlvs(buf: &mut Cursor<&[u8]>) -> Result<Vec<Tlv>, CodecError> {
    let mut tlvs = Vec::new();
    while buf.has_remaining() {
        tlvs.push(Tlv::decode(buf)?);
    }
    Ok(tlvs)
}

pub(crate) fn encode_tlvs(buf: &mut BytesMut, tlvs: &[Tlv]) {
    for tlv in tlvs {
        tlv.encode(buf);
    }
}

/// First TLV with the given tag, if present.
pub fn find_tlv(tlvs: &[Tlv], tag: u16) -> Option<&Tlv> {
    tlvs.iter().find(|t| t.tag == tag)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_layout() {
        let tlv = Tlv::new(0x0424, vec![0x01, 0x02, 0x03, 0x04]);
        let mut buf = BytesMut::new();
        tlv.encode(&mut buf);
        assert_eq!(
            buf.as_ref(),
            &[0x04, 0x24, 0x00, 0x04, 0x01, 0x02, 0x03, 0x04]
        );
    }

    #[test]
    fn empty_value() {
        let tlv = Tlv::new(0x0204, Vec::new());
        let mut buf = BytesMut::new();
        tlv.encode(&mut buf);
        assert_eq!(buf.as_ref(), &[0x02, 0x04, 0x00, 0x00]);
    }

    #[test]
    fn decode_run_preserves_order_and_unknown_tags() {
        let data: &[u8] = &[
            0xFF, 0x01, 0x00, 0x02, 0xAB, 0xCD, // vendor tag first
            0x04, 0x27, 0x00, 0x01, 0x02, // message_state
        ];
        let mut cursor = Cursor::new(data);
        let tlvs = decode_tlvs(&mut cursor).unwrap();
        assert_eq!(tlvs.len(), 2);
        assert_eq!(tlvs[0].tag, 0xFF01);
        assert_eq!(tlvs[0].value.as_ref(), &[0xAB, 0xCD]);
        assert_eq!(tlvs[1].tag, tags::MESSAGE_STATE);

        // Re-encode gives the original octets back.
        let mut buf = BytesMut::new();
        encode_tlvs(&mut buf, &tlvs);
        assert_eq!(buf.as_ref(), data);
    }

    #[test]
    fn truncated_value_is_an_error() {
        let data: &[u8] = &[0x04, 0x24, 0x00, 0x08, 0x01, 0x02];
        let mut cursor = Cursor::new(data);
        assert!(matches!(
            Tlv::decode(&mut cursor),
            Err(CodecError::TruncatedTlv)
        ));
    }

    #[test]
    fn truncated_header_is_an_error() {
        let data: &[u8] = &[0x04, 0x24, 0x00];
        let mut cursor = Cursor::new(data);
        assert!(matches!(
            Tlv::decode(&mut cursor),
            Err(CodecError::TruncatedTlv)
        ));
    }

    #[test]
    fn cstring_accessor() {
        let tlv = Tlv::from_cstring(tags::RECEIPTED_MESSAGE_ID, "MSG0001");
        assert_eq!(tlv.as_cstring(), Some("MSG0001"));
        assert_eq!(tlv.value.len(), 8);
    }
}
