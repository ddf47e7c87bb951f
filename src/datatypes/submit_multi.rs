// submit_multi / submit_multi_resp (SMPP v3.4 Section 4.5): one message to
// up to 254 destinations, each either an SME address or a distribution
// list. The response lists the destinations that were NOT accepted, each
// with its own error status.

use crate::codec::{
    CodecError, Decodable, Encodable, PduHeader, get_cstring, get_short_message, get_u8,
    put_cstring, put_short_message,
};
use crate::datatypes::tlv::{Tlv, decode_tlvs, encode_tlvs};
use crate::datatypes::{CommandId, CommandStatus};
use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::io::Cursor;

/// One entry of the destination list (dest_flag discriminated).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DestAddress {
    /// dest_flag = 1: a directly addressed SME.
    Sme {
        ton: u8,
        npi: u8,
        addr: String,
    },
    /// dest_flag = 2: a distribution list known to the SMSC.
    DistributionList(String),
}

impl DestAddress {
    const FLAG_SME: u8 = 0x01;
    const FLAG_DIST_LIST: u8 = 0x02;

    fn encode(&self, buf: &mut BytesMut) {
        match self {
            DestAddress::Sme { ton, npi, addr } => {
                buf.put_u8(Self::FLAG_SME);
                buf.put_u8(*ton);
                buf.put_u8(*npi);
                put_cstring(buf, addr, 21);
            }
            DestAddress::DistributionList(name) => {
                buf.put_u8(Self::FLAG_DIST_LIST);
                put_cstring(buf, name, 21);
            }
        }
    }

    fn decode(buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        match get_u8(buf, "dest_flag")? {
            Self::FLAG_SME => Ok(DestAddress::Sme {
                ton: get_u8(buf, "dest_addr_ton")?,
                npi: get_u8(buf, "dest_addr_npi")?,
                addr: get_cstring(buf, 21, "destination_addr")?,
            }),
            Self::FLAG_DIST_LIST => Ok(DestAddress::DistributionList(get_cstring(
                buf,
                21,
                "dl_name",
            )?)),
            _ => Err(CodecError::TruncatedField { field: "dest_flag" }),
        }
    }
}

/// A destination the SMSC rejected, from submit_multi_resp.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnsuccessSme {
    pub ton: u8,
    pub npi: u8,
    pub addr: String,
    pub error_status: CommandStatus,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SubmitMulti {
    pub sequence_number: u32,

    pub service_type: String,
    pub source_addr_ton: u8,
    pub source_addr_npi: u8,
    pub source_addr: String,
    pub dest_addresses: Vec<DestAddress>,
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

impl Encodable for SubmitMulti {
    fn command_id(&self) -> CommandId {
        CommandId::SubmitMulti
    }

    fn sequence_number(&self) -> u32 {
        self.sequence_number
    }

    fn encode_body(&self, buf: &mut BytesMut) {
        debug_assert!(self.dest_addresses.len() <= 254);
        put_cstring(buf, &self.service_type, 6);
        buf.put_u8(self.source_addr_ton);
        buf.put_u8(self.source_addr_npi);
        put_cstring(buf, &self.source_addr, 21);
        buf.put_u8(self.dest_addresses.len() as u8);
        for dest in &self.dest_addresses {
            dest.encode(buf);
        }
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

impl Decodable for SubmitMulti {
    fn command_id() -> CommandId {
        CommandId::SubmitMulti
    }

    fn decode_body(header: &PduHeader, buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        let service_type = get_cstring(buf, 6, "service_type")?;
        let source_addr_ton = get_u8(buf, "source_addr_ton")?;
        let source_addr_npi = get_u8(buf, "source_addr_npi")?;
        let source_addr = get_cstring(buf, 21, "source_addr")?;

        let number_of_dests = get_u8(buf, "number_of_dests")?;
        let mut dest_addresses = Vec::with_capacity(number_of_dests as usize);
        for _ in 0..number_of_dests {
            dest_addresses.push(DestAddress::decode(buf)?);
        }

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

        Ok(SubmitMulti {
            sequence_number: header.sequence_number,
            service_type,
            source_addr_ton,
            source_addr_npi,
            source_addr,
            dest_addresses,
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

#[derive(Clone, Debug, PartialEq)]
pub struct SubmitMultiResp {
    pub command_status: CommandStatus,
    pub sequence_number: u32,
    pub message_id: String,
    pub unsuccess: Vec<UnsuccessSme>,
}

impl Encodable for SubmitMultiResp {
    fn command_id(&self) -> CommandId {
        CommandId::SubmitMultiResp
    }

    fn command_status(&self) -> CommandStatus {
        self.command_status
    }

    fn sequence_number(&self) -> u32 {
        self.sequence_number
    }

    fn encode_body(&self, buf: &mut BytesMut) {
        put_cstring(buf, &self.message_id, 65);
        buf.put_u8(self.unsuccess.len() as u8);
        for sme in &self.unsuccess {
            buf.put_u8(sme.ton);
            buf.put_u8(sme.npi);
            put_cstring(buf, &sme.addr, 21);
            buf.put_u32(sme.error_status as u32);
        }
    }
}

impl Decodable for SubmitMultiResp {
    fn command_id() -> CommandId {
        CommandId::SubmitMultiResp
    }

    fn decode_body(header: &PduHeader, buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        if !buf.has_remaining() {
            return Ok(SubmitMultiResp {
                command_status: header.command_status,
                sequence_number: header.sequence_number,
                message_id: String::new(),
                unsuccess: Vec::new(),
            });
        }

        let message_id = get_cstring(buf, 65, "message_id")?;
        let no_unsuccess = get_u8(buf, "no_unsuccess")?;
        let mut unsuccess = Vec::with_capacity(no_unsuccess as usize);
        for _ in 0..no_unsuccess {
            let ton = get_u8(buf, "dest_addr_ton")?;
            let npi = get_u8(buf, "dest_addr_npi")?;
            let addr = get_cstring(buf, 21, "destination_addr")?;
            if buf.remaining() < 4 {
                return Err(CodecError::TruncatedField {
                    field: "error_status_code",
                });
            }
            let raw = buf.get_u32();
            let error_status =
                CommandStatus::try_from(raw).unwrap_or(CommandStatus::UnknownError);
            unsuccess.push(UnsuccessSme {
                ton,
                npi,
                addr,
                error_status,
            });
        }

        Ok(SubmitMultiResp {
            command_status: header.command_status,
            sequence_number: header.sequence_number,
            message_id,
            unsuccess,
        })
    }
}
