// Link-management PDUs: enquire_link keepalive pair (Section 4.11),
// unbind pair (Section 4.2), and generic_nack (Section 4.3). All five are
// header-only.

use crate::codec::{CodecError, Decodable, Encodable, PduHeader};
use crate::datatypes::{CommandId, CommandStatus};
use bytes::BytesMut;
use std::io::Cursor;

macro_rules! header_only_request {
    ($name:ident, $id:expr, $doc:literal) => {
        #[doc = $doc]
        #[derive(Clone, Copy, Debug, PartialEq, Eq)]
        pub struct $name {
            pub sequence_number: u32,
        }

        impl $name {
            pub fn new(sequence_number: u32) -> Self {
                Self { sequence_number }
            }
        }

        impl Encodable for $name {
            fn command_id(&self) -> CommandId {
                $id
            }

            fn sequence_number(&self) -> u32 {
                self.sequence_number
            }

            fn encode_body(&self, _buf: &mut BytesMut) {}
        }

        impl Decodable for $name {
            fn command_id() -> CommandId {
                $id
            }

            fn decode_body(
                header: &PduHeader,
                _buf: &mut Cursor<&[u8]>,
            ) -> Result<Self, CodecError> {
                Ok(Self {
                    sequence_number: header.sequence_number,
                })
            }
        }
    };
}

macro_rules! header_only_response {
    ($name:ident, $id:expr, $doc:literal) => {
        #[doc = $doc]
        #[derive(Clone, Copy, Debug, PartialEq, Eq)]
        pub struct $name {
            pub command_status: CommandStatus,
            pub sequence_number: u32,
        }

        impl $name {
            pub fn ok(sequence_number: u32) -> Self {
                Self {
                    command_status: CommandStatus::Ok,
                    sequence_number,
                }
            }

            pub fn error(sequence_number: u32, status: CommandStatus) -> Self {
                Self {
                    command_status: status,
                    sequence_number,
                }
            }
        }

        impl Encodable for $name {
            fn command_id(&self) -> CommandId {
                $id
            }

            fn command_status(&self) -> CommandStatus {
                self.command_status
            }

            fn sequence_number(&self) -> u32 {
                self.sequence_number
            }

            fn encode_body(&self, _buf: &mut BytesMut) {}
        }

        impl Decodable for $name {
            fn command_id() -> CommandId {
                $id
            }

            fn decode_body(
                header: &PduHeader,
                _buf: &mut Cursor<&[u8]>,
            ) -> Result<Self, CodecError> {
                Ok(Self {
                    command_status: header.command_status,
                    sequence_number: header.sequence_number,
                })
            }
        }
    };
}

header_only_request!(
    EnquireLink,
    CommandId::EnquireLink,
    "enquire_link keepalive probe. Either peer may send one; the other must answer."
);
header_only_response!(
    EnquireLinkResp,
    CommandId::EnquireLinkResp,
    "enquire_link_resp, echoing the probe's sequence number."
);
header_only_request!(
    Unbind,
    CommandId::Unbind,
    "unbind: graceful session teardown request."
);
header_only_response!(
    UnbindResp,
    CommandId::UnbindResp,
    "unbind_resp, after which the TCP connection is closed."
);
header_only_response!(
    GenericNack,
    CommandId::GenericNack,
    "generic_nack: the peer could not parse a PDU, or rejected one with no\ntyped response. The sequence number is the offender's when known, else 0."
);
