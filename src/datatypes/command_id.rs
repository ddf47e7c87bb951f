// SMPP v3.4 command identifiers per specification Table 4-1.
//
// Bit 31 of the command_id marks a response PDU; bits 30-0 identify the
// operation. Reserved ranges are intentionally absent: an id outside this
// table fails conversion and the reader treats the PDU as unknown.

use num_enum::TryFromPrimitive;

/// SMPP v3.4 Command Identifiers (Table 4-1).
#[derive(TryFromPrimitive)]
#[repr(u32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CommandId {
    /// generic_nack (Section 4.3.1), the error response for invalid PDUs
    GenericNack = 0x8000_0000,

    /// bind_receiver (Section 4.1.3)
    BindReceiver = 0x0000_0001,
    /// bind_receiver_resp (Section 4.1.4)
    BindReceiverResp = 0x8000_0001,
    /// bind_transmitter (Section 4.1.1)
    BindTransmitter = 0x0000_0002,
    /// bind_transmitter_resp (Section 4.1.2)
    BindTransmitterResp = 0x8000_0002,

    /// query_sm (Section 4.8.1)
    QuerySm = 0x0000_0003,
    /// query_sm_resp (Section 4.8.2)
    QuerySmResp = 0x8000_0003,

    /// submit_sm (Section 4.4.1)
    SubmitSm = 0x0000_0004,
    /// submit_sm_resp (Section 4.4.2)
    SubmitSmResp = 0x8000_0004,

    /// deliver_sm (Section 4.6.1)
    DeliverSm = 0x0000_0005,
    /// deliver_sm_resp (Section 4.6.2)
    DeliverSmResp = 0x8000_0005,

    /// unbind (Section 4.2.1)
    Unbind = 0x0000_0006,
    /// unbind_resp (Section 4.2.2)
    UnbindResp = 0x8000_0006,

    /// replace_sm (Section 4.10.1)
    ReplaceSm = 0x0000_0007,
    /// replace_sm_resp (Section 4.10.2)
    ReplaceSmResp = 0x8000_0007,
    /// cancel_sm (Section 4.9.1)
    CancelSm = 0x0000_0008,
    /// cancel_sm_resp (Section 4.9.2)
    CancelSmResp = 0x8000_0008,

    /// bind_transceiver (Section 4.1.5)
    BindTransceiver = 0x0000_0009,
    /// bind_transceiver_resp (Section 4.1.6)
    BindTransceiverResp = 0x8000_0009,

    /// outbind (Section 4.1.7)
    Outbind = 0x0000_000B,

    /// enquire_link (Section 4.11.1)
    EnquireLink = 0x0000_0015,
    /// enquire_link_resp (Section 4.11.2)
    EnquireLinkResp = 0x8000_0015,

    /// submit_multi (Section 4.5.1)
    SubmitMulti = 0x0000_0021,
    /// submit_multi_resp (Section 4.5.2)
    SubmitMultiResp = 0x8000_0021,

    /// alert_notification (Section 4.12.1), no response PDU exists
    AlertNotification = 0x0000_0102,
    /// data_sm (Section 4.7.1)
    DataSm = 0x0000_0103,
    /// data_sm_resp (Section 4.7.2)
    DataSmResp = 0x8000_0103,
}

/// The response bit: `request_id | RESPONSE_BIT` names the matching
/// response command.
pub const RESPONSE_BIT: u32 = 0x8000_0000;

impl CommandId {
    /// Whether this command_id names a response PDU.
    pub fn is_response(self) -> bool {
        (self as u32) & RESPONSE_BIT != 0
    }

    /// The response command id paired with this request, if one exists.
    pub fn response_id(self) -> Option<CommandId> {
        CommandId::try_from(self as u32 | RESPONSE_BIT).ok()
    }
}
