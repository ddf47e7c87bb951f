mod address;
mod bind;
mod command_id;
mod command_status;
mod deliver;
mod link;
mod query;
mod submit;
mod submit_multi;
pub mod tlv;

pub use address::{Address, NumericPlanIndicator, TypeOfNumber};
pub use bind::{BindRequest, BindResponse, BindRole, INTERFACE_VERSION};
pub use command_id::{CommandId, RESPONSE_BIT};
pub use command_status::CommandStatus;
pub use deliver::{DeliverSm, DeliverSmResp};
pub use link::{EnquireLink, EnquireLinkResp, GenericNack, Unbind, UnbindResp};
pub use query::{MessageState, QuerySm, QuerySmResp};
pub use submit::{SubmitSm, SubmitSmResp};
pub use submit_multi::{DestAddress, SubmitMulti, SubmitMultiResp, UnsuccessSme};
pub use tlv::{Tlv, find_tlv, tags};

// SMPP v3.4 field length limits, excluding the NUL terminator.
pub const MAX_SYSTEM_ID_LEN: usize = 15;
pub const MAX_PASSWORD_LEN: usize = 8;
pub const MAX_SYSTEM_TYPE_LEN: usize = 12;
pub const MAX_SHORT_MESSAGE_LEN: usize = 254;

/// esm_class bit masks (Section 5.2.12).
pub mod esm {
    /// Bit 6: a user data header leads the short message.
    pub const UDH_INDICATOR: u8 = 0x40;
    /// Bit 2 (deliver_sm): the PDU carries a delivery receipt.
    pub const DELIVERY_RECEIPT: u8 = 0x04;
    /// Bit 7: reply-path requested.
    pub const REPLY_PATH: u8 = 0x80;
}
