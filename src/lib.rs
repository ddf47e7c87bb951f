//! Client-side SMPP 3.4 protocol engine.
//!
//! `esme` speaks the Short Message Peer-to-Peer protocol to a carrier
//! SMSC over a long-lived TCP (optionally TLS, via an injectable dialer)
//! connection: it binds in one of the three session roles, keeps the link
//! alive, splits and reassembles long messages, and correlates every
//! request with its response while hiding reconnection entirely.
//!
//! The crate is layered bottom-up:
//!
//! * [`codec`] / [`frame`] / [`datatypes`] — the wire format: PDU header,
//!   typed PDU bodies, TLVs, and the framing rules.
//! * [`text`] / [`udh`] — text alphabets (GSM 03.38, Latin-1, ISO-8859-5,
//!   UCS-2) and the concatenation user-data header.
//! * [`connection`] / [`transport`] — frame I/O over an injectable byte
//!   stream.
//! * [`client`] — the supervised session: [`client::Transmitter`],
//!   [`client::Receiver`], and [`client::Transceiver`].

pub mod client;
pub mod codec;
pub mod connection;
pub mod datatypes;
pub mod frame;
pub mod text;
pub mod transport;
pub mod udh;

pub use client::{
    BindCredentials, DeliveryReceipt, PartialSubmit, QueryResp, Receiver, SessionConfig,
    SessionError, SessionResult, SessionStatus, ShortMessage, StatusStream, SubmitResp,
    Transceiver, Transmitter,
};
pub use codec::{CodecError, Decodable, Encodable, MAX_PDU_SIZE, PduHeader};
pub use datatypes::{Address, BindRole, CommandId, CommandStatus, MessageState};
pub use frame::Frame;
pub use text::MessageText;
