//! The session layer: three session types over one supervised engine.
//!
//! A session owns its TCP (or injected TLS) connection, binds in its role,
//! keeps the link alive with enquire_link probes, reconnects with
//! exponential backoff, and correlates every request with its response.
//! Inbound messages are acknowledged automatically, reassembled when they
//! arrive as UDH-concatenated parts, and handed to the installed handler.
//!
//! ```rust,no_run
//! use esme::client::{BindCredentials, SessionConfig, SessionStatus, Transmitter};
//! use esme::text::MessageText;
//! use esme::client::ShortMessage;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = SessionConfig::new(
//!     "smsc.example.net:2775",
//!     BindCredentials::new("system_id", "password"),
//! );
//! let (session, mut statuses) = Transmitter::start(config);
//!
//! // Wait until the bind succeeds.
//! while let Some(status) = statuses.recv().await {
//!     if status == SessionStatus::Connected {
//!         break;
//!     }
//! }
//!
//! let message = ShortMessage::builder()
//!     .from("40001")
//!     .to("5511999999999")
//!     .text(MessageText::Gsm7("Hello from esme".into()))
//!     .build();
//! let resp = session.submit(&message).await?;
//! println!("accepted as {}", resp.message_id);
//!
//! session.close().await;
//! # Ok(())
//! # }
//! ```

pub mod config;
mod correlator;
pub mod error;
mod reassembly;
pub mod receipt;
mod segmenter;
mod session;
pub mod types;

pub use config::{BindCredentials, SessionConfig};
pub use error::{SessionError, SessionResult};
pub use receipt::{DeliveryReceipt, ReceiptState};
pub use session::{Receiver, Transceiver, Transmitter};
pub use types::{
    Destination, FailedDestination, MultiSubmitResp, PartialSubmit, PduHandler, QueryResp,
    RateLimit, SessionStatus, ShortMessage, ShortMessageBuilder, StatusStream, SubmitResp,
    TokenBucket,
};
