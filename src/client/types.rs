// Public value types for the session API: the outbound ShortMessage model
// with its builder, response types, the status stream, the inbound PDU
// handler, and the injectable rate limiter with its token-bucket default.

use crate::client::error::SessionError;
use crate::datatypes::{
    Address, CommandStatus, DestAddress, MessageState, SubmitSm, Tlv, esm, tags,
};
use crate::frame::Frame;
use crate::text::MessageText;
use bytes::Bytes;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::Instant;

/// Where a message is headed: one SME, or a submit_multi fanout.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Destination {
    Single(Address),
    Multiple(Vec<DestAddress>),
}

impl Default for Destination {
    fn default() -> Self {
        Destination::Single(Address::default())
    }
}

/// One outbound message, independent of how many PDUs it takes on the
/// wire. Consumed by `submit`, `submit_long`, and `submit_multi`.
#[derive(Clone, Debug, Default)]
pub struct ShortMessage {
    pub source: Address,
    pub dest: Destination,
    pub service_type: String,
    pub esm_class: u8,
    pub protocol_id: u8,
    pub priority: u8,
    /// SMPP time string (`YYMMDDhhmmsstnnp` absolute or
    /// `YYMMDDhhmmss000R` relative), empty for immediate delivery.
    pub schedule_delivery_time: String,
    /// Same format as `schedule_delivery_time`; empty for SMSC default.
    pub validity_period: String,
    pub registered_delivery: u8,
    pub replace_if_present: u8,
    pub text: MessageText,
    /// Raw user data header to prepend to the payload; sets the UDH bit.
    pub udh: Option<Vec<u8>>,
    /// Extra TLVs appended after any the engine generates.
    pub tlvs: Vec<Tlv>,
}

impl ShortMessage {
    pub fn builder() -> ShortMessageBuilder {
        ShortMessageBuilder::default()
    }

    pub(crate) fn single_dest(&self) -> Option<&Address> {
        match &self.dest {
            Destination::Single(addr) => Some(addr),
            Destination::Multiple(_) => None,
        }
    }

    /// Build the submit_sm PDU for this message. Payloads over 254 octets
    /// ride in the message_payload TLV with an empty short_message field.
    pub(crate) fn to_submit_sm(&self, sequence_number: u32) -> SubmitSm {
        let dest = self.single_dest().cloned().unwrap_or_default();

        let mut esm_class = self.esm_class;
        let mut payload = Vec::new();
        if let Some(udh) = &self.udh {
            esm_class |= esm::UDH_INDICATOR;
            payload.extend_from_slice(udh);
        }
        payload.extend_from_slice(&self.text.encode());

        let mut tlvs = Vec::new();
        let short_message = if payload.len() > 254 {
            tlvs.push(Tlv::new(tags::MESSAGE_PAYLOAD, payload));
            Bytes::new()
        } else {
            Bytes::from(payload)
        };
        tlvs.extend(self.tlvs.iter().cloned());

        SubmitSm {
            sequence_number,
            service_type: self.service_type.clone(),
            source_addr_ton: self.source.ton as u8,
            source_addr_npi: self.source.npi as u8,
            source_addr: self.source.addr.clone(),
            dest_addr_ton: dest.ton as u8,
            dest_addr_npi: dest.npi as u8,
            destination_addr: dest.addr,
            esm_class,
            protocol_id: self.protocol_id,
            priority_flag: self.priority,
            schedule_delivery_time: self.schedule_delivery_time.clone(),
            validity_period: self.validity_period.clone(),
            registered_delivery: self.registered_delivery,
            replace_if_present_flag: self.replace_if_present,
            data_coding: self.text.data_coding(),
            sm_default_msg_id: 0,
            short_message,
            tlvs,
        }
    }
}

/// Fluent construction for [`ShortMessage`].
#[derive(Debug, Default)]
pub struct ShortMessageBuilder {
    message: ShortMessage,
}

impl ShortMessageBuilder {
    pub fn from(mut self, source: impl Into<Address>) -> Self {
        self.message.source = source.into();
        self
    }

    pub fn to(mut self, dest: impl Into<Address>) -> Self {
        self.message.dest = Destination::Single(dest.into());
        self
    }

    pub fn to_many(mut self, dests: Vec<DestAddress>) -> Self {
        self.message.dest = Destination::Multiple(dests);
        self
    }

    pub fn text(mut self, text: MessageText) -> Self {
        self.message.text = text;
        self
    }

    pub fn service_type(mut self, service_type: impl Into<String>) -> Self {
        self.message.service_type = service_type.into();
        self
    }

    pub fn priority(mut self, priority: u8) -> Self {
        self.message.priority = priority;
        self
    }

    /// Request a delivery receipt on final state.
    pub fn with_delivery_receipt(mut self) -> Self {
        self.message.registered_delivery = 1;
        self
    }

    pub fn schedule_delivery_time(mut self, at: impl Into<String>) -> Self {
        self.message.schedule_delivery_time = at.into();
        self
    }

    pub fn validity_period(mut self, period: impl Into<String>) -> Self {
        self.message.validity_period = period.into();
        self
    }

    pub fn udh(mut self, udh: Vec<u8>) -> Self {
        self.message.udh = Some(udh);
        self
    }

    pub fn tlv(mut self, tlv: Tlv) -> Self {
        self.message.tlvs.push(tlv);
        self
    }

    pub fn build(self) -> ShortMessage {
        self.message
    }
}

/// Successful submit_sm outcome.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubmitResp {
    /// SMSC-assigned id, usable with query and delivery receipts.
    pub message_id: String,
}

/// Successful query_sm outcome.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueryResp {
    pub message_id: String,
    /// When the message reached a final state; empty while in flight.
    pub final_date: String,
    pub message_state: MessageState,
    pub error_code: u8,
}

/// submit_multi outcome: accepted overall, with zero or more destinations
/// individually rejected.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MultiSubmitResp {
    pub message_id: String,
    pub failed: Vec<FailedDestination>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FailedDestination {
    pub addr: String,
    pub ton: u8,
    pub npi: u8,
    pub status: CommandStatus,
}

/// submit_long stopped partway: `sent` parts were accepted before `error`
/// occurred. The remaining parts were not submitted.
#[derive(Debug, thiserror::Error)]
#[error("long message partially sent ({} parts): {error}", sent.len())]
pub struct PartialSubmit {
    pub sent: Vec<SubmitResp>,
    #[source]
    pub error: SessionError,
}

/// Session lifecycle events, in emission order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionStatus {
    /// Dialing the SMSC.
    Connecting,
    /// Bind accepted; traffic is flowing.
    Connected,
    /// Connection lost; the supervisor will reconnect.
    Disconnected,
    /// The dial itself failed.
    ConnectionFailed(String),
    /// The SMSC refused the bind.
    BindFailed(CommandStatus),
    /// Terminal: close() completed.
    Closed,
}

/// Receiver side of the session status broadcast. The stream is lossy:
/// when a consumer falls behind, the oldest events are dropped. It ends
/// after yielding [`SessionStatus::Closed`].
#[derive(Debug)]
pub struct StatusStream {
    rx: broadcast::Receiver<SessionStatus>,
    terminated: bool,
}

impl StatusStream {
    pub(crate) fn new(rx: broadcast::Receiver<SessionStatus>) -> Self {
        Self {
            rx,
            terminated: false,
        }
    }

    /// Next status event; `None` once the session is closed.
    pub async fn recv(&mut self) -> Option<SessionStatus> {
        if self.terminated {
            return None;
        }
        loop {
            match self.rx.recv().await {
                Ok(status) => {
                    if status == SessionStatus::Closed {
                        self.terminated = true;
                    }
                    return Some(status);
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "status stream lagged, dropping oldest events");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

/// Callback invoked on the reader task for every inbound message PDU.
/// It must not block; hand the frame off to your own executor for real
/// work.
pub type PduHandler = Arc<dyn Fn(Frame) + Send + Sync>;

/// Submission throttle consulted before every request-bearing PDU.
pub trait RateLimit: Send + Sync {
    /// Resolve when one submission token is available.
    fn acquire(&self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>>;
}

/// Token bucket: sustained `rate` permits per second with `burst`
/// headroom.
#[derive(Debug)]
pub struct TokenBucket {
    rate: f64,
    burst: f64,
    state: Mutex<BucketState>,
}

#[derive(Debug)]
struct BucketState {
    tokens: f64,
    refilled_at: Instant,
}

impl TokenBucket {
    pub fn new(rate: f64, burst: u32) -> Self {
        assert!(rate > 0.0, "rate must be positive");
        Self {
            rate,
            burst: burst.max(1) as f64,
            state: Mutex::new(BucketState {
                tokens: burst.max(1) as f64,
                refilled_at: Instant::now(),
            }),
        }
    }

    /// Take one token, returning how long to wait first.
    fn reserve(&self) -> Duration {
        let mut state = self.state.lock().expect("token bucket poisoned");
        let now = Instant::now();
        let elapsed = now.duration_since(state.refilled_at).as_secs_f64();
        state.tokens = (state.tokens + elapsed * self.rate).min(self.burst);
        state.refilled_at = now;

        state.tokens -= 1.0;
        if state.tokens >= 0.0 {
            Duration::ZERO
        } else {
            Duration::from_secs_f64(-state.tokens / self.rate)
        }
    }
}

impl RateLimit for TokenBucket {
    fn acquire(&self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(async move {
            let wait = self.reserve();
            if !wait.is_zero() {
                tokio::time::sleep(wait).await;
            }
        })
    }
}
