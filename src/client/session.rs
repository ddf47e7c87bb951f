// The session engine: dial, bind, run the bound read loop with keepalive
// and reassembly, reconnect with exponential backoff, and serve
// submit/query callers through the correlator.
//
// Task layout per session: one supervisor task owning the state machine
// and the read half (plus both timers, via select), and one writer task
// draining the outbound byte queue. Submit callers suspend on correlator
// waiters and never touch the socket directly.

use crate::client::config::SessionConfig;
use crate::client::correlator::{Correlator, Outcome, PendingResponse};
use crate::client::error::{SessionError, SessionResult};
use crate::client::reassembly::Reassembler;
use crate::client::segmenter::{Segmented, segment};
use crate::client::types::{
    Destination, MultiSubmitResp, FailedDestination, PartialSubmit, PduHandler, QueryResp,
    SessionStatus, ShortMessage, StatusStream, SubmitResp,
};
use crate::codec::Encodable;
use crate::connection::{FrameReader, FrameWriter};
use crate::datatypes::{
    BindRequest, BindResponse, BindRole, CommandId, CommandStatus, DeliverSmResp, EnquireLink,
    EnquireLinkResp, GenericNack, INTERFACE_VERSION, QuerySm, SubmitMulti, SubmitSm,
    UnbindResp, Unbind, esm, tags,
};
use crate::frame::Frame;
use bytes::Bytes;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{ReadHalf, split};
use tokio::sync::{Notify, broadcast, mpsc, watch};
use tokio::time::{Instant, MissedTickBehavior, interval_at, sleep, timeout};
use crate::transport::BoxTransport;

const BACKOFF_INITIAL: Duration = Duration::from_secs(1);
const BACKOFF_CAP: Duration = Duration::from_secs(120);
/// Outbound queue depth; writes are small, the socket drains fast.
const WRITE_QUEUE_DEPTH: usize = 64;

/// Reconnect delay: starts at one second, grows by a factor of e per
/// failed connect-bind cycle, capped at two minutes.
struct Backoff {
    delay: Duration,
}

impl Backoff {
    fn new() -> Self {
        Self {
            delay: BACKOFF_INITIAL,
        }
    }

    fn next(&mut self) -> Duration {
        let delay = self.delay;
        self.delay = self
            .delay
            .mul_f64(std::f64::consts::E)
            .min(BACKOFF_CAP);
        delay
    }

    fn reset(&mut self) {
        self.delay = BACKOFF_INITIAL;
    }
}

/// Why the bound loop ended.
enum LoopExit {
    /// close() ran to completion (or its unbind grace expired).
    Closed,
    /// I/O failure, keepalive death, or peer-initiated unbind.
    Disconnected,
}

pub(crate) struct SessionCore {
    config: SessionConfig,
    role: BindRole,
    correlator: Arc<Correlator>,
    writer: Mutex<Option<mpsc::Sender<Bytes>>>,
    bound: watch::Sender<bool>,
    done: watch::Sender<bool>,
    events: broadcast::Sender<SessionStatus>,
    handler: Mutex<Option<PduHandler>>,
    close_requested: AtomicBool,
    close_notify: Notify,
    /// Concatenation reference counter, per session by construction.
    message_ref: AtomicU8,
}

impl SessionCore {
    /// Spawn the supervisor and hand back the shared core plus the status
    /// stream. Non-blocking; the first status event is `Connecting`.
    pub fn start(config: SessionConfig, role: BindRole) -> (Arc<Self>, StatusStream) {
        let (events, events_rx) = broadcast::channel(config.status_buffer.max(1));
        let window_size = config.window_size;
        let core = Arc::new(SessionCore {
            config,
            role,
            correlator: Arc::new(Correlator::new(window_size)),
            writer: Mutex::new(None),
            bound: watch::Sender::new(false),
            done: watch::Sender::new(false),
            events,
            handler: Mutex::new(None),
            close_requested: AtomicBool::new(false),
            close_notify: Notify::new(),
            message_ref: AtomicU8::new(0),
        });

        tokio::spawn(supervise(Arc::clone(&core)));
        (core, StatusStream::new(events_rx))
    }

    pub fn is_bound(&self) -> bool {
        *self.bound.borrow()
    }

    pub fn set_handler(&self, handler: PduHandler) {
        *self.handler.lock().expect("handler slot poisoned") = Some(handler);
    }

    /// Another subscription to the status broadcast.
    pub fn statuses(&self) -> StatusStream {
        StatusStream::new(self.events.subscribe())
    }

    /// Idempotent shutdown: unbind with a grace period, resolve every
    /// in-flight request with `Closed`, and stop reconnecting.
    pub async fn close(&self) {
        if !self.close_requested.swap(true, Ordering::SeqCst) {
            self.close_notify.notify_one();
        }
        let mut done = self.done.subscribe();
        while !*done.borrow_and_update() {
            if done.changed().await.is_err() {
                break;
            }
        }
    }

    fn closing(&self) -> bool {
        self.close_requested.load(Ordering::SeqCst)
    }

    fn emit(&self, status: SessionStatus) {
        tracing::debug!(?status, "session status");
        let _ = self.events.send(status);
    }

    fn set_bound(&self, bound: bool) {
        let _ = self.bound.send_replace(bound);
    }

    fn take_writer(&self) -> Option<mpsc::Sender<Bytes>> {
        self.writer.lock().expect("writer slot poisoned").take()
    }

    fn set_writer(&self, sender: mpsc::Sender<Bytes>) {
        *self.writer.lock().expect("writer slot poisoned") = Some(sender);
    }

    fn current_writer(&self) -> Option<mpsc::Sender<Bytes>> {
        self.writer.lock().expect("writer slot poisoned").clone()
    }

    async fn send_pdu(&self, pdu: &impl Encodable) -> Result<(), ()> {
        let Some(writer) = self.current_writer() else {
            return Err(());
        };
        writer.send(pdu.to_bytes()).await.map_err(|_| ())
    }

    fn next_message_ref(&self) -> u8 {
        self.message_ref.fetch_add(1, Ordering::Relaxed).wrapping_add(1)
    }

    // ------------------------------------------------------------------
    // Request pipeline
    // ------------------------------------------------------------------

    /// Run one request/response exchange: rate-limit token, window slot,
    /// sequence, write, wait.
    async fn request(
        &self,
        request_id: CommandId,
        build: impl FnOnce(u32) -> Bytes,
    ) -> SessionResult<Frame> {
        if !self.is_bound() {
            return Err(SessionError::NotConnected);
        }

        if let Some(rate_limit) = &self.config.rate_limit {
            rate_limit.acquire().await;
        }
        let _window_slot = self.correlator.acquire_window().await;
        if !self.is_bound() {
            return Err(SessionError::NotConnected);
        }

        let sequence = self.correlator.next_sequence();
        let pending: PendingResponse = self.correlator.register(sequence, request_id);
        let bytes = build(sequence);

        let Some(writer) = self.current_writer() else {
            return Err(SessionError::NotConnected);
        };
        writer
            .send(bytes)
            .await
            .map_err(|_| SessionError::NotConnected)?;

        match timeout(self.config.response_timeout, pending.wait()).await {
            Err(_) => Err(SessionError::Timeout),
            Ok(Outcome::Response(frame)) => {
                let status = frame.command_status();
                if status.is_ok() {
                    Ok(frame)
                } else {
                    Err(SessionError::Protocol(status))
                }
            }
            Ok(Outcome::Nack(status)) => Err(SessionError::Protocol(status)),
            Ok(Outcome::Mismatch { expected, actual }) => {
                Err(SessionError::ResponseMismatch { expected, actual })
            }
            Ok(Outcome::Disconnected) => Err(SessionError::Disconnected),
            Ok(Outcome::Closed) => Err(SessionError::Closed),
        }
    }

    pub async fn submit(&self, message: &ShortMessage) -> SessionResult<SubmitResp> {
        if message.single_dest().is_none() {
            return Err(SessionError::InvalidMessage(
                "submit takes a single destination; use submit_multi for lists",
            ));
        }

        let frame = self
            .request(CommandId::SubmitSm, |sequence| {
                message.to_submit_sm(sequence).to_bytes()
            })
            .await?;

        match frame {
            Frame::SubmitSmResp(resp) => Ok(SubmitResp {
                message_id: resp.message_id,
            }),
            other => Err(SessionError::ResponseMismatch {
                expected: CommandId::SubmitSmResp,
                actual: other.command_id(),
            }),
        }
    }

    /// Submit a message that may need several concatenated parts. Parts go
    /// out sequentially; the first failure stops the run and reports the
    /// responses already collected so the caller can retry the remainder.
    pub async fn submit_long(
        &self,
        message: &ShortMessage,
    ) -> Result<Vec<SubmitResp>, PartialSubmit> {
        let partial = |error| PartialSubmit {
            sent: Vec::new(),
            error,
        };

        if message.single_dest().is_none() {
            return Err(partial(SessionError::InvalidMessage(
                "submit_long takes a single destination",
            )));
        }

        match segment(&message.text, self.next_message_ref()).map_err(partial)? {
            Segmented::Single => {
                let resp = self.submit(message).await.map_err(partial)?;
                Ok(vec![resp])
            }
            Segmented::Parts { reference, parts } => {
                if message.udh.is_some() {
                    return Err(partial(SessionError::InvalidMessage(
                        "a caller-supplied UDH cannot be combined with automatic segmentation",
                    )));
                }
                tracing::debug!(
                    parts = parts.len(),
                    reference,
                    "segmenting long message"
                );
                let mut sent = Vec::with_capacity(parts.len());
                for part in parts {
                    let result = self
                        .request(CommandId::SubmitSm, |sequence| {
                            part_submit_sm(message, &part, sequence).to_bytes()
                        })
                        .await
                        .and_then(|frame| match frame {
                            Frame::SubmitSmResp(resp) => Ok(SubmitResp {
                                message_id: resp.message_id,
                            }),
                            other => Err(SessionError::ResponseMismatch {
                                expected: CommandId::SubmitSmResp,
                                actual: other.command_id(),
                            }),
                        });

                    match result {
                        Ok(resp) => sent.push(resp),
                        Err(error) => return Err(PartialSubmit { sent, error }),
                    }
                }
                Ok(sent)
            }
        }
    }

    pub async fn submit_multi(&self, message: &ShortMessage) -> SessionResult<MultiSubmitResp> {
        let dest_addresses = match &message.dest {
            Destination::Multiple(dests) if !dests.is_empty() => dests.clone(),
            Destination::Multiple(_) => {
                return Err(SessionError::InvalidMessage(
                    "submit_multi needs at least one destination",
                ));
            }
            Destination::Single(addr) => vec![crate::datatypes::DestAddress::Sme {
                ton: addr.ton as u8,
                npi: addr.npi as u8,
                addr: addr.addr.clone(),
            }],
        };

        let frame = self
            .request(CommandId::SubmitMulti, |sequence| {
                multi_submit_pdu(message, dest_addresses.clone(), sequence).to_bytes()
            })
            .await?;

        match frame {
            Frame::SubmitMultiResp(resp) => Ok(MultiSubmitResp {
                message_id: resp.message_id,
                failed: resp
                    .unsuccess
                    .into_iter()
                    .map(|sme| FailedDestination {
                        addr: sme.addr,
                        ton: sme.ton,
                        npi: sme.npi,
                        status: sme.error_status,
                    })
                    .collect(),
            }),
            other => Err(SessionError::ResponseMismatch {
                expected: CommandId::SubmitMultiResp,
                actual: other.command_id(),
            }),
        }
    }

    pub async fn query(
        &self,
        message_id: &str,
        source: &crate::datatypes::Address,
    ) -> SessionResult<QueryResp> {
        let frame = self
            .request(CommandId::QuerySm, |sequence| {
                QuerySm {
                    sequence_number: sequence,
                    message_id: message_id.to_owned(),
                    source_addr_ton: source.ton as u8,
                    source_addr_npi: source.npi as u8,
                    source_addr: source.addr.clone(),
                }
                .to_bytes()
            })
            .await?;

        match frame {
            Frame::QuerySmResp(resp) => Ok(QueryResp {
                message_id: resp.message_id,
                final_date: resp.final_date,
                message_state: resp.message_state,
                error_code: resp.error_code,
            }),
            other => Err(SessionError::ResponseMismatch {
                expected: CommandId::QuerySmResp,
                actual: other.command_id(),
            }),
        }
    }

    // ------------------------------------------------------------------
    // Inbound dispatch
    // ------------------------------------------------------------------

    /// Handle one inbound frame. Returns the loop exit when the frame ends
    /// the bound phase.
    async fn dispatch(
        &self,
        frame: Frame,
        reassembler: &mut Reassembler,
        last_enquire_resp: &mut Instant,
        closing: bool,
    ) -> Option<LoopExit> {
        match frame {
            Frame::EnquireLink(probe) => {
                if self
                    .send_pdu(&EnquireLinkResp::ok(probe.sequence_number))
                    .await
                    .is_err()
                {
                    return Some(LoopExit::Disconnected);
                }
            }
            Frame::EnquireLinkResp(_) => {
                *last_enquire_resp = Instant::now();
            }
            Frame::UnbindResp(_) if closing => {
                tracing::info!("unbind acknowledged");
                return Some(LoopExit::Closed);
            }
            Frame::Unbind(unbind) => {
                tracing::info!("peer requested unbind");
                let _ = self.send_pdu(&UnbindResp::ok(unbind.sequence_number)).await;
                return Some(if closing {
                    LoopExit::Closed
                } else {
                    LoopExit::Disconnected
                });
            }
            Frame::DeliverSm(pdu) => {
                // Ack first: protocol liveness must not depend on the
                // handler or the reassembler.
                if self
                    .send_pdu(&DeliverSmResp::ok(pdu.sequence_number))
                    .await
                    .is_err()
                {
                    return Some(LoopExit::Disconnected);
                }
                let delivered = if self.config.merge_long_messages {
                    reassembler.accept(*pdu)
                } else {
                    Some(*pdu)
                };
                if let Some(pdu) = delivered {
                    self.invoke_handler(Frame::DeliverSm(Box::new(pdu)));
                }
            }
            frame if frame.is_response() => {
                if !self.correlator.resolve(frame) {
                    tracing::debug!("response for unknown sequence discarded");
                }
            }
            frame => {
                tracing::warn!(%frame, "unexpected request from SMSC");
                let _ = self
                    .send_pdu(&GenericNack::error(
                        frame.sequence_number(),
                        CommandStatus::InvalidBindStatus,
                    ))
                    .await;
            }
        }
        None
    }

    fn invoke_handler(&self, frame: Frame) {
        let handler = self.handler.lock().expect("handler slot poisoned").clone();
        match handler {
            Some(handler) => {
                if catch_unwind(AssertUnwindSafe(|| handler(frame))).is_err() {
                    tracing::error!("inbound PDU handler panicked");
                }
            }
            None => tracing::warn!("inbound PDU dropped: no handler installed"),
        }
    }

    // ------------------------------------------------------------------
    // Bound phase
    // ------------------------------------------------------------------

    async fn bound_loop(&self, reader: &mut FrameReader<ReadHalf<BoxTransport>>) -> LoopExit {
        let mut enquire = interval_at(
            Instant::now() + self.config.enquire_link_period,
            self.config.enquire_link_period,
        );
        enquire.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut sweep = interval_at(
            Instant::now() + self.config.merge_check_interval,
            self.config.merge_check_interval,
        );
        sweep.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut reassembler = Reassembler::new(self.config.merge_stale_after);
        let mut last_rx = Instant::now();
        let mut last_enquire_resp = Instant::now();
        let mut unbind_deadline: Option<Instant> = None;

        loop {
            let closing = unbind_deadline.is_some();
            // select! evaluates every branch expression even when its
            // precondition is false, so the disabled arm needs a real
            // (never-polled) deadline value.
            let grace_deadline = unbind_deadline
                .unwrap_or_else(|| Instant::now() + Duration::from_secs(86_400));
            tokio::select! {
                result = reader.read_frame() => match result {
                    Ok(Some(frame)) => {
                        last_rx = Instant::now();
                        if let Some(exit) = self
                            .dispatch(frame, &mut reassembler, &mut last_enquire_resp, closing)
                            .await
                        {
                            return exit;
                        }
                    }
                    Ok(None) => {
                        tracing::info!("SMSC closed the connection");
                        return if closing { LoopExit::Closed } else { LoopExit::Disconnected };
                    }
                    Err(err) => {
                        tracing::warn!(%err, "read failure");
                        return if closing { LoopExit::Closed } else { LoopExit::Disconnected };
                    }
                },

                _ = enquire.tick() => {
                    if last_rx.elapsed() > self.config.enquire_link_timeout {
                        tracing::warn!(
                            silent_for = ?last_rx.elapsed(),
                            "keepalive timeout, dropping connection"
                        );
                        return LoopExit::Disconnected;
                    }
                    let sequence = self.correlator.next_sequence();
                    if self.send_pdu(&EnquireLink::new(sequence)).await.is_err() {
                        return LoopExit::Disconnected;
                    }
                }

                _ = sweep.tick() => reassembler.sweep(),

                _ = self.close_notify.notified(), if !closing => {
                    let sequence = self.correlator.next_sequence();
                    tracing::info!("closing: sending unbind");
                    if self.send_pdu(&Unbind::new(sequence)).await.is_err() {
                        return LoopExit::Closed;
                    }
                    unbind_deadline = Some(Instant::now() + self.config.unbind_timeout);
                }

                _ = tokio::time::sleep_until(grace_deadline), if closing => {
                    tracing::warn!("no unbind_resp within grace period");
                    return LoopExit::Closed;
                }
            }
        }
    }
}

/// Build the submit_sm for one pre-built concatenation part.
fn part_submit_sm(message: &ShortMessage, part: &[u8], sequence_number: u32) -> SubmitSm {
    let mut pdu = message.to_submit_sm(sequence_number);
    pdu.esm_class |= esm::UDH_INDICATOR;
    pdu.short_message = Bytes::copy_from_slice(part);
    pdu.tlvs.retain(|tlv| tlv.tag != tags::MESSAGE_PAYLOAD);
    pdu
}

/// Build the submit_multi PDU, applying the same oversized-payload rule as
/// submit_sm.
fn multi_submit_pdu(
    message: &ShortMessage,
    dest_addresses: Vec<crate::datatypes::DestAddress>,
    sequence_number: u32,
) -> SubmitMulti {
    let single = message.to_submit_sm(sequence_number);
    SubmitMulti {
        sequence_number,
        service_type: single.service_type,
        source_addr_ton: single.source_addr_ton,
        source_addr_npi: single.source_addr_npi,
        source_addr: single.source_addr,
        dest_addresses,
        esm_class: single.esm_class,
        protocol_id: single.protocol_id,
        priority_flag: single.priority_flag,
        schedule_delivery_time: single.schedule_delivery_time,
        validity_period: single.validity_period,
        registered_delivery: single.registered_delivery,
        replace_if_present_flag: single.replace_if_present_flag,
        data_coding: single.data_coding,
        sm_default_msg_id: single.sm_default_msg_id,
        short_message: single.short_message,
        tlvs: single.tlvs,
    }
}

// ----------------------------------------------------------------------
// Supervisor
// ----------------------------------------------------------------------

async fn supervise(core: Arc<SessionCore>) {
    let mut backoff = Backoff::new();

    while !core.closing() {
        core.emit(SessionStatus::Connecting);
        match run_connection(&core, &mut backoff).await {
            LoopExit::Closed => break,
            LoopExit::Disconnected => {
                let delay = backoff.next();
                tracing::debug!(?delay, "reconnecting after backoff");
                tokio::select! {
                    _ = sleep(delay) => {}
                    _ = core.close_notify.notified() => break,
                }
            }
        }
    }

    core.set_bound(false);
    core.take_writer();
    core.correlator.fail_all(Outcome::Closed);
    core.emit(SessionStatus::Closed);
    let _ = core.done.send(true);
}

/// One connect → bind → bound cycle. Every exit path other than a
/// successful close maps to `Disconnected` so the supervisor backs off
/// and retries.
async fn run_connection(core: &Arc<SessionCore>, backoff: &mut Backoff) -> LoopExit {
    let stream = tokio::select! {
        result = core.config.dialer.dial(&core.config.addr) => result,
        _ = core.close_notify.notified() => return LoopExit::Closed,
    };
    let stream = match stream {
        Ok(stream) => stream,
        Err(err) => {
            tracing::warn!(%err, addr = %core.config.addr, "dial failed");
            core.emit(SessionStatus::ConnectionFailed(err.to_string()));
            return LoopExit::Disconnected;
        }
    };

    let (read_half, write_half) = split(stream);
    let mut reader = FrameReader::new(read_half);
    let mut writer = FrameWriter::new(write_half);

    core.correlator.reset();
    let response = tokio::select! {
        result = bind_handshake(core, &mut reader, &mut writer) => result,
        _ = core.close_notify.notified() => return LoopExit::Closed,
    };
    let response = match response {
        Ok(response) => response,
        Err(err) => {
            tracing::warn!(%err, "bind handshake failed");
            core.emit(SessionStatus::ConnectionFailed(err.to_string()));
            return LoopExit::Disconnected;
        }
    };
    if !response.command_status.is_ok() {
        tracing::warn!(status = %response.command_status, "bind rejected");
        core.emit(SessionStatus::BindFailed(response.command_status));
        return LoopExit::Disconnected;
    }

    tracing::info!(
        system_id = %response.system_id,
        role = ?core.role,
        "bound to SMSC"
    );
    backoff.reset();

    // Writer task: the single serialization point for outbound PDUs.
    let (write_tx, mut write_rx) = mpsc::channel::<Bytes>(WRITE_QUEUE_DEPTH);
    let write_task = tokio::spawn(async move {
        while let Some(bytes) = write_rx.recv().await {
            if let Err(err) = writer.write_bytes(&bytes).await {
                tracing::warn!(%err, "write failure");
                break;
            }
        }
        let _ = writer.shutdown().await;
    });

    core.set_writer(write_tx);
    core.set_bound(true);
    core.emit(SessionStatus::Connected);

    let exit = core.bound_loop(&mut reader).await;

    core.set_bound(false);
    core.take_writer(); // closes the queue; the writer task drains and exits
    let _ = write_task.await;

    match exit {
        LoopExit::Closed => {
            core.correlator.fail_all(Outcome::Closed);
            LoopExit::Closed
        }
        LoopExit::Disconnected => {
            core.correlator.fail_all(Outcome::Disconnected);
            core.emit(SessionStatus::Disconnected);
            LoopExit::Disconnected
        }
    }
}

/// Send the bind request and wait for its response. The handshake runs
/// before the writer task exists, so it writes directly.
async fn bind_handshake(
    core: &Arc<SessionCore>,
    reader: &mut FrameReader<ReadHalf<BoxTransport>>,
    writer: &mut FrameWriter<tokio::io::WriteHalf<BoxTransport>>,
) -> std::io::Result<BindResponse> {
    let credentials = &core.config.credentials;
    let sequence = core.correlator.next_sequence();
    let request = BindRequest {
        role: core.role,
        sequence_number: sequence,
        system_id: credentials.system_id.clone(),
        password: credentials.password.clone(),
        system_type: credentials.system_type.clone(),
        interface_version: INTERFACE_VERSION,
        addr_ton: credentials.addr_ton,
        addr_npi: credentials.addr_npi,
        address_range: credentials.address_range.clone(),
    };
    writer.write_bytes(&request.to_bytes()).await?;

    let deadline = core.config.enquire_link_period;
    timeout(deadline, async {
        loop {
            match reader.read_frame().await? {
                None => {
                    return Err(std::io::Error::new(
                        std::io::ErrorKind::UnexpectedEof,
                        "SMSC closed during bind",
                    ));
                }
                Some(Frame::BindResponse(response))
                    if response.sequence_number == sequence =>
                {
                    if response.role != core.role {
                        tracing::warn!(
                            requested = ?core.role,
                            answered = ?response.role,
                            "bind response role mismatch"
                        );
                    }
                    return Ok(response);
                }
                Some(Frame::EnquireLink(probe)) => {
                    writer
                        .write_bytes(&EnquireLinkResp::ok(probe.sequence_number).to_bytes())
                        .await?;
                }
                Some(other) => {
                    tracing::warn!(%other, "unexpected PDU during bind handshake");
                }
            }
        }
    })
    .await
    .map_err(|_| std::io::Error::new(std::io::ErrorKind::TimedOut, "bind response timeout"))?
}

// ----------------------------------------------------------------------
// Public session types
// ----------------------------------------------------------------------

macro_rules! session_common {
    () => {
        /// Current bind state; `false` during reconnects.
        pub fn is_bound(&self) -> bool {
            self.core.is_bound()
        }

        /// A fresh subscription to the status stream.
        pub fn statuses(&self) -> StatusStream {
            self.core.statuses()
        }

        /// Idempotent: unbind, resolve in-flight requests with `Closed`,
        /// stop reconnecting. Resolves when the session has fully stopped.
        pub async fn close(&self) {
            self.core.close().await;
        }
    };
}

/// Send-only session (bind_transmitter).
pub struct Transmitter {
    core: Arc<SessionCore>,
}

impl Transmitter {
    pub fn start(config: SessionConfig) -> (Self, StatusStream) {
        let (core, statuses) = SessionCore::start(config, BindRole::Transmitter);
        (Self { core }, statuses)
    }

    pub async fn submit(&self, message: &ShortMessage) -> SessionResult<SubmitResp> {
        self.core.submit(message).await
    }

    pub async fn submit_long(
        &self,
        message: &ShortMessage,
    ) -> Result<Vec<SubmitResp>, PartialSubmit> {
        self.core.submit_long(message).await
    }

    pub async fn submit_multi(&self, message: &ShortMessage) -> SessionResult<MultiSubmitResp> {
        self.core.submit_multi(message).await
    }

    pub async fn query(
        &self,
        message_id: &str,
        source: &crate::datatypes::Address,
    ) -> SessionResult<QueryResp> {
        self.core.query(message_id, source).await
    }

    session_common!();
}

/// Receive-only session (bind_receiver).
pub struct Receiver {
    core: Arc<SessionCore>,
}

impl Receiver {
    pub fn start(config: SessionConfig) -> (Self, StatusStream) {
        let (core, statuses) = SessionCore::start(config, BindRole::Receiver);
        (Self { core }, statuses)
    }

    /// Install the inbound PDU callback. It runs on the reader task and
    /// must not block.
    pub fn set_handler(&self, handler: PduHandler) {
        self.core.set_handler(handler);
    }

    session_common!();
}

/// Bidirectional session (bind_transceiver).
pub struct Transceiver {
    core: Arc<SessionCore>,
}

impl Transceiver {
    pub fn start(config: SessionConfig) -> (Self, StatusStream) {
        let (core, statuses) = SessionCore::start(config, BindRole::Transceiver);
        (Self { core }, statuses)
    }

    pub fn set_handler(&self, handler: PduHandler) {
        self.core.set_handler(handler);
    }

    pub async fn submit(&self, message: &ShortMessage) -> SessionResult<SubmitResp> {
        self.core.submit(message).await
    }

    pub async fn submit_long(
        &self,
        message: &ShortMessage,
    ) -> Result<Vec<SubmitResp>, PartialSubmit> {
        self.core.submit_long(message).await
    }

    pub async fn submit_multi(&self, message: &ShortMessage) -> SessionResult<MultiSubmitResp> {
        self.core.submit_multi(message).await
    }

    pub async fn query(
        &self,
        message_id: &str,
        source: &crate::datatypes::Address,
    ) -> SessionResult<QueryResp> {
        self.core.query(message_id, source).await
    }

    session_common!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_grows_by_e_and_caps() {
        let mut backoff = Backoff::new();
        assert_eq!(backoff.next(), Duration::from_secs(1));

        let second = backoff.next();
        assert!(second > Duration::from_millis(2700) && second < Duration::from_millis(2730));

        let third = backoff.next();
        assert!(third > Duration::from_millis(7380) && third < Duration::from_millis(7400));

        for _ in 0..10 {
            backoff.next();
        }
        assert_eq!(backoff.next(), BACKOFF_CAP);
    }

    #[test]
    fn backoff_resets_to_initial() {
        let mut backoff = Backoff::new();
        backoff.next();
        backoff.next();
        backoff.reset();
        assert_eq!(backoff.next(), Duration::from_secs(1));
    }

    #[tokio::test]
    async fn message_refs_are_distinct_within_a_window() {
        let (core, _statuses) = SessionCore::start(
            crate::client::config::SessionConfig::new(
                "127.0.0.1:1",
                crate::client::config::BindCredentials::new("x", "y"),
            ),
            BindRole::Transmitter,
        );
        let first = core.next_message_ref();
        let second = core.next_message_ref();
        let third = core.next_message_ref();
        assert_ne!(first, second);
        assert_ne!(second, third);
    }
}
