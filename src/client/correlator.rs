// Request/response correlation: per-connection sequence numbers, the
// in-flight waiter table, and the optional send window. Every waiter
// resolves exactly once, with a response, a nack, a mismatch, or a
// connection-level verdict; dropping a pending call unregisters it.

use crate::datatypes::{CommandId, CommandStatus};
use crate::frame::Frame;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{OwnedSemaphorePermit, Semaphore, oneshot};

/// Highest valid sequence number (2^31 - 1); the counter wraps to 1.
const SEQUENCE_MAX: u32 = 0x7FFF_FFFF;

/// How a waiter was resolved.
#[derive(Clone, Debug)]
pub(crate) enum Outcome {
    /// The matching response PDU.
    Response(Frame),
    /// The SMSC generic_nacked our sequence.
    Nack(CommandStatus),
    /// A response arrived for our sequence with the wrong command id.
    Mismatch {
        expected: CommandId,
        actual: CommandId,
    },
    /// Connection dropped with the request in flight.
    Disconnected,
    /// Session closed with the request in flight.
    Closed,
}

struct Waiter {
    request_id: CommandId,
    tx: oneshot::Sender<Outcome>,
}

pub(crate) struct Correlator {
    sequence: AtomicU32,
    inflight: Mutex<HashMap<u32, Waiter>>,
    window: Option<Arc<Semaphore>>,
}

impl Correlator {
    pub fn new(window_size: usize) -> Self {
        Self {
            sequence: AtomicU32::new(0),
            inflight: Mutex::new(HashMap::new()),
            window: (window_size > 0).then(|| Arc::new(Semaphore::new(window_size))),
        }
    }

    /// Allocate the next sequence number, wrapping within 1..=2^31-1.
    pub fn next_sequence(&self) -> u32 {
        let prev = self
            .sequence
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| {
                Some(if n >= SEQUENCE_MAX { 1 } else { n + 1 })
            })
            .expect("sequence update closure never fails");
        if prev >= SEQUENCE_MAX { 1 } else { prev + 1 }
    }

    /// Start a fresh connection epoch: the counter restarts at 1. The
    /// caller must have failed outstanding waiters first.
    pub fn reset(&self) {
        self.sequence.store(0, Ordering::Relaxed);
    }

    /// Wait for a window slot, when a window is configured. The permit is
    /// held for the lifetime of the request.
    pub async fn acquire_window(&self) -> Option<OwnedSemaphorePermit> {
        match &self.window {
            Some(window) => window.clone().acquire_owned().await.ok(),
            None => None,
        }
    }

    /// Register a waiter for `sequence`. The returned handle resolves
    /// exactly once; dropping it unregisters the waiter.
    pub fn register(self: &Arc<Self>, sequence: u32, request_id: CommandId) -> PendingResponse {
        let (tx, rx) = oneshot::channel();
        let mut inflight = self.inflight.lock().expect("inflight table poisoned");
        if inflight.insert(sequence, Waiter { request_id, tx }).is_some() {
            // One waiter per sequence is an invariant; a collision means
            // the counter lapped 2^31 outstanding requests.
            tracing::error!(sequence, "replaced an existing in-flight waiter");
        }
        PendingResponse {
            sequence,
            rx,
            correlator: Arc::clone(self),
        }
    }

    /// Route an inbound response or nack to its waiter. Returns false when
    /// no waiter is registered for the sequence (late or unsolicited).
    pub fn resolve(&self, frame: Frame) -> bool {
        let sequence = frame.sequence_number();
        let waiter = {
            let mut inflight = self.inflight.lock().expect("inflight table poisoned");
            inflight.remove(&sequence)
        };

        let Some(waiter) = waiter else {
            return false;
        };

        let outcome = if let Frame::GenericNack(nack) = &frame {
            Outcome::Nack(nack.command_status)
        } else {
            match waiter.request_id.response_id() {
                Some(expected) if frame.command_id() == expected => Outcome::Response(frame),
                expected => Outcome::Mismatch {
                    expected: expected.unwrap_or(CommandId::GenericNack),
                    actual: frame.command_id(),
                },
            }
        };

        // A dropped receiver just means the caller gave up first.
        let _ = waiter.tx.send(outcome);
        true
    }

    /// Resolve every outstanding waiter with `outcome`.
    pub fn fail_all(&self, outcome: Outcome) {
        let drained: Vec<Waiter> = {
            let mut inflight = self.inflight.lock().expect("inflight table poisoned");
            inflight.drain().map(|(_, waiter)| waiter).collect()
        };
        for waiter in drained {
            let _ = waiter.tx.send(outcome.clone());
        }
    }

    fn remove(&self, sequence: u32) {
        let mut inflight = self.inflight.lock().expect("inflight table poisoned");
        inflight.remove(&sequence);
    }

    #[cfg(test)]
    pub fn pending(&self) -> usize {
        self.inflight.lock().unwrap().len()
    }
}

/// A registered waiter. Await `wait` for the outcome; dropping the handle
/// (e.g. when a response deadline fires) removes the table entry, and any
/// response arriving afterwards is discarded by the reader.
pub(crate) struct PendingResponse {
    sequence: u32,
    rx: oneshot::Receiver<Outcome>,
    correlator: Arc<Correlator>,
}

impl PendingResponse {
    pub async fn wait(mut self) -> Outcome {
        match (&mut self.rx).await {
            Ok(outcome) => outcome,
            // Sender dropped without resolving: the table was torn down.
            Err(_) => Outcome::Disconnected,
        }
    }
}

impl Drop for PendingResponse {
    fn drop(&mut self) {
        self.correlator.remove(self.sequence);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datatypes::{EnquireLinkResp, GenericNack, SubmitSmResp};

    fn submit_resp(sequence: u32) -> Frame {
        Frame::SubmitSmResp(SubmitSmResp {
            command_status: CommandStatus::Ok,
            sequence_number: sequence,
            message_id: "MSG0001".into(),
        })
    }

    #[test]
    fn sequences_start_at_one_and_increment() {
        let correlator = Correlator::new(0);
        assert_eq!(correlator.next_sequence(), 1);
        assert_eq!(correlator.next_sequence(), 2);
        assert_eq!(correlator.next_sequence(), 3);
    }

    #[test]
    fn sequence_wraps_to_one() {
        let correlator = Correlator::new(0);
        correlator.sequence.store(SEQUENCE_MAX - 1, Ordering::Relaxed);
        assert_eq!(correlator.next_sequence(), SEQUENCE_MAX);
        assert_eq!(correlator.next_sequence(), 1);
    }

    #[test]
    fn reset_restarts_the_counter() {
        let correlator = Correlator::new(0);
        correlator.next_sequence();
        correlator.next_sequence();
        correlator.reset();
        assert_eq!(correlator.next_sequence(), 1);
    }

    #[tokio::test]
    async fn response_routes_to_waiter() {
        let correlator = Arc::new(Correlator::new(0));
        let pending = correlator.register(1, CommandId::SubmitSm);

        assert!(correlator.resolve(submit_resp(1)));
        match pending.wait().await {
            Outcome::Response(frame) => assert_eq!(frame.sequence_number(), 1),
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(correlator.pending(), 0);
    }

    #[tokio::test]
    async fn nack_resolves_with_its_status() {
        let correlator = Arc::new(Correlator::new(0));
        let pending = correlator.register(2, CommandId::SubmitSm);

        correlator.resolve(Frame::GenericNack(GenericNack::error(
            2,
            CommandStatus::Throttled,
        )));
        assert!(matches!(
            pending.wait().await,
            Outcome::Nack(CommandStatus::Throttled)
        ));
    }

    #[tokio::test]
    async fn wrong_response_id_is_a_mismatch() {
        let correlator = Arc::new(Correlator::new(0));
        let pending = correlator.register(3, CommandId::QuerySm);

        correlator.resolve(Frame::EnquireLinkResp(EnquireLinkResp::ok(3)));
        match pending.wait().await {
            Outcome::Mismatch { expected, actual } => {
                assert_eq!(expected, CommandId::QuerySmResp);
                assert_eq!(actual, CommandId::EnquireLinkResp);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn unmatched_response_is_reported() {
        let correlator = Arc::new(Correlator::new(0));
        assert!(!correlator.resolve(submit_resp(99)));
    }

    #[tokio::test]
    async fn dropping_pending_unregisters_the_waiter() {
        let correlator = Arc::new(Correlator::new(0));
        let pending = correlator.register(4, CommandId::SubmitSm);
        assert_eq!(correlator.pending(), 1);
        drop(pending);
        assert_eq!(correlator.pending(), 0);

        // The late response is now simply unmatched.
        assert!(!correlator.resolve(submit_resp(4)));
    }

    #[tokio::test]
    async fn fail_all_resolves_every_waiter() {
        let correlator = Arc::new(Correlator::new(0));
        let first = correlator.register(5, CommandId::SubmitSm);
        let second = correlator.register(6, CommandId::QuerySm);

        correlator.fail_all(Outcome::Disconnected);
        assert!(matches!(first.wait().await, Outcome::Disconnected));
        assert!(matches!(second.wait().await, Outcome::Disconnected));
        assert_eq!(correlator.pending(), 0);
    }

    #[tokio::test]
    async fn window_caps_concurrent_requests() {
        let correlator = Correlator::new(2);
        let first = correlator.acquire_window().await.unwrap();
        let _second = correlator.acquire_window().await.unwrap();

        // Third slot is unavailable until a permit drops.
        assert!(
            tokio::time::timeout(
                std::time::Duration::from_millis(20),
                correlator.acquire_window()
            )
            .await
            .is_err()
        );

        drop(first);
        assert!(correlator.acquire_window().await.is_some());
    }

    #[tokio::test]
    async fn no_window_means_no_permits() {
        let correlator = Correlator::new(0);
        assert!(correlator.acquire_window().await.is_none());
    }
}
