// Inbound long-message reassembly. Parts are buffered per
// (source, destination, reference) until the set is complete, then the
// carrier PDU is rewritten as one unsegmented deliver_sm. A periodic sweep
// bounds memory by discarding partials that stopped arriving.

use crate::datatypes::{DeliverSm, esm};
use crate::udh::parse_concat;
use bytes::Bytes;
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;
use tokio::time::Instant;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct BucketKey {
    source: String,
    dest: String,
    reference: u16,
}

struct Bucket {
    total: u8,
    /// seq -> payload; BTreeMap keeps ascending part order for assembly.
    parts: BTreeMap<u8, Bytes>,
    created_at: Instant,
}

pub(crate) struct Reassembler {
    buckets: HashMap<BucketKey, Bucket>,
    stale_after: Duration,
}

impl Reassembler {
    pub fn new(stale_after: Duration) -> Self {
        Self {
            buckets: HashMap::new(),
            stale_after,
        }
    }

    /// Feed one inbound PDU through the reassembler.
    ///
    /// Messages without a concatenation UDH pass straight through. A part
    /// returns `None` until its siblings arrive; the completing part
    /// returns the merged message with the UDH stripped and the UDH bit
    /// cleared, so the handler sees an ordinary PDU. Each logical message
    /// is delivered at most once; a duplicate sequence number overwrites
    /// the earlier payload.
    pub fn accept(&mut self, mut pdu: DeliverSm) -> Option<DeliverSm> {
        let Some((info, payload)) = parse_concat(&pdu.short_message) else {
            return Some(pdu);
        };
        if info.total == 0 {
            tracing::warn!(
                source = %pdu.source_addr,
                "concatenation header claims zero parts, delivering as-is"
            );
            return Some(pdu);
        }

        let key = BucketKey {
            source: pdu.source_addr.clone(),
            dest: pdu.destination_addr.clone(),
            reference: info.reference,
        };
        let payload = Bytes::copy_from_slice(payload);

        let bucket = self.buckets.entry(key.clone()).or_insert_with(|| Bucket {
            total: info.total,
            parts: BTreeMap::new(),
            created_at: Instant::now(),
        });
        bucket.parts.insert(info.sequence, payload);

        if bucket.parts.len() < bucket.total as usize {
            return None;
        }

        let bucket = self.buckets.remove(&key).expect("bucket just touched");
        let mut assembled = Vec::new();
        for payload in bucket.parts.values() {
            assembled.extend_from_slice(payload);
        }

        pdu.esm_class &= !esm::UDH_INDICATOR;
        pdu.short_message = Bytes::from(assembled);
        Some(pdu)
    }

    /// Drop partial messages older than the stale TTL.
    pub fn sweep(&mut self) {
        let stale_after = self.stale_after;
        let before = self.buckets.len();
        self.buckets
            .retain(|_, bucket| bucket.created_at.elapsed() <= stale_after);
        let dropped = before - self.buckets.len();
        if dropped > 0 {
            tracing::debug!(dropped, "discarded stale partial messages");
        }
    }

    pub fn pending(&self) -> usize {
        self.buckets.len()
    }
}
