// Delivery-receipt text parser. Receipts ride in the short_message of a
// deliver_sm whose esm_class receipt bit is set, in the appendix-B text
// format:
//
//   id:IIIIIIIIII sub:SSS dlvrd:DDD submit date:YYMMDDhhmm
//   done date:YYMMDDhhmm stat:DDDDDDD err:E text:..........
//
// Field order is fixed by convention but this parser locates each key
// independently, since real SMSCs omit and reorder fields freely.

use crate::datatypes::{DeliverSm, MessageState};
use crate::text::MessageText;

/// The seven-character receipt states plus a catch-all for vendor codes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReceiptState {
    Delivered,
    Expired,
    Deleted,
    Undeliverable,
    Accepted,
    Unknown,
    Rejected,
    Other(String),
}

impl ReceiptState {
    fn from_code(code: &str) -> Self {
        match code {
            "DELIVRD" => ReceiptState::Delivered,
            "EXPIRED" => ReceiptState::Expired,
            "DELETED" => ReceiptState::Deleted,
            "UNDELIV" => ReceiptState::Undeliverable,
            "ACCEPTD" => ReceiptState::Accepted,
            "UNKNOWN" => ReceiptState::Unknown,
            "REJECTD" => ReceiptState::Rejected,
            other => ReceiptState::Other(other.to_owned()),
        }
    }

    /// The equivalent message_state value, when one exists.
    pub fn message_state(&self) -> MessageState {
        match self {
            ReceiptState::Delivered => MessageState::Delivered,
            ReceiptState::Expired => MessageState::Expired,
            ReceiptState::Deleted => MessageState::Deleted,
            ReceiptState::Undeliverable => MessageState::Undeliverable,
            ReceiptState::Accepted => MessageState::Accepted,
            ReceiptState::Rejected => MessageState::Rejected,
            ReceiptState::Unknown | ReceiptState::Other(_) => MessageState::Unknown,
        }
    }
}

/// A parsed delivery receipt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeliveryReceipt {
    /// SMSC message id from the original submit_sm_resp.
    pub message_id: String,
    pub state: ReceiptState,
    pub error: Option<u32>,
    pub submitted: Option<u32>,
    pub delivered: Option<u32>,
    pub submit_date: Option<String>,
    pub done_date: Option<String>,
    /// First octets of the original message text.
    pub text: Option<String>,
}

const KEYS: [&str; 8] = [
    "id:",
    "sub:",
    "dlvrd:",
    "submit date:",
    "done date:",
    "stat:",
    "err:",
    "text:",
];

/// Position of `key` in `s`, accepting it only at the start of the string
/// or after whitespace, so `id:` does not match inside another token.
fn find_key(s: &str, key: &str) -> Option<usize> {
    let mut from = 0;
    while let Some(offset) = s[from..].find(key) {
        let pos = from + offset;
        if pos == 0 || s[..pos].ends_with([' ', '\t']) {
            return Some(pos);
        }
        from = pos + key.len();
    }
    None
}

impl DeliveryReceipt {
    /// Parse the receipt text. Returns `None` when no `id:` field is
    /// present, the minimum for correlating the receipt with a submit.
    pub fn parse(text: &str) -> Option<Self> {
        let mut fields: Vec<(usize, usize)> = KEYS
            .iter()
            .enumerate()
            .filter_map(|(index, key)| find_key(text, key).map(|pos| (pos, index)))
            .collect();
        fields.sort_unstable();

        let mut values: [Option<&str>; 8] = [None; 8];
        for (slot, &(pos, index)) in fields.iter().enumerate() {
            let start = pos + KEYS[index].len();
            let end = match KEYS[index] {
                // text is by definition the trailing field
                "text:" => text.len(),
                _ => fields
                    .get(slot + 1)
                    .map(|&(next, _)| next)
                    .unwrap_or(text.len()),
            };
            values[index] = Some(text[start..end.max(start)].trim());
        }

        let message_id = values[0]?.to_owned();
        Some(DeliveryReceipt {
            message_id,
            state: values[5]
                .map(ReceiptState::from_code)
                .unwrap_or(ReceiptState::Unknown),
            error: values[6].and_then(|v| v.parse().ok()),
            submitted: values[1].and_then(|v| v.parse().ok()),
            delivered: values[2].and_then(|v| v.parse().ok()),
            submit_date: values[3].map(str::to_owned),
            done_date: values[4].map(str::to_owned),
            text: values[7].map(str::to_owned),
        })
    }

    /// Parse the receipt carried by a deliver_sm, decoding the short
    /// message (or message_payload TLV) with its data_coding first.
    pub fn from_deliver_sm(pdu: &DeliverSm) -> Option<Self> {
        if !pdu.is_delivery_receipt() {
            return None;
        }
        let octets = pdu
            .message_payload()
            .map(|payload| payload.as_ref())
            .unwrap_or(&pdu.short_message);
        Self::parse(&MessageText::decode(pdu.data_coding, octets))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datatypes::esm;
    use bytes::Bytes;

    const RECEIPT: &str = "id:MSG0001 sub:001 dlvrd:001 submit date:2608011200 \
                           done date:2608011201 stat:DELIVRD err:000 text:hello there";

    #[test]
    fn full_receipt() {
        let receipt = DeliveryReceipt::parse(RECEIPT).unwrap();
        assert_eq!(receipt.message_id, "MSG0001");
        assert_eq!(receipt.state, ReceiptState::Delivered);
        assert_eq!(receipt.error, Some(0));
        assert_eq!(receipt.submitted, Some(1));
        assert_eq!(receipt.delivered, Some(1));
        assert_eq!(receipt.submit_date.as_deref(), Some("2608011200"));
        assert_eq!(receipt.done_date.as_deref(), Some("2608011201"));
        assert_eq!(receipt.text.as_deref(), Some("hello there"));
    }

    #[test]
    fn every_documented_state_code() {
        for (code, state) in [
            ("DELIVRD", ReceiptState::Delivered),
            ("EXPIRED", ReceiptState::Expired),
            ("DELETED", ReceiptState::Deleted),
            ("UNDELIV", ReceiptState::Undeliverable),
            ("ACCEPTD", ReceiptState::Accepted),
            ("UNKNOWN", ReceiptState::Unknown),
            ("REJECTD", ReceiptState::Rejected),
        ] {
            let text = format!("id:X stat:{code} err:001");
            assert_eq!(DeliveryReceipt::parse(&text).unwrap().state, state);
        }
    }

    #[test]
    fn minimal_receipt() {
        let receipt = DeliveryReceipt::parse("id:ABC123 stat:UNDELIV err:042").unwrap();
        assert_eq!(receipt.message_id, "ABC123");
        assert_eq!(receipt.state, ReceiptState::Undeliverable);
        assert_eq!(receipt.error, Some(42));
        assert!(receipt.text.is_none());
    }

    #[test]
    fn missing_id_is_unparseable() {
        assert!(DeliveryReceipt::parse("stat:DELIVRD err:000").is_none());
    }

    #[test]
    fn vendor_state_is_preserved() {
        let receipt = DeliveryReceipt::parse("id:X stat:WEIRD01 err:9").unwrap();
        assert_eq!(receipt.state, ReceiptState::Other("WEIRD01".into()));
        assert_eq!(receipt.state.message_state(), MessageState::Unknown);
    }

    #[test]
    fn from_deliver_sm_respects_receipt_bit() {
        let mut pdu = DeliverSm {
            esm_class: esm::DELIVERY_RECEIPT,
            short_message: Bytes::copy_from_slice(RECEIPT.as_bytes()),
            ..Default::default()
        };
        let receipt = DeliveryReceipt::from_deliver_sm(&pdu).unwrap();
        assert_eq!(receipt.message_id, "MSG0001");

        pdu.esm_class = 0;
        assert!(DeliveryReceipt::from_deliver_sm(&pdu).is_none());
    }

    #[test]
    fn text_field_swallows_trailing_content() {
        let receipt =
            DeliveryReceipt::parse("id:1 stat:DELIVRD err:0 text:contains stat:fake").unwrap();
        assert_eq!(receipt.text.as_deref(), Some("contains stat:fake"));
        assert_eq!(receipt.state, ReceiptState::Delivered);
    }
}
