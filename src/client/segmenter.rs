// Outbound long-message segmentation: cut encoded text into UDH-prefixed
// parts that each fit a single short message. The capacity is counted in
// septets for the GSM alphabet and octets otherwise; every part of one
// message shares a reference number and carries the 8-bit-reference
// concatenation header.

use crate::client::error::SessionError;
use crate::text::MessageText;
use crate::udh::encode_concat;

/// Result of sizing a message against the single-PDU limit.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Segmented {
    /// Fits unsegmented; submit as-is.
    Single,
    /// Needs `parts.len()` PDUs; each entry is a complete short_message
    /// value (UDH + payload slice).
    Parts { reference: u8, parts: Vec<Vec<u8>> },
}

pub(crate) fn segment(text: &MessageText, reference: u8) -> Result<Segmented, SessionError> {
    let units = text.encoded_units();
    if units.len() <= text.single_capacity() {
        return Ok(Segmented::Single);
    }

    let capacity = text.concat_capacity();
    let total = units.len().div_ceil(capacity);
    if total > 255 {
        return Err(SessionError::MessageTooLong);
    }

    let parts = units
        .chunks(capacity)
        .enumerate()
        .map(|(index, chunk)| {
            let mut part =
                Vec::with_capacity(crate::udh::CONCAT_HEADER_LEN + chunk.len());
            part.extend_from_slice(&encode_concat(reference, total as u8, index as u8 + 1));
            part.extend_from_slice(&text.part_octets(chunk));
            part
        })
        .collect();

    Ok(Segmented::Parts { reference, parts })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::udh::parse_concat;

    fn gsm7_text(len: usize) -> MessageText {
        MessageText::Gsm7("a".repeat(len))
    }

    #[test]
    fn short_message_stays_single() {
        assert_eq!(segment(&gsm7_text(160), 1).unwrap(), Segmented::Single);
        assert_eq!(
            segment(&MessageText::Ucs2("x".repeat(70)), 1).unwrap(),
            Segmented::Single
        );
    }

    #[test]
    fn two_hundred_gsm7_chars_make_two_parts() {
        let Segmented::Parts { reference, parts } = segment(&gsm7_text(200), 0x11).unwrap()
        else {
            panic!("expected segmentation");
        };
        assert_eq!(reference, 0x11);
        assert_eq!(parts.len(), 2);

        let (first, first_payload) = parse_concat(&parts[0]).unwrap();
        let (second, second_payload) = parse_concat(&parts[1]).unwrap();
        assert_eq!(first.reference, 0x11);
        assert_eq!(second.reference, 0x11);
        assert_eq!((first.total, first.sequence), (2, 1));
        assert_eq!((second.total, second.sequence), (2, 2));
        assert_eq!(first_payload.len(), 153);
        assert_eq!(second_payload.len(), 47);
    }

    #[test]
    fn parts_concatenate_back_to_the_encoding() {
        let text = MessageText::Latin1("é".repeat(300));
        let Segmented::Parts { parts, .. } = segment(&text, 9).unwrap() else {
            panic!("expected segmentation");
        };

        let mut assembled = Vec::new();
        for part in &parts {
            let (_, payload) = parse_concat(part).unwrap();
            assembled.extend_from_slice(payload);
        }
        assert_eq!(assembled, text.encode());
    }

    #[test]
    fn packed_parts_stay_octet_aligned() {
        let text = MessageText::Gsm7Packed("b".repeat(200));
        let Segmented::Parts { parts, .. } = segment(&text, 3).unwrap() else {
            panic!("expected segmentation");
        };

        // 152 septets pack to exactly 133 octets, no padding bits left
        // over, so unpacking the concatenation recovers the message.
        let (_, first_payload) = parse_concat(&parts[0]).unwrap();
        assert_eq!(first_payload.len(), 133);

        let mut packed = Vec::new();
        for part in &parts {
            let (_, payload) = parse_concat(part).unwrap();
            packed.extend_from_slice(payload);
        }
        let septets = crate::text::gsm7_unpack(&packed, 200);
        assert_eq!(crate::text::gsm7_decode(&septets), "b".repeat(200));
    }

    #[test]
    fn ucs2_capacity_is_134_octets_per_part() {
        let text = MessageText::Ucs2("я".repeat(100)); // 200 octets
        let Segmented::Parts { parts, .. } = segment(&text, 1).unwrap() else {
            panic!("expected segmentation");
        };
        assert_eq!(parts.len(), 2);
        let (_, payload) = parse_concat(&parts[0]).unwrap();
        assert_eq!(payload.len(), 134);
    }

    #[test]
    fn over_255_parts_is_too_long() {
        let text = MessageText::Raw(vec![0u8; 134 * 255 + 1]);
        assert!(matches!(
            segment(&text, 1),
            Err(SessionError::MessageTooLong)
        ));
    }

    #[test]
    fn max_segmentable_length_is_accepted() {
        let text = MessageText::Raw(vec![0u8; 134 * 255]);
        let Segmented::Parts { parts, .. } = segment(&text, 1).unwrap() else {
            panic!("expected segmentation");
        };
        assert_eq!(parts.len(), 255);
    }
}
