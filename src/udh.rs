// User Data Header handling for concatenated short messages (3GPP TS
// 23.040 Section 9.2.3.24). Outbound parts always carry the 8-bit
// reference element; inbound parsing accepts both the 8-bit (IEI 0x00) and
// 16-bit (IEI 0x08) forms.

/// Concatenation metadata extracted from (or destined for) a UDH.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConcatInfo {
    pub reference: u16,
    pub total: u8,
    pub sequence: u8,
}

const IEI_CONCAT_8BIT: u8 = 0x00;
const IEI_CONCAT_16BIT: u8 = 0x08;

/// Octets of the 8-bit-reference concatenation header: UDHL, IEI, IEDL,
/// reference, total, sequence.
pub const CONCAT_HEADER_LEN: usize = 6;

/// Build the UDH for one part of a concatenated message.
pub fn encode_concat(reference: u8, total: u8, sequence: u8) -> [u8; CONCAT_HEADER_LEN] {
    [0x05, IEI_CONCAT_8BIT, 0x03, reference, total, sequence]
}

/// Split a short message into its UDH concatenation info and payload.
///
/// Returns `None` when the bytes do not start with a well-formed UDH or
/// the header carries no concatenation element; the caller then treats the
/// message as unsegmented.
pub fn parse_concat(short_message: &[u8]) -> Option<(ConcatInfo, &[u8])> {
    let (&udhl, rest) = short_message.split_first()?;
    let udhl = udhl as usize;
    if udhl == 0 || rest.len() < udhl {
        return None;
    }
    let (header, payload) = rest.split_at(udhl);

    let mut info = None;
    let mut elements = header;
    while let [iei, iedl, tail @ ..] = elements {
        let iedl = *iedl as usize;
        if tail.len() < iedl {
            return None; // element length overruns the header
        }
        let (value, next) = tail.split_at(iedl);
        match (*iei, iedl) {
            (IEI_CONCAT_8BIT, 3) => {
                info = Some(ConcatInfo {
                    reference: value[0] as u16,
                    total: value[1],
                    sequence: value[2],
                });
            }
            (IEI_CONCAT_16BIT, 4) => {
                info = Some(ConcatInfo {
                    reference: u16::from_be_bytes([value[0], value[1]]),
                    total: value[2],
                    sequence: value[3],
                });
            }
            _ => {} // other elements (ports, etc.) are not ours to interpret
        }
        elements = next;
    }

    info.map(|info| (info, payload))
}
