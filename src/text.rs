//! Text codecs for the data_coding schemes this engine submits and
//! receives: the GSM 03.38 default alphabet (both one-septet-per-octet and
//! packed), Latin-1, ISO-8859-5, UCS-2 big-endian, and raw binary.
//!
//! Substitution policy: characters outside the selected alphabet encode as
//! `?` (0x3F); undecodable input decodes to U+FFFD. Encoding is therefore
//! total, which keeps the reader alive on foreign traffic.

/// GSM 03.38 default alphabet, indexed by septet value. 0x1B is the
/// extension escape and is handled before table lookup.
const GSM7_BASIC: [char; 128] = [
    '@', '£', '$', '¥', 'è', 'é', 'ù', 'ì', 'ò', 'Ç', '\n', 'Ø', 'ø', '\r', 'Å', 'å', //
    'Δ', '_', 'Φ', 'Γ', 'Λ', 'Ω', 'Π', 'Ψ', 'Σ', 'Θ', 'Ξ', ' ', 'Æ', 'æ', 'ß', 'É', //
    ' ', '!', '"', '#', '¤', '%', '&', '\'', '(', ')', '*', '+', ',', '-', '.', '/', //
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', ':', ';', '<', '=', '>', '?', //
    '¡', 'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K', 'L', 'M', 'N', 'O', //
    'P', 'Q', 'R', 'S', 'T', 'U', 'V', 'W', 'X', 'Y', 'Z', 'Ä', 'Ö', 'Ñ', 'Ü', '§', //
    '¿', 'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j', 'k', 'l', 'm', 'n', 'o', //
    'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z', 'ä', 'ö', 'ñ', 'ü', 'à',
];

const GSM7_ESCAPE: u8 = 0x1B;

/// Extension-table pairs (escape septet, character).
const GSM7_EXT: [(u8, char); 10] = [
    (0x0A, '\u{000C}'), // form feed
    (0x14, '^'),
    (0x28, '{'),
    (0x29, '}'),
    (0x2F, '\\'),
    (0x3C, '['),
    (0x3D, '~'),
    (0x3E, ']'),
    (0x40, '|'),
    (0x65, '€'),
];

const SUBSTITUTE: u8 = 0x3F; // '?'

fn gsm7_lookup(c: char) -> Option<Septet> {
    if let Some(idx) = GSM7_BASIC.iter().position(|&t| t == c) {
        // Positions 0x1B (escape) and 0x20 both render as ' '; prefer the
        // plain space septet.
        if c == ' ' {
            return Some(Septet::Basic(0x20));
        }
        return Some(Septet::Basic(idx as u8));
    }
    GSM7_EXT
        .iter()
        .find(|&&(_, ext)| ext == c)
        .map(|&(code, _)| Septet::Extended(code))
}

enum Septet {
    Basic(u8),
    Extended(u8),
}

/// Encode to GSM 03.38 septets, one septet per output byte.
pub fn gsm7_encode(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len());
    for c in text.chars() {
        match gsm7_lookup(c) {
            Some(Septet::Basic(s)) => out.push(s),
            Some(Septet::Extended(s)) => {
                out.push(GSM7_ESCAPE);
                out.push(s);
            }
            None => out.push(SUBSTITUTE),
        }
    }
    out
}

/// Decode GSM 03.38 septets (one per byte). A dangling escape at the end
/// of input decodes to U+FFFD.
pub fn gsm7_decode(septets: &[u8]) -> String {
    let mut out = String::with_capacity(septets.len());
    let mut iter = septets.iter();
    while let Some(&s) = iter.next() {
        let s = s & 0x7F;
        if s == GSM7_ESCAPE {
            match iter.next() {
                Some(&ext) => match GSM7_EXT.iter().find(|&&(code, _)| code == ext & 0x7F) {
                    Some(&(_, c)) => out.push(c),
                    // Unknown extension: the standard says fall back to
                    // the basic character for the septet.
                    None => out.push(GSM7_BASIC[(ext & 0x7F) as usize]),
                },
                None => out.push('\u{FFFD}'),
            }
        } else {
            out.push(GSM7_BASIC[s as usize]);
        }
    }
    out
}

/// Pack septets into octets, low bits first (GSM 03.38 Section 6.1.2.1).
pub fn gsm7_pack(septets: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(septets.len() * 7 / 8 + 1);
    let mut acc: u16 = 0;
    let mut nbits = 0u8;
    for &s in septets {
        acc |= ((s & 0x7F) as u16) << nbits;
        nbits += 7;
        while nbits >= 8 {
            out.push((acc & 0xFF) as u8);
            acc >>= 8;
            nbits -= 8;
        }
    }
    if nbits > 0 {
        out.push((acc & 0xFF) as u8);
    }
    out
}

/// Unpack `count` septets from packed octets. `count` disambiguates the
/// trailing padding bits: `len * 8 / 7` recovers everything that fits.
pub fn gsm7_unpack(data: &[u8], count: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(count);
    let mut acc: u16 = 0;
    let mut nbits = 0u8;
    for &b in data {
        if out.len() == count {
            break;
        }
        acc |= (b as u16) << nbits;
        nbits += 8;
        while nbits >= 7 && out.len() < count {
            out.push((acc & 0x7F) as u8);
            acc >>= 7;
            nbits -= 7;
        }
    }
    out
}

pub fn latin1_encode(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| {
            let cp = c as u32;
            if cp <= 0xFF { cp as u8 } else { SUBSTITUTE }
        })
        .collect()
}

pub fn latin1_decode(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

// ISO-8859-5 maps 0xA1..=0xFF onto U+0401 + (byte - 0xA1), with three
// carve-outs: 0xAD soft hyphen, 0xF0 numero sign, 0xFD section sign.
const CYRILLIC_BASE: u32 = 0x0401;

pub fn cyrillic_encode(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            '\u{00AD}' => 0xAD,
            '№' => 0xF0,
            '§' => 0xFD,
            c if (c as u32) < 0xA1 => c as u8,
            c => {
                let cp = c as u32;
                if (CYRILLIC_BASE..=0x045F).contains(&cp) {
                    let b = (cp - CYRILLIC_BASE + 0xA1) as u8;
                    // Code points shadowed by the carve-outs do not exist
                    // in this charset.
                    if matches!(b, 0xAD | 0xF0 | 0xFD) {
                        SUBSTITUTE
                    } else {
                        b
                    }
                } else {
                    SUBSTITUTE
                }
            }
        })
        .collect()
}

pub fn cyrillic_decode(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|&b| match b {
            0xAD => '\u{00AD}',
            0xF0 => '№',
            0xFD => '§',
            b if b < 0xA1 => b as char,
            b => char::from_u32(CYRILLIC_BASE + (b as u32 - 0xA1)).unwrap_or('\u{FFFD}'),
        })
        .collect()
}

/// UTF-16 big-endian, the UCS-2 flavor SMSCs actually speak.
pub fn ucs2_encode(text: &str) -> Vec<u8> {
    text.encode_utf16()
        .flat_map(|unit| unit.to_be_bytes())
        .collect()
}

pub fn ucs2_decode(bytes: &[u8]) -> String {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
        .collect();
    let mut text = String::from_utf16_lossy(&units);
    if bytes.len() % 2 != 0 {
        text.push('\u{FFFD}');
    }
    text
}

/// The outbound text payload: which alphabet to use and the text itself.
/// `data_coding()` and `encode()` always agree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MessageText {
    /// GSM 03.38 default alphabet, one septet per octet (data_coding 0x00)
    Gsm7(String),
    /// GSM 03.38 packed into octets (data_coding 0x00)
    Gsm7Packed(String),
    /// ISO-8859-1 (data_coding 0x03)
    Latin1(String),
    /// ISO-8859-5 (data_coding 0x06)
    Cyrillic(String),
    /// UTF-16BE (data_coding 0x08)
    Ucs2(String),
    /// Pre-encoded octets, passed through with data_coding 0x00
    Raw(Vec<u8>),
}

impl Default for MessageText {
    fn default() -> Self {
        MessageText::Gsm7(String::new())
    }
}

impl MessageText {
    pub fn data_coding(&self) -> u8 {
        match self {
            MessageText::Gsm7(_) | MessageText::Gsm7Packed(_) | MessageText::Raw(_) => 0x00,
            MessageText::Latin1(_) => 0x03,
            MessageText::Cyrillic(_) => 0x06,
            MessageText::Ucs2(_) => 0x08,
        }
    }

    /// Wire octets for a single-part message.
    pub fn encode(&self) -> Vec<u8> {
        match self {
            MessageText::Gsm7(s) => gsm7_encode(s),
            MessageText::Gsm7Packed(s) => gsm7_pack(&gsm7_encode(s)),
            MessageText::Latin1(s) => latin1_encode(s),
            MessageText::Cyrillic(s) => cyrillic_encode(s),
            MessageText::Ucs2(s) => ucs2_encode(s),
            MessageText::Raw(b) => b.clone(),
        }
    }

    /// The units segmentation counts in: septets for the GSM variants,
    /// octets otherwise.
    pub(crate) fn encoded_units(&self) -> Vec<u8> {
        match self {
            MessageText::Gsm7(s) | MessageText::Gsm7Packed(s) => gsm7_encode(s),
            other => other.encode(),
        }
    }

    /// Turn a slice of units into the wire octets of one message part.
    pub(crate) fn part_octets(&self, units: &[u8]) -> Vec<u8> {
        match self {
            MessageText::Gsm7Packed(_) => gsm7_pack(units),
            _ => units.to_vec(),
        }
    }

    /// Units that fit in one unsegmented short message.
    pub(crate) fn single_capacity(&self) -> usize {
        match self {
            MessageText::Gsm7(_) | MessageText::Gsm7Packed(_) => 160,
            _ => 140,
        }
    }

    /// Units per part under a 7-octet (8-bit reference) concatenation
    /// header. The packed variant cuts at a septet count divisible by 8 so
    /// every part packs to whole octets and parts concatenate exactly.
    pub(crate) fn concat_capacity(&self) -> usize {
        match self {
            MessageText::Gsm7(_) => 153,
            MessageText::Gsm7Packed(_) => 152,
            _ => 134,
        }
    }

    /// Best-effort decode of inbound payload octets by data_coding value.
    pub fn decode(data_coding: u8, bytes: &[u8]) -> String {
        match data_coding {
            0x00 | 0x01 => gsm7_decode(bytes),
            0x03 => latin1_decode(bytes),
            0x06 => cyrillic_decode(bytes),
            0x08 => ucs2_decode(bytes),
            _ => String::from_utf8_lossy(bytes).into_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gsm7_roundtrip_basic_alphabet() {
        let text = "Hello @£$¥ (GSM) 0123456789 ÄÖÑÜ §¿¡ àèéùìò";
        assert_eq!(gsm7_decode(&gsm7_encode(text)), text);
    }

    #[test]
    fn gsm7_roundtrip_extension_table() {
        let text = "brackets [] braces {} caret ^ pipe | tilde ~ euro € back\\slash";
        let septets = gsm7_encode(text);
        assert_eq!(gsm7_decode(&septets), text);
        // Each extension character costs two septets.
        assert!(septets.len() > text.chars().count());
    }

    #[test]
    fn gsm7_escape_sequence_layout() {
        assert_eq!(gsm7_encode("€"), vec![0x1B, 0x65]);
        assert_eq!(gsm7_encode("["), vec![0x1B, 0x3C]);
        assert_eq!(gsm7_decode(&[0x1B, 0x3E]), "]");
    }

    #[test]
    fn gsm7_out_of_alphabet_substitutes() {
        assert_eq!(gsm7_encode("漢"), vec![SUBSTITUTE]);
        assert_eq!(gsm7_decode(&gsm7_encode("a漢b")), "a?b");
    }

    #[test]
    fn gsm7_dangling_escape() {
        assert_eq!(gsm7_decode(&[0x41, 0x1B]), "A\u{FFFD}");
    }

    #[test]
    fn septet_packing_known_vector() {
        // "hello" packs to E8 32 9B FD 06 per GSM 03.38.
        let septets = gsm7_encode("hello");
        assert_eq!(gsm7_pack(&septets), vec![0xE8, 0x32, 0x9B, 0xFD, 0x06]);
    }

    #[test]
    fn septet_pack_unpack_roundtrip() {
        for len in [0usize, 1, 7, 8, 9, 152, 153, 160] {
            let septets: Vec<u8> = (0..len).map(|i| (i % 127) as u8).collect();
            let packed = gsm7_pack(&septets);
            assert_eq!(packed.len(), (len * 7).div_ceil(8));
            assert_eq!(gsm7_unpack(&packed, len), septets);
        }
    }

    #[test]
    fn latin1_roundtrip_and_substitution() {
        let text = "Grüße, señor! ±×÷";
        assert_eq!(latin1_decode(&latin1_encode(text)), text);
        assert_eq!(latin1_encode("aЖb"), b"a?b".to_vec());
    }

    #[test]
    fn cyrillic_roundtrip() {
        let text = "Привет, мир! Ёё Џџ № §";
        assert_eq!(cyrillic_decode(&cyrillic_encode(text)), text);
    }

    #[test]
    fn cyrillic_known_bytes() {
        // А=0xB0, я=0xEF in ISO-8859-5.
        assert_eq!(cyrillic_encode("Ая"), vec![0xB0, 0xEF]);
        assert_eq!(cyrillic_decode(&[0xB0, 0xEF]), "Ая");
        // Shadowed code points cannot be represented.
        assert_eq!(cyrillic_encode("\u{040D}"), vec![SUBSTITUTE]);
    }

    #[test]
    fn ucs2_literal_vector() {
        let bytes = ucs2_encode("你好 😊");
        assert_eq!(
            bytes,
            vec![0x4F, 0x60, 0x59, 0x7D, 0x00, 0x20, 0xD8, 0x3D, 0xDE, 0x0A]
        );
        assert_eq!(ucs2_decode(&bytes), "你好 😊");
    }

    #[test]
    fn ucs2_roundtrip_plane_one() {
        let text = "emoji 🚀🛰 and text";
        assert_eq!(ucs2_decode(&ucs2_encode(text)), text);
    }

    #[test]
    fn ucs2_odd_length_input() {
        let decoded = ucs2_decode(&[0x00, 0x41, 0x00]);
        assert_eq!(decoded, "A\u{FFFD}");
    }

    #[test]
    fn ucs2_unpaired_surrogate() {
        let decoded = ucs2_decode(&[0xD8, 0x3D, 0x00, 0x41]);
        assert_eq!(decoded, "\u{FFFD}A");
    }

    #[test]
    fn data_coding_matches_encoding() {
        assert_eq!(MessageText::Gsm7("x".into()).data_coding(), 0x00);
        assert_eq!(MessageText::Latin1("x".into()).data_coding(), 0x03);
        assert_eq!(MessageText::Cyrillic("x".into()).data_coding(), 0x06);
        assert_eq!(MessageText::Ucs2("x".into()).data_coding(), 0x08);
        assert_eq!(MessageText::Raw(vec![1, 2]).data_coding(), 0x00);
    }

    #[test]
    fn packed_variant_encodes_packed() {
        let plain = MessageText::Gsm7("hello".into()).encode();
        let packed = MessageText::Gsm7Packed("hello".into()).encode();
        assert_eq!(plain.len(), 5);
        assert_eq!(packed, vec![0xE8, 0x32, 0x9B, 0xFD, 0x06]);
    }

    #[test]
    fn decode_dispatches_on_data_coding() {
        assert_eq!(MessageText::decode(0x08, &ucs2_encode("hi")), "hi");
        assert_eq!(MessageText::decode(0x03, b"caf\xe9"), "café");
        assert_eq!(MessageText::decode(0x00, &gsm7_encode("hi")), "hi");
    }
}
