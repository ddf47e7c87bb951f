// Address numbering: type-of-number and numbering-plan-indicator tables
// (SMPP v3.4 Section 5.2.5 / 5.2.6) plus the address value used across the
// client API.

use num_enum::TryFromPrimitive;
use std::fmt;

/// Type of Number (Section 5.2.5).
#[derive(TryFromPrimitive)]
#[repr(u8)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TypeOfNumber {
    #[default]
    Unknown = 0x00,
    International = 0x01,
    National = 0x02,
    NetworkSpecific = 0x03,
    SubscriberNumber = 0x04,
    Alphanumeric = 0x05,
    Abbreviated = 0x06,
}

/// Numbering Plan Indicator (Section 5.2.6).
#[derive(TryFromPrimitive)]
#[repr(u8)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum NumericPlanIndicator {
    #[default]
    Unknown = 0x00,
    Isdn = 0x01,
    Data = 0x03,
    Telex = 0x04,
    LandMobile = 0x06,
    National = 0x08,
    Private = 0x09,
    Ermes = 0x0A,
    Internet = 0x0E,
    WapClientId = 0x12,
}

/// An SME address with its numbering metadata.
///
/// Addresses travel on the wire as a TON octet, an NPI octet, and a
/// C-string of at most 20 digits plus terminator.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Address {
    pub addr: String,
    pub ton: TypeOfNumber,
    pub npi: NumericPlanIndicator,
}

impl Address {
    /// Maximum address length including the NUL terminator.
    pub const MAX_WIRE_LEN: usize = 21;

    pub fn new(addr: impl Into<String>, ton: TypeOfNumber, npi: NumericPlanIndicator) -> Self {
        Self {
            addr: addr.into(),
            ton,
            npi,
        }
    }

    /// An international ISDN number, the common case for MSISDNs.
    pub fn international(addr: impl Into<String>) -> Self {
        Self::new(addr, TypeOfNumber::International, NumericPlanIndicator::Isdn)
    }
}

impl From<&str> for Address {
    fn from(addr: &str) -> Self {
        Self {
            addr: addr.to_owned(),
            ..Default::default()
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.addr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ton_npi_wire_values() {
        assert_eq!(TypeOfNumber::International as u8, 0x01);
        assert_eq!(NumericPlanIndicator::Isdn as u8, 0x01);
        assert_eq!(TypeOfNumber::Alphanumeric as u8, 0x05);
        assert_eq!(NumericPlanIndicator::WapClientId as u8, 0x12);
    }

    #[test]
    fn international_shorthand() {
        let addr = Address::international("5511999999999");
        assert_eq!(addr.ton, TypeOfNumber::International);
        assert_eq!(addr.npi, NumericPlanIndicator::Isdn);
        assert_eq!(addr.to_string(), "5511999999999");
    }

    #[test]
    fn default_is_unknown_numbering() {
        let addr = Address::from("1234");
        assert_eq!(addr.ton, TypeOfNumber::Unknown);
        assert_eq!(addr.npi, NumericPlanIndicator::Unknown);
    }
}
