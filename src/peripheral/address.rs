use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
#[error("invalid peripheral address: {0:?}")]
pub struct AddressParseError(pub String);

/// Peripheral hardware address: six colon-separated hex octets,
/// normalized to uppercase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[serde(transparent)]
pub struct MacAddress(String);

impl MacAddress {
    pub fn parse(input: &str) -> Result<Self, AddressParseError> {
        let trimmed = input.trim();
        let octets: Vec<&str> = trimmed.split(':').collect();
        let well_formed = octets.len() == 6
            && octets
                .iter()
                .all(|o| o.len() == 2 && o.chars().all(|c| c.is_ascii_hexdigit()));

        if !well_formed {
            return Err(AddressParseError(trimmed.to_string()));
        }
        Ok(Self(trimmed.to_ascii_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for MacAddress {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl<'de> Deserialize<'de> for MacAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        MacAddress::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_and_normalizes_valid_addresses() {
        let mac = MacAddress::parse("aa:bb:cc:dd:ee:ff").unwrap();
        assert_eq!(mac.as_str(), "AA:BB:CC:DD:EE:FF");

        let mac = MacAddress::parse("  00:11:22:33:44:55 ").unwrap();
        assert_eq!(mac.as_str(), "00:11:22:33:44:55");
    }

    #[test]
    fn rejects_malformed_addresses() {
        for bad in [
            "",
            "AA:BB:CC:DD:EE",
            "AA:BB:CC:DD:EE:FF:00",
            "AA-BB-CC-DD-EE-FF",
            "AA:BB:CC:DD:EE:GG",
            "AAA:BB:CC:DD:EE:F",
            "AA:BB:CC:DD:EE:F",
        ] {
            assert!(MacAddress::parse(bad).is_err(), "accepted {:?}", bad);
        }
    }
}
