//! Domain primitives: Address.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Account or contract address (0x-prefixed, 20-byte hex string).
///
/// Equality is structural on the string as given; discovery and read keys reuse the same
/// value so no case folding is applied.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Address(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid address {0:?}: expected 0x followed by 40 hex digits")]
pub struct AddressParseError(pub String);

impl Address {
    pub fn new(addr: String) -> Self {
        Address(addr)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The 20 raw bytes behind the hex string.
    pub fn to_bytes(&self) -> Result<[u8; 20], AddressParseError> {
        let digits = self
            .0
            .strip_prefix("0x")
            .or_else(|| self.0.strip_prefix("0X"))
            .ok_or_else(|| AddressParseError(self.0.clone()))?;
        let raw = hex::decode(digits).map_err(|_| AddressParseError(self.0.clone()))?;
        raw.try_into().map_err(|_| AddressParseError(self.0.clone()))
    }
}

impl FromStr for Address {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let addr = Address(s.trim().to_string());
        addr.to_bytes()?;
        Ok(addr)
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
