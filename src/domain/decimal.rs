//! Lossless fixed-point numeric type backed by rust_decimal.
//!
//! Used for configured fractions and the percentages derived from them. Token amounts
//! live in [`super::amount::TokenAmount`], which has no 96-bit ceiling.

use rust_decimal::Decimal as RustDecimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Number of fractional digits carried by on-chain token amounts.
pub const WEI_SCALE: u32 = 18;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecimalError {
    #[error("invalid decimal {0:?}")]
    Invalid(String),
    #[error("{0:?} has more than 18 fractional digits")]
    TooPrecise(String),
    #[error("wei amount {0:?} is not a non-negative integer")]
    NotWei(String),
}

/// Lossless decimal numeric type for financial calculations.
///
/// Backed by rust_decimal to avoid floating-point drift.
/// Serializes to a JSON string so no consumer re-parses it as a float.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Decimal(#[serde(with = "rust_decimal::serde::str")] RustDecimal);

impl Decimal {
    /// Parse a fraction that must fit the 18-digit fixed-point scale.
    pub fn from_fixed_str(s: &str) -> Result<Self, DecimalError> {
        let value =
            RustDecimal::from_str(s.trim()).map_err(|_| DecimalError::Invalid(s.to_string()))?;
        if value.scale() > WEI_SCALE {
            return Err(DecimalError::TooPrecise(s.to_string()));
        }
        Ok(Decimal(value))
    }

    /// Format the Decimal as a canonical string (no exponent notation).
    pub fn to_canonical_string(&self) -> String {
        // normalize() strips trailing zeros and folds -0 into 0
        let normalized = self.0.normalize();
        format!("{}", normalized)
    }

    pub fn mul_int(&self, n: i64) -> Self {
        Decimal(self.0 * RustDecimal::from(n))
    }

    pub fn one() -> Self {
        Decimal(RustDecimal::ONE)
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_canonical_string())
    }
}

impl std::ops::Add for Decimal {
    type Output = Decimal;

    fn add(self, rhs: Decimal) -> Decimal {
        Decimal(self.0 + rhs.0)
    }
}
