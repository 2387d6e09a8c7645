//! Token amounts at full uint256 width.
//!
//! Values are held as a signed integer count of wei, so conversion, truncation and the
//! net-exposure subtraction never lose digits however large the on-chain value is.

use super::decimal::{DecimalError, WEI_SCALE};
use num_bigint::{BigInt, Sign};
use std::fmt;
use std::str::FromStr;

/// Maximum number of fractional digits shown for a token amount.
pub const DISPLAY_DECIMALS: u32 = 4;

fn pow10(exp: u32) -> BigInt {
    BigInt::from(10u32).pow(exp)
}

/// Signed token amount with 18 fractional digits and no upper bound.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TokenAmount {
    wei: BigInt,
}

impl TokenAmount {
    /// Interpret a base-10 integer wei string (wei / 10^18 tokens).
    pub fn from_wei(wei: &str) -> Result<Self, DecimalError> {
        let digits = wei.trim();
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(DecimalError::NotWei(wei.to_string()));
        }
        let wei_value =
            BigInt::from_str(digits).map_err(|_| DecimalError::NotWei(wei.to_string()))?;
        Ok(Self { wei: wei_value })
    }

    /// Whole-token amount.
    pub fn from_tokens(tokens: i64) -> Self {
        Self {
            wei: BigInt::from(tokens) * pow10(WEI_SCALE),
        }
    }

    /// Truncate toward zero to at most `places` fractional digits.
    pub fn truncate_to(&self, places: u32) -> Self {
        if places >= WEI_SCALE {
            return self.clone();
        }
        let unit = pow10(WEI_SCALE - places);
        // BigInt remainder carries the dividend's sign
        let dropped = &self.wei % &unit;
        Self {
            wei: &self.wei - dropped,
        }
    }

    /// Plain decimal rendering, no exponent, trailing fractional zeros stripped.
    pub fn to_canonical_string(&self) -> String {
        let digits = self.wei.magnitude().to_string();
        let scale = WEI_SCALE as usize;
        let padded = if digits.len() <= scale {
            format!("{}{}", "0".repeat(scale + 1 - digits.len()), digits)
        } else {
            digits
        };
        let (int_part, frac_part) = padded.split_at(padded.len() - scale);
        let frac_part = frac_part.trim_end_matches('0');

        let sign = if self.wei.sign() == Sign::Minus { "-" } else { "" };
        if frac_part.is_empty() {
            format!("{}{}", sign, int_part)
        } else {
            format!("{}{}.{}", sign, int_part, frac_part)
        }
    }
}

impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_canonical_string())
    }
}

impl std::ops::Sub for &TokenAmount {
    type Output = TokenAmount;

    fn sub(self, rhs: &TokenAmount) -> TokenAmount {
        TokenAmount {
            wei: &self.wei - &rhs.wei,
        }
    }
}
