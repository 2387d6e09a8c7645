//! Contract read keys and raw read values.

use super::Address;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Contract operations the aggregation stage depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Operation {
    Name,
    TotalSupply,
    BalanceOf,
}

impl Operation {
    /// Solidity method name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Name => "name",
            Operation::TotalSupply => "totalSupply",
            Operation::BalanceOf => "balanceOf",
        }
    }

    /// Canonical signature used to derive the call selector.
    pub fn signature(&self) -> &'static str {
        match self {
            Operation::Name => "name()",
            Operation::TotalSupply => "totalSupply()",
            Operation::BalanceOf => "balanceOf(address)",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Memoization key for a single contract read.
///
/// Structural equality over (source, operation, ordered args).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ReadKey {
    pub source: Address,
    pub operation: Operation,
    pub args: Vec<Address>,
}

impl ReadKey {
    pub fn new(source: Address, operation: Operation, args: Vec<Address>) -> Self {
        Self {
            source,
            operation,
            args,
        }
    }

    pub fn name(source: &Address) -> Self {
        Self::new(source.clone(), Operation::Name, Vec::new())
    }

    pub fn total_supply(source: &Address) -> Self {
        Self::new(source.clone(), Operation::TotalSupply, Vec::new())
    }

    pub fn balance_of(source: &Address, holder: &Address) -> Self {
        Self::new(source.clone(), Operation::BalanceOf, vec![holder.clone()])
    }
}

impl fmt::Display for ReadKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}(", self.source, self.operation)?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", arg)?;
        }
        f.write_str(")")
    }
}

/// Raw value returned by a contract read, before any formatting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "value")]
pub enum RawValue {
    /// The call returned no data.
    Null,
    Text(String),
    /// Unsigned integer rendered as base-10 digits (wei for token amounts).
    Uint(String),
}

impl RawValue {
    pub fn text(s: impl Into<String>) -> Self {
        RawValue::Text(s.into())
    }

    pub fn uint(s: impl Into<String>) -> Self {
        RawValue::Uint(s.into())
    }

    /// Null or empty. A resolved-but-falsy value still counts as resolved.
    pub fn is_falsy(&self) -> bool {
        match self {
            RawValue::Null => true,
            RawValue::Text(s) | RawValue::Uint(s) => s.is_empty(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            RawValue::Null => None,
            RawValue::Text(s) | RawValue::Uint(s) => Some(s),
        }
    }
}
