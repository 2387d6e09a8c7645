//! Synthetic asset identifier configuration.

use super::decimal::{Decimal, DecimalError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IdentifierConfigError {
    #[error("failed to read identifier config: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed identifier config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("identifier {identifier}: {source}")]
    SupportedMove {
        identifier: String,
        #[source]
        source: DecimalError,
    },
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawIdentifierEntry {
    supported_move: String,
}

/// Per-identifier settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentifierEntry {
    /// Fraction the price may move before the position is undercollateralized.
    pub supported_move: Decimal,
}

/// Identifier → entry, ordered by identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IdentifierConfig {
    entries: BTreeMap<String, IdentifierEntry>,
}

/// A selectable asset option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentifierOption {
    pub key: String,
    pub value: String,
}

impl IdentifierConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(mut self, identifier: impl Into<String>, supported_move: Decimal) -> Self {
        self.entries
            .insert(identifier.into(), IdentifierEntry { supported_move });
        self
    }

    /// Parse `{ "<identifier>": { "supportedMove": "<decimal>" }, ... }`.
    ///
    /// Every supported move must fit the 18-digit fixed-point scale.
    pub fn from_json_str(json: &str) -> Result<Self, IdentifierConfigError> {
        let raw: BTreeMap<String, RawIdentifierEntry> = serde_json::from_str(json)?;
        let mut entries = BTreeMap::new();
        for (identifier, entry) in raw {
            let supported_move = Decimal::from_fixed_str(&entry.supported_move).map_err(|source| {
                IdentifierConfigError::SupportedMove {
                    identifier: identifier.clone(),
                    source,
                }
            })?;
            entries.insert(identifier, IdentifierEntry { supported_move });
        }
        Ok(Self { entries })
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, IdentifierConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &IdentifierEntry)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
