//! Asset selection options derived from identifier configuration.

use crate::domain::{Decimal, IdentifierConfig, IdentifierOption};

/// Collateralization requirement shown to the user: `(supported_move + 1) * 100`.
pub fn collateral_percentage(supported_move: Decimal) -> Decimal {
    (supported_move + Decimal::one()).mul_int(100)
}

/// Build the selectable options, or `None` while the configuration has not loaded.
pub fn identifier_options(config: Option<&IdentifierConfig>) -> Option<Vec<IdentifierOption>> {
    let config = config?;
    Some(
        config
            .iter()
            .map(|(identifier, entry)| IdentifierOption {
                key: identifier.clone(),
                value: format!(
                    "{} ({}%)",
                    identifier,
                    collateral_percentage(entry.supported_move)
                ),
            })
            .collect(),
    )
}
