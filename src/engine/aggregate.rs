//! Aggregation stage: resolved reads to position records.
//!
//! Pure functions; nothing here touches the memoizer or the registry.

use crate::domain::{
    Address, AddressLink, Exposure, ExposureItems, ExposureKind, Position, RawValue, TokenAmount,
    DISPLAY_DECIMALS,
};

/// Rendered in place of an amount that is missing or unparseable, so the defect is visible.
pub const AMOUNT_SENTINEL: &str = "-999999999";

// TODO: replace with a liquidation price derived from the contract's margin parameters.
pub const LIQUIDATION_PRICE_PLACEHOLDER: &str = "$14,000";

/// The three resolved reads behind one position.
#[derive(Debug, Clone, Copy)]
pub struct SourceReads<'a> {
    pub address: &'a Address,
    pub name: &'a RawValue,
    pub total_supply: &'a RawValue,
    pub balance: &'a RawValue,
}

fn sentinel() -> TokenAmount {
    TokenAmount::from_tokens(-999_999_999)
}

/// Token amount as displayed: wei converted to tokens and truncated to display precision,
/// or the sentinel for a falsy/unparseable read.
pub fn display_amount(raw: &RawValue) -> TokenAmount {
    if raw.is_falsy() {
        return sentinel();
    }
    raw.as_str()
        .and_then(|wei| TokenAmount::from_wei(wei).ok())
        .map(|amount| amount.truncate_to(DISPLAY_DECIMALS))
        .unwrap_or_else(sentinel)
}

pub fn explorer_link(explorer_prefix: &str, address: &Address) -> AddressLink {
    AddressLink {
        display: address.to_string(),
        link: format!(
            "{}/address/{}",
            explorer_prefix.trim_end_matches('/'),
            address
        ),
    }
}

fn exposure(kind: ExposureKind, direction: String, total: &str, yours: &str) -> Exposure {
    Exposure {
        kind,
        items: ExposureItems {
            direction,
            total_exposure: total.to_string(),
            your_exposure: yours.to_string(),
        },
    }
}

pub fn build_position(explorer_prefix: &str, reads: SourceReads<'_>) -> Position {
    let name = reads.name.as_str().unwrap_or_default().to_string();
    let total = display_amount(reads.total_supply);
    let yours = display_amount(reads.balance);
    // net is taken over the displayed amounts, sentinel included
    let net = &yours - &total;

    let total_supply = total.to_canonical_string();
    let your_supply = yours.to_canonical_string();
    let net_exposure = net.to_canonical_string();

    let exposures = vec![
        exposure(
            ExposureKind::TokenFacility,
            format!("Short {}", name),
            &total_supply,
            &total_supply,
        ),
        exposure(
            ExposureKind::Tokens,
            format!("Long {}", name),
            &total_supply,
            &your_supply,
        ),
        exposure(
            ExposureKind::NetExposure,
            "Flat Risk".to_string(),
            "",
            &net_exposure,
        ),
    ];

    Position {
        address: explorer_link(explorer_prefix, reads.address),
        token_name: name,
        total_supply,
        your_supply,
        net_exposure,
        liquidation_price: LIQUIDATION_PRICE_PLACEHOLDER.to_string(),
        exposures,
    }
}

pub fn aggregate<'a>(
    explorer_prefix: &str,
    sources: impl IntoIterator<Item = SourceReads<'a>>,
) -> Vec<Position> {
    sources
        .into_iter()
        .map(|reads| build_position(explorer_prefix, reads))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const WEI: &str = "000000000000000000";

    fn tokens(n: &str) -> RawValue {
        RawValue::uint(format!("{}{}", n, WEI))
    }

    fn addr() -> Address {
        Address::new("0x00000000000000000000000000000000000000aa".to_string())
    }

    #[test]
    fn test_build_position_rows() {
        let a = addr();
        let name = RawValue::text("Foo");
        let total = tokens("100");
        let balance = tokens("40");
        let position = build_position(
            "https://etherscan.io",
            SourceReads {
                address: &a,
                name: &name,
                total_supply: &total,
                balance: &balance,
            },
        );

        assert_eq!(position.token_name, "Foo");
        assert_eq!(position.total_supply, "100");
        assert_eq!(position.your_supply, "40");
        assert_eq!(position.net_exposure, "-60");
        assert_eq!(position.liquidation_price, "$14,000");
        assert_eq!(
            position.address.link,
            "https://etherscan.io/address/0x00000000000000000000000000000000000000aa"
        );

        let facility = position.exposure(ExposureKind::TokenFacility).unwrap();
        assert_eq!(facility.direction, "Short Foo");
        assert_eq!(facility.total_exposure, "100");
        assert_eq!(facility.your_exposure, "100");

        let long = position.exposure(ExposureKind::Tokens).unwrap();
        assert_eq!(long.direction, "Long Foo");
        assert_eq!(long.total_exposure, "100");
        assert_eq!(long.your_exposure, "40");

        let net = position.exposure(ExposureKind::NetExposure).unwrap();
        assert_eq!(net.direction, "Flat Risk");
        assert_eq!(net.total_exposure, "");
        assert_eq!(net.your_exposure, "-60");
    }

    #[test]
    fn test_display_amount_truncates_to_four_places() {
        // 1.23456789 tokens
        let raw = RawValue::uint("1234567890000000000");
        assert_eq!(display_amount(&raw).to_canonical_string(), "1.2345");
    }

    #[test]
    fn test_display_amount_zero_is_not_falsy() {
        assert_eq!(display_amount(&RawValue::uint("0")).to_canonical_string(), "0");
    }

    #[test]
    fn test_falsy_amount_renders_sentinel() {
        assert_eq!(display_amount(&RawValue::Null).to_canonical_string(), AMOUNT_SENTINEL);
        assert_eq!(display_amount(&RawValue::uint("")).to_canonical_string(), AMOUNT_SENTINEL);
        assert_eq!(
            display_amount(&RawValue::text("garbage")).to_canonical_string(),
            AMOUNT_SENTINEL
        );
    }

    #[test]
    fn test_sentinel_flows_into_net_exposure() {
        let a = addr();
        let name = RawValue::text("Foo");
        let balance = tokens("40");
        let position = build_position(
            "https://etherscan.io/",
            SourceReads {
                address: &a,
                name: &name,
                total_supply: &RawValue::Null,
                balance: &balance,
            },
        );
        assert_eq!(position.total_supply, AMOUNT_SENTINEL);
        assert_eq!(position.net_exposure, "1000000039");
        assert_eq!(
            position.address.link,
            "https://etherscan.io/address/0x00000000000000000000000000000000000000aa"
        );
    }

    #[test]
    fn test_amounts_past_rust_decimal_range_render_exactly() {
        let a = addr();
        let name = RawValue::text("Big");
        // 1e11 tokens
        let total = RawValue::uint("100000000000000000000000000000");
        // 2^200 wei
        let balance =
            RawValue::uint("1606938044258990275541962092341162602522202993782792835301376");
        let position = build_position(
            "https://etherscan.io",
            SourceReads {
                address: &a,
                name: &name,
                total_supply: &total,
                balance: &balance,
            },
        );
        assert_eq!(position.total_supply, "100000000000");
        assert_eq!(
            position.your_supply,
            "1606938044258990275541962092341162602522202.9937"
        );
        assert_eq!(
            position.net_exposure,
            "1606938044258990275541962092341062602522202.9937"
        );
    }
}
