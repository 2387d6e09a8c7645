//! Output record consumed by the presentation layer.

use serde::{Deserialize, Serialize};

/// Contract address with its block-explorer link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressLink {
    pub display: String,
    pub link: String,
}

/// Which leg of the position an exposure row describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExposureKind {
    /// The short side carried by the token facility.
    TokenFacility,
    /// The long side carried by held tokens.
    Tokens,
    /// Net of the two.
    NetExposure,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExposureItems {
    pub direction: String,
    pub total_exposure: String,
    pub your_exposure: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exposure {
    #[serde(rename = "type")]
    pub kind: ExposureKind,
    pub items: ExposureItems,
}

/// One fully-resolved sponsor position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub address: AddressLink,
    pub token_name: String,
    pub total_supply: String,
    pub your_supply: String,
    pub net_exposure: String,
    pub liquidation_price: String,
    pub exposures: Vec<Exposure>,
}

impl Position {
    pub fn exposure(&self, kind: ExposureKind) -> Option<&ExposureItems> {
        self.exposures
            .iter()
            .find(|e| e.kind == kind)
            .map(|e| &e.items)
    }
}
