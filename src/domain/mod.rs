//! Domain types for the sponsor position view.
//!
//! This module provides:
//! - Lossless fixed-point handling via the Decimal wrapper
//! - Full-width token amounts
//! - Address primitive and contract read keys
//! - Position output records and identifier configuration

pub mod amount;
pub mod decimal;
pub mod identifier;
pub mod position;
pub mod primitives;
pub mod read;

pub use amount::{TokenAmount, DISPLAY_DECIMALS};
pub use decimal::{Decimal, DecimalError};
pub use identifier::{IdentifierConfig, IdentifierConfigError, IdentifierEntry, IdentifierOption};
pub use position::{AddressLink, Exposure, ExposureItems, ExposureKind, Position};
pub use primitives::{Address, AddressParseError};
pub use read::{Operation, RawValue, ReadKey};
