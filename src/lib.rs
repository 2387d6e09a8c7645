pub mod api;
pub mod config;
pub mod datasource;
pub mod domain;
pub mod engine;
pub mod error;
pub mod orchestration;

pub use config::Config;
pub use datasource::{ChainReader, DataSourceError, MockChainReader, RpcChainReader};
pub use domain::{
    Address, Decimal, Exposure, ExposureKind, IdentifierConfig, IdentifierOption, Operation,
    Position, RawValue, ReadKey, TokenAmount,
};
pub use engine::{EngineEvent, ResolutionCoordinator, Verdict};
pub use error::AppError;
pub use orchestration::{PositionSession, SessionOutcome};
