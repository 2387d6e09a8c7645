//! Resolution engine: registry, memoizer, fixed-point coordinator and the pure
//! transforms that feed the presentation layer.

pub mod aggregate;
pub mod coordinator;
pub mod identifiers;
pub mod memo;
pub mod registry;

pub use aggregate::{aggregate, build_position, SourceReads, AMOUNT_SENTINEL};
pub use coordinator::{
    required_reads, EngineEvent, FetchRequest, Phase, Progress, ResolutionCoordinator,
    ResolutionError, Verdict,
};
pub use identifiers::{collateral_percentage, identifier_options};
pub use memo::{CallMemoizer, ReadEntry};
pub use registry::{DataSource, Membership, SourceRegistry};
