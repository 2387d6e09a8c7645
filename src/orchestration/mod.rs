pub mod session;

pub use session::{PositionSession, SessionError, SessionOutcome};
