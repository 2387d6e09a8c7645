//! Chain reader abstraction for source discovery and contract reads.

use crate::domain::{Address, RawValue, ReadKey};
use async_trait::async_trait;
use std::fmt;

pub mod mock;
pub mod rpc;

pub use mock::MockChainReader;
pub use rpc::RpcChainReader;

/// Chain reader trait for the two external reads the engine depends on.
///
/// Implementations own transport concerns (retry/backoff, decoding); the engine only sees
/// completed values or errors.
#[async_trait]
pub trait ChainReader: Send + Sync + fmt::Debug {
    /// List the contracts registered for `account`.
    ///
    /// # Returns
    /// Contract addresses in registry order (duplicates allowed)
    async fn registered_sources(&self, account: &Address) -> Result<Vec<Address>, DataSourceError>;

    /// Perform a single contract read.
    async fn read(&self, key: &ReadKey) -> Result<RawValue, DataSourceError>;
}

/// Error type for chain reader operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSourceError {
    /// Network error (e.g., connection timeout, DNS failure)
    NetworkError(String),
    /// HTTP error (e.g., 429 rate limit, 5xx server error)
    HttpError { status: u16, message: String },
    /// JSON-RPC error object returned by the node
    RpcError { code: i64, message: String },
    /// Parsing error (invalid JSON or malformed ABI payload)
    ParseError(String),
    /// Rate limit exceeded (caller should implement backoff)
    RateLimited,
    Other(String),
}

impl fmt::Display for DataSourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSourceError::NetworkError(msg) => write!(f, "Network error: {}", msg),
            DataSourceError::HttpError { status, message } => {
                write!(f, "HTTP error {}: {}", status, message)
            }
            DataSourceError::RpcError { code, message } => {
                write!(f, "RPC error {}: {}", code, message)
            }
            DataSourceError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            DataSourceError::RateLimited => write!(f, "Rate limited"),
            DataSourceError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for DataSourceError {}
