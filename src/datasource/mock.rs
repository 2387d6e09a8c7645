//! Mock chain reader for testing without network calls.

use super::{ChainReader, DataSourceError};
use crate::domain::{Address, RawValue, ReadKey};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone)]
enum MockOutcome<T> {
    Ready(T),
    Delayed(T, Duration),
    Fail(DataSourceError),
    Never,
}

impl<T: Clone> MockOutcome<T> {
    async fn resolve(&self) -> Result<T, DataSourceError> {
        match self {
            MockOutcome::Ready(value) => Ok(value.clone()),
            MockOutcome::Delayed(value, delay) => {
                tokio::time::sleep(*delay).await;
                Ok(value.clone())
            }
            MockOutcome::Fail(err) => Err(err.clone()),
            MockOutcome::Never => futures::future::pending().await,
        }
    }
}

/// Mock chain reader that returns predefined test data and counts fetches.
///
/// Accounts without configured sources discover an empty set. Reads without a configured
/// value fail, so a missing fixture shows up as an error rather than a hang.
#[derive(Debug, Clone, Default)]
pub struct MockChainReader {
    sources: HashMap<Address, MockOutcome<Vec<Address>>>,
    reads: HashMap<ReadKey, MockOutcome<RawValue>>,
    discovery_calls: Arc<Mutex<HashMap<Address, usize>>>,
    read_calls: Arc<Mutex<HashMap<ReadKey, usize>>>,
}

impl MockChainReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the contracts discovered for `account`.
    pub fn with_sources(mut self, account: &Address, sources: Vec<Address>) -> Self {
        self.sources
            .insert(account.clone(), MockOutcome::Ready(sources));
        self
    }

    pub fn with_sources_delayed(
        mut self,
        account: &Address,
        sources: Vec<Address>,
        delay: Duration,
    ) -> Self {
        self.sources
            .insert(account.clone(), MockOutcome::Delayed(sources, delay));
        self
    }

    pub fn with_discovery_failure(mut self, account: &Address, err: DataSourceError) -> Self {
        self.sources.insert(account.clone(), MockOutcome::Fail(err));
        self
    }

    pub fn with_discovery_never(mut self, account: &Address) -> Self {
        self.sources.insert(account.clone(), MockOutcome::Never);
        self
    }

    pub fn with_value(mut self, key: ReadKey, value: RawValue) -> Self {
        self.reads.insert(key, MockOutcome::Ready(value));
        self
    }

    pub fn with_delayed_value(mut self, key: ReadKey, value: RawValue, delay: Duration) -> Self {
        self.reads.insert(key, MockOutcome::Delayed(value, delay));
        self
    }

    pub fn with_failure(mut self, key: ReadKey, err: DataSourceError) -> Self {
        self.reads.insert(key, MockOutcome::Fail(err));
        self
    }

    /// The read stays in flight forever.
    pub fn with_never(mut self, key: ReadKey) -> Self {
        self.reads.insert(key, MockOutcome::Never);
        self
    }

    /// Configure name, totalSupply (wei) and balanceOf(holder) (wei) for one contract.
    pub fn with_token(
        self,
        source: &Address,
        holder: &Address,
        name: &str,
        total_supply_wei: &str,
        balance_wei: &str,
    ) -> Self {
        self.with_value(ReadKey::name(source), RawValue::text(name))
            .with_value(ReadKey::total_supply(source), RawValue::uint(total_supply_wei))
            .with_value(ReadKey::balance_of(source, holder), RawValue::uint(balance_wei))
    }

    pub fn discovery_calls(&self, account: &Address) -> usize {
        self.discovery_calls
            .lock()
            .map(|calls| calls.get(account).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    pub fn read_calls(&self, key: &ReadKey) -> usize {
        self.read_calls
            .lock()
            .map(|calls| calls.get(key).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    pub fn total_read_calls(&self) -> usize {
        self.read_calls
            .lock()
            .map(|calls| calls.values().sum())
            .unwrap_or(0)
    }
}

#[async_trait]
impl ChainReader for MockChainReader {
    async fn registered_sources(&self, account: &Address) -> Result<Vec<Address>, DataSourceError> {
        if let Ok(mut calls) = self.discovery_calls.lock() {
            *calls.entry(account.clone()).or_default() += 1;
        }
        match self.sources.get(account) {
            Some(outcome) => outcome.resolve().await,
            None => Ok(Vec::new()),
        }
    }

    async fn read(&self, key: &ReadKey) -> Result<RawValue, DataSourceError> {
        if let Ok(mut calls) = self.read_calls.lock() {
            *calls.entry(key.clone()).or_default() += 1;
        }
        match self.reads.get(key) {
            Some(outcome) => outcome.resolve().await,
            None => Err(DataSourceError::Other(format!("no mock value for {}", key))),
        }
    }
}
