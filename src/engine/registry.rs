//! Source registry: the growing set of contracts registered for one account.

use crate::datasource::DataSourceError;
use crate::domain::Address;
use chrono::{DateTime, Utc};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Membership {
    /// Returned by discovery but not yet registered with the coordinator.
    Discovering,
    Known,
}

/// A discovered contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataSource {
    pub address: Address,
    pub discovered_at: DateTime<Utc>,
    pub membership: Membership,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
enum Discovery {
    #[default]
    NotIssued,
    InFlight,
    Settled,
    Failed(DataSourceError),
}

/// Monotone set of sources guarded by a frozen flag.
///
/// Sources are only ever added; once the discovery call settles the set is frozen and
/// later discovery results are dropped.
#[derive(Debug, Default)]
pub struct SourceRegistry {
    sources: Vec<DataSource>,
    seen: HashSet<Address>,
    discovery: Discovery,
    discovery_requested: bool,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the discovery call if it has not been issued yet.
    pub fn ensure_discovery_issued(&mut self) -> bool {
        if self.discovery != Discovery::NotIssued {
            return false;
        }
        self.discovery = Discovery::InFlight;
        self.discovery_requested = true;
        true
    }

    /// Drain the pending discovery request, if any.
    pub fn take_discovery_request(&mut self) -> bool {
        std::mem::take(&mut self.discovery_requested)
    }

    /// Record the result of the discovery call. Returns false if the set was already settled.
    pub fn record_discovery(&mut self, result: Result<Vec<Address>, DataSourceError>) -> bool {
        if self.discovery != Discovery::InFlight {
            return false;
        }
        match result {
            Ok(addresses) => {
                let now = Utc::now();
                for address in addresses {
                    if self.seen.insert(address.clone()) {
                        self.sources.push(DataSource {
                            address,
                            discovered_at: now,
                            membership: Membership::Discovering,
                        });
                    }
                }
                self.discovery = Discovery::Settled;
            }
            Err(err) => self.discovery = Discovery::Failed(err),
        }
        true
    }

    /// Promote every discovering source to known; returns how many were promoted.
    pub fn admit_discovering(&mut self) -> usize {
        let mut admitted = 0;
        for source in self
            .sources
            .iter_mut()
            .filter(|s| s.membership == Membership::Discovering)
        {
            source.membership = Membership::Known;
            admitted += 1;
        }
        admitted
    }

    pub fn known_sources(&self) -> impl Iterator<Item = &DataSource> {
        self.sources
            .iter()
            .filter(|s| s.membership == Membership::Known)
    }

    pub fn discovering_count(&self) -> usize {
        self.sources
            .iter()
            .filter(|s| s.membership == Membership::Discovering)
            .count()
    }

    pub fn is_frozen(&self) -> bool {
        self.discovery == Discovery::Settled
    }

    /// The discovery call resolved and every discovered source is registered.
    pub fn all_known(&self) -> bool {
        self.is_frozen() && self.discovering_count() == 0
    }

    pub fn failure(&self) -> Option<&DataSourceError> {
        match &self.discovery {
            Discovery::Failed(err) => Some(err),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}
