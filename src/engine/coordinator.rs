//! Resolution coordinator: the fixed-point evaluator over discovered sources and reads.
//!
//! The coordinator never waits. Each [`ResolutionCoordinator::attempt`] inspects what is
//! known, queues any reads it has not asked for yet, and either completes or reports
//! incomplete. Completed fetches come back through [`ResolutionCoordinator::deliver`] and
//! the caller attempts again.

use super::aggregate::{aggregate, SourceReads};
use super::memo::{CallMemoizer, ReadEntry};
use super::registry::SourceRegistry;
use crate::datasource::DataSourceError;
use crate::domain::{Address, Position, RawValue, ReadKey};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    #[error("source discovery failed: {0}")]
    SourceDiscovery(DataSourceError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    DiscoveringSources,
    Reading,
    Complete,
    Failed,
}

/// Outgoing fetch queued by an attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchRequest {
    Discover { account: Address },
    Read { account: Address, key: ReadKey },
}

/// Completed fetch, tagged with the account it was issued for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    SourcesDiscovered {
        account: Address,
        result: Result<Vec<Address>, DataSourceError>,
    },
    ReadCompleted {
        account: Address,
        key: ReadKey,
        result: Result<RawValue, DataSourceError>,
    },
}

impl EngineEvent {
    pub fn account(&self) -> &Address {
        match self {
            EngineEvent::SourcesDiscovered { account, .. } => account,
            EngineEvent::ReadCompleted { account, .. } => account,
        }
    }
}

/// Snapshot of an incomplete attempt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Progress {
    pub discovery_settled: bool,
    pub known_sources: usize,
    /// Sources registered by this attempt.
    pub registered: usize,
    pub pending_reads: usize,
    pub failed_reads: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Incomplete(Progress),
    /// Positions are available from [`ResolutionCoordinator::output`].
    Complete,
    Failed(ResolutionError),
}

/// Reads every position depends on.
pub fn required_reads(source: &Address, account: &Address) -> [ReadKey; 3] {
    [
        ReadKey::name(source),
        ReadKey::total_supply(source),
        ReadKey::balance_of(source, account),
    ]
}

/// One resolution cycle for one account.
#[derive(Debug)]
pub struct ResolutionCoordinator {
    account: Address,
    explorer_prefix: String,
    registry: SourceRegistry,
    memo: CallMemoizer,
    phase: Phase,
    output: Option<Vec<Position>>,
    attempts: usize,
    aggregation_runs: usize,
}

impl ResolutionCoordinator {
    pub fn new(account: Address, explorer_prefix: impl Into<String>) -> Self {
        Self {
            registry: SourceRegistry::new(),
            account,
            explorer_prefix: explorer_prefix.into(),
            memo: CallMemoizer::new(),
            phase: Phase::DiscoveringSources,
            output: None,
            attempts: 0,
            aggregation_runs: 0,
        }
    }

    pub fn account(&self) -> &Address {
        &self.account
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Positions once complete; `None` while incomplete or failed.
    pub fn output(&self) -> Option<&[Position]> {
        self.output.as_deref()
    }

    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    pub fn memo(&self) -> &CallMemoizer {
        &self.memo
    }

    pub fn attempts(&self) -> usize {
        self.attempts
    }

    pub fn aggregation_runs(&self) -> usize {
        self.aggregation_runs
    }

    /// Run one evaluation step.
    pub fn attempt(&mut self) -> Verdict {
        match self.phase {
            Phase::Complete => return Verdict::Complete,
            Phase::Failed => {
                if let Some(err) = self.registry.failure() {
                    return Verdict::Failed(ResolutionError::SourceDiscovery(err.clone()));
                }
            }
            Phase::DiscoveringSources | Phase::Reading => {}
        }
        self.attempts += 1;

        if self.registry.ensure_discovery_issued() {
            debug!("Issuing source discovery for account={}", self.account);
        }
        if let Some(err) = self.registry.failure() {
            warn!("Source discovery failed for account={}: {}", self.account, err);
            self.phase = Phase::Failed;
            return Verdict::Failed(ResolutionError::SourceDiscovery(err.clone()));
        }

        let registered = self.registry.admit_discovering();
        if registered > 0 {
            debug!(
                "Registered {} new sources for account={}",
                registered, self.account
            );
        }

        let mut pending_reads = 0;
        let mut failed_reads = 0;
        let mut known_sources = 0;
        for source in self.registry.known_sources() {
            known_sources += 1;
            for key in required_reads(&source.address, &self.account) {
                match self.memo.read(&key) {
                    ReadEntry::Pending => pending_reads += 1,
                    // a failed read never resolves, so it blocks completion
                    ReadEntry::Failed(_) => failed_reads += 1,
                    ReadEntry::Resolved(_) => {}
                }
            }
        }

        let discovery_settled = self.registry.all_known() && registered == 0;
        if discovery_settled && pending_reads == 0 && failed_reads == 0 {
            if let Some(positions) = self.aggregate_resolved() {
                info!(
                    "Resolved {} positions for account={} after {} attempts",
                    positions.len(),
                    self.account,
                    self.attempts
                );
                self.output = Some(positions);
                self.aggregation_runs += 1;
                self.phase = Phase::Complete;
                return Verdict::Complete;
            }
        }

        if self.registry.is_frozen() {
            self.phase = Phase::Reading;
        }
        Verdict::Incomplete(Progress {
            discovery_settled,
            known_sources,
            registered,
            pending_reads,
            failed_reads,
        })
    }

    fn aggregate_resolved(&self) -> Option<Vec<Position>> {
        let reads = self
            .registry
            .known_sources()
            .map(|source| {
                let [name, total_supply, balance] = required_reads(&source.address, &self.account);
                Some(SourceReads {
                    address: &source.address,
                    name: self.memo.get(&name)?.resolved()?,
                    total_supply: self.memo.get(&total_supply)?.resolved()?,
                    balance: self.memo.get(&balance)?.resolved()?,
                })
            })
            .collect::<Option<Vec<_>>>()?;
        Some(aggregate(&self.explorer_prefix, reads))
    }

    /// Apply a completed fetch. Events for another account are ignored.
    ///
    /// Returns true if the event changed engine state.
    pub fn deliver(&mut self, event: EngineEvent) -> bool {
        if event.account() != &self.account {
            debug!(
                "Dropping stale event for account={} (active account={})",
                event.account(),
                self.account
            );
            return false;
        }
        match event {
            EngineEvent::SourcesDiscovered { result, .. } => {
                if let Ok(sources) = &result {
                    debug!("Discovered {} sources for account={}", sources.len(), self.account);
                }
                self.registry.record_discovery(result)
            }
            EngineEvent::ReadCompleted { key, result, .. } => {
                if let Err(err) = &result {
                    warn!("Read {} failed: {}", key, err);
                }
                self.memo.complete(&key, result)
            }
        }
    }

    /// Drain fetches queued by previous attempts.
    pub fn take_requests(&mut self) -> Vec<FetchRequest> {
        let mut requests = Vec::new();
        if self.registry.take_discovery_request() {
            requests.push(FetchRequest::Discover {
                account: self.account.clone(),
            });
        }
        requests.extend(self.memo.take_issued().into_iter().map(|key| FetchRequest::Read {
            account: self.account.clone(),
            key,
        }));
        requests
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(n: u8) -> Address {
        Address::new(format!("0x{:040x}", n))
    }

    fn discovered(account: &Address, sources: Vec<Address>) -> EngineEvent {
        EngineEvent::SourcesDiscovered {
            account: account.clone(),
            result: Ok(sources),
        }
    }

    #[test]
    fn test_first_attempt_issues_discovery_only() {
        let mut coordinator = ResolutionCoordinator::new(addr(1), "https://etherscan.io");
        let verdict = coordinator.attempt();
        assert!(matches!(verdict, Verdict::Incomplete(p) if !p.discovery_settled));
        assert_eq!(
            coordinator.take_requests(),
            vec![FetchRequest::Discover { account: addr(1) }]
        );
        assert_eq!(coordinator.phase(), Phase::DiscoveringSources);
        assert!(coordinator.output().is_none());
    }

    #[test]
    fn test_registration_attempt_is_incomplete_and_issues_reads() {
        let account = addr(1);
        let mut coordinator = ResolutionCoordinator::new(account.clone(), "https://etherscan.io");
        coordinator.attempt();
        coordinator.take_requests();
        assert!(coordinator.deliver(discovered(&account, vec![addr(2)])));

        match coordinator.attempt() {
            Verdict::Incomplete(progress) => {
                assert_eq!(progress.registered, 1);
                assert_eq!(progress.known_sources, 1);
                assert_eq!(progress.pending_reads, 3);
            }
            other => panic!("expected incomplete, got {:?}", other),
        }
        assert_eq!(coordinator.phase(), Phase::Reading);
        assert_eq!(coordinator.take_requests().len(), 3);
    }

    #[test]
    fn test_empty_discovery_completes_immediately() {
        let account = addr(1);
        let mut coordinator = ResolutionCoordinator::new(account.clone(), "https://etherscan.io");
        coordinator.attempt();
        coordinator.deliver(discovered(&account, vec![]));
        assert_eq!(coordinator.attempt(), Verdict::Complete);
        assert_eq!(coordinator.output(), Some(&[][..]));
        assert_eq!(coordinator.aggregation_runs(), 1);
    }

    #[test]
    fn test_discovery_failure_is_terminal() {
        let account = addr(1);
        let mut coordinator = ResolutionCoordinator::new(account.clone(), "https://etherscan.io");
        coordinator.attempt();
        coordinator.deliver(EngineEvent::SourcesDiscovered {
            account: account.clone(),
            result: Err(DataSourceError::RateLimited),
        });
        let expected = Verdict::Failed(ResolutionError::SourceDiscovery(
            DataSourceError::RateLimited,
        ));
        assert_eq!(coordinator.attempt(), expected);
        assert_eq!(coordinator.attempt(), expected);
        assert_eq!(coordinator.phase(), Phase::Failed);
        assert!(coordinator.output().is_none());
    }

    #[test]
    fn test_stale_account_event_ignored() {
        let mut coordinator = ResolutionCoordinator::new(addr(1), "https://etherscan.io");
        coordinator.attempt();
        assert!(!coordinator.deliver(discovered(&addr(7), vec![addr(2)])));
        assert!(coordinator.registry().is_empty());
    }
}
