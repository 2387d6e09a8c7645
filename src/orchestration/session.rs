//! Async driver that feeds fetch completions back into the resolution coordinator.
//!
//! Everything runs on the caller's task: queued requests become futures in a single
//! `FuturesUnordered`, and each completed future is delivered as an event before the next
//! attempt. No engine state is shared across tasks.

use crate::datasource::ChainReader;
use crate::domain::{Address, Position, ReadKey};
use crate::engine::{EngineEvent, FetchRequest, ResolutionCoordinator, ResolutionError, Verdict};
use futures::future::BoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use futures::FutureExt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Resolution(#[from] ResolutionError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    Resolved(Vec<Position>),
    /// Nothing is in flight but failed reads keep the cycle incomplete.
    Stalled { failed: Vec<ReadKey> },
}

/// Resolution session bound to one account at a time.
pub struct PositionSession {
    reader: Arc<dyn ChainReader>,
    explorer_prefix: String,
    coordinator: ResolutionCoordinator,
    in_flight: FuturesUnordered<BoxFuture<'static, EngineEvent>>,
}

impl PositionSession {
    pub fn new(reader: Arc<dyn ChainReader>, account: Address, explorer_prefix: String) -> Self {
        Self {
            coordinator: ResolutionCoordinator::new(account, explorer_prefix.clone()),
            reader,
            explorer_prefix,
            in_flight: FuturesUnordered::new(),
        }
    }

    pub fn account(&self) -> &Address {
        self.coordinator.account()
    }

    pub fn coordinator(&self) -> &ResolutionCoordinator {
        &self.coordinator
    }

    /// Latest complete output, if any.
    pub fn positions(&self) -> Option<&[Position]> {
        self.coordinator.output()
    }

    /// Discard every cache and in-flight fetch of the current account and start over.
    pub fn switch_account(&mut self, account: Address) {
        info!(
            "Switching account from {} to {}; dropping {} in-flight fetches",
            self.coordinator.account(),
            account,
            self.in_flight.len()
        );
        self.in_flight = FuturesUnordered::new();
        self.coordinator = ResolutionCoordinator::new(account, self.explorer_prefix.clone());
    }

    /// Feed one event from an outside source (e.g. a push notification).
    pub fn deliver(&mut self, event: EngineEvent) -> bool {
        self.coordinator.deliver(event)
    }

    /// Drive the coordinator until it completes, fails, or stalls on failed reads.
    ///
    /// There is no timeout: a read that never settles keeps this future pending. Dropping
    /// the future is safe; in-flight fetches are kept and picked up by the next call.
    pub async fn resolve(&mut self) -> Result<SessionOutcome, SessionError> {
        loop {
            let progress = match self.coordinator.attempt() {
                Verdict::Complete => {
                    let positions = self.coordinator.output().unwrap_or_default().to_vec();
                    return Ok(SessionOutcome::Resolved(positions));
                }
                Verdict::Failed(err) => return Err(err.into()),
                Verdict::Incomplete(progress) => progress,
            };

            for request in self.coordinator.take_requests() {
                self.in_flight.push(fetch(self.reader.clone(), request));
            }
            debug!(
                "Attempt {} incomplete: {:?}, {} in flight",
                self.coordinator.attempts(),
                progress,
                self.in_flight.len()
            );

            // registering sources is itself a change; re-evaluate before waiting
            if progress.registered > 0 {
                continue;
            }

            match self.in_flight.next().await {
                Some(event) => {
                    self.coordinator.deliver(event);
                }
                None => {
                    let failed = self.coordinator.memo().failed_keys();
                    warn!(
                        "Resolution stalled for account={} with {} failed reads",
                        self.coordinator.account(),
                        failed.len()
                    );
                    return Ok(SessionOutcome::Stalled { failed });
                }
            }
        }
    }
}

fn fetch(reader: Arc<dyn ChainReader>, request: FetchRequest) -> BoxFuture<'static, EngineEvent> {
    async move {
        match request {
            FetchRequest::Discover { account } => {
                let result = reader.registered_sources(&account).await;
                EngineEvent::SourcesDiscovered { account, result }
            }
            FetchRequest::Read { account, key } => {
                let result = reader.read(&key).await;
                EngineEvent::ReadCompleted {
                    account,
                    key,
                    result,
                }
            }
        }
    }
    .boxed()
}
