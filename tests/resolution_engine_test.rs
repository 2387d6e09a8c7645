use sponsor_positions::datasource::DataSourceError;
use sponsor_positions::engine::{
    required_reads, EngineEvent, FetchRequest, Phase, ReadEntry, ResolutionCoordinator, Verdict,
    AMOUNT_SENTINEL,
};
use sponsor_positions::{Address, ExposureKind, RawValue, ReadKey};

const EXPLORER: &str = "https://etherscan.io";

fn addr(n: u8) -> Address {
    Address::new(format!("0x{:040x}", n))
}

/// Whole-token amount as a wei string.
fn wei(tokens: &str) -> RawValue {
    RawValue::uint(format!("{}000000000000000000", tokens))
}

fn discover(coordinator: &mut ResolutionCoordinator, sources: Vec<Address>) {
    let account = coordinator.account().clone();
    coordinator.deliver(EngineEvent::SourcesDiscovered {
        account,
        result: Ok(sources),
    });
}

fn resolve(coordinator: &mut ResolutionCoordinator, key: ReadKey, value: RawValue) -> bool {
    let account = coordinator.account().clone();
    coordinator.deliver(EngineEvent::ReadCompleted {
        account,
        key,
        result: Ok(value),
    })
}

fn resolve_token(
    coordinator: &mut ResolutionCoordinator,
    source: &Address,
    name: &str,
    total: RawValue,
    balance: RawValue,
) {
    let account = coordinator.account().clone();
    let [name_key, total_key, balance_key] = required_reads(source, &account);
    resolve(coordinator, name_key, RawValue::text(name));
    resolve(coordinator, total_key, total);
    resolve(coordinator, balance_key, balance);
}

/// Attempt until sources are registered and reads have been queued.
fn settle_discovery(coordinator: &mut ResolutionCoordinator, sources: Vec<Address>) {
    coordinator.attempt();
    coordinator.take_requests();
    discover(coordinator, sources);
    coordinator.attempt();
}

#[test]
fn test_two_source_scenario_waits_for_last_read() {
    let account = addr(1);
    let a = addr(0xa);
    let b = addr(0xb);
    let mut coordinator = ResolutionCoordinator::new(account.clone(), EXPLORER);
    settle_discovery(&mut coordinator, vec![a.clone(), b.clone()]);

    resolve_token(&mut coordinator, &a, "Foo", wei("100"), wei("40"));
    resolve(&mut coordinator, ReadKey::name(&b), RawValue::text("Bar"));
    resolve(&mut coordinator, ReadKey::total_supply(&b), wei("50"));

    match coordinator.attempt() {
        Verdict::Incomplete(progress) => {
            assert!(progress.discovery_settled);
            assert_eq!(progress.known_sources, 2);
            assert_eq!(progress.pending_reads, 1);
            assert_eq!(progress.failed_reads, 0);
        }
        other => panic!("expected incomplete, got {:?}", other),
    }
    assert!(coordinator.output().is_none());

    resolve(&mut coordinator, ReadKey::balance_of(&b, &account), wei("10"));
    assert_eq!(coordinator.attempt(), Verdict::Complete);

    let positions = coordinator.output().unwrap();
    assert_eq!(positions.len(), 2);
    assert_eq!(positions[0].address.display, a.to_string());
    assert_eq!(positions[0].token_name, "Foo");
    assert_eq!(positions[0].net_exposure, "-60");
    assert_eq!(positions[1].token_name, "Bar");
    assert_eq!(positions[1].net_exposure, "-40");
    assert_eq!(
        positions[1].exposure(ExposureKind::Tokens).unwrap().your_exposure,
        "10"
    );
}

#[test]
fn test_reattempt_without_events_is_idempotent() {
    let account = addr(1);
    let a = addr(0xa);
    let mut coordinator = ResolutionCoordinator::new(account, EXPLORER);
    settle_discovery(&mut coordinator, vec![a.clone()]);

    let first = coordinator.attempt();
    let second = coordinator.attempt();
    assert_eq!(first, second);
    assert!(coordinator.take_requests().len() == 3);
    coordinator.attempt();
    assert!(coordinator.take_requests().is_empty());

    resolve_token(&mut coordinator, &a, "Foo", wei("1"), wei("1"));
    assert_eq!(coordinator.attempt(), Verdict::Complete);
    let output = coordinator.output().unwrap().to_vec();

    assert_eq!(coordinator.attempt(), Verdict::Complete);
    assert_eq!(coordinator.attempt(), Verdict::Complete);
    assert_eq!(coordinator.output().unwrap(), output.as_slice());
    assert_eq!(coordinator.aggregation_runs(), 1);
    assert!(coordinator.take_requests().is_empty());
}

#[test]
fn test_aggregation_runs_exactly_once_per_cycle() {
    let account = addr(1);
    let sources = vec![addr(0xa), addr(0xb), addr(0xc)];
    let mut coordinator = ResolutionCoordinator::new(account, EXPLORER);
    settle_discovery(&mut coordinator, sources.clone());

    for source in &sources {
        resolve_token(&mut coordinator, source, "T", wei("5"), wei("2"));
        coordinator.attempt();
    }
    for _ in 0..5 {
        coordinator.attempt();
    }
    assert_eq!(coordinator.phase(), Phase::Complete);
    assert_eq!(coordinator.aggregation_runs(), 1);
    assert_eq!(coordinator.output().unwrap().len(), 3);
}

#[test]
fn test_reads_never_revert_and_sources_only_grow() {
    let account = addr(1);
    let a = addr(0xa);
    let mut coordinator = ResolutionCoordinator::new(account.clone(), EXPLORER);
    settle_discovery(&mut coordinator, vec![a.clone()]);

    assert!(resolve(&mut coordinator, ReadKey::name(&a), RawValue::text("Foo")));
    assert!(!resolve(&mut coordinator, ReadKey::name(&a), RawValue::text("Other")));
    assert!(!coordinator.deliver(EngineEvent::ReadCompleted {
        account: account.clone(),
        key: ReadKey::name(&a),
        result: Err(DataSourceError::RateLimited),
    }));
    coordinator.attempt();
    assert_eq!(
        coordinator.memo().get(&ReadKey::name(&a)),
        Some(&ReadEntry::Resolved(RawValue::text("Foo")))
    );

    // discovery is frozen; a late result cannot add or remove sources
    discover(&mut coordinator, vec![addr(0xd)]);
    discover(&mut coordinator, vec![]);
    assert_eq!(coordinator.registry().len(), 1);
    assert!(coordinator.registry().is_frozen());
}

#[test]
fn test_null_total_supply_completes_with_sentinel() {
    let account = addr(1);
    let a = addr(0xa);
    let mut coordinator = ResolutionCoordinator::new(account, EXPLORER);
    settle_discovery(&mut coordinator, vec![a.clone()]);

    resolve_token(&mut coordinator, &a, "Foo", RawValue::Null, wei("40"));
    assert_eq!(coordinator.attempt(), Verdict::Complete);

    let position = &coordinator.output().unwrap()[0];
    assert_eq!(position.total_supply, AMOUNT_SENTINEL);
    assert_eq!(
        position.exposure(ExposureKind::TokenFacility).unwrap().total_exposure,
        AMOUNT_SENTINEL
    );
    assert_eq!(position.your_supply, "40");
}

#[test]
fn test_empty_discovery_is_terminal_once() {
    let mut coordinator = ResolutionCoordinator::new(addr(1), EXPLORER);
    coordinator.attempt();
    discover(&mut coordinator, vec![]);
    assert_eq!(coordinator.attempt(), Verdict::Complete);
    assert_eq!(coordinator.attempt(), Verdict::Complete);
    assert!(coordinator.output().unwrap().is_empty());
    assert_eq!(coordinator.aggregation_runs(), 1);
}

#[test]
fn test_reads_start_before_every_source_is_registered() {
    let account = addr(1);
    let mut coordinator = ResolutionCoordinator::new(account.clone(), EXPLORER);
    coordinator.attempt();
    assert_eq!(
        coordinator.take_requests(),
        vec![FetchRequest::Discover {
            account: account.clone()
        }]
    );
    discover(&mut coordinator, vec![addr(0xa), addr(0xb)]);

    // the registering attempt is incomplete but already queues every read
    assert!(matches!(coordinator.attempt(), Verdict::Incomplete(p) if p.registered == 2));
    let requests = coordinator.take_requests();
    assert_eq!(requests.len(), 6);
    assert!(requests.iter().all(|r| matches!(r, FetchRequest::Read { .. })));
}

#[test]
fn test_failed_read_blocks_completion() {
    let account = addr(1);
    let a = addr(0xa);
    let mut coordinator = ResolutionCoordinator::new(account.clone(), EXPLORER);
    settle_discovery(&mut coordinator, vec![a.clone()]);

    resolve(&mut coordinator, ReadKey::name(&a), RawValue::text("Foo"));
    resolve(&mut coordinator, ReadKey::total_supply(&a), wei("1"));
    coordinator.deliver(EngineEvent::ReadCompleted {
        account: account.clone(),
        key: ReadKey::balance_of(&a, &account),
        result: Err(DataSourceError::NetworkError("reset".to_string())),
    });

    for _ in 0..3 {
        match coordinator.attempt() {
            Verdict::Incomplete(progress) => {
                assert_eq!(progress.pending_reads, 0);
                assert_eq!(progress.failed_reads, 1);
            }
            other => panic!("expected incomplete, got {:?}", other),
        }
    }
    assert!(coordinator.output().is_none());
    assert_eq!(
        coordinator.memo().failed_keys(),
        vec![ReadKey::balance_of(&a, &account)]
    );
}

#[test]
fn test_events_from_previous_account_are_ignored() {
    let old_account = addr(1);
    let new_account = addr(2);
    let a = addr(0xa);

    let mut coordinator = ResolutionCoordinator::new(new_account.clone(), EXPLORER);
    coordinator.attempt();

    assert!(!coordinator.deliver(EngineEvent::SourcesDiscovered {
        account: old_account.clone(),
        result: Ok(vec![a.clone()]),
    }));
    assert!(!coordinator.deliver(EngineEvent::ReadCompleted {
        account: old_account.clone(),
        key: ReadKey::name(&a),
        result: Ok(RawValue::text("Stale")),
    }));
    assert!(coordinator.registry().is_empty());
    assert!(coordinator.memo().is_empty());

    discover(&mut coordinator, vec![]);
    assert_eq!(coordinator.attempt(), Verdict::Complete);
    assert!(coordinator.output().unwrap().is_empty());
}
