use std::sync::Arc;
use std::time::Duration;

use super::*;
use crate::BallotError;
use crate::DurableStore;
use crate::Error;
use crate::FastStore;
use crate::StrategyKind;
use crate::MemDurableStore;
use crate::MemFastStore;
use crate::MockDurableStore;
use crate::Participant;
use crate::RetryPolicies;
use crate::VoteError;

fn strategy_under_test(
    kind: StrategyKind,
    durable: Arc<dyn DurableStore>,
    fast: Arc<dyn FastStore>,
) -> Arc<dyn IncrementStrategy> {
    let mut retry = RetryPolicies::default();
    retry.optimistic.min_delay_ms = 1;
    retry.optimistic.max_delay_ms = 2;
    retry.lock.min_delay_ms = 1;
    retry.lock.max_delay_ms = 2;
    build_strategy(kind, durable, fast, &retry, Duration::from_millis(50))
}

#[tokio::test]
async fn durable_strategies_should_count_one_vote_per_call() {
    for kind in [
        StrategyKind::Direct,
        StrategyKind::Optimistic,
        StrategyKind::LockGuarded,
    ] {
        let durable = Arc::new(MemDurableStore::new());
        let fast = Arc::new(MemFastStore::new());
        durable.seed_participant("alice", 0);

        let strategy = strategy_under_test(kind, durable.clone(), fast);
        for _ in 0..5 {
            strategy.increment("alice").await.unwrap();
        }

        let alice = durable.get_participant("alice").await.unwrap().unwrap();
        assert_eq!(alice.votes, 5, "strategy {:?}", kind);
    }
}

#[tokio::test]
async fn durable_strategies_should_reject_unknown_participant() {
    for kind in [
        StrategyKind::Direct,
        StrategyKind::Optimistic,
        StrategyKind::LockGuarded,
    ] {
        let durable = Arc::new(MemDurableStore::new());
        let fast = Arc::new(MemFastStore::new());

        let strategy = strategy_under_test(kind, durable, fast);
        let err = strategy.increment("nobody").await.unwrap_err();
        assert!(
            matches!(
                err,
                Error::Ballot(BallotError::Vote(VoteError::NotFound(_)))
            ),
            "strategy {:?}",
            kind
        );
    }
}

#[tokio::test]
async fn cached_strategy_should_only_touch_the_delta_key() {
    let fast = Arc::new(MemFastStore::new());
    // a mock with no expectations: any durable call panics
    let durable: Arc<dyn DurableStore> = Arc::new(MockDurableStore::new());

    let strategy = strategy_under_test(StrategyKind::Cached, durable, fast.clone());
    for _ in 0..3 {
        strategy.increment("alice").await.unwrap();
    }

    assert_eq!(
        fast.get("tally:votes:alice").await.unwrap(),
        Some("3".to_string())
    );
}

#[tokio::test]
async fn optimistic_should_surface_conflict_after_bounded_attempts() {
    let mut durable = MockDurableStore::new();
    durable.expect_get_participant().times(10).returning(|_| {
        Ok(Some(Participant {
            name: "alice".to_string(),
            votes: 1,
            version: 1,
        }))
    });
    // every attempt loses the version race
    durable
        .expect_conditional_update()
        .times(10)
        .returning(|_, _, _, _| Ok(0));

    let fast = Arc::new(MemFastStore::new());
    let strategy = strategy_under_test(StrategyKind::Optimistic, Arc::new(durable), fast);

    let err = strategy.increment("alice").await.unwrap_err();
    assert!(matches!(
        err,
        Error::Ballot(BallotError::Vote(VoteError::ConcurrencyConflict {
            attempts: 10,
            ..
        }))
    ));
}

#[tokio::test]
async fn lock_guarded_should_free_the_lock_after_each_call() {
    let durable = Arc::new(MemDurableStore::new());
    let fast = Arc::new(MemFastStore::new());
    durable.seed_participant("alice", 0);

    let strategy = strategy_under_test(StrategyKind::LockGuarded, durable, fast.clone());
    strategy.increment("alice").await.unwrap();

    // the per-participant lock key must be gone
    assert_eq!(fast.get("tally:lock:user:alice").await.unwrap(), None);
}

#[tokio::test]
async fn lock_guarded_should_release_even_when_the_statement_fails() {
    let durable = Arc::new(MemDurableStore::new());
    let fast = Arc::new(MemFastStore::new());

    let strategy = strategy_under_test(StrategyKind::LockGuarded, durable, fast.clone());
    assert!(strategy.increment("nobody").await.is_err());

    assert_eq!(fast.get("tally:lock:user:nobody").await.unwrap(), None);
}

#[tokio::test]
async fn concurrent_increments_should_never_lose_updates() {
    for kind in [
        StrategyKind::Direct,
        StrategyKind::Optimistic,
        StrategyKind::LockGuarded,
    ] {
        let durable = Arc::new(MemDurableStore::new());
        let fast = Arc::new(MemFastStore::new());
        durable.seed_participant("alice", 0);

        let strategy = strategy_under_test(kind, durable.clone(), fast);
        let mut handles = Vec::new();
        for _ in 0..50 {
            let strategy = strategy.clone();
            handles.push(tokio::spawn(async move {
                strategy.increment("alice").await
            }));
        }

        let mut succeeded = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                succeeded += 1;
            }
        }

        let alice = durable.get_participant("alice").await.unwrap().unwrap();
        assert_eq!(alice.votes, succeeded, "strategy {:?}", kind);
    }
}
