use std::sync::Arc;
use std::time::Duration;

use super::*;
use crate::DurableStore;
use crate::FastStore;
use crate::MemDurableStore;
use crate::MemFastStore;
use crate::MockDurableStore;

fn reconciler_under_test(
    durable: Arc<dyn DurableStore>,
    fast: Arc<dyn FastStore>,
) -> Reconciler {
    Reconciler::new(durable, fast, Duration::from_millis(50))
}

#[tokio::test]
async fn tick_should_fold_deltas_into_durable_totals() {
    let durable = Arc::new(MemDurableStore::new());
    let fast = Arc::new(MemFastStore::new());
    durable.seed_participant("alice", 100);
    durable.seed_participant("bob", 0);
    fast.set("tally:votes:alice", "7", None).await.unwrap();
    fast.set("tally:votes:bob", "3", None).await.unwrap();

    let reconciler = reconciler_under_test(durable.clone(), fast.clone());
    let stats = reconciler.tick().await.unwrap();

    assert_eq!(stats.folded_names, 2);
    assert_eq!(stats.folded_votes, 10);
    assert_eq!(stats.failed_names, 0);

    let alice = durable.get_participant("alice").await.unwrap().unwrap();
    let bob = durable.get_participant("bob").await.unwrap().unwrap();
    assert_eq!(alice.votes, 107);
    assert_eq!(bob.votes, 3);

    // the deltas were decremented to zero, not deleted
    assert_eq!(
        fast.get("tally:votes:alice").await.unwrap(),
        Some("0".to_string())
    );
}

#[tokio::test]
async fn tick_should_be_idempotent_without_new_increments() {
    let durable = Arc::new(MemDurableStore::new());
    let fast = Arc::new(MemFastStore::new());
    durable.seed_participant("alice", 0);
    fast.set("tally:votes:alice", "5", None).await.unwrap();

    let reconciler = reconciler_under_test(durable.clone(), fast.clone());
    reconciler.tick().await.unwrap();
    let second = reconciler.tick().await.unwrap();

    assert_eq!(second.folded_names, 0);
    assert_eq!(second.folded_votes, 0);

    let alice = durable.get_participant("alice").await.unwrap().unwrap();
    assert_eq!(alice.votes, 5);
}

#[tokio::test]
async fn increments_landing_between_read_and_clear_should_survive() {
    let durable = Arc::new(MemDurableStore::new());
    let fast = Arc::new(MemFastStore::new());
    durable.seed_participant("alice", 0);
    fast.set("tally:votes:alice", "5", None).await.unwrap();

    let reconciler = reconciler_under_test(durable.clone(), fast.clone());
    reconciler.tick().await.unwrap();

    // a vote that arrives after the fold is a fresh delta
    fast.increment("tally:votes:alice").await.unwrap();
    let stats = reconciler.tick().await.unwrap();

    assert_eq!(stats.folded_votes, 1);
    let alice = durable.get_participant("alice").await.unwrap().unwrap();
    assert_eq!(alice.votes, 6);
}

#[tokio::test]
async fn failed_fold_should_keep_delta_for_next_tick() {
    let mut durable = MockDurableStore::new();
    durable
        .expect_list_participant_names()
        .returning(|| Ok(vec!["alice".to_string(), "bob".to_string()]));
    // alice's durable write fails; bob's succeeds
    durable
        .expect_additive_update()
        .withf(|name, _| name == "alice")
        .returning(|_, _| {
            Err(crate::StorageError::Unavailable("write failed".into()).into())
        });
    durable
        .expect_additive_update()
        .withf(|name, _| name == "bob")
        .returning(|_, _| Ok(()));

    let fast = Arc::new(MemFastStore::new());
    fast.set("tally:votes:alice", "4", None).await.unwrap();
    fast.set("tally:votes:bob", "2", None).await.unwrap();

    let reconciler = reconciler_under_test(Arc::new(durable), fast.clone());
    let stats = reconciler.tick().await.unwrap();

    assert_eq!(stats.folded_names, 1);
    assert_eq!(stats.failed_names, 1);

    // alice's delta is untouched because the clear only happens after a
    // successful durable write
    assert_eq!(
        fast.get("tally:votes:alice").await.unwrap(),
        Some("4".to_string())
    );
    assert_eq!(
        fast.get("tally:votes:bob").await.unwrap(),
        Some("0".to_string())
    );
}

#[tokio::test]
async fn missing_delta_keys_should_fold_nothing() {
    let durable = Arc::new(MemDurableStore::new());
    let fast = Arc::new(MemFastStore::new());
    durable.seed_participant("alice", 9);

    let reconciler = reconciler_under_test(durable.clone(), fast);
    let stats = reconciler.tick().await.unwrap();

    assert_eq!(stats, ReconcileStats::default());
    let alice = durable.get_participant("alice").await.unwrap().unwrap();
    assert_eq!(alice.votes, 9);
}
