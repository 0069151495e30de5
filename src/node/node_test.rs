use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::sleep;

use super::*;
use crate::DurableStore;
use crate::FastStore;
use crate::MemDurableStore;
use crate::MemFastStore;
use crate::Settings;
use crate::StrategyKind;

fn test_settings() -> Settings {
    let mut settings = Settings::default();
    settings.ballot.strategy = StrategyKind::Cached;
    settings.ballot.rotation_interval_ms = 10_000;
    settings.ballot.flush_interval_ms = 25;
    settings.ballot.shutdown_grace_ms = 5;
    settings
}

async fn started_node(
    durable: Arc<MemDurableStore>,
    fast: Arc<MemFastStore>,
) -> (
    Arc<Node>,
    watch::Sender<()>,
    tokio::task::JoinHandle<crate::Result<()>>,
) {
    let (shutdown_tx, shutdown_rx) = watch::channel(());
    let node = Arc::new(
        NodeBuilder::new(test_settings(), shutdown_rx)
            .durable_store(durable)
            .fast_store(fast)
            .build()
            .await
            .unwrap(),
    );

    let run_handle = {
        let node = node.clone();
        tokio::spawn(async move { node.run().await })
    };

    // wait for readiness
    for _ in 0..100 {
        if node.server_is_ready() {
            break;
        }
        sleep(Duration::from_millis(5)).await;
    }
    assert!(node.server_is_ready());

    (node, shutdown_tx, run_handle)
}

#[tokio::test]
async fn node_should_rotate_a_ticket_before_reporting_ready() {
    let durable = Arc::new(MemDurableStore::new());
    let fast = Arc::new(MemFastStore::new());
    let (node, shutdown_tx, run_handle) = started_node(durable, fast).await;

    let ticket = node.ticket_authority().current();
    assert!(ticket.is_some());
    assert_eq!(ticket.unwrap().len(), 10);

    shutdown_tx.send(()).unwrap();
    run_handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn cached_votes_should_reach_the_durable_store_via_reconciliation() {
    let durable = Arc::new(MemDurableStore::new());
    let fast = Arc::new(MemFastStore::new());
    durable.seed_participant("alice", 0);

    let (node, shutdown_tx, run_handle) = started_node(durable.clone(), fast).await;

    let counter = node.vote_counter();
    for _ in 0..8 {
        counter.increment("alice").await.unwrap();
    }

    // give the reconciliation loop a few ticks
    for _ in 0..100 {
        let alice = durable.get_participant("alice").await.unwrap().unwrap();
        if alice.votes == 8 {
            break;
        }
        sleep(Duration::from_millis(10)).await;
    }
    let alice = durable.get_participant("alice").await.unwrap().unwrap();
    assert_eq!(alice.votes, 8);

    shutdown_tx.send(()).unwrap();
    run_handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn shutdown_should_drain_unflushed_votes_and_purge_state() {
    let durable = Arc::new(MemDurableStore::new());
    let fast = Arc::new(MemFastStore::new());
    durable.seed_participant("alice", 0);

    let (node, shutdown_tx, run_handle) = started_node(durable.clone(), fast.clone()).await;

    let counter = node.vote_counter();
    for _ in 0..5 {
        counter.increment("alice").await.unwrap();
    }

    // terminate immediately; the drain must still fold the deltas
    shutdown_tx.send(()).unwrap();
    run_handle.await.unwrap().unwrap();

    let alice = durable.get_participant("alice").await.unwrap().unwrap();
    assert_eq!(alice.votes, 5);

    // the namespace is gone, ticket table included
    assert!(fast.scan_prefix("tally:").await.unwrap().is_empty());
}
