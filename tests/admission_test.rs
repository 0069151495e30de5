//! End-to-end admission properties: quota monotonicity, rotation
//! uniqueness, and the TTL window for superseded tickets.

mod common;

use std::collections::HashSet;
use std::sync::Arc;

use common::test_retry_policies;
use tallyd::BallotConfig;
use tallyd::BallotError;
use tallyd::Error;
use tallyd::MemDurableStore;
use tallyd::MemFastStore;
use tallyd::TicketAuthority;
use tallyd::TicketError;

fn authority(quota: i64) -> TicketAuthority {
    let config = BallotConfig {
        ticket_quota: quota,
        ..BallotConfig::default()
    };
    TicketAuthority::new(
        Arc::new(MemDurableStore::new()),
        Arc::new(MemFastStore::new()),
        config,
        test_retry_policies().rotation,
    )
}

#[tokio::test]
async fn exactly_quota_consumptions_should_succeed() {
    let authority = authority(200);
    let token = authority.rotate().await.unwrap();

    for used in 1..=200 {
        authority
            .validate_and_consume(&token)
            .await
            .unwrap_or_else(|e| panic!("use {} should be admitted: {:?}", used, e));
    }

    // use 201 is the one that reports exhaustion
    let err = authority.validate_and_consume(&token).await.unwrap_err();
    assert!(matches!(
        err,
        Error::Ballot(BallotError::Ticket(TicketError::Exhausted(_)))
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_consumers_should_admit_exactly_quota_votes() {
    let authority = Arc::new(authority(200));
    let token = authority.rotate().await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..300 {
        let authority = authority.clone();
        let token = token.clone();
        handles.push(tokio::spawn(async move {
            authority.validate_and_consume(&token).await.is_ok()
        }));
    }

    let mut admitted = 0;
    for handle in handles {
        if handle.await.unwrap() {
            admitted += 1;
        }
    }

    assert_eq!(admitted, 200);
}

#[tokio::test]
async fn rotations_should_always_publish_a_fresh_token() {
    let authority = authority(200);

    let mut seen = HashSet::new();
    for _ in 0..50 {
        let token = authority.rotate().await.unwrap();
        let current = authority.current().expect("current must follow rotate");
        assert_eq!(current.as_str(), token);
        assert!(!token.is_empty());
        assert!(seen.insert(token));
    }
}

#[tokio::test]
async fn superseded_ticket_should_be_consumable_until_its_window_ends() {
    let authority = authority(200);
    let old_token = authority.rotate().await.unwrap();
    let _new_token = authority.rotate().await.unwrap();

    // still inside the old ticket's TTL window
    authority.validate_and_consume(&old_token).await.unwrap();
}
