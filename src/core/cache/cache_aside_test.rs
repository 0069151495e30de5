use std::sync::Arc;
use std::time::Duration;

use super::*;
use crate::BackoffPolicy;
use crate::BallotError;
use crate::CacheConfig;
use crate::DistributedLock;
use crate::Error;
use crate::MemFastStore;
use crate::MockDurableStore;
use crate::Participant;
use crate::VoteError;

fn cache_config() -> CacheConfig {
    CacheConfig {
        read_ttl_ms: 3_000,
        singleflight_ttl_ms: 20,
        singleflight_retries: 2,
        singleflight_wait_ms: 1,
    }
}

fn participant(
    name: &str,
    votes: i64,
) -> Participant {
    Participant {
        name: name.to_string(),
        votes,
        version: 0,
    }
}

fn store_under_test(
    fast: Arc<MemFastStore>,
    durable: MockDurableStore,
) -> CacheAsideStore {
    let singleflight = DistributedLock::singleflight(
        fast.clone(),
        BackoffPolicy {
            max_retries: 0,
            deadline_ms: 100,
            min_delay_ms: 1,
            max_delay_ms: 2,
        },
    );
    CacheAsideStore::new(fast, Arc::new(durable), singleflight, cache_config())
}

#[tokio::test]
async fn miss_should_populate_cache_and_second_read_should_not_touch_durable() {
    let fast = Arc::new(MemFastStore::new());
    let mut durable = MockDurableStore::new();
    durable
        .expect_get_participant()
        .withf(|name| name == "alice")
        .times(1)
        .returning(|_| Ok(Some(participant("alice", 63_123))));

    let cache = store_under_test(fast.clone(), durable);

    assert_eq!(cache.get_votes("alice").await.unwrap(), 63_123);
    // served from the fast store this time; the mock would panic on a
    // second durable call
    assert_eq!(cache.get_votes("alice").await.unwrap(), 63_123);

    use crate::FastStore;
    assert_eq!(
        fast.get("tally:cache:votes:alice").await.unwrap(),
        Some("63123".to_string())
    );
}

#[tokio::test]
async fn unknown_participant_should_surface_not_found() {
    let fast = Arc::new(MemFastStore::new());
    let mut durable = MockDurableStore::new();
    durable
        .expect_get_participant()
        .returning(|_| Ok(None));

    let cache = store_under_test(fast, durable);

    let err = cache.get_votes("nobody").await.unwrap_err();
    assert!(matches!(
        err,
        Error::Ballot(BallotError::Vote(VoteError::NotFound(_)))
    ));
}

#[tokio::test]
async fn singleflight_loser_should_degrade_to_durable_read() {
    let fast = Arc::new(MemFastStore::new());
    // a stalled winner holds the singleflight lock and never fills the cache
    {
        use crate::FastStore;
        fast.set_if_absent("tally:sf:alice", "stalled-winner", Duration::from_secs(60))
            .await
            .unwrap();
    }

    let mut durable = MockDurableStore::new();
    durable
        .expect_get_participant()
        .withf(|name| name == "alice")
        .times(1)
        .returning(|_| Ok(Some(participant("alice", 7))));

    let cache = store_under_test(fast.clone(), durable);

    assert_eq!(cache.get_votes("alice").await.unwrap(), 7);

    // the degraded path must not have populated the cache
    use crate::FastStore;
    assert_eq!(fast.get("tally:cache:votes:alice").await.unwrap(), None);
}

#[tokio::test]
async fn warm_should_prime_all_known_participants() {
    let fast = Arc::new(MemFastStore::new());
    let mut durable = MockDurableStore::new();
    durable
        .expect_list_participant_names()
        .times(1)
        .returning(|| Ok(vec!["alice".to_string(), "bob".to_string()]));
    durable
        .expect_get_participant()
        .times(2)
        .returning(|name| Ok(Some(participant(name, 10))));

    let cache = store_under_test(fast, durable);

    assert_eq!(cache.warm().await.unwrap(), 2);
    // both reads are now cache hits; the mock allows no further calls
    assert_eq!(cache.get_votes("alice").await.unwrap(), 10);
    assert_eq!(cache.get_votes("bob").await.unwrap(), 10);
}
