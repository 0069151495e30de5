use std::sync::Arc;
use std::time::Duration;

use tallyd::build_strategy;
use tallyd::BackoffPolicy;
use tallyd::CacheAsideStore;
use tallyd::CacheConfig;
use tallyd::DistributedLock;
use tallyd::MemDurableStore;
use tallyd::MemFastStore;
use tallyd::RetryPolicies;
use tallyd::StrategyKind;
use tallyd::VoteCounter;

/// Retry policies tightened for test runtimes: same bounds semantics,
/// millisecond-scale sleeps.
pub fn test_retry_policies() -> RetryPolicies {
    RetryPolicies {
        lock: BackoffPolicy {
            max_retries: 0,
            deadline_ms: 30_000,
            min_delay_ms: 1,
            max_delay_ms: 3,
        },
        optimistic: BackoffPolicy {
            max_retries: 10,
            deadline_ms: 0,
            min_delay_ms: 1,
            max_delay_ms: 5,
        },
        rotation: BackoffPolicy {
            max_retries: 3,
            deadline_ms: 0,
            min_delay_ms: 1,
            max_delay_ms: 5,
        },
    }
}

pub fn build_counter(
    kind: StrategyKind,
    durable: Arc<MemDurableStore>,
    fast: Arc<MemFastStore>,
) -> Arc<VoteCounter> {
    let retry = test_retry_policies();
    let strategy = build_strategy(
        kind,
        durable.clone(),
        fast.clone(),
        &retry,
        Duration::from_millis(100),
    );
    let cache = Arc::new(CacheAsideStore::new(
        fast.clone(),
        durable,
        DistributedLock::singleflight(fast, retry.lock),
        CacheConfig::default(),
    ));
    Arc::new(VoteCounter::new(strategy, cache))
}
