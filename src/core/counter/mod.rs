mod cached;
mod direct;
mod lock_guarded;
mod optimistic;
mod vote_counter;

pub use cached::*;
pub use direct::*;
pub use lock_guarded::*;
pub use optimistic::*;
pub use vote_counter::*;

#[cfg(test)]
mod vote_counter_test;

///--------------------------------------
/// Trait Definition
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::DistributedLock;
use crate::DurableStore;
use crate::FastStore;
use crate::Result;
use crate::RetryPolicies;
use crate::StrategyKind;

/// One way of turning a vote into a counted vote.
///
/// Every variant satisfies the same external contract: `votes` increases by
/// exactly 1 per successful call and a call that returned success is never
/// double-counted. The variants differ only in latency and in how they keep
/// concurrent writers from losing updates, and they are deliberately kept
/// side by side so deployments can pick one and benchmarks can compare them.
#[async_trait]
pub trait IncrementStrategy: Send + Sync + 'static {
    async fn increment(
        &self,
        name: &str,
    ) -> Result<()>;

    /// Stable label for metrics and logs
    fn kind(&self) -> StrategyKind;
}

pub fn build_strategy(
    kind: StrategyKind,
    durable: Arc<dyn DurableStore>,
    fast: Arc<dyn FastStore>,
    retry: &RetryPolicies,
    lock_ttl: Duration,
) -> Arc<dyn IncrementStrategy> {
    match kind {
        StrategyKind::Cached => Arc::new(CachedIncrement::new(fast)),
        StrategyKind::Direct => Arc::new(DirectIncrement::new(durable)),
        StrategyKind::Optimistic => Arc::new(OptimisticIncrement::new(durable, retry.optimistic)),
        StrategyKind::LockGuarded => Arc::new(LockGuardedIncrement::new(
            durable,
            DistributedLock::mutation(fast, retry.lock),
            lock_ttl,
        )),
    }
}

impl StrategyKind {
    pub fn as_label(&self) -> &'static str {
        match self {
            StrategyKind::Cached => "cached",
            StrategyKind::Direct => "direct",
            StrategyKind::Optimistic => "optimistic",
            StrategyKind::LockGuarded => "lock_guarded",
        }
    }
}
