use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use super::IncrementStrategy;
use crate::DistributedLock;
use crate::DurableStore;
use crate::Result;
use crate::StrategyKind;
use crate::VoteError;

/// Serializes writers on `user:<name>` with the distributed lock, then runs
/// the direct statement while held. Highest latency, strongest mutual
/// exclusion; the lock is released on every exit path including errors.
pub struct LockGuardedIncrement {
    durable: Arc<dyn DurableStore>,
    lock: DistributedLock,
    lock_ttl: Duration,
}

impl LockGuardedIncrement {
    pub fn new(
        durable: Arc<dyn DurableStore>,
        lock: DistributedLock,
        lock_ttl: Duration,
    ) -> Self {
        Self {
            durable,
            lock,
            lock_ttl,
        }
    }
}

#[async_trait]
impl IncrementStrategy for LockGuardedIncrement {
    async fn increment(
        &self,
        name: &str,
    ) -> Result<()> {
        let resource = format!("user:{}", name);
        let durable = self.durable.clone();
        let name = name.to_string();

        self.lock
            .with_held(&resource, self.lock_ttl, || async move {
                let rows = durable.increment_votes(&name).await?;
                if rows == 0 {
                    return Err(VoteError::NotFound(name).into());
                }
                Ok(())
            })
            .await
    }

    fn kind(&self) -> StrategyKind {
        StrategyKind::LockGuarded
    }
}
