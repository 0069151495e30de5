use std::sync::Arc;

use async_trait::async_trait;
use tokio::time::sleep;
use tracing::debug;

use super::IncrementStrategy;
use crate::utils::jittered_delay;
use crate::BackoffPolicy;
use crate::DurableStore;
use crate::Result;
use crate::StrategyKind;
use crate::VoteError;

/// Version-guarded conditional update, retried on conflict.
///
/// Each attempt reads `(votes, version)` and issues
/// `SET votes = votes+1, version = version+1 WHERE version = <read>`.
/// Zero rows affected means another writer won the race since our read;
/// attempts are bounded and sleep a small randomized interval in between.
pub struct OptimisticIncrement {
    durable: Arc<dyn DurableStore>,
    policy: BackoffPolicy,
}

impl OptimisticIncrement {
    pub fn new(
        durable: Arc<dyn DurableStore>,
        policy: BackoffPolicy,
    ) -> Self {
        Self { durable, policy }
    }
}

#[async_trait]
impl IncrementStrategy for OptimisticIncrement {
    async fn increment(
        &self,
        name: &str,
    ) -> Result<()> {
        let max_attempts = self.policy.max_retries.max(1);
        for attempt in 1..=max_attempts {
            let participant = self
                .durable
                .get_participant(name)
                .await?
                .ok_or_else(|| VoteError::NotFound(name.to_string()))?;

            let rows = self
                .durable
                .conditional_update(
                    name,
                    participant.version,
                    participant.votes + 1,
                    participant.version + 1,
                )
                .await?;
            if rows > 0 {
                return Ok(());
            }

            debug!(
                "version conflict on {} (attempt {}/{})",
                name, attempt, max_attempts
            );
            if attempt < max_attempts {
                sleep(jittered_delay(
                    self.policy.min_delay_ms,
                    self.policy.max_delay_ms,
                ))
                .await;
            }
        }

        Err(VoteError::ConcurrencyConflict {
            name: name.to_string(),
            attempts: max_attempts,
        }
        .into())
    }

    fn kind(&self) -> StrategyKind {
        StrategyKind::Optimistic
    }
}
