use std::sync::Arc;

use async_trait::async_trait;

use super::IncrementStrategy;
use crate::DurableStore;
use crate::Result;
use crate::StrategyKind;
use crate::VoteError;

/// One atomic `votes = votes + 1` statement against the durable store.
/// Safe under concurrency only because it never reads then writes; zero
/// rows affected means the participant does not exist.
pub struct DirectIncrement {
    durable: Arc<dyn DurableStore>,
}

impl DirectIncrement {
    pub fn new(durable: Arc<dyn DurableStore>) -> Self {
        Self { durable }
    }
}

#[async_trait]
impl IncrementStrategy for DirectIncrement {
    async fn increment(
        &self,
        name: &str,
    ) -> Result<()> {
        let rows = self.durable.increment_votes(name).await?;
        if rows == 0 {
            return Err(VoteError::NotFound(name.to_string()).into());
        }
        Ok(())
    }

    fn kind(&self) -> StrategyKind {
        StrategyKind::Direct
    }
}
