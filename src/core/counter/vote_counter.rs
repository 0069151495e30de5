use std::sync::Arc;

use autometrics::autometrics;

use super::IncrementStrategy;
use crate::metrics::VOTE_RESULTS_METRIC;
use crate::CacheAsideStore;
use crate::Result;
use crate::StrategyKind;
use crate::API_SLO;

/// Public counting surface consumed by the API layer.
///
/// Writes go through the configured [`IncrementStrategy`]; reads go through
/// the cache-aside store rather than always hitting the durable store.
pub struct VoteCounter {
    strategy: Arc<dyn IncrementStrategy>,
    cache: Arc<CacheAsideStore>,
}

impl VoteCounter {
    pub fn new(
        strategy: Arc<dyn IncrementStrategy>,
        cache: Arc<CacheAsideStore>,
    ) -> Self {
        Self { strategy, cache }
    }

    #[autometrics(objective = API_SLO)]
    pub async fn increment(
        &self,
        name: &str,
    ) -> Result<()> {
        let label = self.strategy.kind().as_label();
        match self.strategy.increment(name).await {
            Ok(()) => {
                VOTE_RESULTS_METRIC
                    .with_label_values(&[label, "success"])
                    .inc();
                Ok(())
            }
            Err(e) => {
                VOTE_RESULTS_METRIC
                    .with_label_values(&[label, "error"])
                    .inc();
                Err(e)
            }
        }
    }

    #[autometrics(objective = API_SLO)]
    pub async fn read(
        &self,
        name: &str,
    ) -> Result<i64> {
        self.cache.get_votes(name).await
    }

    pub fn strategy_kind(&self) -> StrategyKind {
        self.strategy.kind()
    }
}
