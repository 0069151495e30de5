//! Read path: cache-aside with stampede protection.
//!
//! A miss does not send every concurrent reader to the durable store. The
//! first reader to win a short-TTL singleflight lock repopulates the cache;
//! the losers re-read the cache a bounded number of times and then degrade
//! to a direct durable read rather than blocking indefinitely.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;
use tracing::warn;

use crate::constants::votes_cache_key;
use crate::metrics::CACHE_READS_METRIC;
use crate::CacheConfig;
use crate::DistributedLock;
use crate::DurableStore;
use crate::FastStore;
use crate::Result;
use crate::StorageError;
use crate::VoteError;

pub struct CacheAsideStore {
    fast: Arc<dyn FastStore>,
    durable: Arc<dyn DurableStore>,
    singleflight: DistributedLock,
    config: CacheConfig,
}

impl CacheAsideStore {
    pub fn new(
        fast: Arc<dyn FastStore>,
        durable: Arc<dyn DurableStore>,
        singleflight: DistributedLock,
        config: CacheConfig,
    ) -> Self {
        Self {
            fast,
            durable,
            singleflight,
            config,
        }
    }

    /// Current vote total for `name`: fast store first, durable store on a
    /// miss, with the winner of the singleflight race refilling the cache.
    pub async fn get_votes(
        &self,
        name: &str,
    ) -> Result<i64> {
        let key = votes_cache_key(name);

        if let Some(cached) = self.fast.get(&key).await? {
            CACHE_READS_METRIC.with_label_values(&["hit"]).inc();
            return parse_votes(&cached);
        }
        CACHE_READS_METRIC.with_label_values(&["miss"]).inc();

        let owner_token = crate::new_owner_token();
        let singleflight_ttl = Duration::from_millis(self.config.singleflight_ttl_ms);
        if self
            .singleflight
            .try_acquire(name, &owner_token, singleflight_ttl)
            .await?
        {
            let result = self.load_and_fill(name, &key).await;
            match self.singleflight.release(name, &owner_token).await {
                Ok(_) => {}
                Err(e) => warn!("failed to release singleflight lock for {}: {:?}", name, e),
            }
            return result;
        }

        // Another reader is repopulating; re-read the cache a bounded number
        // of times before degrading.
        for _ in 0..self.config.singleflight_retries {
            tokio::time::sleep(Duration::from_millis(self.config.singleflight_wait_ms)).await;
            if let Some(cached) = self.fast.get(&key).await? {
                return parse_votes(&cached);
            }
        }

        debug!("singleflight wait exhausted for {}, degrading to durable read", name);
        CACHE_READS_METRIC.with_label_values(&["degraded"]).inc();
        self.read_durable(name).await
    }

    /// Prime the read cache for every known participant. Run at startup so
    /// the first reads after a restart do not stampede the durable store.
    pub async fn warm(&self) -> Result<usize> {
        let names = self.durable.list_participant_names().await?;
        let read_ttl = Duration::from_millis(self.config.read_ttl_ms);
        let mut warmed = 0;
        for name in &names {
            let Some(participant) = self.durable.get_participant(name).await? else {
                continue;
            };
            self.fast
                .set(
                    &votes_cache_key(name),
                    &participant.votes.to_string(),
                    Some(read_ttl),
                )
                .await?;
            warmed += 1;
        }
        Ok(warmed)
    }

    async fn load_and_fill(
        &self,
        name: &str,
        key: &str,
    ) -> Result<i64> {
        let votes = self.read_durable(name).await?;
        self.fast
            .set(
                key,
                &votes.to_string(),
                Some(Duration::from_millis(self.config.read_ttl_ms)),
            )
            .await?;
        Ok(votes)
    }

    async fn read_durable(
        &self,
        name: &str,
    ) -> Result<i64> {
        self.durable
            .get_participant(name)
            .await?
            .map(|p| p.votes)
            .ok_or_else(|| VoteError::NotFound(name.to_string()).into())
    }
}

fn parse_votes(value: &str) -> Result<i64> {
    value
        .parse::<i64>()
        .map_err(|_| StorageError::Convert(format!("cached votes not an integer: {value}")).into())
}
