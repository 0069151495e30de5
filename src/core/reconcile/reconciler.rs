//! Write-back drain: folds fast-store vote deltas into the durable store.
//!
//! Each tick enumerates the known participants and, per name, reads the
//! delta key, applies it as an additive durable update and only then clears
//! it with an atomic decrement of exactly the amount read, never an
//! unconditional reset, so increments landing between the read and the
//! clear survive to the next tick. A delta is cleared only after the
//! durable write succeeded, which makes each fold idempotent and crash-safe
//! up to re-applying at most the last unflushed interval.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::interval;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::constants::votes_delta_key;
use crate::metrics::RECONCILED_VOTES_METRIC;
use crate::DurableStore;
use crate::FastStore;
use crate::Result;
use crate::StorageError;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileStats {
    /// Names whose non-zero delta was folded this tick
    pub folded_names: usize,
    /// Total votes moved into the durable store this tick
    pub folded_votes: i64,
    /// Names skipped because their fold failed; retried next tick
    pub failed_names: usize,
}

pub struct Reconciler {
    durable: Arc<dyn DurableStore>,
    fast: Arc<dyn FastStore>,
    flush_interval: Duration,
}

impl Reconciler {
    pub fn new(
        durable: Arc<dyn DurableStore>,
        fast: Arc<dyn FastStore>,
        flush_interval: Duration,
    ) -> Self {
        Self {
            durable,
            fast,
            flush_interval,
        }
    }

    /// One reconciliation pass over every known participant. Per-name
    /// failures are logged and skipped so one bad name never blocks the
    /// rest; the uncleared delta is naturally retried next tick.
    pub async fn tick(&self) -> Result<ReconcileStats> {
        let names = self.durable.list_participant_names().await?;
        let mut stats = ReconcileStats::default();

        for name in &names {
            match self.fold_one(name).await {
                Ok(0) => {}
                Ok(delta) => {
                    stats.folded_names += 1;
                    stats.folded_votes += delta;
                }
                Err(e) => {
                    warn!("reconciliation of {} skipped: {:?}", name, e);
                    RECONCILED_VOTES_METRIC.with_label_values(&["error"]).inc();
                    stats.failed_names += 1;
                }
            }
        }

        if stats.folded_names > 0 {
            debug!(
                "reconciled {} votes across {} participants",
                stats.folded_votes, stats.folded_names
            );
        }
        Ok(stats)
    }

    async fn fold_one(
        &self,
        name: &str,
    ) -> Result<i64> {
        let key = votes_delta_key(name);
        let delta = match self.fast.get(&key).await? {
            None => return Ok(0),
            Some(raw) => raw.parse::<i64>().map_err(|_| {
                StorageError::Convert(format!("delta for {} not an integer: {}", name, raw))
            })?,
        };
        if delta <= 0 {
            return Ok(0);
        }

        self.durable.additive_update(name, delta).await?;
        // clear exactly what was folded; concurrent increments that landed
        // since the read stay in the key
        self.fast.decrement_by(&key, delta).await?;

        RECONCILED_VOTES_METRIC
            .with_label_values(&["success"])
            .inc_by(delta as u64);
        Ok(delta)
    }

    /// Fixed-period drain loop.
    pub async fn run(
        &self,
        mut shutdown_signal: watch::Receiver<()>,
    ) -> Result<()> {
        let mut ticker = interval(self.flush_interval);
        ticker.tick().await;

        loop {
            tokio::select! {
                biased;
                _ = shutdown_signal.changed() => {
                    info!("reconciliation loop: shutdown signal received.");
                    return Ok(());
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.tick().await {
                        warn!("reconciliation tick failed, retrying next tick: {:?}", e);
                    }
                }
            }
        }
    }
}
