//! Ordered drain-then-clear sequence for process termination.
//!
//! Once the grace period has passed and the final drain tick has run, the
//! primary durability guarantee (no counted vote is lost) is already
//! honored, so every later step is best-effort: purge and truncate failures
//! are logged and never abort the sequence.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use tracing::error;
use tracing::info;

use crate::constants::KEY_NAMESPACE;
use crate::DurableStore;
use crate::FastStore;
use crate::Reconciler;

pub struct ShutdownCoordinator {
    fast: Arc<dyn FastStore>,
    durable: Arc<dyn DurableStore>,
    reconciler: Arc<Reconciler>,
    grace_period: Duration,
}

impl ShutdownCoordinator {
    pub fn new(
        fast: Arc<dyn FastStore>,
        durable: Arc<dyn DurableStore>,
        reconciler: Arc<Reconciler>,
        grace_period: Duration,
    ) -> Self {
        Self {
            fast,
            durable,
            reconciler,
            grace_period,
        }
    }

    /// Runs the full shutdown sequence:
    /// 1. wait the grace period, then drain outstanding deltas with one
    ///    final reconciliation tick
    /// 2. purge every `tally:`-namespaced fast-store key (cursor-scoped)
    /// 3. truncate the durable ticket table
    pub async fn drain_and_clear(&self) {
        info!("shutdown: draining vote deltas to the durable store...");
        sleep(self.grace_period).await;
        match self.reconciler.tick().await {
            Ok(stats) => {
                info!(
                    "shutdown: final drain folded {} votes across {} participants ({} failed)",
                    stats.folded_votes, stats.folded_names, stats.failed_names
                );
            }
            Err(e) => {
                error!("shutdown: final drain failed: {:?}", e);
            }
        }

        info!("shutdown: clearing the {}* cache namespace...", KEY_NAMESPACE);
        match self.fast.scan_prefix(KEY_NAMESPACE).await {
            Ok(keys) => {
                if let Err(e) = self.fast.delete_all(&keys).await {
                    error!("shutdown: cache purge failed: {:?}", e);
                } else {
                    info!("shutdown: purged {} cache keys", keys.len());
                }
            }
            Err(e) => {
                error!("shutdown: cache scan failed: {:?}", e);
            }
        }

        if let Err(e) = self.durable.truncate_tickets().await {
            error!("shutdown: ticket table truncate failed: {:?}", e);
        } else {
            info!("shutdown: ticket table cleared");
        }
    }
}
