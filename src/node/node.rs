//! The long-running vote-tallying node.
//!
//! ## Key Responsibilities
//! - Warms the read cache from durable totals at startup
//! - Performs the initial ticket rotation before accepting work
//! - Owns the background loops (ticket rotation, reconciliation) and their
//!   internal shutdown channel
//! - Drives the drain-then-clear sequence when the external termination
//!   signal fires, and joins every background task before returning
//!
//! ## Example Usage
//! ```ignore
//! let node = NodeBuilder::new(settings, shutdown_rx).build().await?;
//! node.run().await?;
//! ```

use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::error;
use tracing::info;
use tracing::warn;

use crate::CacheAsideStore;
use crate::Error;
use crate::Reconciler;
use crate::Result;
use crate::Settings;
use crate::ShutdownCoordinator;
use crate::TicketAuthority;
use crate::VoteCounter;

pub struct Node {
    pub settings: Arc<Settings>,

    pub(crate) counter: Arc<VoteCounter>,
    pub(crate) cache: Arc<CacheAsideStore>,
    pub(crate) authority: Arc<TicketAuthority>,
    pub(crate) reconciler: Arc<Reconciler>,
    pub(crate) coordinator: ShutdownCoordinator,

    // External termination signal (SIGINT/SIGTERM via main)
    pub(crate) shutdown_signal: watch::Receiver<()>,
    pub(crate) ready: AtomicBool,
}

impl Node {
    /// Runs the node until the termination signal fires or the rotation
    /// loop dies. On exit, the drain-then-clear sequence has completed and
    /// every background task has been joined.
    pub async fn run(&self) -> Result<()> {
        // 1. Prime the read cache so the first reads after a restart do not
        //    stampede the durable store
        match self.cache.warm().await {
            Ok(warmed) => info!("warmed read cache for {} participants", warmed),
            Err(e) => warn!("read cache warm-up failed: {:?}", e),
        }

        // 2. The admission gate must be live before the node is ready
        self.authority.rotate().await?;

        // 3. Background loops, stopped via the node-owned channel so they
        //    keep draining during the external shutdown sequence
        let (task_tx, task_rx) = watch::channel(());

        let mut rotation_handle = {
            let authority = self.authority.clone();
            let task_rx = task_rx.clone();
            tokio::spawn(async move { authority.run(task_rx).await })
        };
        let reconcile_handle = {
            let reconciler = self.reconciler.clone();
            let task_rx = task_rx.clone();
            tokio::spawn(async move { reconciler.run(task_rx).await })
        };

        self.set_ready(true);
        info!("node is ready; strategy = {:?}", self.counter.strategy_kind());

        // 4. Wait for the termination signal; a dead rotation loop is a
        //    stale admission gate, which also ends the node
        let mut shutdown_signal = self.shutdown_signal.clone();
        let mut fatal: Option<Error> = None;
        tokio::select! {
            biased;
            _ = shutdown_signal.changed() => {
                info!("node: shutdown signal received.");
            }
            join = &mut rotation_handle => {
                match join {
                    Ok(Err(e)) => {
                        error!("ticket rotation loop stopped: {:?}", e);
                        fatal = Some(e);
                    }
                    Ok(Ok(())) => {
                        warn!("ticket rotation loop stopped unexpectedly");
                    }
                    Err(e) => {
                        error!("ticket rotation task panicked: {:?}", e);
                        fatal = Some(crate::SystemError::TaskFailed(e).into());
                    }
                }
            }
        }
        self.set_ready(false);

        // 5. Drain outstanding deltas, then clear our state everywhere
        self.coordinator.drain_and_clear().await;

        // 6. Stop and join the background loops
        if task_tx.send(()).is_err() {
            warn!("background loops already stopped");
        }
        if !rotation_handle.is_finished() {
            let _ = rotation_handle.await;
        }
        let _ = reconcile_handle.await;
        info!("node stopped.");

        match fatal {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Counting surface for the API layer.
    pub fn vote_counter(&self) -> Arc<VoteCounter> {
        self.counter.clone()
    }

    /// Admission surface for the API layer.
    pub fn ticket_authority(&self) -> Arc<TicketAuthority> {
        self.authority.clone()
    }

    pub fn set_ready(
        &self,
        is_ready: bool,
    ) {
        self.ready.store(is_ready, Ordering::SeqCst);
    }

    pub fn server_is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }
}
