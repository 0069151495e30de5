//! A builder pattern implementation for constructing a [`Node`] instance.
//!
//! The [`NodeBuilder`] provides a fluent interface to configure and assemble
//! the components of the voting core: the durable and fast stores, the
//! cache-aside read path, the configured increment strategy, the ticket
//! authority and the reconciliation loop.
//!
//! ## Key Design Points
//! - **Default Components**: Initializes with production-ready defaults (sqlite durable store,
//!   shared-cache fast store).
//! - **Customization**: Allows overriding the stores via setter methods (e.g., `durable_store()`),
//!   which is how tests and embedded deployments run against the in-memory adaptors.
//! - **Lifecycle Management**:
//!   - `build()`: Assembles the [`Node`].
//!   - `start_metrics_server()`: Launches the metrics endpoint.
//!
//! ## Example
//! ```ignore
//! let (shutdown_tx, shutdown_rx) = watch::channel(());
//! let node = NodeBuilder::new(settings, shutdown_rx)
//!     .start_metrics_server(shutdown_tx.subscribe())
//!     .build()
//!     .await?;
//! tokio::spawn(async move { node.run().await });
//! ```

use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::info;

use crate::build_strategy;
use crate::metrics;
use crate::CacheAsideStore;
use crate::DistributedLock;
use crate::DurableStore;
use crate::FastStore;
use crate::Node;
use crate::Reconciler;
use crate::RedisFastStore;
use crate::Result;
use crate::Settings;
use crate::ShutdownCoordinator;
use crate::SqliteDurableStore;
use crate::TicketAuthority;
use crate::VoteCounter;

pub struct NodeBuilder {
    pub(super) settings: Settings,
    pub(super) durable: Option<Arc<dyn DurableStore>>,
    pub(super) fast: Option<Arc<dyn FastStore>>,
    pub(super) shutdown_signal: watch::Receiver<()>,
}

impl NodeBuilder {
    pub fn new(
        settings: Settings,
        shutdown_signal: watch::Receiver<()>,
    ) -> Self {
        Self {
            settings,
            durable: None,
            fast: None,
            shutdown_signal,
        }
    }

    /// Override the durable store (tests, embedded deployments).
    pub fn durable_store(
        mut self,
        durable: Arc<dyn DurableStore>,
    ) -> Self {
        self.durable = Some(durable);
        self
    }

    /// Override the fast store (tests, embedded deployments).
    pub fn fast_store(
        mut self,
        fast: Arc<dyn FastStore>,
    ) -> Self {
        self.fast = Some(fast);
        self
    }

    /// Launches the metrics endpoint when monitoring is enabled.
    pub fn start_metrics_server(
        self,
        shutdown_signal: watch::Receiver<()>,
    ) -> Self {
        if self.settings.monitoring.prometheus_enabled {
            let port = self.settings.monitoring.prometheus_port;
            tokio::spawn(async move {
                metrics::start_server(port, shutdown_signal).await;
            });
        }
        self
    }

    pub async fn build(self) -> Result<Node> {
        let settings = Arc::new(self.settings);

        let durable: Arc<dyn DurableStore> = match self.durable {
            Some(durable) => durable,
            None => {
                info!(
                    "opening durable store at {}",
                    settings.storage.sqlite_path
                );
                Arc::new(SqliteDurableStore::open(&settings.storage.sqlite_path)?)
            }
        };
        let fast: Arc<dyn FastStore> = match self.fast {
            Some(fast) => fast,
            None => {
                info!("connecting fast store at {}", settings.storage.redis_url);
                Arc::new(RedisFastStore::connect(&settings.storage).await?)
            }
        };

        let singleflight = DistributedLock::singleflight(fast.clone(), settings.retry.lock);
        let cache = Arc::new(CacheAsideStore::new(
            fast.clone(),
            durable.clone(),
            singleflight,
            settings.cache,
        ));

        let strategy = build_strategy(
            settings.ballot.strategy,
            durable.clone(),
            fast.clone(),
            &settings.retry,
            Duration::from_millis(settings.ballot.lock_ttl_ms),
        );
        let counter = Arc::new(VoteCounter::new(strategy, cache.clone()));

        let authority = Arc::new(TicketAuthority::new(
            durable.clone(),
            fast.clone(),
            settings.ballot.clone(),
            settings.retry.rotation,
        ));

        let reconciler = Arc::new(Reconciler::new(
            durable.clone(),
            fast.clone(),
            Duration::from_millis(settings.ballot.flush_interval_ms),
        ));

        let coordinator = ShutdownCoordinator::new(
            fast.clone(),
            durable.clone(),
            reconciler.clone(),
            Duration::from_millis(settings.ballot.shutdown_grace_ms),
        );

        Ok(Node {
            settings,
            counter,
            cache,
            authority,
            reconciler,
            coordinator,
            shutdown_signal: self.shutdown_signal,
            ready: AtomicBool::new(false),
        })
    }
}
