//! Admission control: issues, rotates and rate-limits the voting ticket.
//!
//! Exactly one ticket is current at any instant. The current token lives in
//! an atomically published snapshot so readers never observe a half-written
//! value; only the rotation task writes it, and a rotation's persistence
//! steps (durable row, then fast-store usage key) must both complete before
//! the swap becomes visible. The fast-store usage key, not the published
//! slot, is the source of truth for validity, so an in-flight vote against
//! a just-superseded ticket inside its TTL window is still accepted.

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwapOption;
use rand::RngCore;
use tokio::sync::watch;
use tokio::time::interval;
use tracing::error;
use tracing::info;
use tracing::warn;

use crate::constants::ticket_usage_key;
use crate::metrics::TICKET_ROTATIONS_METRIC;
use crate::utils::retry_with_backoff;
use crate::BackoffPolicy;
use crate::BallotConfig;
use crate::DurableStore;
use crate::Error;
use crate::FastStore;
use crate::Result;
use crate::TicketError;

pub struct TicketAuthority {
    durable: Arc<dyn DurableStore>,
    fast: Arc<dyn FastStore>,
    config: BallotConfig,
    rotation_policy: BackoffPolicy,
    current: ArcSwapOption<String>,
}

impl TicketAuthority {
    pub fn new(
        durable: Arc<dyn DurableStore>,
        fast: Arc<dyn FastStore>,
        config: BallotConfig,
        rotation_policy: BackoffPolicy,
    ) -> Self {
        Self {
            durable,
            fast,
            config,
            rotation_policy,
            current: ArcSwapOption::empty(),
        }
    }

    /// Lock-free read of the current ticket token. `None` only before the
    /// first rotation.
    pub fn current(&self) -> Option<Arc<String>> {
        self.current.load_full()
    }

    /// Issue a fresh ticket and make it current.
    ///
    /// Single-writer: only the rotation loop (and startup) calls this, and
    /// never concurrently: a rotation does not begin while a previous
    /// rotation's persistence step is outstanding. Persistence is retried
    /// per the rotation backoff policy; exhaustion surfaces an error the
    /// caller treats as fatal.
    pub async fn rotate(&self) -> Result<String> {
        let token = generate_token(self.config.ticket_len);
        let quota = self.config.ticket_quota;
        let usage_ttl = Duration::from_millis(self.config.rotation_interval_ms);

        let persist = retry_with_backoff("ticket rotation persistence", self.rotation_policy, || {
            let token = token.clone();
            async move {
                self.durable.find_or_create_ticket(&token, quota).await?;
                self.fast
                    .set(&ticket_usage_key(&token), &quota.to_string(), Some(usage_ttl))
                    .await?;
                Ok(())
            }
        })
        .await;

        if let Err(e) = persist {
            TICKET_ROTATIONS_METRIC.with_label_values(&["error"]).inc();
            return Err(e);
        }

        self.current.store(Some(Arc::new(token.clone())));
        TICKET_ROTATIONS_METRIC
            .with_label_values(&["success"])
            .inc();
        info!("rotated admission ticket: {}", token);
        Ok(token)
    }

    /// Burn one use of `ticket_id`. Non-blocking by design: one atomic
    /// decrement, no retries. The decrement that takes the counter below
    /// zero is the one that reports exhaustion, and that caller's vote must
    /// not be counted. A missing (expired) usage key decrements straight
    /// below zero and reports the same way as an exhausted one.
    pub async fn validate_and_consume(
        &self,
        ticket_id: &str,
    ) -> Result<()> {
        let remaining = self
            .fast
            .decrement_by(&ticket_usage_key(ticket_id), 1)
            .await?;
        if remaining < 0 {
            warn!("ticket {} exhausted or expired", ticket_id);
            return Err(TicketError::Exhausted(ticket_id.to_string()).into());
        }
        Ok(())
    }

    /// Periodic rotation loop. The first rotation is expected to have been
    /// driven by the node before this loop starts; every timer firing is
    /// strictly serialized through the single `rotate().await` below.
    pub async fn run(
        &self,
        mut shutdown_signal: watch::Receiver<()>,
    ) -> Result<()> {
        let mut ticker = interval(Duration::from_millis(self.config.rotation_interval_ms));
        // the first tick completes immediately; the startup rotation
        // already covered it
        ticker.tick().await;

        loop {
            tokio::select! {
                biased;
                _ = shutdown_signal.changed() => {
                    info!("ticket rotation loop: shutdown signal received.");
                    return Ok(());
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.rotate().await {
                        error!("ticket rotation failed: {:?}", e);
                        return Err(Error::Fatal(format!("ticket rotation failed: {}", e)));
                    }
                }
            }
        }
    }
}

/// Hex-encoded high-entropy token truncated to `len` characters.
pub(crate) fn generate_token(len: usize) -> String {
    let mut bytes = vec![0u8; (len + 1) / 2];
    rand::thread_rng().fill_bytes(&mut bytes);
    let mut token: String = bytes.iter().map(|b| format!("{:02x}", b)).collect();
    token.truncate(len);
    token
}
