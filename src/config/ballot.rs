use config::ConfigError;
use serde::Deserialize;

use crate::Result;

/// Which increment path `VoteCounter` dispatches to.
///
/// The variants are kept side by side on purpose: comparative benchmarking
/// of the durable-store strategies is part of the system's job, and `cached`
/// is the write-back path the reconciliation loop drains.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Atomic fast-store delta increment, folded into the durable store by
    /// the reconciliation loop (deployment default)
    #[default]
    Cached,
    /// Single atomic `votes = votes + 1` statement against the durable store
    Direct,
    /// Version-guarded conditional update with bounded retries
    Optimistic,
    /// Distributed lock around the direct statement
    LockGuarded,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BallotConfig {
    /// Length of generated ticket tokens (hex characters)
    #[serde(default = "default_ticket_len")]
    pub ticket_len: usize,

    /// Maximum uses of a single ticket within its rotation window
    #[serde(default = "default_ticket_quota")]
    pub ticket_quota: i64,

    /// Interval between ticket rotations; also the TTL of the fast-store
    /// ticket usage key (milliseconds)
    #[serde(default = "default_rotation_interval_ms")]
    pub rotation_interval_ms: u64,

    /// Interval between reconciliation ticks (milliseconds)
    #[serde(default = "default_flush_interval_ms")]
    pub flush_interval_ms: u64,

    /// Grace period before shutdown-drain begins purging state (milliseconds)
    #[serde(default = "default_shutdown_grace_ms")]
    pub shutdown_grace_ms: u64,

    /// TTL of the per-participant mutation lock (milliseconds)
    #[serde(default = "default_lock_ttl_ms")]
    pub lock_ttl_ms: u64,

    /// Selected increment strategy
    #[serde(default)]
    pub strategy: StrategyKind,
}

impl Default for BallotConfig {
    fn default() -> Self {
        Self {
            ticket_len: default_ticket_len(),
            ticket_quota: default_ticket_quota(),
            rotation_interval_ms: default_rotation_interval_ms(),
            flush_interval_ms: default_flush_interval_ms(),
            shutdown_grace_ms: default_shutdown_grace_ms(),
            lock_ttl_ms: default_lock_ttl_ms(),
            strategy: StrategyKind::default(),
        }
    }
}

impl BallotConfig {
    pub fn validate(&self) -> Result<()> {
        if self.ticket_len == 0 {
            return Err(ConfigError::Message("ticket_len cannot be 0".into()).into());
        }
        if self.ticket_quota <= 0 {
            return Err(ConfigError::Message("ticket_quota must be positive".into()).into());
        }
        if self.rotation_interval_ms == 0 || self.flush_interval_ms == 0 {
            return Err(ConfigError::Message(
                "rotation_interval_ms and flush_interval_ms must be positive".into(),
            )
            .into());
        }
        Ok(())
    }
}

fn default_ticket_len() -> usize {
    10
}
fn default_ticket_quota() -> i64 {
    200
}
fn default_rotation_interval_ms() -> u64 {
    20_000
}
fn default_flush_interval_ms() -> u64 {
    5_000
}
fn default_shutdown_grace_ms() -> u64 {
    5_000
}
fn default_lock_ttl_ms() -> u64 {
    10
}
