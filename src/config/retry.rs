use serde::Deserialize;

/// Basic retry policy template
#[derive(Debug, Deserialize, Clone, Copy, Default)]
pub struct BackoffPolicy {
    /// Maximum number of attempts before the operation is surfaced as failed
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,

    /// Overall wall-clock deadline for the operation (unit: milliseconds);
    /// 0 means no deadline, only the attempt bound applies
    #[serde(default = "default_deadline_ms")]
    pub deadline_ms: u64,

    /// Lower bound of the randomized sleep between attempts (milliseconds)
    #[serde(default = "default_min_delay_ms")]
    pub min_delay_ms: u64,

    /// Upper bound (exclusive) of the randomized sleep between attempts
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

/// Divide strategies by contention domain
#[derive(Debug, Deserialize, Clone)]
pub struct RetryPolicies {
    /// Distributed lock acquisition (deadline-bounded, jittered)
    #[serde(default)]
    pub lock: BackoffPolicy,

    /// Optimistic version-guarded updates (attempt-bounded)
    #[serde(default)]
    pub optimistic: BackoffPolicy,

    /// Ticket rotation persistence (correctness-critical, few attempts)
    #[serde(default)]
    pub rotation: BackoffPolicy,
}

impl Default for RetryPolicies {
    fn default() -> Self {
        Self {
            lock: BackoffPolicy {
                max_retries: 0, // deadline-bounded, not attempt-bounded
                deadline_ms: 10_000,
                min_delay_ms: 10,
                max_delay_ms: 110,
            },
            optimistic: BackoffPolicy {
                max_retries: 10,
                deadline_ms: 0,
                min_delay_ms: 10,
                max_delay_ms: 60,
            },
            rotation: BackoffPolicy {
                max_retries: 3,
                deadline_ms: 0,
                min_delay_ms: 50,
                max_delay_ms: 1_000,
            },
        }
    }
}
fn default_max_retries() -> usize {
    3
}
fn default_deadline_ms() -> u64 {
    10_000
}
fn default_min_delay_ms() -> u64 {
    10
}
fn default_max_delay_ms() -> u64 {
    110
}
