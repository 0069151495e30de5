use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Path of the sqlite database file backing the durable store
    #[serde(default = "default_sqlite_path")]
    pub sqlite_path: String,

    /// Connection URL of the shared fast store
    #[serde(default = "default_redis_url")]
    pub redis_url: String,

    /// Fast-store connection timeout (milliseconds)
    #[serde(default = "default_redis_connect_timeout_ms")]
    pub redis_connect_timeout_ms: u64,

    /// Reconnect attempts the fast-store connection manager performs per
    /// command before surfacing the error
    #[serde(default = "default_redis_retries")]
    pub redis_retries: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            sqlite_path: default_sqlite_path(),
            redis_url: default_redis_url(),
            redis_connect_timeout_ms: default_redis_connect_timeout_ms(),
            redis_retries: default_redis_retries(),
        }
    }
}

fn default_sqlite_path() -> String {
    "data/tally.db".to_string()
}
fn default_redis_url() -> String {
    "redis://127.0.0.1:6379".to_string()
}
fn default_redis_connect_timeout_ms() -> u64 {
    100
}
fn default_redis_retries() -> usize {
    1
}
