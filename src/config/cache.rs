use serde::Deserialize;

#[derive(Debug, Deserialize, Clone, Copy)]
pub struct CacheConfig {
    /// TTL of cached vote totals (milliseconds)
    #[serde(default = "default_read_ttl_ms")]
    pub read_ttl_ms: u64,

    /// TTL of the singleflight repopulation lock (milliseconds)
    #[serde(default = "default_singleflight_ttl_ms")]
    pub singleflight_ttl_ms: u64,

    /// How many times a singleflight loser re-reads the cache before
    /// degrading to a direct durable read
    #[serde(default = "default_singleflight_retries")]
    pub singleflight_retries: usize,

    /// Fixed sleep between singleflight re-reads (milliseconds)
    #[serde(default = "default_singleflight_wait_ms")]
    pub singleflight_wait_ms: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            read_ttl_ms: default_read_ttl_ms(),
            singleflight_ttl_ms: default_singleflight_ttl_ms(),
            singleflight_retries: default_singleflight_retries(),
            singleflight_wait_ms: default_singleflight_wait_ms(),
        }
    }
}

fn default_read_ttl_ms() -> u64 {
    3_000
}
fn default_singleflight_ttl_ms() -> u64 {
    20
}
fn default_singleflight_retries() -> usize {
    3
}
fn default_singleflight_wait_ms() -> u64 {
    10
}
