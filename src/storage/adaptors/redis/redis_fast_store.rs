//! Redis-backed fast store.
//!
//! All counter mutations ride single Redis commands (INCR/DECRBY) and the
//! lock release rides a Lua script, so nothing here ever needs a
//! read-modify-write round trip. `scan_prefix` walks the keyspace with
//! cursor-based SCAN, never a blocking KEYS.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::aio::ConnectionManagerConfig;
use redis::Client;
use redis::Script;
use tracing::debug;

use crate::FastStore;
use crate::Result;
use crate::StorageConfig;

/// Deletes the key only when it still holds the expected value. Returns the
/// number of keys deleted (0 or 1).
const COMPARE_AND_DELETE_SCRIPT: &str = r#"
if redis.call("get", KEYS[1]) == ARGV[1] then
    return redis.call("del", KEYS[1])
else
    return 0
end"#;

const SCAN_BATCH: usize = 100;
const DELETE_BATCH: usize = 500;

pub struct RedisFastStore {
    conn: ConnectionManager,
    compare_and_delete: Script,
}

impl RedisFastStore {
    pub async fn connect(config: &StorageConfig) -> Result<Self> {
        let manager_config = ConnectionManagerConfig::new()
            .set_number_of_retries(config.redis_retries)
            .set_connection_timeout(Duration::from_millis(config.redis_connect_timeout_ms));

        let client = Client::open(config.redis_url.as_str())?;
        let mut conn = client
            .get_connection_manager_with_config(manager_config)
            .await?;

        let pong: String = redis::cmd("PING").query_async(&mut conn).await?;
        debug!("fast store connected: {}", pong);

        Ok(Self {
            conn,
            compare_and_delete: Script::new(COMPARE_AND_DELETE_SCRIPT),
        })
    }

    fn ttl_ms(ttl: Duration) -> u64 {
        (ttl.as_millis() as u64).max(1)
    }
}

#[async_trait]
impl FastStore for RedisFastStore {
    async fn get(
        &self,
        key: &str,
    ) -> Result<Option<String>> {
        let mut conn = self.conn.clone();
        let value: Option<String> = redis::cmd("GET").arg(key).query_async(&mut conn).await?;
        Ok(value)
    }

    async fn set(
        &self,
        key: &str,
        value: &str,
        ttl: Option<Duration>,
    ) -> Result<()> {
        let mut conn = self.conn.clone();
        let mut cmd = redis::cmd("SET");
        cmd.arg(key).arg(value);
        if let Some(ttl) = ttl {
            cmd.arg("PX").arg(Self::ttl_ms(ttl));
        }
        let _: () = cmd.query_async(&mut conn).await?;
        Ok(())
    }

    async fn set_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<bool> {
        let mut conn = self.conn.clone();
        let set: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("PX")
            .arg(Self::ttl_ms(ttl))
            .arg("NX")
            .query_async(&mut conn)
            .await?;
        Ok(set.is_some())
    }

    async fn compare_and_delete(
        &self,
        key: &str,
        expected: &str,
    ) -> Result<bool> {
        let mut conn = self.conn.clone();
        let deleted: i64 = self
            .compare_and_delete
            .key(key)
            .arg(expected)
            .invoke_async(&mut conn)
            .await?;
        Ok(deleted == 1)
    }

    async fn increment(
        &self,
        key: &str,
    ) -> Result<i64> {
        let mut conn = self.conn.clone();
        let value: i64 = redis::cmd("INCR").arg(key).query_async(&mut conn).await?;
        Ok(value)
    }

    async fn decrement_by(
        &self,
        key: &str,
        n: i64,
    ) -> Result<i64> {
        let mut conn = self.conn.clone();
        let value: i64 = redis::cmd("DECRBY")
            .arg(key)
            .arg(n)
            .query_async(&mut conn)
            .await?;
        Ok(value)
    }

    async fn scan_prefix(
        &self,
        prefix: &str,
    ) -> Result<Vec<String>> {
        let mut conn = self.conn.clone();
        let pattern = format!("{}*", prefix);
        let mut cursor: u64 = 0;
        let mut keys = Vec::new();
        loop {
            let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut conn)
                .await?;
            keys.extend(batch);
            if next == 0 {
                break;
            }
            cursor = next;
        }
        Ok(keys)
    }

    async fn delete_all(
        &self,
        keys: &[String],
    ) -> Result<()> {
        if keys.is_empty() {
            return Ok(());
        }
        let mut conn = self.conn.clone();
        for chunk in keys.chunks(DELETE_BATCH) {
            let _: i64 = redis::cmd("DEL").arg(chunk).query_async(&mut conn).await?;
        }
        Ok(())
    }
}
