//! Fast store boundary: the low-latency shared key-value cache holding hot
//! counters, ticket usage keys and locks. Not the system of record.

use std::time::Duration;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use crate::Result;

#[cfg_attr(test, automock)]
#[async_trait]
pub trait FastStore: Send + Sync + 'static {
    async fn get(
        &self,
        key: &str,
    ) -> Result<Option<String>>;

    /// `ttl` of `None` stores the value without expiry.
    async fn set(
        &self,
        key: &str,
        value: &str,
        ttl: Option<Duration>,
    ) -> Result<()>;

    /// Atomic set-if-absent with expiry; returns whether the key was set.
    async fn set_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<bool>;

    /// Atomic delete-if-value-matches; returns whether a deletion happened.
    /// A mismatch (someone else's lock after our TTL expired) is not an
    /// error, only a `false`.
    async fn compare_and_delete(
        &self,
        key: &str,
        expected: &str,
    ) -> Result<bool>;

    /// Atomic increment by 1; a missing key counts from 0.
    async fn increment(
        &self,
        key: &str,
    ) -> Result<i64>;

    /// Atomic decrement by `n`; returns the new value, which may be
    /// negative (the ticket-exhaustion signal relies on that).
    async fn decrement_by(
        &self,
        key: &str,
        n: i64,
    ) -> Result<i64>;

    /// Cursor-based enumeration of keys under `prefix`; never a single
    /// blocking scan of the whole keyspace.
    async fn scan_prefix(
        &self,
        prefix: &str,
    ) -> Result<Vec<String>>;

    async fn delete_all(
        &self,
        keys: &[String],
    ) -> Result<()>;
}
