use std::time::Duration;

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::time::Instant;

use crate::FastStore;
use crate::Result;
use crate::StorageError;

#[derive(Debug, Clone)]
struct CacheEntry {
    value: String,
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn new(
        value: String,
        ttl: Option<Duration>,
    ) -> Self {
        Self {
            value,
            expires_at: ttl.map(|d| Instant::now() + d),
        }
    }

    fn is_expired(&self) -> bool {
        self.expires_at.map_or(false, |t| t <= Instant::now())
    }
}

/// In-process fast store implementation.
///
/// Honors the same atomicity contract as the shared-cache adapter: every
/// operation on a single key is atomic (dashmap shard locking), counters go
/// negative like their remote counterparts, and expiry is handled lazily on
/// access. Used by tests and embeddable deployments.
#[derive(Debug, Default)]
pub struct MemFastStore {
    data: DashMap<String, CacheEntry>,
}

impl MemFastStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn parse_counter(value: &str) -> Result<i64> {
        value
            .parse::<i64>()
            .map_err(|_| StorageError::Convert(format!("not an integer counter: {value}")).into())
    }
}

#[async_trait]
impl FastStore for MemFastStore {
    async fn get(
        &self,
        key: &str,
    ) -> Result<Option<String>> {
        match self.data.get(key) {
            Some(entry) if !entry.is_expired() => Ok(Some(entry.value.clone())),
            _ => Ok(None),
        }
    }

    async fn set(
        &self,
        key: &str,
        value: &str,
        ttl: Option<Duration>,
    ) -> Result<()> {
        self.data
            .insert(key.to_string(), CacheEntry::new(value.to_string(), ttl));
        Ok(())
    }

    async fn set_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<bool> {
        match self.data.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().is_expired() {
                    occupied.insert(CacheEntry::new(value.to_string(), Some(ttl)));
                    Ok(true)
                } else {
                    Ok(false)
                }
            }
            Entry::Vacant(vacant) => {
                vacant.insert(CacheEntry::new(value.to_string(), Some(ttl)));
                Ok(true)
            }
        }
    }

    async fn compare_and_delete(
        &self,
        key: &str,
        expected: &str,
    ) -> Result<bool> {
        match self.data.entry(key.to_string()) {
            Entry::Occupied(occupied) => {
                if !occupied.get().is_expired() && occupied.get().value == expected {
                    occupied.remove();
                    Ok(true)
                } else {
                    Ok(false)
                }
            }
            Entry::Vacant(_) => Ok(false),
        }
    }

    async fn increment(
        &self,
        key: &str,
    ) -> Result<i64> {
        self.add(key, 1)
    }

    async fn decrement_by(
        &self,
        key: &str,
        n: i64,
    ) -> Result<i64> {
        self.add(key, -n)
    }

    async fn scan_prefix(
        &self,
        prefix: &str,
    ) -> Result<Vec<String>> {
        let keys = self
            .data
            .iter()
            .filter(|entry| entry.key().starts_with(prefix) && !entry.value().is_expired())
            .map(|entry| entry.key().clone())
            .collect();
        Ok(keys)
    }

    async fn delete_all(
        &self,
        keys: &[String],
    ) -> Result<()> {
        for key in keys {
            self.data.remove(key);
        }
        Ok(())
    }
}

impl MemFastStore {
    /// A missing or expired key counts from 0 and carries no expiry, the
    /// same as the remote store's INCR/DECRBY.
    fn add(
        &self,
        key: &str,
        n: i64,
    ) -> Result<i64> {
        let mut entry = self
            .data
            .entry(key.to_string())
            .or_insert_with(|| CacheEntry::new("0".to_string(), None));
        if entry.is_expired() {
            *entry = CacheEntry::new("0".to_string(), None);
        }
        let current = Self::parse_counter(&entry.value)?;
        let updated = current + n;
        entry.value = updated.to_string();
        Ok(updated)
    }
}
