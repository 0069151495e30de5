//! Mutual exclusion across process instances, built on the fast store.
//!
//! A lock key holds an opaque owner token with a short TTL. Acquisition is a
//! single atomic set-if-absent; release is a single atomic
//! compare-and-delete, so a holder whose TTL already expired can never
//! delete a lock that was re-acquired by someone else. The primitive itself
//! never blocks or retries; the deadline-bounded retry loop lives in
//! [`DistributedLock::acquire`].

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use nanoid::nanoid;
use tokio::time::sleep;
use tokio::time::Instant;
use tracing::warn;

use crate::constants::SINGLEFLIGHT_LOCK_PREFIX;
use crate::constants::VALUE_LOCK_PREFIX;
use crate::utils::jittered_delay;
use crate::BackoffPolicy;
use crate::FastStore;
use crate::LockError;
use crate::Result;

/// A fresh owner token for one acquisition attempt. Owner tokens are what
/// make release safe: only the holder that wrote the token may delete it.
pub fn new_owner_token() -> String {
    nanoid!()
}

pub struct DistributedLock {
    store: Arc<dyn FastStore>,
    namespace: &'static str,
    policy: BackoffPolicy,
}

impl DistributedLock {
    /// Locks guarding participant mutations (`tally:lock:<resource>`).
    pub fn mutation(
        store: Arc<dyn FastStore>,
        policy: BackoffPolicy,
    ) -> Self {
        Self {
            store,
            namespace: VALUE_LOCK_PREFIX,
            policy,
        }
    }

    /// Locks guarding cache repopulation (`tally:sf:<resource>`), a distinct
    /// namespace from the mutation locks.
    pub fn singleflight(
        store: Arc<dyn FastStore>,
        policy: BackoffPolicy,
    ) -> Self {
        Self {
            store,
            namespace: SINGLEFLIGHT_LOCK_PREFIX,
            policy,
        }
    }

    fn key(
        &self,
        resource: &str,
    ) -> String {
        format!("{}{}", self.namespace, resource)
    }

    /// One atomic acquisition attempt; `false` means someone else holds the
    /// lock right now.
    pub async fn try_acquire(
        &self,
        resource: &str,
        owner_token: &str,
        ttl: Duration,
    ) -> Result<bool> {
        self.store
            .set_if_absent(&self.key(resource), owner_token, ttl)
            .await
            .map_err(|e| LockError::Unavailable(e.to_string()).into())
    }

    /// One atomic release attempt. `false` means the lock was not held under
    /// `owner_token` anymore (expired and possibly re-acquired); that is
    /// reported, never treated as fatal.
    pub async fn release(
        &self,
        resource: &str,
        owner_token: &str,
    ) -> Result<bool> {
        self.store
            .compare_and_delete(&self.key(resource), owner_token)
            .await
            .map_err(|e| LockError::Unavailable(e.to_string()).into())
    }

    /// Deadline-bounded acquisition: retries `try_acquire` with a jittered
    /// sleep between attempts until the configured wall-clock deadline, then
    /// fails with [`LockError::Timeout`]. The caller must not treat itself
    /// as holding the lock after a timeout.
    pub async fn acquire(
        &self,
        resource: &str,
        owner_token: &str,
        ttl: Duration,
    ) -> Result<()> {
        let deadline = Duration::from_millis(self.policy.deadline_ms);
        let start = Instant::now();
        loop {
            if start.elapsed() > deadline {
                return Err(LockError::Timeout {
                    resource: resource.to_string(),
                    waited: deadline,
                }
                .into());
            }

            if self.try_acquire(resource, owner_token, ttl).await? {
                return Ok(());
            }

            sleep(jittered_delay(
                self.policy.min_delay_ms,
                self.policy.max_delay_ms,
            ))
            .await;
        }
    }

    /// Scoped acquisition: runs `f` while holding the lock and releases on
    /// every exit path, including `f`'s error path. A failed release is
    /// logged and swallowed; the lock key still expires with its TTL.
    pub async fn with_held<F, Fut, T>(
        &self,
        resource: &str,
        ttl: Duration,
        f: F,
    ) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let owner_token = new_owner_token();
        self.acquire(resource, &owner_token, ttl).await?;

        let result = f().await;

        match self.release(resource, &owner_token).await {
            Ok(true) => {}
            Ok(false) => {
                warn!("lock on {} was no longer held at release", resource);
            }
            Err(e) => {
                warn!("failed to release lock on {}: {:?}", resource, e);
            }
        }

        result
    }
}
