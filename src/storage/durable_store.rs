//! Durable store boundary: the authoritative relational home of participants
//! and tickets. Everything behind this trait is a single atomic statement so
//! the counting strategies never read-then-write through it accidentally.

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use crate::Result;

/// A vote recipient. `votes` is authoritative here; the fast store only ever
/// holds unreconciled deltas and TTL-bounded read copies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub name: String,
    pub votes: i64,
    /// Monotonically increasing, bumped by every versioned update
    pub version: i64,
}

/// An admission token row. Superseded tickets stay in the table for audit
/// until shutdown-drain truncates it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    pub ticket_id: String,
    pub quota: i64,
    pub created_at_ms: i64,
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait DurableStore: Send + Sync + 'static {
    async fn find_or_create_participant(
        &self,
        name: &str,
    ) -> Result<Participant>;

    async fn get_participant(
        &self,
        name: &str,
    ) -> Result<Option<Participant>>;

    /// Atomic `votes = votes + 1` for the named participant; returns the
    /// number of rows affected (0 means no such participant).
    async fn increment_votes(
        &self,
        name: &str,
    ) -> Result<u64>;

    /// Version-guarded update; 0 rows affected signals a version conflict
    /// (or a missing row; callers read first, so they can tell the two
    /// apart).
    async fn conditional_update(
        &self,
        name: &str,
        expected_version: i64,
        new_votes: i64,
        new_version: i64,
    ) -> Result<u64>;

    /// Atomic `votes = votes + delta`, used by reconciliation folds.
    async fn additive_update(
        &self,
        name: &str,
        delta: i64,
    ) -> Result<()>;

    async fn find_or_create_ticket(
        &self,
        ticket_id: &str,
        quota: i64,
    ) -> Result<Ticket>;

    async fn truncate_tickets(&self) -> Result<()>;

    async fn list_participant_names(&self) -> Result<Vec<String>>;
}
