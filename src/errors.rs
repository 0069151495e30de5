//! Vote Backend Error Hierarchy
//!
//! Defines error types for the tallying core, categorized by operational
//! concern: admission control, counting, locking, and storage transport.
//! Admission failures (`TicketError`) are always distinguishable from
//! transient backend failures (`SystemError`) so the API layer never has to
//! conflate "your ticket is invalid/exhausted" with "retry later".

use std::time::Duration;

use config::ConfigError;
use tokio::task::JoinError;

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Infrastructure-level failures (durable store, fast store, tasks)
    #[error(transparent)]
    System(#[from] SystemError),

    /// Configuration loading/validation failures
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Domain failures of the voting core
    #[error(transparent)]
    Ballot(#[from] BallotError),

    /// Unrecoverable failures requiring process termination
    #[error("Fatal error: {0}")]
    Fatal(String),
}

#[derive(Debug, thiserror::Error)]
pub enum BallotError {
    /// Vote counting failures
    #[error(transparent)]
    Vote(#[from] VoteError),

    /// Admission ticket failures
    #[error(transparent)]
    Ticket(#[from] TicketError),

    /// Distributed lock failures
    #[error(transparent)]
    Lock(#[from] LockError),
}

#[derive(Debug, thiserror::Error)]
pub enum VoteError {
    /// No participant row matched the given name
    #[error("no participant found with name: {0}")]
    NotFound(String),

    /// Optimistic update lost the version race on every bounded attempt
    #[error("failed to update votes for {name} after {attempts} attempts due to version conflict")]
    ConcurrencyConflict { name: String, attempts: usize },
}

#[derive(Debug, thiserror::Error)]
pub enum TicketError {
    /// Usage quota reached, or the usage key already expired; the vote that
    /// observed this must not be counted
    #[error("ticket {0} has reached its maximum usage")]
    Exhausted(String),
}

#[derive(Debug, thiserror::Error)]
pub enum LockError {
    /// Wall-clock deadline elapsed before the lock could be acquired
    #[error("failed to acquire lock on {resource} within {waited:?}")]
    Timeout { resource: String, waited: Duration },

    /// Underlying store error while acquiring/releasing; never retried by
    /// the lock primitive itself
    #[error("lock store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, thiserror::Error)]
pub enum SystemError {
    /// Durable/fast store failures
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Background task failed to join
    #[error("Background task failed: {0}")]
    TaskFailed(#[from] JoinError),

    /// Retry policy exhaustion on a background operation
    #[error("{0}")]
    TaskBackoffFailed(String),

    /// Shutdown-signal channel failures
    #[error("{0}")]
    SignalSendFailed(String),
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Durable store (SQL) errors
    #[error("durable store error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Fast store (cache) transport errors
    #[error("fast store error: {0}")]
    Redis(#[from] redis::RedisError),

    /// Store reachable but returned a value this core cannot interpret
    #[error("stored value convert failed: {0}")]
    Convert(String),

    /// Transport/connection failure without a finer-grained source
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl Error {
    /// Whether the caller may usefully retry the failed request.
    ///
    /// Admission and not-found failures are final for the request that saw
    /// them; everything under [`SystemError`] is transient by contract.
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::System(_))
    }
}

impl From<VoteError> for Error {
    fn from(e: VoteError) -> Self {
        Error::Ballot(BallotError::Vote(e))
    }
}

impl From<TicketError> for Error {
    fn from(e: TicketError) -> Self {
        Error::Ballot(BallotError::Ticket(e))
    }
}

impl From<LockError> for Error {
    fn from(e: LockError) -> Self {
        Error::Ballot(BallotError::Lock(e))
    }
}

impl From<StorageError> for Error {
    fn from(e: StorageError) -> Self {
        Error::System(SystemError::Storage(e))
    }
}

impl From<rusqlite::Error> for Error {
    fn from(e: rusqlite::Error) -> Self {
        Error::System(SystemError::Storage(StorageError::Sqlite(e)))
    }
}

impl From<redis::RedisError> for Error {
    fn from(e: redis::RedisError) -> Self {
        Error::System(SystemError::Storage(StorageError::Redis(e)))
    }
}
