//! SQLite-backed durable store.
//!
//! Schema:
//! - participants: (name TEXT PRIMARY KEY, votes INTEGER, version INTEGER)
//! - tickets: (ticket_id TEXT PRIMARY KEY, quota INTEGER, created_at_ms INTEGER)
//!
//! WAL journal mode for concurrent readers, FULL synchronous mode so an
//! acknowledged reconciliation fold survives a crash. Every mutation is a
//! single statement; rows-affected is the concurrency signal the counting
//! strategies interpret.

use std::fs;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use rusqlite::params;
use rusqlite::Connection;
use rusqlite::OptionalExtension;

use crate::utils::now_ms;
use crate::DurableStore;
use crate::Participant;
use crate::Result;
use crate::StorageError;
use crate::Ticket;
use crate::VoteError;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS participants (
    name    TEXT PRIMARY KEY,
    votes   INTEGER NOT NULL DEFAULT 0,
    version INTEGER NOT NULL DEFAULT 0
);
CREATE TABLE IF NOT EXISTS tickets (
    ticket_id     TEXT PRIMARY KEY,
    quota         INTEGER NOT NULL,
    created_at_ms INTEGER NOT NULL
);
";

pub struct SqliteDurableStore {
    conn: Mutex<Connection>,
}

impl SqliteDurableStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| {
                    StorageError::Unavailable(format!(
                        "failed to create durable store dir {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }
        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "FULL")?;
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Test/benchmark convenience: provision a participant with a known
    /// vote total.
    pub fn seed_participant(
        &self,
        name: &str,
        votes: i64,
    ) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO participants (name, votes, version) VALUES (?1, ?2, 0)
             ON CONFLICT(name) DO UPDATE SET votes = ?2",
            params![name, votes],
        )?;
        Ok(())
    }
}

#[async_trait]
impl DurableStore for SqliteDurableStore {
    async fn find_or_create_participant(
        &self,
        name: &str,
    ) -> Result<Participant> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT OR IGNORE INTO participants (name) VALUES (?1)",
            params![name],
        )?;
        let participant = conn.query_row(
            "SELECT name, votes, version FROM participants WHERE name = ?1",
            params![name],
            |row| {
                Ok(Participant {
                    name: row.get(0)?,
                    votes: row.get(1)?,
                    version: row.get(2)?,
                })
            },
        )?;
        Ok(participant)
    }

    async fn get_participant(
        &self,
        name: &str,
    ) -> Result<Option<Participant>> {
        let conn = self.conn.lock();
        let participant = conn
            .query_row(
                "SELECT name, votes, version FROM participants WHERE name = ?1",
                params![name],
                |row| {
                    Ok(Participant {
                        name: row.get(0)?,
                        votes: row.get(1)?,
                        version: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(participant)
    }

    async fn increment_votes(
        &self,
        name: &str,
    ) -> Result<u64> {
        let conn = self.conn.lock();
        let rows = conn.execute(
            "UPDATE participants SET votes = votes + 1 WHERE name = ?1",
            params![name],
        )?;
        Ok(rows as u64)
    }

    async fn conditional_update(
        &self,
        name: &str,
        expected_version: i64,
        new_votes: i64,
        new_version: i64,
    ) -> Result<u64> {
        let conn = self.conn.lock();
        let rows = conn.execute(
            "UPDATE participants SET votes = ?2, version = ?3 WHERE name = ?1 AND version = ?4",
            params![name, new_votes, new_version, expected_version],
        )?;
        Ok(rows as u64)
    }

    async fn additive_update(
        &self,
        name: &str,
        delta: i64,
    ) -> Result<()> {
        let conn = self.conn.lock();
        let rows = conn.execute(
            "UPDATE participants SET votes = votes + ?2 WHERE name = ?1",
            params![name, delta],
        )?;
        if rows == 0 {
            return Err(VoteError::NotFound(name.to_string()).into());
        }
        Ok(())
    }

    async fn find_or_create_ticket(
        &self,
        ticket_id: &str,
        quota: i64,
    ) -> Result<Ticket> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT OR IGNORE INTO tickets (ticket_id, quota, created_at_ms) VALUES (?1, ?2, ?3)",
            params![ticket_id, quota, now_ms()],
        )?;
        let ticket = conn.query_row(
            "SELECT ticket_id, quota, created_at_ms FROM tickets WHERE ticket_id = ?1",
            params![ticket_id],
            |row| {
                Ok(Ticket {
                    ticket_id: row.get(0)?,
                    quota: row.get(1)?,
                    created_at_ms: row.get(2)?,
                })
            },
        )?;
        Ok(ticket)
    }

    async fn truncate_tickets(&self) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute("DELETE FROM tickets", [])?;
        Ok(())
    }

    async fn list_participant_names(&self) -> Result<Vec<String>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare("SELECT name FROM participants ORDER BY name")?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(names)
    }
}
