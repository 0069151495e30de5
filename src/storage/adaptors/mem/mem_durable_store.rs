use std::collections::BTreeMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::utils::now_ms;
use crate::DurableStore;
use crate::Participant;
use crate::Result;
use crate::Ticket;
use crate::VoteError;

#[derive(Debug, Clone)]
struct ParticipantRow {
    votes: i64,
    version: i64,
}

/// In-memory durable store implementation.
///
/// A faithful stand-in for the relational adapter: the same row semantics
/// and the same rows-affected signals, backed by maps under one lock.
#[derive(Debug, Default)]
pub struct MemDurableStore {
    participants: RwLock<BTreeMap<String, ParticipantRow>>,
    tickets: RwLock<BTreeMap<String, Ticket>>,
}

impl MemDurableStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Test/benchmark convenience: provision a participant with a known
    /// vote total.
    pub fn seed_participant(
        &self,
        name: &str,
        votes: i64,
    ) {
        self.participants
            .write()
            .insert(name.to_string(), ParticipantRow { votes, version: 0 });
    }
}

#[async_trait]
impl DurableStore for MemDurableStore {
    async fn find_or_create_participant(
        &self,
        name: &str,
    ) -> Result<Participant> {
        let mut participants = self.participants.write();
        let row = participants
            .entry(name.to_string())
            .or_insert(ParticipantRow { votes: 0, version: 0 });
        Ok(Participant {
            name: name.to_string(),
            votes: row.votes,
            version: row.version,
        })
    }

    async fn get_participant(
        &self,
        name: &str,
    ) -> Result<Option<Participant>> {
        let participants = self.participants.read();
        Ok(participants.get(name).map(|row| Participant {
            name: name.to_string(),
            votes: row.votes,
            version: row.version,
        }))
    }

    async fn increment_votes(
        &self,
        name: &str,
    ) -> Result<u64> {
        let mut participants = self.participants.write();
        match participants.get_mut(name) {
            Some(row) => {
                row.votes += 1;
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn conditional_update(
        &self,
        name: &str,
        expected_version: i64,
        new_votes: i64,
        new_version: i64,
    ) -> Result<u64> {
        let mut participants = self.participants.write();
        match participants.get_mut(name) {
            Some(row) if row.version == expected_version => {
                row.votes = new_votes;
                row.version = new_version;
                Ok(1)
            }
            _ => Ok(0),
        }
    }

    async fn additive_update(
        &self,
        name: &str,
        delta: i64,
    ) -> Result<()> {
        let mut participants = self.participants.write();
        match participants.get_mut(name) {
            Some(row) => {
                row.votes += delta;
                Ok(())
            }
            None => Err(VoteError::NotFound(name.to_string()).into()),
        }
    }

    async fn find_or_create_ticket(
        &self,
        ticket_id: &str,
        quota: i64,
    ) -> Result<Ticket> {
        let mut tickets = self.tickets.write();
        let ticket = tickets.entry(ticket_id.to_string()).or_insert_with(|| Ticket {
            ticket_id: ticket_id.to_string(),
            quota,
            created_at_ms: now_ms(),
        });
        Ok(ticket.clone())
    }

    async fn truncate_tickets(&self) -> Result<()> {
        self.tickets.write().clear();
        Ok(())
    }

    async fn list_participant_names(&self) -> Result<Vec<String>> {
        let participants = self.participants.read();
        Ok(participants.keys().cloned().collect())
    }
}
