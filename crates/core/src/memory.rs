//! Durable conversation transcript: the unbounded record of every turn.
//!
//! This is deliberately a separate layer from the bounded working window the
//! orchestrator feeds to the LLM: trimming the window never touches it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::error::StoreError;
use crate::message::Message;

/// One persisted transcript line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub session_id: String,
    pub agent_id: String,
    pub company_id: String,
    pub message: Message,
}

/// The agent and company a session was first recorded under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionOwner {
    pub agent_id: String,
    pub company_id: String,
}

/// Append-only transcript storage.
///
/// Implementations: in-memory (tests, ephemeral runs) and SQLite.
#[async_trait]
pub trait TranscriptStore: Send + Sync {
    /// The backend name (e.g., "sqlite", "in_memory").
    fn name(&self) -> &str;

    async fn append(&self, entry: TranscriptEntry) -> Result<(), StoreError>;

    /// All messages of a session, oldest first.
    async fn load(&self, session_id: &str) -> Result<Vec<Message>, StoreError>;

    async fn count(&self, session_id: &str) -> Result<usize, StoreError>;

    /// Owner of the session's first entry; `None` for unknown sessions.
    async fn owner(&self, session_id: &str) -> Result<Option<SessionOwner>, StoreError>;
}
