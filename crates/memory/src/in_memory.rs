//! In-memory transcript: useful for testing and ephemeral sessions.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tierline_core::error::StoreError;
use tierline_core::memory::{SessionOwner, TranscriptEntry, TranscriptStore};
use tierline_core::message::Message;
use tokio::sync::RwLock;

struct SessionLog {
    owner: SessionOwner,
    messages: Vec<Message>,
}

/// Keeps every session's messages in a map keyed by session id.
/// Nothing survives a restart.
pub struct InMemoryTranscript {
    sessions: Arc<RwLock<HashMap<String, SessionLog>>>,
}

impl InMemoryTranscript {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for InMemoryTranscript {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TranscriptStore for InMemoryTranscript {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn append(&self, entry: TranscriptEntry) -> Result<(), StoreError> {
        let TranscriptEntry {
            session_id,
            agent_id,
            company_id,
            message,
        } = entry;
        self.sessions
            .write()
            .await
            .entry(session_id)
            .or_insert_with(|| SessionLog {
                owner: SessionOwner {
                    agent_id,
                    company_id,
                },
                messages: Vec::new(),
            })
            .messages
            .push(message);
        Ok(())
    }

    async fn load(&self, session_id: &str) -> Result<Vec<Message>, StoreError> {
        Ok(self
            .sessions
            .read()
            .await
            .get(session_id)
            .map(|log| log.messages.clone())
            .unwrap_or_default())
    }

    async fn count(&self, session_id: &str) -> Result<usize, StoreError> {
        Ok(self
            .sessions
            .read()
            .await
            .get(session_id)
            .map_or(0, |log| log.messages.len()))
    }

    async fn owner(&self, session_id: &str) -> Result<Option<SessionOwner>, StoreError> {
        Ok(self
            .sessions
            .read()
            .await
            .get(session_id)
            .map(|log| log.owner.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(session: &str, message: Message) -> TranscriptEntry {
        TranscriptEntry {
            session_id: session.into(),
            agent_id: "ava".into(),
            company_id: "acme".into(),
            message,
        }
    }

    #[tokio::test]
    async fn append_and_load_in_order() {
        let store = InMemoryTranscript::new();
        store.append(entry("s1", Message::user("hi"))).await.unwrap();
        store.append(entry("s1", Message::assistant("hello"))).await.unwrap();
        store.append(entry("s2", Message::user("other"))).await.unwrap();

        let history = store.load("s1").await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].content, "hi");
        assert_eq!(history[1].content, "hello");
        assert_eq!(store.count("s2").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn unknown_session_is_empty() {
        let store = InMemoryTranscript::new();
        assert!(store.load("nope").await.unwrap().is_empty());
        assert_eq!(store.count("nope").await.unwrap(), 0);
        assert!(store.owner("nope").await.unwrap().is_none());
        assert_eq!(store.name(), "in_memory");
    }

    #[tokio::test]
    async fn owner_is_first_writer() {
        let store = InMemoryTranscript::new();
        store.append(entry("s1", Message::user("hi"))).await.unwrap();
        store
            .append(TranscriptEntry {
                agent_id: "bob".into(),
                company_id: "globex".into(),
                ..entry("s1", Message::user("late"))
            })
            .await
            .unwrap();

        let owner = store.owner("s1").await.unwrap().unwrap();
        assert_eq!(owner.agent_id, "ava");
        assert_eq!(owner.company_id, "acme");
    }
}
