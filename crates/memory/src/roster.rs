//! In-memory human-agent roster.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tierline_core::error::StoreError;
use tierline_core::escalation::{HumanAgent, HumanAgentDirectory};
use tokio::sync::RwLock;
use tracing::debug;

/// Roster loaded from configuration. Chat counts live here, so claiming a
/// slot is a single write-locked check-and-increment.
pub struct InMemoryRoster {
    agents: RwLock<Vec<HumanAgent>>,
}

impl InMemoryRoster {
    pub fn new(agents: Vec<HumanAgent>) -> Self {
        Self {
            agents: RwLock::new(agents),
        }
    }

    pub async fn get(&self, agent_id: &str) -> Option<HumanAgent> {
        self.agents
            .read()
            .await
            .iter()
            .find(|a| a.id == agent_id)
            .cloned()
    }

    pub async fn all(&self) -> Vec<HumanAgent> {
        self.agents.read().await.clone()
    }
}

#[async_trait]
impl HumanAgentDirectory for InMemoryRoster {
    async fn available_for(
        &self,
        company_id: &str,
        at: DateTime<Utc>,
    ) -> Result<Vec<HumanAgent>, StoreError> {
        Ok(self
            .agents
            .read()
            .await
            .iter()
            .filter(|a| a.company_id == company_id && a.is_available(at))
            .cloned()
            .collect())
    }

    async fn claim_slot(&self, agent_id: &str) -> Result<bool, StoreError> {
        let mut agents = self.agents.write().await;
        let agent = agents
            .iter_mut()
            .find(|a| a.id == agent_id)
            .ok_or_else(|| StoreError::QueryFailed(format!("unknown human agent {agent_id}")))?;

        if agent.active_chats >= agent.max_chats {
            debug!(agent_id, "Human agent at capacity");
            return Ok(false);
        }
        agent.active_chats += 1;
        Ok(true)
    }

    async fn release_slot(&self, agent_id: &str) -> Result<(), StoreError> {
        let mut agents = self.agents.write().await;
        if let Some(agent) = agents.iter_mut().find(|a| a.id == agent_id) {
            agent.active_chats = agent.active_chats.saturating_sub(1);
        }
        Ok(())
    }
}
