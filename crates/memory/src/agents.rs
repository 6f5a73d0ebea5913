//! Agent directory backed by a fixed list of profiles.

use async_trait::async_trait;
use std::collections::HashMap;
use tierline_core::agent::{AgentDirectory, AgentProfile};

pub struct StaticAgentDirectory {
    profiles: HashMap<(String, String), AgentProfile>,
}

impl StaticAgentDirectory {
    pub fn new(profiles: impl IntoIterator<Item = AgentProfile>) -> Self {
        Self {
            profiles: profiles
                .into_iter()
                .map(|p| ((p.id.clone(), p.company_id.clone()), p))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

#[async_trait]
impl AgentDirectory for StaticAgentDirectory {
    async fn lookup(&self, agent_id: &str, company_id: &str) -> Option<AgentProfile> {
        self.profiles
            .get(&(agent_id.to_string(), company_id.to_string()))
            .cloned()
    }
}
