//! Agent profile types and the lookup seam.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Persona and capabilities of a deployed conversational agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentProfile {
    pub id: String,

    pub company_id: String,

    /// Display name used in the system prompt
    pub name: String,

    /// Personality description (e.g. "friendly and concise")
    #[serde(default = "default_personality")]
    pub personality: String,

    #[serde(default)]
    pub description: String,

    /// Industry key used to look up guidelines
    #[serde(default = "default_industry")]
    pub industry: String,

    /// Tool ids this agent may fire
    #[serde(default)]
    pub enabled_tools: Vec<String>,

    /// Live sources used by the fallback fetch
    #[serde(default)]
    pub source_urls: Vec<String>,
}

fn default_personality() -> String {
    "helpful and professional".into()
}

fn default_industry() -> String {
    "general".into()
}

impl AgentProfile {
    pub fn new(id: impl Into<String>, company_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            company_id: company_id.into(),
            name: name.into(),
            personality: default_personality(),
            description: String::new(),
            industry: default_industry(),
            enabled_tools: Vec::new(),
            source_urls: Vec::new(),
        }
    }

    pub fn has_tool(&self, tool_id: &str) -> bool {
        self.enabled_tools.iter().any(|t| t == tool_id)
    }
}

/// Agent metadata lookup (backed by whatever persists agents).
#[async_trait]
pub trait AgentDirectory: Send + Sync {
    async fn lookup(&self, agent_id: &str, company_id: &str) -> Option<AgentProfile>;
}
