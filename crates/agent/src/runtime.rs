//! Wiring: build every shared subsystem once from an [`AppConfig`].
//!
//! The gateway and the CLI both start from here, so a turn served over HTTP
//! and a turn typed at the terminal run through identical components.

use std::path::Path;
use std::sync::Arc;
use tierline_config::AppConfig;
use tierline_core::error::{Error, Result, StoreError};
use tierline_core::event::EventBus;
use tierline_core::knowledge::{LiveFetch, VectorSearch};
use tierline_core::memory::TranscriptStore;
use tierline_core::provider::Provider;
use tierline_memory::{
    InMemoryEscalationStore, InMemoryKnowledgeBase, InMemoryRoster, InMemoryTranscript,
    SqliteTranscript, StaticAgentDirectory,
};
use tierline_tools::HttpLiveFetch;
use tracing::info;

use crate::context::ConversationContexts;
use crate::escalation::{EscalationEngine, SlaTable};
use crate::orchestrator::Orchestrator;
use crate::prompt::{IndustryGuidelines, PromptAssembler};
use crate::retriever::KnowledgeRetriever;
use crate::triggers::ToolTriggerDetector;

pub struct Runtime {
    pub config: Arc<AppConfig>,
    pub orchestrator: Arc<Orchestrator>,
}

impl Runtime {
    /// Build with the provider named in the config. Fails without an API key.
    pub async fn from_config(config: AppConfig) -> Result<Self> {
        let provider = tierline_providers::build_from_config(&config)?;
        Self::with_provider(config, provider).await
    }

    /// Build around an explicit provider.
    pub async fn with_provider(config: AppConfig, provider: Arc<dyn Provider>) -> Result<Self> {
        config.validate().map_err(|e| Error::Config {
            message: e.to_string(),
        })?;

        let events = Arc::new(EventBus::default());
        let agents = Arc::new(StaticAgentDirectory::new(config.agents.clone()));

        let transcript = open_transcript(&config).await?;
        let contexts = Arc::new(ConversationContexts::new(config.context.window_size, transcript));

        let knowledge: Arc<dyn VectorSearch> = match &config.knowledge.documents_file {
            Some(path) => Arc::new(InMemoryKnowledgeBase::load_json(Path::new(path)).await?),
            None => Arc::new(InMemoryKnowledgeBase::new()),
        };
        let live_fetch: Arc<dyn LiveFetch> = Arc::new(HttpLiveFetch::new(agents.clone())?);
        let retriever =
            KnowledgeRetriever::new(knowledge, config.retrieval.clone()).with_live_fetch(live_fetch);

        let escalations = Arc::new(
            EscalationEngine::new(
                Arc::new(InMemoryEscalationStore::new()),
                Arc::new(InMemoryRoster::new(config.human_agents.clone())),
                events.clone(),
            )
            .with_sla(SlaTable::from_config(&config.escalation)),
        );

        let triggers = if config.tool_triggers.is_empty() {
            tierline_tools::default_triggers()
        } else {
            config.tool_triggers.clone()
        };
        let guidelines = IndustryGuidelines::new(config.industry_guidelines.clone());

        let orchestrator = Orchestrator::new(provider, agents, retriever, contexts, escalations, events)
            .with_tools(Arc::new(tierline_tools::default_registry()))
            .with_triggers(ToolTriggerDetector::new(triggers))
            .with_prompt_assembler(PromptAssembler::new(guidelines))
            .with_llm(config.llm.clone());

        info!(
            agents = config.agents.len(),
            human_agents = config.human_agents.len(),
            storage = %config.storage.backend,
            "Runtime ready"
        );

        Ok(Self {
            config: Arc::new(config),
            orchestrator: Arc::new(orchestrator),
        })
    }
}

async fn open_transcript(config: &AppConfig) -> Result<Arc<dyn TranscriptStore>> {
    if config.storage.backend == "in_memory" {
        return Ok(Arc::new(InMemoryTranscript::new()));
    }

    let path = config.transcript_path();
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| StoreError::Storage(format!("{}: {e}", parent.display())))?;
    }
    let store = SqliteTranscript::new(&path.to_string_lossy()).await?;
    Ok(Arc::new(store))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::TurnRequest;
    use crate::test_helpers::SequentialMockProvider;
    use tierline_core::agent::AgentProfile;

    fn config() -> AppConfig {
        let mut config = AppConfig::default();
        config.storage.backend = "in_memory".into();
        config.agents = vec![AgentProfile::new("ava", "acme", "Ava")];
        config
    }

    #[tokio::test]
    async fn from_config_without_api_key_fails() {
        let err = Runtime::from_config(config()).await.err().unwrap();
        assert!(matches!(err, Error::Provider(_)));
    }

    #[tokio::test]
    async fn builds_and_serves_a_turn() {
        let provider = Arc::new(SequentialMockProvider::repeating("Hi! How can I help?", 1));
        let runtime = Runtime::with_provider(config(), provider).await.unwrap();

        let reply = runtime
            .orchestrator
            .handle_turn(TurnRequest::new("ava", "acme", "u1", "Hello"))
            .await
            .unwrap();
        assert_eq!(reply.reply, "Hi! How can I help?");
    }

    #[tokio::test]
    async fn invalid_config_is_rejected() {
        let mut bad = config();
        bad.context.window_size = 0;
        let provider = Arc::new(SequentialMockProvider::repeating("x", 1));
        assert!(matches!(
            Runtime::with_provider(bad, provider).await.err().unwrap(),
            Error::Config { .. }
        ));
    }
}
