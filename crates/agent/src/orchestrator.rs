//! The turn orchestrator.
//!
//! One inbound message runs through:
//!
//! 1. **Validate** the request and look up the agent
//! 2. **Retrieve** knowledge, scored into a confidence tier (live fallback when thin)
//! 3. **Trigger** at most one tool by keyword and run it
//! 4. **Assemble** the tiered system prompt
//! 5. **Persist** the user message, then make the single LLM call
//! 6. **Persist** the reply and update the unresolved streak
//! 7. **Escalate** if a rule fires (or the escalate tool asked for it)
//!
//! Only step 1 can fail the request. Everything after it degrades: no
//! knowledge, a failed tool, an apology reply, or a missing escalation.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tierline_config::LlmConfig;
use tierline_core::agent::AgentDirectory;
use tierline_core::error::{Error, ProviderError, Result, ToolError, ValidationError};
use tierline_core::escalation::{Escalation, Priority};
use tierline_core::event::{DomainEvent, EventBus};
use tierline_core::message::{Message, SessionId};
use tierline_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use tierline_core::tool::{ToolContext, ToolRegistry};
use tracing::{debug, info, warn};

use crate::confidence::ConfidenceTier;
use crate::context::{ConversationContexts, SessionScope};
use crate::escalation::{EscalationDecision, EscalationEngine, NewEscalation, Signals, sentiment};
use crate::locks::KeyedLocks;
use crate::prompt::{PromptAssembler, PromptInput, ToolReport};
use crate::retriever::KnowledgeRetriever;
use crate::triggers::ToolTriggerDetector;

/// Reply used when the completion call fails or times out.
pub const APOLOGY: &str =
    "I'm sorry, I'm having trouble answering right now. Please try again in a moment.";

// ── Types ─────────────────────────────────────────────────────────────────

/// One inbound customer message.
///
/// Absent fields deserialize empty so that validation, not the decoder,
/// reports them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnRequest {
    #[serde(default)]
    pub agent_id: String,
    #[serde(default)]
    pub company_id: String,
    #[serde(default)]
    pub user_id: String,
    /// Omitted on the first message; a new session id is minted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default)]
    pub message: String,
}

impl TurnRequest {
    pub fn new(
        agent_id: impl Into<String>,
        company_id: impl Into<String>,
        user_id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            agent_id: agent_id.into(),
            company_id: company_id.into(),
            user_id: user_id.into(),
            session_id: None,
            message: message.into(),
        }
    }

    pub fn in_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    fn validate(&self) -> std::result::Result<(), ValidationError> {
        for (name, value) in [
            ("agent_id", &self.agent_id),
            ("company_id", &self.company_id),
            ("user_id", &self.user_id),
        ] {
            if value.trim().is_empty() {
                return Err(ValidationError::MissingField(name.into()));
            }
        }
        if self.message.trim().is_empty() {
            return Err(ValidationError::EmptyMessage);
        }
        Ok(())
    }
}

/// Observability data for one turn.
#[derive(Debug, Clone, Serialize)]
pub struct TurnMetadata {
    pub confidence_score: f32,
    pub passage_count: usize,
    pub fallback_used: bool,
    pub matched_tools: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub executed_tool: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_report: Option<ToolReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub escalation_reason: Option<String>,
    pub sentiment: f32,
    pub unresolved_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
    /// The reply is the apology, not model output
    pub llm_fallback: bool,
    pub duration_ms: u64,
}

/// The result of one turn.
#[derive(Debug, Clone, Serialize)]
pub struct TurnReply {
    pub session_id: String,
    pub reply: String,
    pub confidence_tier: ConfidenceTier,
    pub knowledge_used: bool,
    pub tools_executed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub escalation: Option<Escalation>,
    pub metadata: TurnMetadata,
}

// ── Orchestrator ──────────────────────────────────────────────────────────

pub struct Orchestrator {
    provider: Arc<dyn Provider>,
    agents: Arc<dyn AgentDirectory>,
    retriever: KnowledgeRetriever,
    triggers: ToolTriggerDetector,
    tools: Arc<ToolRegistry>,
    prompt: PromptAssembler,
    contexts: Arc<ConversationContexts>,
    escalations: Arc<EscalationEngine>,
    events: Arc<EventBus>,
    llm: LlmConfig,
    turn_locks: KeyedLocks,
}

impl Orchestrator {
    /// Create an orchestrator with the built-in tools, the default trigger
    /// table, the built-in industry guidelines, and default LLM settings.
    pub fn new(
        provider: Arc<dyn Provider>,
        agents: Arc<dyn AgentDirectory>,
        retriever: KnowledgeRetriever,
        contexts: Arc<ConversationContexts>,
        escalations: Arc<EscalationEngine>,
        events: Arc<EventBus>,
    ) -> Self {
        Self {
            provider,
            agents,
            retriever,
            triggers: ToolTriggerDetector::new(tierline_tools::default_triggers()),
            tools: Arc::new(tierline_tools::default_registry()),
            prompt: PromptAssembler::default(),
            contexts,
            escalations,
            events,
            llm: LlmConfig::default(),
            turn_locks: KeyedLocks::new(),
        }
    }

    pub fn with_tools(mut self, tools: Arc<ToolRegistry>) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_triggers(mut self, triggers: ToolTriggerDetector) -> Self {
        self.triggers = triggers;
        self
    }

    pub fn with_prompt_assembler(mut self, prompt: PromptAssembler) -> Self {
        self.prompt = prompt;
        self
    }

    /// Model, temperature, max tokens and the completion timeout.
    pub fn with_llm(mut self, llm: LlmConfig) -> Self {
        self.llm = llm;
        self
    }

    pub fn contexts(&self) -> &Arc<ConversationContexts> {
        &self.contexts
    }

    pub fn escalations(&self) -> &Arc<EscalationEngine> {
        &self.escalations
    }

    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Run one turn. Fails only on an invalid request or an unknown agent.
    pub async fn handle_turn(&self, request: TurnRequest) -> Result<TurnReply> {
        let started = Instant::now();
        request.validate()?;

        let agent = self
            .agents
            .lookup(&request.agent_id, &request.company_id)
            .await
            .ok_or_else(|| Error::AgentNotFound {
                agent_id: request.agent_id.clone(),
                company_id: request.company_id.clone(),
            })?;

        let session_id = request
            .session_id
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| SessionId::new().to_string());
        let scope = SessionScope::new(&session_id, &agent.id, &agent.company_id);
        let message = request.message.trim();

        let _turn = self.turn_locks.lock(&session_id).await;
        self.contexts.ensure_scope(&scope).await?;
        info!(session_id = %session_id, agent_id = %agent.id, "Turn started");

        // 1. Retrieval
        let retrieval = self.retriever.retrieve(&agent.id, &agent.company_id, message).await;
        if retrieval.fallback_used {
            self.events.publish(DomainEvent::FallbackRetrieval {
                agent_id: agent.id.clone(),
                snippets: retrieval.live_snippets.len(),
                timestamp: Utc::now(),
            });
        }

        // 2. Tool trigger, first match only
        let matched_tools = self.triggers.detect(message, &agent.enabled_tools);
        let tool_report = match matched_tools.first() {
            Some(tool_id) => {
                let context = ToolContext {
                    agent_id: agent.id.clone(),
                    company_id: agent.company_id.clone(),
                    user_id: request.user_id.clone(),
                    agent: agent.clone(),
                };
                Some(self.run_tool(tool_id, message, &context).await)
            }
            None => None,
        };
        let tools_executed = tool_report.as_ref().is_some_and(ToolReport::executed);

        // 3. Prompt
        let system_prompt = self.prompt.assemble(&PromptInput {
            agent: &agent,
            retrieval: &retrieval,
            tool: tool_report.as_ref(),
        });

        // 4. Persist the user message before the LLM call
        self.contexts.append(&scope, Message::user(message)).await;

        // 5. Completion
        let mut messages = vec![Message::system(system_prompt)];
        messages.extend(
            self.contexts
                .history(&session_id, &agent.company_id, self.contexts.window_size())
                .await?,
        );
        let (reply, usage, llm_fallback) = match self.complete(messages).await {
            Ok(response) => (response.content, response.usage, false),
            Err(e) => {
                warn!(session_id = %session_id, error = %e, "Completion failed, replying with apology");
                self.events.publish(DomainEvent::ErrorOccurred {
                    context: "completion".into(),
                    error_message: e.to_string(),
                    timestamp: Utc::now(),
                });
                (APOLOGY.to_string(), None, true)
            }
        };
        self.contexts.append(&scope, Message::assistant(&reply)).await;

        // 6. Unresolved streak
        let resolved = retrieval.confidence.tier != ConfidenceTier::None || tools_executed;
        let unresolved_count = self.contexts.record_resolution(&scope, resolved).await;

        // 7. Escalation
        let signals = Signals {
            sentiment: sentiment::score(message),
            unresolved_count,
        };
        let decision = self
            .escalations
            .should_escalate(message, &signals)
            .or_else(|| tool_report.as_ref().and_then(requested_escalation));
        let escalation = match &decision {
            Some(decision) => self.open_escalation(&scope, decision).await,
            None => None,
        };

        let duration_ms = started.elapsed().as_millis() as u64;
        let executed_tool = tool_report
            .as_ref()
            .filter(|r| r.executed())
            .map(|r| r.tool_id().to_string());

        info!(
            session_id = %session_id,
            tier = %retrieval.confidence.tier,
            score = retrieval.confidence.score,
            tool = executed_tool.as_deref().unwrap_or("-"),
            escalated = escalation.is_some(),
            duration_ms,
            "Turn completed"
        );
        self.events.publish(DomainEvent::TurnCompleted {
            session_id: session_id.clone(),
            agent_id: agent.id.clone(),
            confidence_tier: retrieval.confidence.tier.to_string(),
            knowledge_used: retrieval.knowledge_used(),
            tools_executed,
            tokens_used: usage.map(|u| u.total_tokens).unwrap_or(0),
            duration_ms,
            timestamp: Utc::now(),
        });

        Ok(TurnReply {
            session_id,
            reply,
            confidence_tier: retrieval.confidence.tier,
            knowledge_used: retrieval.knowledge_used(),
            tools_executed,
            escalation,
            metadata: TurnMetadata {
                confidence_score: retrieval.confidence.score,
                passage_count: retrieval.confidence.passage_count,
                fallback_used: retrieval.fallback_used,
                matched_tools,
                executed_tool,
                tool_report,
                escalation_reason: decision.map(|d| d.reason),
                sentiment: signals.sentiment,
                unresolved_count,
                usage,
                llm_fallback,
                duration_ms,
            },
        })
    }

    /// Validate and run one tool. Never fails the turn.
    async fn run_tool(&self, tool_id: &str, message: &str, context: &ToolContext) -> ToolReport {
        let parameters = tierline_tools::extract_parameters(tool_id, message);
        let started = Instant::now();

        let report = match self.tools.execute(tool_id, parameters, context).await {
            Ok(outcome) => ToolReport::Executed {
                tool_id: tool_id.to_string(),
                outcome,
            },
            Err(ToolError::Validation(ValidationError::MissingToolParameters { missing, .. })) => {
                debug!(tool_id, ?missing, "Tool needs more details from the customer");
                ToolReport::MissingParameters {
                    tool_id: tool_id.to_string(),
                    missing,
                }
            }
            Err(e) => {
                warn!(tool_id, error = %e, "Tool failed");
                ToolReport::Failed {
                    tool_id: tool_id.to_string(),
                    reason: e.to_string(),
                }
            }
        };

        self.events.publish(DomainEvent::ToolExecuted {
            tool_id: tool_id.to_string(),
            success: report.executed(),
            duration_ms: started.elapsed().as_millis() as u64,
            timestamp: Utc::now(),
        });
        report
    }

    async fn complete(&self, messages: Vec<Message>) -> std::result::Result<ProviderResponse, ProviderError> {
        let request = ProviderRequest {
            model: self.llm.model.clone(),
            messages,
            temperature: self.llm.temperature,
            max_tokens: Some(self.llm.max_tokens),
        };
        let timeout = Duration::from_secs(self.llm.timeout_secs);

        let response = tokio::time::timeout(timeout, self.provider.complete(request))
            .await
            .map_err(|_| ProviderError::Timeout(format!("no completion within {}s", self.llm.timeout_secs)))??;

        if response.content.trim().is_empty() {
            return Err(ProviderError::ApiError {
                status_code: 200,
                message: "empty completion".into(),
            });
        }
        Ok(response)
    }

    /// Summarize the session and open (or reuse) its escalation. Failures are logged.
    async fn open_escalation(&self, scope: &SessionScope, decision: &EscalationDecision) -> Option<Escalation> {
        let summary = self
            .contexts
            .summarize(&scope.session_id, &scope.company_id, Some(&decision.reason))
            .await
            .ok();

        match self
            .escalations
            .create(NewEscalation {
                session_id: scope.session_id.clone(),
                company_id: scope.company_id.clone(),
                reason: decision.reason.clone(),
                priority: decision.priority,
                summary,
            })
            .await
        {
            Ok(escalation) => Some(escalation),
            Err(e) => {
                warn!(session_id = %scope.session_id, error = %e, "Escalation could not be opened");
                self.events.publish(DomainEvent::ErrorOccurred {
                    context: "escalation".into(),
                    error_message: e.to_string(),
                    timestamp: Utc::now(),
                });
                None
            }
        }
    }
}

/// The escalate tool asks for a human through its outcome data.
fn requested_escalation(report: &ToolReport) -> Option<EscalationDecision> {
    let ToolReport::Executed { outcome, .. } = report else {
        return None;
    };
    let requested = outcome
        .data
        .as_ref()
        .and_then(|d| d.get("escalation_requested"))
        .and_then(|v| v.as_bool())
        .unwrap_or(false);
    requested.then(|| EscalationDecision {
        rule_id: "tool_request".into(),
        reason: "customer asked for a human".into(),
        priority: Priority::Medium,
    })
}
