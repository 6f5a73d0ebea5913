//! The confidence-tiered response orchestrator at the center of Tierline.
//!
//! Every customer message goes through the same pipeline:
//!
//! 1. **Retrieve** knowledge and score how well it grounds the question
//!    ([`confidence`], [`retriever`]); thin results trigger a live fetch
//! 2. **Detect** keyword tool triggers and run at most one tool ([`triggers`])
//! 3. **Assemble** a system prompt whose instructions depend on the
//!    confidence tier ([`prompt`])
//! 4. **Call** the LLM once, with the bounded working window ([`context`])
//! 5. **Escalate** to a human when the rules say so ([`escalation`])
//!
//! [`orchestrator::Orchestrator`] sequences the steps; [`runtime::Runtime`]
//! builds it from configuration.

pub mod confidence;
pub mod context;
pub mod escalation;
pub mod locks;
pub mod orchestrator;
pub mod prompt;
pub mod retriever;
pub mod runtime;
pub mod triggers;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use confidence::{ConfidenceResult, ConfidenceTier};
pub use context::{ContextSnapshot, ConversationContexts, SessionScope};
pub use escalation::{EscalationEngine, NewEscalation, SlaTable};
pub use orchestrator::{APOLOGY, Orchestrator, TurnMetadata, TurnReply, TurnRequest};
pub use prompt::{IndustryGuidelines, PromptAssembler, ToolReport};
pub use retriever::{KnowledgeRetriever, RetrievalOutcome};
pub use runtime::Runtime;
pub use triggers::ToolTriggerDetector;
