//! # Tierline Core
//!
//! Domain types, capability traits, and error definitions for the Tierline
//! confidence-tiered response orchestrator. This crate has **no framework
//! dependencies**: it defines the domain model every other crate builds on.
//!
//! ## Design Philosophy
//!
//! Every external collaborator (vector index, live fetch, LLM, agent
//! records, escalation storage, human roster, transcript) is a trait here.
//! Implementations live in their respective crates, so tests can substitute
//! fixtures and deployments can swap backends through configuration.

pub mod error;
pub mod message;
pub mod provider;
pub mod knowledge;
pub mod tool;
pub mod memory;
pub mod agent;
pub mod escalation;
pub mod event;

// Re-export key types at crate root for ergonomics
pub use error::{Error, Result};
pub use message::{Message, Role, SessionId};
pub use provider::{Provider, ProviderRequest, ProviderResponse, Usage};
pub use knowledge::{FetchOptions, FetchResult, KnowledgePassage, LiveFetch, SearchOptions, VectorSearch};
pub use tool::{Tool, ToolContext, ToolOutcome, ToolRegistry, ToolTrigger};
pub use memory::{SessionOwner, TranscriptEntry, TranscriptStore};
pub use agent::{AgentDirectory, AgentProfile};
pub use escalation::{
    Escalation, EscalationStatus, EscalationStore, HumanAgent, HumanAgentDirectory, Priority,
    SenderType,
};
pub use event::{DomainEvent, EventBus};
