//! Error types for the Tierline domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant. Only [`ValidationError`]
//! on an inbound request is ever shown to a caller as a failure; everything
//! else is recovered inside the turn.

use thiserror::Error;

/// The top-level error type for all Tierline operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Retrieval error: {0}")]
    Retrieval(#[from] RetrievalError),

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    #[error("Escalation error: {0}")]
    Escalation(#[from] EscalationError),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Agent not found: {agent_id} (company {company_id})")]
    AgentNotFound { agent_id: String, company_id: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// A request (or tool invocation) is missing something it needs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Message text is empty")]
    EmptyMessage,

    #[error("Session '{session_id}' belongs to another agent or company")]
    SessionScopeMismatch { session_id: String },

    #[error("Tool '{tool_id}' is missing required parameters: {}", missing.join(", "))]
    MissingToolParameters { tool_id: String, missing: Vec<String> },
}

#[derive(Debug, Clone, Error)]
pub enum RetrievalError {
    #[error("Vector search failed: {0}")]
    VectorSearch(String),

    #[error("Live fetch failed: {0}")]
    LiveFetch(String),

    #[error("Retrieval timed out after {0}ms")]
    Timeout(u64),
}

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

#[derive(Debug, Clone, Error)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Tool {tool_id} failed: {reason}")]
    ExecutionFailed { tool_id: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EscalationError {
    #[error("Escalation not found: {0}")]
    NotFound(String),

    #[error("Invalid escalation transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Escalation {0} is closed to further changes")]
    Terminal(String),

    #[error("Assignment requires a human agent")]
    MissingAssignee,

    #[error("Human agent {0} has no free chat slot or is not on the roster")]
    AgentUnavailable(String),
}

#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),
}
