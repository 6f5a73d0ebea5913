//! Tool trait: side-effecting actions an agent can trigger.
//!
//! Tools are fired by keyword triggers, not by the LLM: the orchestrator
//! picks at most one per turn, validates its parameters, executes it and
//! feeds the outcome into the prompt.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use crate::agent::AgentProfile;
use crate::error::{ToolError, ValidationError};

/// Static keyword trigger for one tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolTrigger {
    pub tool_id: String,

    /// Trigger phrases, matched as case-insensitive substrings
    pub keywords: Vec<String>,
}

impl ToolTrigger {
    pub fn new(tool_id: impl Into<String>, keywords: &[&str]) -> Self {
        Self {
            tool_id: tool_id.into(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }
}

/// Who a tool runs on behalf of.
#[derive(Debug, Clone)]
pub struct ToolContext {
    pub agent_id: String,
    pub company_id: String,
    pub user_id: String,
    pub agent: AgentProfile,
}

/// The result of a tool execution.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolOutcome {
    /// Whether the tool did what it was asked
    pub success: bool,

    /// Human-readable outcome, fed into the prompt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Optional structured data
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl ToolOutcome {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: None,
        }
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }
}

/// The core Tool trait.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique id of this tool (e.g., "refund").
    fn id(&self) -> &str;

    /// A description of what this tool does.
    fn description(&self) -> &str;

    /// Parameters that must be present and non-empty before dispatch.
    fn required_parameters(&self) -> &[&'static str] {
        &[]
    }

    /// Execute the tool with already-validated parameters.
    async fn execute(
        &self,
        parameters: serde_json::Value,
        context: &ToolContext,
    ) -> std::result::Result<ToolOutcome, ToolError>;
}

/// A registry of available tool handlers, keyed by tool id.
///
/// Built once at startup and shared immutably.
pub struct ToolRegistry {
    tools: HashMap<String, Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a tool. Replaces any existing tool with the same id.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        let id = tool.id().to_string();
        self.tools.insert(id, tool);
    }

    pub fn get(&self, tool_id: &str) -> Option<&dyn Tool> {
        self.tools.get(tool_id).map(|t| t.as_ref())
    }

    /// Check required parameters without executing anything.
    pub fn validate(&self, tool_id: &str, parameters: &serde_json::Value) -> std::result::Result<(), ToolError> {
        let tool = self
            .tools
            .get(tool_id)
            .ok_or_else(|| ToolError::NotFound(tool_id.to_string()))?;

        let missing: Vec<String> = tool
            .required_parameters()
            .iter()
            .filter(|name| is_blank(parameters.get(**name)))
            .map(|name| name.to_string())
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::MissingToolParameters {
                tool_id: tool_id.to_string(),
                missing,
            }
            .into())
        }
    }

    /// Validate, then execute a tool.
    pub async fn execute(
        &self,
        tool_id: &str,
        parameters: serde_json::Value,
        context: &ToolContext,
    ) -> std::result::Result<ToolOutcome, ToolError> {
        self.validate(tool_id, &parameters)?;
        let tool = self
            .tools
            .get(tool_id)
            .ok_or_else(|| ToolError::NotFound(tool_id.to_string()))?;
        tool.execute(parameters, context).await
    }

    /// List all registered tool ids, sorted.
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.tools.keys().map(|s| s.as_str()).collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn is_blank(value: Option<&serde_json::Value>) -> bool {
    match value {
        None | Some(serde_json::Value::Null) => true,
        Some(serde_json::Value::String(s)) => s.trim().is_empty(),
        Some(_) => false,
    }
}
