//! Escalate tool: asks for a human to take over the conversation.
//!
//! The tool itself creates nothing; it flags `escalation_requested` and the
//! orchestrator opens the escalation through the engine.

use async_trait::async_trait;
use tierline_core::error::ToolError;
use tierline_core::tool::{Tool, ToolContext, ToolOutcome};

pub struct EscalateTool;

#[async_trait]
impl Tool for EscalateTool {
    fn id(&self) -> &str {
        "escalate"
    }

    fn description(&self) -> &str {
        "Hand the conversation over to a human support agent."
    }

    async fn execute(
        &self,
        _parameters: serde_json::Value,
        _context: &ToolContext,
    ) -> Result<ToolOutcome, ToolError> {
        Ok(
            ToolOutcome::ok("The customer asked for a person; a human agent has been requested.")
                .with_data(serde_json::json!({ "escalation_requested": true })),
        )
    }
}
