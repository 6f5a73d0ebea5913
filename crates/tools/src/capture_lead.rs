//! Lead capture tool.

use async_trait::async_trait;
use tierline_core::error::ToolError;
use tierline_core::tool::{Tool, ToolContext, ToolOutcome};
use tracing::info;
use uuid::Uuid;

pub struct CaptureLeadTool;

#[async_trait]
impl Tool for CaptureLeadTool {
    fn id(&self) -> &str {
        "capture_lead"
    }

    fn description(&self) -> &str {
        "Save the visitor's contact details so the sales team can reach out."
    }

    fn required_parameters(&self) -> &[&'static str] {
        &["email"]
    }

    async fn execute(
        &self,
        parameters: serde_json::Value,
        context: &ToolContext,
    ) -> Result<ToolOutcome, ToolError> {
        let email = parameters["email"]
            .as_str()
            .ok_or_else(|| ToolError::ExecutionFailed {
                tool_id: self.id().into(),
                reason: "email must be a string".into(),
            })?;
        if !email.contains('@') {
            return Err(ToolError::ExecutionFailed {
                tool_id: self.id().into(),
                reason: format!("'{email}' is not an email address"),
            });
        }

        let lead_id = Uuid::new_v4().to_string();
        info!(lead_id = %lead_id, company_id = %context.company_id, "Lead captured");

        Ok(ToolOutcome::ok(format!(
            "Contact details saved ({email}). Someone from {} will be in touch.",
            context.agent.name
        ))
        .with_data(serde_json::json!({
            "lead_id": lead_id,
            "email": email,
            "phone": parameters.get("phone"),
        })))
    }
}
