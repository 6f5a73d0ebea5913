//! Order status tool.

use async_trait::async_trait;
use tierline_core::error::ToolError;
use tierline_core::tool::{Tool, ToolContext, ToolOutcome};
use tracing::info;

pub struct OrderStatusTool;

#[async_trait]
impl Tool for OrderStatusTool {
    fn id(&self) -> &str {
        "order_status"
    }

    fn description(&self) -> &str {
        "Look up the status of an order by its number."
    }

    fn required_parameters(&self) -> &[&'static str] {
        &["order_id"]
    }

    async fn execute(
        &self,
        parameters: serde_json::Value,
        context: &ToolContext,
    ) -> Result<ToolOutcome, ToolError> {
        let order_id = parameters["order_id"]
            .as_str()
            .ok_or_else(|| ToolError::ExecutionFailed {
                tool_id: self.id().into(),
                reason: "order_id must be a string".into(),
            })?
            .to_uppercase();

        info!(order_id = %order_id, company_id = %context.company_id, "Order status lookup queued");

        // No order system is attached; the lookup is queued for the team.
        Ok(ToolOutcome::ok(format!(
            "Order {order_id} was found in the request and a status lookup has been queued."
        ))
        .with_data(serde_json::json!({
            "order_id": order_id,
            "status": "lookup_queued",
        })))
    }
}
