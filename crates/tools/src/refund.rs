//! Refund tool: records a refund request for staff review.

use async_trait::async_trait;
use tierline_core::error::ToolError;
use tierline_core::tool::{Tool, ToolContext, ToolOutcome};
use tracing::info;
use uuid::Uuid;

pub struct RefundTool;

#[async_trait]
impl Tool for RefundTool {
    fn id(&self) -> &str {
        "refund"
    }

    fn description(&self) -> &str {
        "Open a refund request for the customer; staff review it before any money moves."
    }

    fn required_parameters(&self) -> &[&'static str] {
        &["message"]
    }

    async fn execute(
        &self,
        parameters: serde_json::Value,
        context: &ToolContext,
    ) -> Result<ToolOutcome, ToolError> {
        let request_id = Uuid::new_v4().to_string();
        let order_id = parameters["order_id"].as_str();

        info!(
            request_id = %request_id,
            company_id = %context.company_id,
            user_id = %context.user_id,
            order_id = order_id.unwrap_or("-"),
            "Refund request recorded"
        );

        let message = match order_id {
            Some(order) => format!(
                "A refund request ({request_id}) was opened for order {order}. \
                 The team will review it and follow up."
            ),
            None => format!(
                "A refund request ({request_id}) was opened. The team will review it \
                 and may ask for the order number."
            ),
        };

        Ok(ToolOutcome::ok(message).with_data(serde_json::json!({
            "request_id": request_id,
            "status": "pending_review",
            "order_id": order_id,
            "reason": parameters["message"],
        })))
    }
}
