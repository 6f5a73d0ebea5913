//! Appointment booking tool: notes the requested slot for confirmation.

use async_trait::async_trait;
use tierline_core::error::ToolError;
use tierline_core::tool::{Tool, ToolContext, ToolOutcome};
use tracing::info;
use uuid::Uuid;

pub struct BookAppointmentTool;

#[async_trait]
impl Tool for BookAppointmentTool {
    fn id(&self) -> &str {
        "book_appointment"
    }

    fn description(&self) -> &str {
        "Request an appointment; the team confirms the exact time."
    }

    async fn execute(
        &self,
        parameters: serde_json::Value,
        context: &ToolContext,
    ) -> Result<ToolOutcome, ToolError> {
        let day = parameters["day"].as_str();
        let time = parameters["time"].as_str();
        let booking_id = Uuid::new_v4().to_string();

        let requested = match (day, time) {
            (Some(d), Some(t)) => Some(format!("{d} at {t}")),
            (Some(d), None) => Some(d.to_string()),
            (None, Some(t)) => Some(t.to_string()),
            (None, None) => None,
        };

        info!(
            booking_id = %booking_id,
            company_id = %context.company_id,
            requested = requested.as_deref().unwrap_or("unspecified"),
            "Appointment requested"
        );

        let message = match &requested {
            Some(slot) => format!("Appointment requested for {slot}; the team will confirm."),
            None => "Appointment requested. Ask the customer which day and time suit them.".into(),
        };

        Ok(ToolOutcome::ok(message).with_data(serde_json::json!({
            "booking_id": booking_id,
            "requested_time": requested,
            "status": "awaiting_confirmation",
        })))
    }
}
