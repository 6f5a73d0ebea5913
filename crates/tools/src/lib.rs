//! Built-in tools and the live-fetch capability for Tierline.
//!
//! Tools give an agent side effects it can trigger from a customer message:
//! open a refund request, hand over to a human, capture a lead, request an
//! appointment, or look up an order. Which ones fire is decided by the
//! keyword trigger table in [`default_triggers`], never by the LLM.

pub mod book_appointment;
pub mod capture_lead;
pub mod escalate;
pub mod extract;
pub mod live_fetch;
pub mod order_status;
pub mod refund;

use tierline_core::tool::{ToolRegistry, ToolTrigger};

pub use extract::extract_parameters;
pub use live_fetch::HttpLiveFetch;

/// Create a tool registry with every built-in tool.
pub fn default_registry() -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(refund::RefundTool));
    registry.register(Box::new(escalate::EscalateTool));
    registry.register(Box::new(capture_lead::CaptureLeadTool));
    registry.register(Box::new(book_appointment::BookAppointmentTool));
    registry.register(Box::new(order_status::OrderStatusTool));
    registry
}

/// The default trigger table. Order matters: the first enabled match fires.
pub fn default_triggers() -> Vec<ToolTrigger> {
    vec![
        ToolTrigger::new("refund", &["refund", "money back", "reimburse", "chargeback"]),
        ToolTrigger::new(
            "escalate",
            &["speak to a human", "talk to a person", "real person", "escalate"],
        ),
        ToolTrigger::new(
            "capture_lead",
            &["contact me", "call me", "email me", "get a quote", "pricing", "sign up"],
        ),
        ToolTrigger::new(
            "book_appointment",
            &["appointment", "book a", "schedule", "reservation", "consultation"],
        ),
        ToolTrigger::new(
            "order_status",
            &["order status", "where is my order", "track my order", "tracking", "shipped"],
        ),
    ]
}
