//! Escalation to human agents.
//!
//! - [`rules`] decide whether a turn should escalate (ordered, first wins)
//! - [`sentiment`] provides the sentiment signal the first rule reads
//! - [`sla`] holds the response-time targets per priority
//! - [`engine`] creates escalations, auto-assigns them, and drives the lifecycle

pub mod engine;
pub mod rules;
pub mod sentiment;
pub mod sla;

pub use engine::{EscalationEngine, NewEscalation};
pub use rules::{Condition, EscalationDecision, EscalationRule, Signals, default_rules};
pub use sla::SlaTable;
