//! Conversation summaries and key points for human hand-over.

use tierline_core::message::{Message, Role};

const QUOTE_LIMIT: usize = 100;
const MAX_KEY_POINTS: usize = 5;

const ISSUE_KEYWORDS: &[&str] = &[
    "problem", "issue", "error", "broken", "not working", "refund", "billing", "charge",
    "cancel", "delivery", "order", "login", "password", "payment", "account",
];

const URGENCY_KEYWORDS: &[&str] = &[
    "urgent", "asap", "immediately", "emergency", "right now", "critical",
];

const URGENCY_POINT: &str = "Customer flagged the matter as urgent";
const GENERIC_POINT: &str = "General inquiry";

/// A short hand-over summary of a conversation.
pub fn summarize(messages: &[Message], escalation_reason: Option<&str>) -> String {
    let user_messages: Vec<&Message> = messages.iter().filter(|m| m.role == Role::User).collect();

    let mut summary = format!(
        "Conversation with {} customer message(s) and {} total exchange(s).",
        user_messages.len(),
        messages.iter().filter(|m| m.role != Role::System).count()
    );

    match (user_messages.first(), user_messages.last()) {
        (Some(first), Some(last)) => {
            summary.push_str(&format!(" First request: \"{}\".", truncate(&first.content)));
            if user_messages.len() > 1 {
                summary.push_str(&format!(" Latest message: \"{}\".", truncate(&last.content)));
            }
        }
        _ => summary.push_str(" The customer has not written anything yet."),
    }

    if let Some(reason) = escalation_reason.filter(|r| !r.trim().is_empty()) {
        summary.push_str(&format!(" Escalation reason: {}.", reason.trim()));
    }

    summary.push_str(" Please review the conversation and follow up with the customer.");
    summary
}

/// Up to five deduplicated points drawn from the customer's messages.
pub fn key_points(messages: &[Message]) -> Vec<String> {
    let mut points: Vec<String> = Vec::new();

    for message in messages.iter().filter(|m| m.role == Role::User) {
        let lowered = message.content.to_lowercase();
        for keyword in ISSUE_KEYWORDS.iter().filter(|k| lowered.contains(**k)) {
            add_point(&mut points, format!("Customer mentioned: {keyword}"));
        }
        if URGENCY_KEYWORDS.iter().any(|k| lowered.contains(k)) {
            add_point(&mut points, URGENCY_POINT.to_string());
        }
    }

    if points.is_empty() {
        points.push(GENERIC_POINT.to_string());
    }
    points
}

fn add_point(points: &mut Vec<String>, point: String) {
    if points.len() < MAX_KEY_POINTS && !points.contains(&point) {
        points.push(point);
    }
}

fn truncate(text: &str) -> String {
    let text = text.trim();
    if text.chars().count() <= QUOTE_LIMIT {
        return text.to_string();
    }
    let cut: String = text.chars().take(QUOTE_LIMIT).collect();
    format!("{cut}...")
}
