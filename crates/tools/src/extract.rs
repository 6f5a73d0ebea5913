//! Parameter extraction from free-text messages.
//!
//! Tools are triggered by keywords, so their parameters have to be pulled out
//! of the same message. Anything not found is simply left out; the registry's
//! validation then reports which required parameters are missing.

use regex_lite::Regex;
use serde_json::{Map, Value, json};
use std::sync::LazyLock;

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").expect("valid email regex")
});

static PHONE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\+?\d[\d\s().-]{7,}\d").expect("valid phone regex")
});

static ORDER_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:order\s*(?:number|no\.?|id)?\s*[:#]?\s*|#)([A-Z0-9][A-Z0-9-]{3,})")
        .expect("valid order id regex")
});

static TIME_OF_DAY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d{1,2}(?::\d{2})?\s*(?:am|pm))\b").expect("valid time regex")
});

const DAY_WORDS: &[&str] = &[
    "today", "tomorrow", "monday", "tuesday", "wednesday", "thursday", "friday", "saturday",
    "sunday",
];

/// Best-effort parameters for `tool_id` drawn from `message`.
pub fn extract_parameters(tool_id: &str, message: &str) -> Value {
    let mut params = Map::new();
    params.insert("message".into(), json!(message));

    match tool_id {
        "capture_lead" => {
            if let Some(m) = EMAIL.find(message) {
                params.insert("email".into(), json!(m.as_str()));
            }
            if let Some(m) = PHONE.find(message) {
                params.insert("phone".into(), json!(m.as_str().trim()));
            }
        }
        "order_status" | "refund" => {
            if let Some(id) = order_id(message) {
                params.insert("order_id".into(), json!(id));
            }
        }
        "book_appointment" => {
            let lower = message.to_lowercase();
            if let Some(day) = DAY_WORDS.iter().find(|d| lower.contains(**d)) {
                params.insert("day".into(), json!(day));
            }
            if let Some(c) = TIME_OF_DAY.captures(message) {
                params.insert("time".into(), json!(c[1].to_lowercase()));
            }
        }
        _ => {}
    }

    Value::Object(params)
}

fn order_id(message: &str) -> Option<String> {
    ORDER_ID
        .captures_iter(message)
        .map(|c| c[1].to_string())
        // "order status" would otherwise capture "status"
        .find(|id| id.chars().any(|ch| ch.is_ascii_digit()))
}
