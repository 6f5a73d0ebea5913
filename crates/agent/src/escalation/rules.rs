//! Ordered escalation rules. The first rule whose condition holds wins.

use serde::{Deserialize, Serialize};
use tierline_core::escalation::Priority;

/// Per-turn facts the rules look at besides the message text.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Signals {
    /// Lexicon sentiment in [-1, 1]
    pub sentiment: f32,
    /// Consecutive unanswered turns, including this one
    pub unresolved_count: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    SentimentBelow(f32),
    AnyKeyword(Vec<String>),
    UnresolvedAtLeast(u32),
    /// A keyword in a message longer than `min_chars`
    KeywordInLongMessage { keywords: Vec<String>, min_chars: usize },
}

impl Condition {
    pub fn holds(&self, message: &str, signals: &Signals) -> bool {
        match self {
            Condition::SentimentBelow(threshold) => signals.sentiment < *threshold,
            Condition::AnyKeyword(keywords) => contains_any(message, keywords),
            Condition::UnresolvedAtLeast(n) => signals.unresolved_count >= *n,
            Condition::KeywordInLongMessage { keywords, min_chars } => {
                message.chars().count() > *min_chars && contains_any(message, keywords)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EscalationRule {
    pub id: String,
    pub condition: Condition,
    pub reason: String,
    pub priority: Priority,
}

impl EscalationRule {
    pub fn new(
        id: impl Into<String>,
        condition: Condition,
        reason: impl Into<String>,
        priority: Priority,
    ) -> Self {
        Self {
            id: id.into(),
            condition,
            reason: reason.into(),
            priority,
        }
    }
}

/// The verdict of a matched rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscalationDecision {
    pub rule_id: String,
    pub reason: String,
    pub priority: Priority,
}

pub const HUMAN_REQUEST_KEYWORDS: &[&str] = &[
    "agent",
    "manager",
    "supervisor",
    "human",
    "real person",
    "representative",
    "speak to someone",
];

pub const TECHNICAL_KEYWORDS: &[&str] = &[
    "error",
    "bug",
    "crash",
    "not working",
    "broken",
    "integration",
    "server",
    "timeout",
    "database",
    "install",
    "configuration",
    "api key",
];

/// The standard rule list, in priority order.
pub fn default_rules() -> Vec<EscalationRule> {
    let words = |list: &[&str]| list.iter().map(|s| s.to_string()).collect::<Vec<_>>();
    vec![
        EscalationRule::new(
            "negative_sentiment",
            Condition::SentimentBelow(-0.5),
            "negative sentiment",
            Priority::High,
        ),
        EscalationRule::new(
            "human_request",
            Condition::AnyKeyword(words(HUMAN_REQUEST_KEYWORDS)),
            "human-request keyword",
            Priority::Medium,
        ),
        EscalationRule::new(
            "repeated_unresolved",
            Condition::UnresolvedAtLeast(3),
            "repeated unresolved questions",
            Priority::Medium,
        ),
        EscalationRule::new(
            "complex_technical",
            Condition::KeywordInLongMessage {
                keywords: words(TECHNICAL_KEYWORDS),
                min_chars: 100,
            },
            "complex technical issue",
            Priority::High,
        ),
    ]
}

/// Evaluate `rules` in order; the first that holds decides.
pub fn evaluate(rules: &[EscalationRule], message: &str, signals: &Signals) -> Option<EscalationDecision> {
    rules
        .iter()
        .find(|rule| rule.condition.holds(message, signals))
        .map(|rule| EscalationDecision {
            rule_id: rule.id.clone(),
            reason: rule.reason.clone(),
            priority: rule.priority,
        })
}

fn contains_any(message: &str, keywords: &[String]) -> bool {
    let lowered = message.to_lowercase();
    keywords.iter().any(|k| lowered.contains(&k.to_lowercase()))
}
