//! Keyword-driven tool-trigger detection.

use tierline_core::tool::ToolTrigger;

/// Matches messages against an ordered trigger table.
///
/// Reports every matching enabled tool in table order; the orchestrator runs
/// only the first.
#[derive(Debug, Clone)]
pub struct ToolTriggerDetector {
    table: Vec<ToolTrigger>,
}

impl ToolTriggerDetector {
    pub fn new(table: Vec<ToolTrigger>) -> Self {
        let table = table
            .into_iter()
            .map(|t| ToolTrigger {
                tool_id: t.tool_id,
                keywords: t
                    .keywords
                    .into_iter()
                    .map(|k| k.to_lowercase())
                    .filter(|k| !k.trim().is_empty())
                    .collect(),
            })
            .collect();
        Self { table }
    }

    pub fn detect(&self, message: &str, enabled_tools: &[String]) -> Vec<String> {
        let lowered = message.to_lowercase();
        self.table
            .iter()
            .filter(|t| enabled_tools.iter().any(|e| e == &t.tool_id))
            .filter(|t| t.keywords.iter().any(|k| lowered.contains(k.as_str())))
            .map(|t| t.tool_id.clone())
            .collect()
    }

    pub fn table(&self) -> &[ToolTrigger] {
        &self.table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector() -> ToolTriggerDetector {
        ToolTriggerDetector::new(vec![
            ToolTrigger::new("refund", &["refund", "money back"]),
            ToolTrigger::new("escalate", &["human", "agent"]),
            ToolTrigger::new("order_status", &["Order Status"]),
        ])
    }

    fn enabled(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn matches_in_table_order() {
        let matched = detector().detect(
            "I want a refund now, agent!",
            &enabled(&["escalate", "refund"]),
        );
        assert_eq!(matched, vec!["refund", "escalate"]);
    }

    #[test]
    fn disabled_tools_never_match() {
        let matched = detector().detect("refund please", &enabled(&["escalate"]));
        assert!(matched.is_empty());
    }

    #[test]
    fn matching_is_case_insensitive() {
        let matched = detector().detect("what's my ORDER STATUS?", &enabled(&["order_status"]));
        assert_eq!(matched, vec!["order_status"]);
    }

    #[test]
    fn no_keywords_no_match() {
        assert!(detector().detect("hello there", &enabled(&["refund", "escalate"])).is_empty());
    }
}
