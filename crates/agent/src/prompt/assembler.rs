//! Tiered system-prompt assembly.
//!
//! Sections, in order:
//!
//! 1. Identity and personality
//! 2. Knowledge-base priority directive
//! 3. Confidence-tiered instruction
//! 4. Knowledge passages, or an explicit "no knowledge found" notice
//! 5. Tool results (if a tool was triggered)
//! 6. Industry guidelines
//! 7. Closing directives
//!
//! # Determinism
//!
//! Identical inputs produce identical prompts. Nothing time-dependent or
//! random goes into the text.

use serde::{Deserialize, Serialize};
use tierline_core::agent::AgentProfile;
use tierline_core::tool::ToolOutcome;

use crate::confidence::{ConfidenceResult, ConfidenceTier};
use crate::prompt::guidelines::IndustryGuidelines;
use crate::retriever::RetrievalOutcome;

// ── Types ─────────────────────────────────────────────────────────────────

/// What happened to the tool triggered this turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ToolReport {
    Executed { tool_id: String, outcome: ToolOutcome },
    MissingParameters { tool_id: String, missing: Vec<String> },
    Failed { tool_id: String, reason: String },
}

impl ToolReport {
    pub fn tool_id(&self) -> &str {
        match self {
            Self::Executed { tool_id, .. }
            | Self::MissingParameters { tool_id, .. }
            | Self::Failed { tool_id, .. } => tool_id,
        }
    }

    /// Only a successful run counts as executed.
    pub fn executed(&self) -> bool {
        matches!(self, Self::Executed { outcome, .. } if outcome.success)
    }
}

pub struct PromptInput<'a> {
    pub agent: &'a AgentProfile,
    pub retrieval: &'a RetrievalOutcome,
    pub tool: Option<&'a ToolReport>,
}

// ── Assembler ─────────────────────────────────────────────────────────────

pub struct PromptAssembler {
    guidelines: IndustryGuidelines,
}

impl PromptAssembler {
    pub fn new(guidelines: IndustryGuidelines) -> Self {
        Self { guidelines }
    }

    pub fn assemble(&self, input: &PromptInput<'_>) -> String {
        let agent = input.agent;
        let mut sections: Vec<String> = Vec::with_capacity(7);

        sections.push(identity_section(agent));

        sections.push(
            "Always answer from the company knowledge base below before anything else. \
             The knowledge base takes priority over your general knowledge."
                .to_string(),
        );

        sections.push(tier_instruction(
            &input.retrieval.confidence,
            input.retrieval.live_snippets.len(),
        ));

        let knowledge = input.retrieval.knowledge_text();
        if knowledge.is_empty() {
            sections.push(
                "## Knowledge\nNo knowledge found for this question in the knowledge base \
                 or live sources."
                    .to_string(),
            );
        } else {
            sections.push(format!("## Knowledge\n{knowledge}"));
        }

        if let Some(report) = input.tool {
            sections.push(tool_section(report));
        }

        sections.push(format!(
            "## Guidelines ({})\n{}",
            agent.industry,
            self.guidelines.lookup(&agent.industry)
        ));

        sections.push(format!(
            "## Rules\n- Stay {} in every reply.\n\
             - Match your certainty to the confidence level above; never present a guess as fact.\n\
             - If the knowledge does not cover the question, say so and offer to connect the \
             customer with a human team member.",
            agent.personality
        ));

        sections.join("\n\n")
    }
}

impl Default for PromptAssembler {
    fn default() -> Self {
        Self::new(IndustryGuidelines::default())
    }
}

fn identity_section(agent: &AgentProfile) -> String {
    let mut text = format!(
        "You are {}, a customer support assistant. Your personality is {}.",
        agent.name, agent.personality
    );
    if !agent.description.trim().is_empty() {
        text.push(' ');
        text.push_str(agent.description.trim());
    }
    text
}

fn tier_instruction(confidence: &ConfidenceResult, live_snippets: usize) -> String {
    let n = confidence.passage_count;
    let pct = confidence.percent();
    let live = if live_snippets > 0 {
        format!(" plus {live_snippets} live source snippet(s)")
    } else {
        String::new()
    };

    match confidence.tier {
        ConfidenceTier::High => format!(
            "HIGH-CONFIDENCE: {n} knowledge passage(s){live} matched at {pct}% average \
             similarity. Answer directly and specifically from the knowledge."
        ),
        ConfidenceTier::Medium => format!(
            "MEDIUM-CONFIDENCE: {n} knowledge passage(s){live} matched at {pct}% average \
             similarity. Answer from the knowledge and mention briefly if part of the \
             question may not be covered."
        ),
        ConfidenceTier::Low => format!(
            "LOW-CONFIDENCE: {n} knowledge passage(s){live} matched at only {pct}% average \
             similarity. Share only what the knowledge supports, state clearly what you \
             are unsure about, and offer to connect the customer with a team member."
        ),
        ConfidenceTier::None => format!(
            "NO-KNOWLEDGE: {n} relevant passage(s) found ({pct}% similarity). Do not invent \
             facts about the company, its products or its policies. Say you do not have \
             that information and offer to connect the customer with a team member."
        ),
    }
}

fn tool_section(report: &ToolReport) -> String {
    match report {
        ToolReport::Executed { tool_id, outcome } => {
            let status = if outcome.success { "succeeded" } else { "did not succeed" };
            let mut text = format!("## Action taken\nThe `{tool_id}` action {status}.");
            if let Some(message) = &outcome.message {
                text.push_str(&format!(" Result: {message}"));
            }
            text.push_str(" Tell the customer what was done.");
            text
        }
        ToolReport::MissingParameters { tool_id, missing } => format!(
            "## Action pending\nThe `{tool_id}` action could not run yet. Ask the customer \
             for: {}.",
            missing.join(", ")
        ),
        ToolReport::Failed { tool_id, reason } => format!(
            "## Action failed\nThe `{tool_id}` action failed ({reason}). Apologise and offer \
             another way to help."
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tierline_core::knowledge::KnowledgePassage;

    fn agent() -> AgentProfile {
        let mut agent = AgentProfile::new("ava", "acme", "Ava");
        agent.personality = "warm and concise".into();
        agent.industry = "ecommerce".into();
        agent
    }

    fn outcome(tier: ConfidenceTier, passages: Vec<KnowledgePassage>) -> RetrievalOutcome {
        let mut confidence = crate::confidence::score(&passages);
        confidence.tier = tier;
        RetrievalOutcome {
            passages,
            live_snippets: Vec::new(),
            confidence,
            fallback_used: false,
        }
    }

    #[test]
    fn high_confidence_prompt_names_count_and_percent() {
        let retrieval = outcome(
            ConfidenceTier::High,
            vec![
                KnowledgePassage::new("Refunds take 5 days.", "faq", 0.9),
                KnowledgePassage::new("Refunds go to the card.", "faq", 0.8),
            ],
        );
        let agent = agent();
        let prompt = PromptAssembler::default().assemble(&PromptInput {
            agent: &agent,
            retrieval: &retrieval,
            tool: None,
        });
        assert!(prompt.contains("HIGH-CONFIDENCE: 2 knowledge passage(s) matched at 85%"));
        assert!(prompt.contains("Refunds take 5 days."));
        assert!(!prompt.contains("## Action"));
    }

    #[test]
    fn sections_appear_in_order() {
        let retrieval = outcome(ConfidenceTier::None, Vec::new());
        let agent = agent();
        let report = ToolReport::MissingParameters {
            tool_id: "order_status".into(),
            missing: vec!["order_id".into()],
        };
        let prompt = PromptAssembler::default().assemble(&PromptInput {
            agent: &agent,
            retrieval: &retrieval,
            tool: Some(&report),
        });

        let markers = [
            "You are Ava",
            "knowledge base takes priority",
            "NO-KNOWLEDGE",
            "No knowledge found",
            "Ask the customer for: order_id",
            "## Guidelines (ecommerce)",
            "Stay warm and concise",
        ];
        let positions: Vec<usize> = markers
            .iter()
            .map(|m| prompt.find(m).unwrap_or_else(|| panic!("missing {m}")))
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "{positions:?}");
    }

    #[test]
    fn assembly_is_deterministic() {
        let retrieval = outcome(
            ConfidenceTier::Medium,
            vec![KnowledgePassage::new("Open 9-5.", "hours", 0.65)],
        );
        let agent = agent();
        let input = PromptInput {
            agent: &agent,
            retrieval: &retrieval,
            tool: None,
        };
        let assembler = PromptAssembler::default();
        assert_eq!(assembler.assemble(&input), assembler.assemble(&input));
        assert!(assembler.assemble(&input).contains("MEDIUM-CONFIDENCE"));
    }

    #[test]
    fn executed_tool_result_is_included() {
        let retrieval = outcome(ConfidenceTier::Low, vec![KnowledgePassage::new("x", "y", 0.45)]);
        let agent = agent();
        let report = ToolReport::Executed {
            tool_id: "refund".into(),
            outcome: ToolOutcome::ok("Refund request opened."),
        };
        assert!(report.executed());
        let prompt = PromptAssembler::default().assemble(&PromptInput {
            agent: &agent,
            retrieval: &retrieval,
            tool: Some(&report),
        });
        assert!(prompt.contains("LOW-CONFIDENCE"));
        assert!(prompt.contains("The `refund` action succeeded. Result: Refund request opened."));
    }
}
