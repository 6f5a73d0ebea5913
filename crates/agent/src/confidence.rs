//! Retrieval-confidence scoring.
//!
//! Turns a set of retrieved passages into a coarse tier the prompt can key
//! its honesty instructions on. Pure and total: no I/O, no failure path.

use serde::{Deserialize, Serialize};
use tierline_core::knowledge::KnowledgePassage;

/// How well the retrieved knowledge grounds an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceTier {
    None,
    Low,
    Medium,
    High,
}

impl ConfidenceTier {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl std::fmt::Display for ConfidenceTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceResult {
    /// Mean similarity, in [0, 1]
    pub score: f32,
    pub tier: ConfidenceTier,
    pub passage_count: usize,
    pub mean_similarity: f32,
}

impl ConfidenceResult {
    pub fn empty() -> Self {
        Self {
            score: 0.0,
            tier: ConfidenceTier::None,
            passage_count: 0,
            mean_similarity: 0.0,
        }
    }

    /// Score as a whole percentage, for prompts and logs.
    pub fn percent(&self) -> u32 {
        (self.score * 100.0).round() as u32
    }
}

/// Tier thresholds, first match wins.
pub fn tier_for(score: f32, passage_count: usize) -> ConfidenceTier {
    if score >= 0.8 && passage_count >= 2 {
        ConfidenceTier::High
    } else if score >= 0.6 && passage_count >= 1 {
        ConfidenceTier::Medium
    } else if score >= 0.4 && passage_count >= 1 {
        ConfidenceTier::Low
    } else {
        ConfidenceTier::None
    }
}

/// Score a set of passages by their mean similarity.
pub fn score(passages: &[KnowledgePassage]) -> ConfidenceResult {
    if passages.is_empty() {
        return ConfidenceResult::empty();
    }

    let total: f32 = passages.iter().map(|p| sanitize(p.similarity)).sum();
    let mean = total / passages.len() as f32;

    ConfidenceResult {
        score: mean,
        tier: tier_for(mean, passages.len()),
        passage_count: passages.len(),
        mean_similarity: mean,
    }
}

fn sanitize(similarity: f32) -> f32 {
    if similarity.is_nan() {
        0.0
    } else {
        similarity.clamp(0.0, 1.0)
    }
}
