//! Knowledge retrieval with live-fetch fallback.
//!
//! 1. Vector search over the agent's indexed knowledge, scored for confidence.
//! 2. When nothing was found or the mean similarity is below the fallback
//!    trigger, the live fetch is consulted for fresh snippets.
//! 3. If the fallback produced content the effective score is floored, so a
//!    turn with live content never reports `none`.
//!
//! Retrieval never fails a turn: any error is logged and read as "no knowledge".

use std::sync::Arc;
use std::time::Duration;
use tierline_config::RetrievalConfig;
use tierline_core::knowledge::{FetchOptions, KnowledgePassage, LiveFetch, SearchOptions, VectorSearch};
use tracing::{debug, warn};

use crate::confidence::{self, ConfidenceResult, ConfidenceTier};

/// Everything retrieval produced for one query.
#[derive(Debug, Clone)]
pub struct RetrievalOutcome {
    pub passages: Vec<KnowledgePassage>,
    pub live_snippets: Vec<String>,
    pub confidence: ConfidenceResult,
    pub fallback_used: bool,
}

impl RetrievalOutcome {
    pub fn knowledge_used(&self) -> bool {
        !self.passages.is_empty() || !self.live_snippets.is_empty()
    }

    /// Indexed passages first, then live snippets. Empty when nothing was found.
    pub fn knowledge_text(&self) -> String {
        let mut text = String::new();

        for (i, passage) in self.passages.iter().enumerate() {
            text.push_str(&format!(
                "[{}] (source: {}, {}% match)\n{}\n\n",
                i + 1,
                passage.source_id,
                (passage.similarity.clamp(0.0, 1.0) * 100.0).round() as u32,
                passage.text.trim()
            ));
        }

        for (i, snippet) in self.live_snippets.iter().enumerate() {
            text.push_str(&format!("[Live source {}]\n{}\n\n", i + 1, snippet.trim()));
        }

        text.trim_end().to_string()
    }
}

pub struct KnowledgeRetriever {
    vector_search: Arc<dyn VectorSearch>,
    live_fetch: Option<Arc<dyn LiveFetch>>,
    config: RetrievalConfig,
}

impl KnowledgeRetriever {
    pub fn new(vector_search: Arc<dyn VectorSearch>, config: RetrievalConfig) -> Self {
        Self {
            vector_search,
            live_fetch: None,
            config,
        }
    }

    /// Attach the live-fetch fallback.
    pub fn with_live_fetch(mut self, live_fetch: Arc<dyn LiveFetch>) -> Self {
        self.live_fetch = Some(live_fetch);
        self
    }

    pub async fn retrieve(&self, agent_id: &str, company_id: &str, query: &str) -> RetrievalOutcome {
        let options = SearchOptions {
            limit: self.config.limit,
            threshold: self.config.similarity_threshold,
        };

        let passages = match self
            .vector_search
            .search(agent_id, company_id, query, options)
            .await
        {
            Ok(passages) => passages,
            Err(e) => {
                warn!(agent_id, error = %e, "Vector search failed, continuing without knowledge");
                Vec::new()
            }
        };

        let confidence = confidence::score(&passages);
        debug!(
            agent_id,
            passages = passages.len(),
            score = confidence.score,
            tier = %confidence.tier,
            "Vector search scored"
        );

        let needs_fallback = passages.is_empty() || confidence.score < self.config.fallback_trigger;
        if !needs_fallback {
            return RetrievalOutcome {
                passages,
                live_snippets: Vec::new(),
                confidence,
                fallback_used: false,
            };
        }

        let live_snippets = self.fetch_live(agent_id, company_id, query).await;
        let fallback_used = !live_snippets.is_empty();
        let confidence = if fallback_used {
            apply_fallback_floor(confidence, self.config.fallback_floor)
        } else {
            confidence
        };

        RetrievalOutcome {
            passages,
            live_snippets,
            confidence,
            fallback_used,
        }
    }

    async fn fetch_live(&self, agent_id: &str, company_id: &str, query: &str) -> Vec<String> {
        let Some(live_fetch) = &self.live_fetch else {
            return Vec::new();
        };

        let options = FetchOptions {
            max_urls: self.config.max_urls,
            timeout_ms: self.config.fetch_timeout_ms,
        };
        // URLs are fetched in parallel, each under its own timeout; this caps the whole call.
        let budget = Duration::from_millis(self.config.fetch_timeout_ms.saturating_mul(2));

        match tokio::time::timeout(budget, live_fetch.fetch(agent_id, company_id, query, options)).await {
            Ok(Ok(result)) => {
                let mut snippets: Vec<String> = result
                    .snippets
                    .into_iter()
                    .filter(|s| !s.trim().is_empty())
                    .collect();
                snippets.truncate(self.config.max_snippets);
                snippets
            }
            Ok(Err(e)) => {
                warn!(agent_id, error = %e, "Live fetch failed, continuing without it");
                Vec::new()
            }
            Err(_) => {
                warn!(agent_id, budget_ms = budget.as_millis() as u64, "Live fetch timed out");
                Vec::new()
            }
        }
    }
}

/// Lift the score to `floor` once live content exists. The tier is medium at
/// 0.7 and above, otherwise the regular table with at least one passage
/// counted, and never below low.
pub fn apply_fallback_floor(result: ConfidenceResult, floor: f32) -> ConfidenceResult {
    let effective = result.score.max(floor).clamp(0.0, 1.0);
    let tier = if effective >= 0.7 {
        ConfidenceTier::Medium
    } else {
        confidence::tier_for(effective, result.passage_count.max(1)).max(ConfidenceTier::Low)
    };

    ConfidenceResult {
        score: effective,
        tier,
        passage_count: result.passage_count,
        mean_similarity: result.mean_similarity,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{FailingVectorSearch, StaticLiveFetch, StaticVectorSearch};

    fn retriever(passages: Vec<KnowledgePassage>, snippets: Vec<&str>) -> KnowledgeRetriever {
        KnowledgeRetriever::new(Arc::new(StaticVectorSearch::new(passages)), RetrievalConfig::default())
            .with_live_fetch(Arc::new(StaticLiveFetch::new(snippets)))
    }

    #[tokio::test]
    async fn strong_passages_skip_fallback() {
        let r = retriever(
            vec![
                KnowledgePassage::new("Refunds take 5 days.", "faq", 0.9),
                KnowledgePassage::new("Refunds go to the original card.", "faq", 0.85),
            ],
            vec!["live snippet"],
        );
        let outcome = r.retrieve("ava", "acme", "refund").await;
        assert!(!outcome.fallback_used);
        assert!(outcome.live_snippets.is_empty());
        assert_eq!(outcome.confidence.tier, ConfidenceTier::High);
    }

    #[tokio::test]
    async fn empty_passages_with_live_content_floor_to_low() {
        let r = retriever(Vec::new(), vec!["Store hours are 9-5.", "We ship worldwide."]);
        let outcome = r.retrieve("ava", "acme", "hours").await;
        assert!(outcome.fallback_used);
        assert_eq!(outcome.live_snippets.len(), 2);
        assert!((outcome.confidence.score - 0.5).abs() < 1e-6);
        assert_eq!(outcome.confidence.tier, ConfidenceTier::Low);
        assert!(outcome.knowledge_used());
    }

    #[tokio::test]
    async fn weak_passages_trigger_fallback_and_are_kept() {
        let r = retriever(
            vec![KnowledgePassage::new("Loosely related.", "faq", 0.35)],
            vec!["fresh"],
        );
        let outcome = r.retrieve("ava", "acme", "q").await;
        assert!(outcome.fallback_used);
        assert_eq!(outcome.passages.len(), 1);
        assert_eq!(outcome.confidence.tier, ConfidenceTier::Low);
    }

    #[tokio::test]
    async fn snippets_are_capped() {
        let r = retriever(Vec::new(), vec!["a", "b", "c", "d", "e", "f"]);
        let outcome = r.retrieve("ava", "acme", "q").await;
        assert_eq!(outcome.live_snippets.len(), 4);
    }

    #[tokio::test]
    async fn search_error_reads_as_no_knowledge() {
        let r = KnowledgeRetriever::new(Arc::new(FailingVectorSearch), RetrievalConfig::default());
        let outcome = r.retrieve("ava", "acme", "q").await;
        assert!(!outcome.knowledge_used());
        assert_eq!(outcome.confidence.tier, ConfidenceTier::None);
        assert!(outcome.knowledge_text().is_empty());
    }

    #[test]
    fn floor_boundaries() {
        let none = ConfidenceResult::empty();
        assert_eq!(apply_fallback_floor(none, 0.5).tier, ConfidenceTier::Low);
        assert_eq!(apply_fallback_floor(none, 0.65).tier, ConfidenceTier::Medium);
        assert_eq!(apply_fallback_floor(none, 0.7).tier, ConfidenceTier::Medium);
        assert_eq!(apply_fallback_floor(none, 0.2).tier, ConfidenceTier::Low);
    }

    #[test]
    fn knowledge_text_orders_passages_before_live() {
        let outcome = RetrievalOutcome {
            passages: vec![KnowledgePassage::new("Indexed fact.", "handbook", 0.72)],
            live_snippets: vec!["Live fact.".into()],
            confidence: ConfidenceResult::empty(),
            fallback_used: true,
        };
        let text = outcome.knowledge_text();
        let indexed = text.find("Indexed fact.").unwrap();
        let live = text.find("Live fact.").unwrap();
        assert!(indexed < live);
        assert!(text.contains("(source: handbook, 72% match)"));
        assert!(text.contains("[Live source 1]"));
    }
}
