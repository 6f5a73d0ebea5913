//! In-memory knowledge base: the reference `VectorSearch` backend.
//!
//! Documents are split into paragraph chunks on insert and scored against the
//! query with lexical cosine similarity. Good enough for local runs and tests;
//! production deployments plug a real vector index in behind the same trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tierline_core::error::{RetrievalError, StoreError};
use tierline_core::knowledge::{KnowledgePassage, SearchOptions, VectorSearch};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::vector::lexical_similarity;

/// Longest chunk kept as a single passage, in bytes.
const MAX_CHUNK_LEN: usize = 800;

/// A document as stored in the documents file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeDocument {
    pub agent_id: String,
    pub company_id: String,
    pub source_id: String,
    pub text: String,
}

#[derive(Debug, Clone)]
struct Chunk {
    agent_id: String,
    company_id: String,
    source_id: String,
    text: String,
}

pub struct InMemoryKnowledgeBase {
    chunks: RwLock<Vec<Chunk>>,
}

impl InMemoryKnowledgeBase {
    pub fn new() -> Self {
        Self {
            chunks: RwLock::new(Vec::new()),
        }
    }

    /// Load documents from a JSON array file.
    pub async fn load_json(path: &Path) -> Result<Self, StoreError> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| StoreError::Storage(format!("read {}: {e}", path.display())))?;
        let documents: Vec<KnowledgeDocument> = serde_json::from_str(&raw)
            .map_err(|e| StoreError::Storage(format!("parse {}: {e}", path.display())))?;

        let kb = Self::new();
        let count = documents.len();
        for doc in documents {
            kb.add_document(doc).await;
        }
        info!(documents = count, path = %path.display(), "Knowledge base loaded");
        Ok(kb)
    }

    /// Index a document, split into paragraph chunks.
    pub async fn add_document(&self, doc: KnowledgeDocument) {
        let pieces = split_chunks(&doc.text);
        let mut chunks = self.chunks.write().await;
        for text in pieces {
            chunks.push(Chunk {
                agent_id: doc.agent_id.clone(),
                company_id: doc.company_id.clone(),
                source_id: doc.source_id.clone(),
                text,
            });
        }
    }

    pub async fn len(&self) -> usize {
        self.chunks.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.chunks.read().await.is_empty()
    }
}

impl Default for InMemoryKnowledgeBase {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorSearch for InMemoryKnowledgeBase {
    async fn search(
        &self,
        agent_id: &str,
        company_id: &str,
        query: &str,
        options: SearchOptions,
    ) -> Result<Vec<KnowledgePassage>, RetrievalError> {
        let chunks = self.chunks.read().await;

        let mut scored: Vec<KnowledgePassage> = chunks
            .iter()
            .filter(|c| c.agent_id == agent_id && c.company_id == company_id)
            .filter_map(|c| {
                let similarity = lexical_similarity(query, &c.text);
                (similarity >= options.threshold)
                    .then(|| KnowledgePassage::new(c.text.clone(), c.source_id.clone(), similarity))
            })
            .collect();

        scored.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(options.limit);

        debug!(agent_id, hits = scored.len(), "In-memory vector search");
        Ok(scored)
    }
}

/// Split on blank lines, then hard-wrap anything longer than `MAX_CHUNK_LEN`.
fn split_chunks(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    for paragraph in text.split("\n\n").map(str::trim).filter(|p| !p.is_empty()) {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            if !current.is_empty() && current.len() + word.len() + 1 > MAX_CHUNK_LEN {
                out.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
        }
        if !current.is_empty() {
            out.push(current);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(agent: &str, source: &str, text: &str) -> KnowledgeDocument {
        KnowledgeDocument {
            agent_id: agent.into(),
            company_id: "acme".into(),
            source_id: source.into(),
            text: text.into(),
        }
    }

    #[tokio::test]
    async fn search_ranks_and_scopes_by_agent() {
        let kb = InMemoryKnowledgeBase::new();
        kb.add_document(doc("ava", "faq", "Refunds are issued within 5 days.\n\nShipping is free over $50."))
            .await;
        kb.add_document(doc("bob", "faq", "Refunds for Bob's store take 10 days.")).await;
        assert_eq!(kb.len().await, 3);

        let hits = kb
            .search("ava", "acme", "how long do refunds take", SearchOptions { limit: 5, threshold: 0.1 })
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert!(hits[0].text.contains("5 days"));
        assert_eq!(hits[0].source_id, "faq");
    }

    #[tokio::test]
    async fn threshold_filters_weak_matches() {
        let kb = InMemoryKnowledgeBase::new();
        kb.add_document(doc("ava", "faq", "Shipping is free over fifty dollars.")).await;
        let hits = kb
            .search("ava", "acme", "refund", SearchOptions::default())
            .await
            .unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn long_paragraphs_are_wrapped() {
        let text = "word ".repeat(400);
        let chunks = split_chunks(&text);
        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| c.len() <= MAX_CHUNK_LEN));
    }
}
