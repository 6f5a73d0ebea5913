//! Knowledge capabilities: indexed vector search and live fetch fallback.
//!
//! Both are narrow seams: the orchestrator never knows what index or crawler
//! sits behind them.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::error::RetrievalError;

/// A ranked passage returned by the vector backend for a single query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgePassage {
    /// Passage text
    pub text: String,

    /// Identifier of the source document
    pub source_id: String,

    /// Similarity to the query, in [0, 1]
    pub similarity: f32,
}

impl KnowledgePassage {
    pub fn new(text: impl Into<String>, source_id: impl Into<String>, similarity: f32) -> Self {
        Self {
            text: text.into(),
            source_id: source_id.into(),
            similarity,
        }
    }
}

/// Vector search parameters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SearchOptions {
    /// Maximum passages to return
    pub limit: usize,

    /// Minimum similarity for a passage to be returned
    pub threshold: f32,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            limit: 5,
            threshold: 0.3,
        }
    }
}

/// Live fetch parameters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FetchOptions {
    /// Maximum number of source URLs to visit
    pub max_urls: usize,

    /// Per-URL timeout in milliseconds
    pub timeout_ms: u64,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            max_urls: 2,
            timeout_ms: 2_000,
        }
    }
}

/// Text snippets collected by a live fetch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FetchResult {
    pub snippets: Vec<String>,
}

/// Similarity search over an agent's indexed knowledge.
#[async_trait]
pub trait VectorSearch: Send + Sync {
    async fn search(
        &self,
        agent_id: &str,
        company_id: &str,
        query: &str,
        options: SearchOptions,
    ) -> Result<Vec<KnowledgePassage>, RetrievalError>;
}

/// On-demand fetch of live source content, used when indexed knowledge is thin.
#[async_trait]
pub trait LiveFetch: Send + Sync {
    async fn fetch(
        &self,
        agent_id: &str,
        company_id: &str,
        query: &str,
        options: FetchOptions,
    ) -> Result<FetchResult, RetrievalError>;
}
