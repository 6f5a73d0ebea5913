//! Live fetch: the fallback retrieval path when indexed knowledge is thin.
//!
//! Fetches the agent's configured source pages with a per-URL timeout,
//! strips markup, and keeps the sentences that share terms with the query.

use async_trait::async_trait;
use regex_lite::Regex;
use std::sync::{Arc, LazyLock};
use std::time::Duration;
use tierline_core::agent::AgentDirectory;
use tierline_core::error::RetrievalError;
use tierline_core::knowledge::{FetchOptions, FetchResult, LiveFetch};
use tierline_memory::vector::tokenize;
use tracing::{debug, warn};

/// Snippets kept per fetched page.
const SNIPPETS_PER_PAGE: usize = 2;
const MIN_SEGMENT_LEN: usize = 20;
const MAX_SEGMENT_LEN: usize = 400;

static SCRIPT_OR_STYLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<script[^>]*>.*?</script>|<style[^>]*>.*?</style>")
        .expect("valid script regex")
});

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("valid tag regex"));

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

static SENTENCE_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?]\s+").expect("valid sentence regex"));

pub struct HttpLiveFetch {
    client: reqwest::Client,
    agents: Arc<dyn AgentDirectory>,
}

impl HttpLiveFetch {
    pub fn new(agents: Arc<dyn AgentDirectory>) -> Result<Self, RetrievalError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("tierline/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| RetrievalError::LiveFetch(format!("HTTP client: {e}")))?;
        Ok(Self { client, agents })
    }

    async fn fetch_page(&self, url: &str, timeout: Duration) -> Result<String, RetrievalError> {
        let request = async {
            let response = self
                .client
                .get(url)
                .send()
                .await
                .map_err(|e| RetrievalError::LiveFetch(format!("{url}: {e}")))?;
            if !response.status().is_success() {
                return Err(RetrievalError::LiveFetch(format!(
                    "{url}: status {}",
                    response.status()
                )));
            }
            response
                .text()
                .await
                .map_err(|e| RetrievalError::LiveFetch(format!("{url}: {e}")))
        };

        tokio::time::timeout(timeout, request)
            .await
            .map_err(|_| RetrievalError::Timeout(timeout.as_millis() as u64))?
    }
}

#[async_trait]
impl LiveFetch for HttpLiveFetch {
    async fn fetch(
        &self,
        agent_id: &str,
        company_id: &str,
        query: &str,
        options: FetchOptions,
    ) -> Result<FetchResult, RetrievalError> {
        let Some(agent) = self.agents.lookup(agent_id, company_id).await else {
            return Ok(FetchResult::default());
        };

        let urls: Vec<&String> = agent.source_urls.iter().take(options.max_urls).collect();
        if urls.is_empty() {
            return Ok(FetchResult::default());
        }

        let timeout = Duration::from_millis(options.timeout_ms);
        let pages =
            futures::future::join_all(urls.iter().map(|url| self.fetch_page(url, timeout))).await;

        let mut snippets = Vec::new();
        let mut failures = 0;
        for (url, page) in urls.iter().zip(pages) {
            match page {
                Ok(html) => {
                    let text = strip_markup(&html);
                    snippets.extend(select_segments(&text, query, SNIPPETS_PER_PAGE));
                }
                Err(e) => {
                    failures += 1;
                    warn!(url = %url, error = %e, "Live source fetch failed");
                }
            }
        }

        if failures == urls.len() {
            return Err(RetrievalError::LiveFetch(format!(
                "all {failures} live sources failed"
            )));
        }

        debug!(agent_id, snippets = snippets.len(), "Live fetch complete");
        Ok(FetchResult { snippets })
    }
}

/// Drop scripts, styles and tags; decode the common entities; collapse whitespace.
pub fn strip_markup(html: &str) -> String {
    let without_code = SCRIPT_OR_STYLE.replace_all(html, " ");
    let without_tags = TAG.replace_all(&without_code, " ");
    let decoded = without_tags
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");
    WHITESPACE.replace_all(&decoded, " ").trim().to_string()
}

/// Sentences sharing the most query terms, best first.
pub fn select_segments(text: &str, query: &str, max: usize) -> Vec<String> {
    let terms = tokenize(query);
    if terms.is_empty() {
        return Vec::new();
    }

    let mut scored: Vec<(usize, usize, &str)> = SENTENCE_END
        .split(text)
        .map(str::trim)
        .filter(|s| (MIN_SEGMENT_LEN..=MAX_SEGMENT_LEN).contains(&s.len()))
        .enumerate()
        .filter_map(|(pos, segment)| {
            let words = tokenize(segment);
            let overlap = terms.iter().filter(|t| words.contains(t)).count();
            (overlap > 0).then_some((overlap, pos, segment))
        })
        .collect();

    // Most overlap first, then document order.
    scored.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
    scored
        .into_iter()
        .take(max)
        .map(|(_, _, s)| s.to_string())
        .collect()
}
