//! Shared test helpers: scripted providers and static capabilities.

use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;
use tierline_core::error::{ProviderError, RetrievalError};
use tierline_core::knowledge::{FetchOptions, FetchResult, KnowledgePassage, LiveFetch, SearchOptions, VectorSearch};
use tierline_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};

/// A mock provider that returns a sequence of scripted responses and keeps
/// every request it was sent.
///
/// Panics if more calls are made than responses provided.
pub struct SequentialMockProvider {
    responses: Mutex<Vec<ProviderResponse>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl SequentialMockProvider {
    pub fn new(responses: Vec<ProviderResponse>) -> Self {
        Self {
            responses: Mutex::new(responses),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// A provider that answers every call with the same text.
    pub fn repeating(text: &str, calls: usize) -> Self {
        Self::new((0..calls).map(|_| make_text_response(text)).collect())
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// The system prompt of the most recent request.
    pub fn last_system_prompt(&self) -> Option<String> {
        self.requests
            .lock()
            .unwrap()
            .last()
            .and_then(|r| r.messages.first())
            .map(|m| m.content.clone())
    }

    pub fn last_request(&self) -> Option<ProviderRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl Provider for SequentialMockProvider {
    fn name(&self) -> &str {
        "sequential_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let mut requests = self.requests.lock().unwrap();
        let responses = self.responses.lock().unwrap();
        let call = requests.len();
        if call >= responses.len() {
            panic!(
                "SequentialMockProvider: no more responses (call #{}, have {})",
                call,
                responses.len()
            );
        }
        requests.push(request);
        Ok(responses[call].clone())
    }
}

/// Always fails with an API error.
pub struct FailingProvider;

#[async_trait]
impl Provider for FailingProvider {
    fn name(&self) -> &str {
        "failing"
    }

    async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        Err(ProviderError::ApiError {
            status_code: 503,
            message: "upstream unavailable".into(),
        })
    }
}

/// Sleeps before answering, to exercise the completion timeout.
pub struct SlowProvider(pub Duration);

#[async_trait]
impl Provider for SlowProvider {
    fn name(&self) -> &str {
        "slow"
    }

    async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        tokio::time::sleep(self.0).await;
        Ok(make_text_response("too late"))
    }
}

pub fn make_text_response(text: &str) -> ProviderResponse {
    ProviderResponse {
        content: text.to_string(),
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
        model: "mock-model".into(),
    }
}

/// Returns the same passages for every query.
pub struct StaticVectorSearch {
    passages: Vec<KnowledgePassage>,
}

impl StaticVectorSearch {
    pub fn new(passages: Vec<KnowledgePassage>) -> Self {
        Self { passages }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }
}

#[async_trait]
impl VectorSearch for StaticVectorSearch {
    async fn search(
        &self,
        _agent_id: &str,
        _company_id: &str,
        _query: &str,
        options: SearchOptions,
    ) -> Result<Vec<KnowledgePassage>, RetrievalError> {
        Ok(self
            .passages
            .iter()
            .filter(|p| p.similarity >= options.threshold)
            .take(options.limit)
            .cloned()
            .collect())
    }
}

pub struct FailingVectorSearch;

#[async_trait]
impl VectorSearch for FailingVectorSearch {
    async fn search(
        &self,
        _agent_id: &str,
        _company_id: &str,
        _query: &str,
        _options: SearchOptions,
    ) -> Result<Vec<KnowledgePassage>, RetrievalError> {
        Err(RetrievalError::VectorSearch("index offline".into()))
    }
}

/// Returns fixed snippets and counts how often it was consulted.
pub struct StaticLiveFetch {
    snippets: Vec<String>,
    calls: Mutex<usize>,
}

impl StaticLiveFetch {
    pub fn new(snippets: Vec<&str>) -> Self {
        Self {
            snippets: snippets.into_iter().map(String::from).collect(),
            calls: Mutex::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl LiveFetch for StaticLiveFetch {
    async fn fetch(
        &self,
        _agent_id: &str,
        _company_id: &str,
        _query: &str,
        _options: FetchOptions,
    ) -> Result<FetchResult, RetrievalError> {
        *self.calls.lock().unwrap() += 1;
        Ok(FetchResult {
            snippets: self.snippets.clone(),
        })
    }
}
