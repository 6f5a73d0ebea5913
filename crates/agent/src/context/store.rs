//! Per-session conversation contexts.
//!
//! Two layers, kept apart:
//! - the working window (bounded, in memory) that feeds the LLM
//! - the durable transcript (unbounded, [`TranscriptStore`]) that is never trimmed
//!
//! Each session's record sits behind its own async mutex, so appends to one
//! session are atomic and other sessions are never blocked.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tierline_core::error::ValidationError;
use tierline_core::memory::{SessionOwner, TranscriptEntry, TranscriptStore};
use tierline_core::message::Message;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};

use crate::context::summary;
use crate::context::window::ContextWindow;

/// Identifies a session and who it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionScope {
    pub session_id: String,
    pub agent_id: String,
    pub company_id: String,
}

impl SessionScope {
    pub fn new(
        session_id: impl Into<String>,
        agent_id: impl Into<String>,
        company_id: impl Into<String>,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            agent_id: agent_id.into(),
            company_id: company_id.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConversationContext {
    pub scope: SessionScope,
    pub window: ContextWindow,
    pub summary: Option<String>,
    /// Consecutive turns the bot could not answer
    pub unresolved_count: u32,
    pub updated_at: DateTime<Utc>,
}

/// Read-only view of a session, for APIs.
#[derive(Debug, Clone, Serialize)]
pub struct ContextSnapshot {
    pub session_id: String,
    pub agent_id: String,
    pub company_id: String,
    pub messages: Vec<Message>,
    pub summary: Option<String>,
    pub unresolved_count: u32,
    pub updated_at: DateTime<Utc>,
}

pub struct ConversationContexts {
    sessions: RwLock<HashMap<String, Arc<Mutex<ConversationContext>>>>,
    transcript: Arc<dyn TranscriptStore>,
    window_size: usize,
}

impl ConversationContexts {
    pub fn new(window_size: usize, transcript: Arc<dyn TranscriptStore>) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            transcript,
            window_size,
        }
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Fetch the session record, creating it on first use. A session the
    /// process has not seen yet is rehydrated from the transcript tail.
    async fn record(&self, scope: &SessionScope) -> Arc<Mutex<ConversationContext>> {
        if let Some(existing) = self.sessions.read().await.get(&scope.session_id) {
            return existing.clone();
        }

        let history = match self.transcript.load(&scope.session_id).await {
            Ok(history) => history,
            Err(e) => {
                warn!(session_id = %scope.session_id, error = %e, "Transcript load failed, starting empty");
                Vec::new()
            }
        };

        let mut sessions = self.sessions.write().await;
        sessions
            .entry(scope.session_id.clone())
            .or_insert_with(|| {
                let mut window = ContextWindow::new(self.window_size);
                for message in history {
                    window.push(message);
                }
                Arc::new(Mutex::new(ConversationContext {
                    scope: scope.clone(),
                    window,
                    summary: None,
                    unresolved_count: 0,
                    updated_at: Utc::now(),
                }))
            })
            .clone()
    }

    async fn existing(&self, session_id: &str) -> Option<Arc<Mutex<ConversationContext>>> {
        self.sessions.read().await.get(session_id).cloned()
    }

    /// Append to the working window (evicting beyond the window size) and to
    /// the durable transcript. Transcript failures are logged, never raised.
    pub async fn append(&self, scope: &SessionScope, message: Message) {
        let record = self.record(scope).await;
        let mut ctx = record.lock().await;

        let evicted = ctx.window.push(message.clone());
        ctx.updated_at = Utc::now();
        if evicted > 0 {
            debug!(session_id = %scope.session_id, evicted, "Window trimmed");
        }

        let entry = TranscriptEntry {
            session_id: scope.session_id.clone(),
            agent_id: scope.agent_id.clone(),
            company_id: scope.company_id.clone(),
            message,
        };
        if let Err(e) = self.transcript.append(entry).await {
            warn!(session_id = %scope.session_id, error = %e, "Transcript append failed");
        }
    }

    /// Who the session belongs to: the live record if this process has one,
    /// otherwise the first transcript entry.
    pub async fn owner(&self, session_id: &str) -> Option<SessionOwner> {
        if let Some(record) = self.existing(session_id).await {
            let ctx = record.lock().await;
            return Some(SessionOwner {
                agent_id: ctx.scope.agent_id.clone(),
                company_id: ctx.scope.company_id.clone(),
            });
        }
        match self.transcript.owner(session_id).await {
            Ok(owner) => owner,
            Err(e) => {
                warn!(session_id, error = %e, "Transcript owner lookup failed");
                None
            }
        }
    }

    /// Reject a turn whose agent or company differs from the session's owner.
    /// Unknown sessions pass; the first turn claims them.
    pub async fn ensure_scope(&self, scope: &SessionScope) -> Result<(), ValidationError> {
        match self.owner(&scope.session_id).await {
            Some(owner) if owner.agent_id != scope.agent_id || owner.company_id != scope.company_id => {
                warn!(session_id = %scope.session_id, "Session used outside its owning scope");
                Err(ValidationError::SessionScopeMismatch {
                    session_id: scope.session_id.clone(),
                })
            }
            _ => Ok(()),
        }
    }

    async fn ensure_company(&self, session_id: &str, company_id: &str) -> Result<(), ValidationError> {
        match self.owner(session_id).await {
            Some(owner) if owner.company_id != company_id => Err(ValidationError::SessionScopeMismatch {
                session_id: session_id.to_string(),
            }),
            _ => Ok(()),
        }
    }

    /// The most recent `limit` messages of a company's session.
    pub async fn history(
        &self,
        session_id: &str,
        company_id: &str,
        limit: usize,
    ) -> Result<Vec<Message>, ValidationError> {
        self.ensure_company(session_id, company_id).await?;
        Ok(match self.existing(session_id).await {
            Some(record) => record.lock().await.window.recent(limit),
            None => {
                // Not in memory; fall back to the durable record.
                let all = self.transcript.load(session_id).await.unwrap_or_default();
                let skip = all.len().saturating_sub(limit);
                all.into_iter().skip(skip).collect()
            }
        })
    }

    /// Summarize the whole session (from the durable transcript) and cache it on the record.
    pub async fn summarize(
        &self,
        session_id: &str,
        company_id: &str,
        escalation_reason: Option<&str>,
    ) -> Result<String, ValidationError> {
        self.ensure_company(session_id, company_id).await?;
        let messages = self.full_history(session_id).await;
        let text = summary::summarize(&messages, escalation_reason);

        if let Some(record) = self.existing(session_id).await {
            record.lock().await.summary = Some(text.clone());
        }
        Ok(text)
    }

    pub async fn key_points(&self, session_id: &str, company_id: &str) -> Result<Vec<String>, ValidationError> {
        self.ensure_company(session_id, company_id).await?;
        Ok(summary::key_points(&self.full_history(session_id).await))
    }

    /// Count an unresolved turn, or reset the streak. Returns the new count.
    pub async fn record_resolution(&self, scope: &SessionScope, resolved: bool) -> u32 {
        let record = self.record(scope).await;
        let mut ctx = record.lock().await;
        ctx.unresolved_count = if resolved { 0 } else { ctx.unresolved_count + 1 };
        ctx.unresolved_count
    }

    pub async fn unresolved_count(&self, session_id: &str) -> u32 {
        match self.existing(session_id).await {
            Some(record) => record.lock().await.unresolved_count,
            None => 0,
        }
    }

    pub async fn snapshot(&self, session_id: &str) -> Option<ContextSnapshot> {
        let record = self.existing(session_id).await?;
        let ctx = record.lock().await;
        Some(ContextSnapshot {
            session_id: ctx.scope.session_id.clone(),
            agent_id: ctx.scope.agent_id.clone(),
            company_id: ctx.scope.company_id.clone(),
            messages: ctx.window.messages().cloned().collect(),
            summary: ctx.summary.clone(),
            unresolved_count: ctx.unresolved_count,
            updated_at: ctx.updated_at,
        })
    }

    async fn full_history(&self, session_id: &str) -> Vec<Message> {
        match self.transcript.load(session_id).await {
            Ok(messages) => messages,
            Err(e) => {
                warn!(session_id, error = %e, "Transcript load failed, summarizing the window");
                match self.existing(session_id).await {
                    Some(record) => record.lock().await.window.messages().cloned().collect(),
                    None => Vec::new(),
                }
            }
        }
    }
}
