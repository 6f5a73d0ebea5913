//! Escalation domain types and lifecycle state machine.
//!
//! ```text
//! pending ──assign──▶ assigned ──start──▶ in_progress ──resolve──▶ resolved
//!    │                   │                     │
//!    └───────────────────┴────────close────────┴──────────────────▶ closed
//! ```
//!
//! `resolved` and `closed` are terminal: no transitions and no new messages.

use async_trait::async_trait;
use chrono::{DateTime, Datelike, Timelike, Utc, Weekday};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use crate::error::{EscalationError, StoreError};

/// Urgency of an escalation. Ordered from least to most urgent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
    Urgent,
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Urgent => "urgent",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscalationStatus {
    Pending,
    Assigned,
    InProgress,
    Resolved,
    Closed,
}

impl EscalationStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Resolved | Self::Closed)
    }

    /// Whether `self → next` is an edge of the lifecycle graph.
    pub fn can_transition_to(self, next: Self) -> bool {
        use EscalationStatus::*;
        match (self, next) {
            (Pending, Assigned) | (Assigned, InProgress) | (InProgress, Resolved) => true,
            (from, Closed) => !from.is_terminal(),
            _ => false,
        }
    }
}

impl std::fmt::Display for EscalationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Assigned => "assigned",
            Self::InProgress => "in_progress",
            Self::Resolved => "resolved",
            Self::Closed => "closed",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SenderType {
    Customer,
    Bot,
    Human,
    System,
}

/// A message on the escalation's own thread.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscalationMessage {
    pub content: String,
    pub sender: String,
    pub sender_type: SenderType,
    pub timestamp: DateTime<Utc>,
}

/// A request to hand a conversation to a human.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Escalation {
    pub id: String,
    pub session_id: String,
    pub company_id: String,
    pub reason: String,
    pub priority: Priority,
    pub status: EscalationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_agent: Option<String>,
    #[serde(default)]
    pub messages: Vec<EscalationMessage>,
    /// Conversation summary captured at creation time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,
}

impl Escalation {
    pub fn new(
        session_id: impl Into<String>,
        company_id: impl Into<String>,
        reason: impl Into<String>,
        priority: Priority,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            session_id: session_id.into(),
            company_id: company_id.into(),
            reason: reason.into(),
            priority,
            status: EscalationStatus::Pending,
            assigned_agent: None,
            messages: Vec::new(),
            summary: None,
            created_at: now,
            updated_at: now,
            resolved_at: None,
        }
    }

    /// `pending → assigned`. Requires a human agent id.
    pub fn assign(&mut self, agent_id: Option<String>) -> Result<(), EscalationError> {
        self.check(EscalationStatus::Assigned)?;
        let agent_id = agent_id
            .filter(|a| !a.trim().is_empty())
            .ok_or(EscalationError::MissingAssignee)?;
        self.assigned_agent = Some(agent_id);
        self.apply(EscalationStatus::Assigned);
        Ok(())
    }

    /// `assigned → in_progress`.
    pub fn start(&mut self) -> Result<(), EscalationError> {
        self.check(EscalationStatus::InProgress)?;
        self.apply(EscalationStatus::InProgress);
        Ok(())
    }

    /// `in_progress → resolved`.
    pub fn resolve(&mut self) -> Result<(), EscalationError> {
        self.check(EscalationStatus::Resolved)?;
        self.apply(EscalationStatus::Resolved);
        self.resolved_at = Some(self.updated_at);
        Ok(())
    }

    /// Any non-terminal state `→ closed`.
    pub fn close(&mut self) -> Result<(), EscalationError> {
        self.check(EscalationStatus::Closed)?;
        self.apply(EscalationStatus::Closed);
        Ok(())
    }

    pub fn add_message(
        &mut self,
        content: impl Into<String>,
        sender: impl Into<String>,
        sender_type: SenderType,
    ) -> Result<(), EscalationError> {
        if self.status.is_terminal() {
            return Err(EscalationError::Terminal(self.id.clone()));
        }
        let now = Utc::now();
        self.messages.push(EscalationMessage {
            content: content.into(),
            sender: sender.into(),
            sender_type,
            timestamp: now,
        });
        self.updated_at = now;
        Ok(())
    }

    fn check(&self, next: EscalationStatus) -> Result<(), EscalationError> {
        if self.status.is_terminal() {
            return Err(EscalationError::Terminal(self.id.clone()));
        }
        if !self.status.can_transition_to(next) {
            return Err(EscalationError::InvalidTransition {
                from: self.status.to_string(),
                to: next.to_string(),
            });
        }
        Ok(())
    }

    fn apply(&mut self, next: EscalationStatus) {
        self.status = next;
        self.updated_at = Utc::now();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Presence {
    Online,
    Away,
    Offline,
}

/// A weekly availability window, in UTC hours `[start_hour, end_hour)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityWindow {
    pub days: Vec<Weekday>,
    pub start_hour: u32,
    pub end_hour: u32,
}

impl AvailabilityWindow {
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.days.contains(&at.weekday()) && (self.start_hour..self.end_hour).contains(&at.hour())
    }
}

/// A human support agent who can take escalations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HumanAgent {
    pub id: String,
    pub company_id: String,
    pub name: String,
    pub presence: Presence,
    #[serde(default)]
    pub active_chats: u32,
    #[serde(default = "default_max_chats")]
    pub max_chats: u32,
    /// Empty means always available while online
    #[serde(default)]
    pub availability: Vec<AvailabilityWindow>,
}

fn default_max_chats() -> u32 {
    3
}

impl HumanAgent {
    pub fn is_available(&self, at: DateTime<Utc>) -> bool {
        self.presence == Presence::Online
            && self.active_chats < self.max_chats
            && (self.availability.is_empty() || self.availability.iter().any(|w| w.contains(at)))
    }
}

/// Persistence for escalation records.
#[async_trait]
pub trait EscalationStore: Send + Sync {
    async fn insert(&self, escalation: Escalation) -> Result<(), StoreError>;

    async fn get(&self, id: &str) -> Result<Option<Escalation>, StoreError>;

    async fn update(&self, escalation: Escalation) -> Result<(), StoreError>;

    async fn list_by_company(&self, company_id: &str) -> Result<Vec<Escalation>, StoreError>;

    /// The non-terminal escalation for a session, if any.
    async fn open_for_session(&self, session_id: &str) -> Result<Option<Escalation>, StoreError>;
}

/// Roster of human agents and their chat capacity.
#[async_trait]
pub trait HumanAgentDirectory: Send + Sync {
    /// Agents of the company who could take a chat at `at`, in roster order.
    async fn available_for(&self, company_id: &str, at: DateTime<Utc>) -> Result<Vec<HumanAgent>, StoreError>;

    /// Take one chat slot if the agent still has capacity. Returns whether it was claimed.
    async fn claim_slot(&self, agent_id: &str) -> Result<bool, StoreError>;

    async fn release_slot(&self, agent_id: &str) -> Result<(), StoreError>;
}
