//! Escalation engine: rule evaluation, creation with auto-assignment, and
//! the lifecycle operations.
//!
//! Every mutation of one escalation runs under that escalation's lock, so
//! concurrent transitions are applied one at a time against fresh state.
//! Creation runs under a separate per-session lock.
//!
//! An assigned escalation always holds one chat slot of its assignee, taken
//! when it was assigned and given back when it is resolved or closed.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tierline_core::error::{EscalationError, Result};
use tierline_core::escalation::{
    Escalation, EscalationStatus, EscalationStore, HumanAgentDirectory, Priority, SenderType,
};
use tierline_core::event::{DomainEvent, EventBus};
use tracing::{debug, info, warn};

use crate::escalation::rules::{self, EscalationDecision, EscalationRule, Signals};
use crate::escalation::sla::SlaTable;
use crate::locks::KeyedLocks;

/// Input for opening an escalation.
#[derive(Debug, Clone)]
pub struct NewEscalation {
    pub session_id: String,
    pub company_id: String,
    pub reason: String,
    pub priority: Priority,
    pub summary: Option<String>,
}

pub struct EscalationEngine {
    store: Arc<dyn EscalationStore>,
    roster: Arc<dyn HumanAgentDirectory>,
    rules: Vec<EscalationRule>,
    sla: SlaTable,
    events: Arc<EventBus>,
    session_locks: KeyedLocks,
    escalation_locks: KeyedLocks,
}

impl EscalationEngine {
    pub fn new(
        store: Arc<dyn EscalationStore>,
        roster: Arc<dyn HumanAgentDirectory>,
        events: Arc<EventBus>,
    ) -> Self {
        Self {
            store,
            roster,
            rules: rules::default_rules(),
            sla: SlaTable::default(),
            events,
            session_locks: KeyedLocks::new(),
            escalation_locks: KeyedLocks::new(),
        }
    }

    /// Replace the rule list (order is significant).
    pub fn with_rules(mut self, rules: Vec<EscalationRule>) -> Self {
        self.rules = rules;
        self
    }

    pub fn with_sla(mut self, sla: SlaTable) -> Self {
        self.sla = sla;
        self
    }

    pub fn sla(&self) -> &SlaTable {
        &self.sla
    }

    pub fn should_escalate(&self, message: &str, signals: &Signals) -> Option<EscalationDecision> {
        rules::evaluate(&self.rules, message, signals)
    }

    pub fn is_overdue(&self, escalation: &Escalation, now: DateTime<Utc>) -> bool {
        self.sla.is_overdue(escalation, now)
    }

    /// Open an escalation and try to hand it to an available human.
    ///
    /// A session that already has an open escalation gets that one back
    /// instead of a duplicate.
    pub async fn create(&self, request: NewEscalation) -> Result<Escalation> {
        let _guard = self.session_locks.lock(&request.session_id).await;

        if let Some(open) = self.store.open_for_session(&request.session_id).await? {
            debug!(escalation_id = %open.id, session_id = %request.session_id, "Open escalation reused");
            return Ok(open);
        }

        let mut escalation = Escalation::new(
            request.session_id,
            request.company_id,
            request.reason,
            request.priority,
        );
        escalation.summary = request.summary;

        self.auto_assign(&mut escalation).await;
        if let Err(e) = self.store.insert(escalation.clone()).await {
            self.release(&escalation).await;
            return Err(e.into());
        }

        info!(
            escalation_id = %escalation.id,
            session_id = %escalation.session_id,
            priority = %escalation.priority,
            assigned = escalation.assigned_agent.as_deref().unwrap_or("-"),
            "Escalation created"
        );
        self.events.publish(DomainEvent::EscalationCreated {
            escalation_id: escalation.id.clone(),
            session_id: escalation.session_id.clone(),
            priority: escalation.priority.to_string(),
            assigned_agent: escalation.assigned_agent.clone(),
            timestamp: Utc::now(),
        });

        Ok(escalation)
    }

    /// First available human with a free slot takes it; otherwise it stays pending.
    async fn auto_assign(&self, escalation: &mut Escalation) {
        let candidates = match self.roster.available_for(&escalation.company_id, Utc::now()).await {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!(error = %e, "Roster lookup failed, escalation stays pending");
                return;
            }
        };

        for candidate in candidates {
            match self.roster.claim_slot(&candidate.id).await {
                Ok(true) => {
                    if let Err(e) = escalation.assign(Some(candidate.id.clone())) {
                        warn!(error = %e, "Assignment rejected, releasing slot");
                        self.release_slot(&candidate.id).await;
                    }
                    return;
                }
                Ok(false) => continue,
                Err(e) => warn!(agent_id = %candidate.id, error = %e, "Slot claim failed"),
            }
        }
        debug!(escalation_id = %escalation.id, "No human agent available");
    }

    pub async fn get(&self, id: &str) -> Result<Escalation> {
        self.load(id).await
    }

    pub async fn list(&self, company_id: &str) -> Result<Vec<Escalation>> {
        Ok(self.store.list_by_company(company_id).await?)
    }

    /// `pending → assigned`. The assignee must have a free chat slot.
    pub async fn assign(&self, id: &str, agent_id: Option<String>) -> Result<Escalation> {
        let agent_id = agent_id
            .filter(|a| !a.trim().is_empty())
            .ok_or(EscalationError::MissingAssignee)?;

        let _guard = self.escalation_locks.lock(id).await;
        let mut escalation = self.load(id).await?;
        let from = escalation.status;
        escalation.assign(Some(agent_id.clone()))?;

        match self.roster.claim_slot(&agent_id).await {
            Ok(true) => {}
            Ok(false) => return Err(EscalationError::AgentUnavailable(agent_id).into()),
            Err(e) => {
                warn!(agent_id = %agent_id, error = %e, "Slot claim failed");
                return Err(EscalationError::AgentUnavailable(agent_id).into());
            }
        }

        if let Err(e) = self.store.update(escalation.clone()).await {
            self.release_slot(&agent_id).await;
            return Err(e.into());
        }
        self.publish_transition(id, from, &escalation);
        Ok(escalation)
    }

    /// `assigned → in_progress`.
    pub async fn start(&self, id: &str) -> Result<Escalation> {
        self.transition(id, Escalation::start).await
    }

    /// `in_progress → resolved`. Frees the assignee's slot.
    pub async fn resolve(&self, id: &str) -> Result<Escalation> {
        let escalation = self.transition(id, Escalation::resolve).await?;
        self.release(&escalation).await;
        Ok(escalation)
    }

    /// Any open state `→ closed`. Frees the assignee's slot.
    pub async fn close(&self, id: &str) -> Result<Escalation> {
        let escalation = self.transition(id, Escalation::close).await?;
        self.release(&escalation).await;
        Ok(escalation)
    }

    pub async fn add_message(
        &self,
        id: &str,
        content: &str,
        sender: &str,
        sender_type: SenderType,
    ) -> Result<Escalation> {
        self.transition(id, |e| e.add_message(content, sender, sender_type))
            .await
    }

    /// Load, mutate and store under the escalation's lock.
    async fn transition<F>(&self, id: &str, apply: F) -> Result<Escalation>
    where
        F: FnOnce(&mut Escalation) -> std::result::Result<(), EscalationError>,
    {
        let _guard = self.escalation_locks.lock(id).await;

        let mut escalation = self.load(id).await?;
        let from = escalation.status;

        apply(&mut escalation)?;
        self.store.update(escalation.clone()).await?;
        self.publish_transition(id, from, &escalation);
        Ok(escalation)
    }

    async fn load(&self, id: &str) -> Result<Escalation> {
        Ok(self
            .store
            .get(id)
            .await?
            .ok_or_else(|| EscalationError::NotFound(id.to_string()))?)
    }

    fn publish_transition(&self, id: &str, from: EscalationStatus, escalation: &Escalation) {
        if from == escalation.status {
            return;
        }
        info!(escalation_id = %id, from = %from, to = %escalation.status, "Escalation transitioned");
        self.events.publish(DomainEvent::EscalationTransitioned {
            escalation_id: id.to_string(),
            from: from.to_string(),
            to: escalation.status.to_string(),
            timestamp: Utc::now(),
        });
    }

    async fn release(&self, escalation: &Escalation) {
        if let Some(agent) = &escalation.assigned_agent {
            self.release_slot(agent).await;
        }
    }

    async fn release_slot(&self, agent_id: &str) {
        if let Err(e) = self.roster.release_slot(agent_id).await {
            warn!(agent_id, error = %e, "Slot release failed");
        }
    }
}
