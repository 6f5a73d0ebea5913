//! In-memory escalation store.

use async_trait::async_trait;
use std::collections::HashMap;
use tierline_core::error::StoreError;
use tierline_core::escalation::{Escalation, EscalationStore};
use tokio::sync::RwLock;

/// Escalation records keyed by id, plus insertion order for stable listing.
#[derive(Default)]
pub struct InMemoryEscalationStore {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    records: HashMap<String, Escalation>,
    order: Vec<String>,
}

impl InMemoryEscalationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EscalationStore for InMemoryEscalationStore {
    async fn insert(&self, escalation: Escalation) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if inner.records.contains_key(&escalation.id) {
            return Err(StoreError::QueryFailed(format!(
                "escalation {} already exists",
                escalation.id
            )));
        }
        inner.order.push(escalation.id.clone());
        inner.records.insert(escalation.id.clone(), escalation);
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<Escalation>, StoreError> {
        Ok(self.inner.read().await.records.get(id).cloned())
    }

    async fn update(&self, escalation: Escalation) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        match inner.records.get_mut(&escalation.id) {
            Some(slot) => {
                *slot = escalation;
                Ok(())
            }
            None => Err(StoreError::QueryFailed(format!(
                "escalation {} does not exist",
                escalation.id
            ))),
        }
    }

    async fn list_by_company(&self, company_id: &str) -> Result<Vec<Escalation>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .order
            .iter()
            .filter_map(|id| inner.records.get(id))
            .filter(|e| e.company_id == company_id)
            .cloned()
            .collect())
    }

    async fn open_for_session(&self, session_id: &str) -> Result<Option<Escalation>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .order
            .iter()
            .rev()
            .filter_map(|id| inner.records.get(id))
            .find(|e| e.session_id == session_id && !e.status.is_terminal())
            .cloned())
    }
}
