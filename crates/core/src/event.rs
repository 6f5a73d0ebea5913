//! Domain event system: decoupled observability for turns and escalations.
//!
//! Events are published when something interesting happens in the system.
//! Other components can subscribe to react without tight coupling.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

/// All domain events in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DomainEvent {
    /// A turn produced a reply
    TurnCompleted {
        session_id: String,
        agent_id: String,
        confidence_tier: String,
        knowledge_used: bool,
        tools_executed: bool,
        tokens_used: u32,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },

    /// Indexed knowledge was thin and the live fetch was consulted
    FallbackRetrieval {
        agent_id: String,
        snippets: usize,
        timestamp: DateTime<Utc>,
    },

    /// A triggered tool ran
    ToolExecuted {
        tool_id: String,
        success: bool,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },

    /// An escalation was opened
    EscalationCreated {
        escalation_id: String,
        session_id: String,
        priority: String,
        assigned_agent: Option<String>,
        timestamp: DateTime<Utc>,
    },

    /// An escalation moved along its lifecycle
    EscalationTransitioned {
        escalation_id: String,
        from: String,
        to: String,
        timestamp: DateTime<Utc>,
    },

    /// A recovered error occurred
    ErrorOccurred {
        context: String,
        error_message: String,
        timestamp: DateTime<Utc>,
    },
}

/// A broadcast-based event bus for domain events.
///
/// Uses `tokio::sync::broadcast` for multi-consumer pub/sub.
pub struct EventBus {
    sender: broadcast::Sender<Arc<DomainEvent>>,
}

impl EventBus {
    /// Create a new event bus with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all subscribers.
    pub fn publish(&self, event: DomainEvent) {
        // No subscribers is fine
        let _ = self.sender.send(Arc::new(event));
    }

    /// Subscribe to receive events.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<DomainEvent>> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
