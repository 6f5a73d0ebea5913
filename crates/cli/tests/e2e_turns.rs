//! End-to-end turns through a fully wired runtime: config parsed from TOML,
//! knowledge loaded from disk, SQLite transcripts, and a scripted provider
//! standing in for the LLM.

use async_trait::async_trait;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tierline_agent::confidence::ConfidenceTier;
use tierline_agent::{Runtime, TurnRequest};
use tierline_config::AppConfig;
use tierline_core::error::{Error, ProviderError};
use tierline_core::escalation::EscalationStatus;
use tierline_core::message::Role;
use tierline_core::provider::{Provider, ProviderRequest, ProviderResponse};

// ── Test provider ────────────────────────────────────────────────────────

#[derive(Default)]
struct ScriptedProvider {
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let mut requests = self.requests.lock().unwrap();
        requests.push(request);
        Ok(ProviderResponse {
            content: format!("Reply {}", requests.len()),
            usage: None,
            model: "scripted-1".into(),
        })
    }
}

// ── Fixtures ─────────────────────────────────────────────────────────────

fn write_knowledge(dir: &Path) -> String {
    let docs = serde_json::json!([
        {
            "agent_id": "ava",
            "company_id": "acme",
            "source_id": "returns.md",
            "text": "Return window: 30 days.\n\nDays in the return window: 30."
        },
        {
            "agent_id": "bob",
            "company_id": "acme",
            "source_id": "other.md",
            "text": "Return window days for Bob."
        }
    ]);
    let path = dir.join("knowledge.json");
    std::fs::write(&path, docs.to_string()).unwrap();
    path.to_string_lossy().into_owned()
}

fn config_for(dir: &Path) -> AppConfig {
    let knowledge = write_knowledge(dir);
    let db = dir.join("transcripts.db");
    let toml_str = format!(
        r#"
[storage]
backend = "sqlite"
path = "{db}"

[knowledge]
documents_file = "{knowledge}"

[[agents]]
id = "ava"
company_id = "acme"
name = "Ava"
industry = "ecommerce"
enabled_tools = ["refund", "escalate", "order_status"]

[[agents]]
id = "bob"
company_id = "acme"
name = "Bob"

[[human_agents]]
id = "h1"
company_id = "acme"
name = "Sam"
presence = "online"
max_chats = 1
"#,
        db = db.display(),
        knowledge = knowledge,
    );
    AppConfig::from_toml(&toml_str).unwrap()
}

async fn runtime(dir: &Path) -> (Runtime, Arc<ScriptedProvider>) {
    let provider = Arc::new(ScriptedProvider::default());
    let runtime = Runtime::with_provider(config_for(dir), provider.clone())
        .await
        .unwrap();
    (runtime, provider)
}

// ── Scenarios ────────────────────────────────────────────────────────────

#[tokio::test]
async fn knowledge_backed_turn_is_high_confidence() {
    let dir = tempfile::tempdir().unwrap();
    let (rt, provider) = runtime(dir.path()).await;

    let reply = rt
        .orchestrator
        .handle_turn(TurnRequest::new("ava", "acme", "u1", "Return window days?"))
        .await
        .unwrap();

    assert_eq!(reply.reply, "Reply 1");
    assert_eq!(reply.confidence_tier, ConfidenceTier::High);
    assert_eq!(reply.metadata.passage_count, 2);
    assert!(reply.knowledge_used);
    assert!(!reply.metadata.fallback_used);
    assert!(reply.escalation.is_none());

    let system = &provider.requests()[0].messages[0];
    assert_eq!(system.role, Role::System);
    assert!(system.content.contains("Return window: 30 days."));
    assert!(!system.content.contains("for Bob"));
}

#[tokio::test]
async fn session_survives_runtime_restart() {
    let dir = tempfile::tempdir().unwrap();

    let session_id = {
        let (rt, _) = runtime(dir.path()).await;
        rt.orchestrator
            .handle_turn(TurnRequest::new("ava", "acme", "u1", "Return window days?"))
            .await
            .unwrap()
            .session_id
    };

    let (rt, provider) = runtime(dir.path()).await;
    rt.orchestrator
        .handle_turn(
            TurnRequest::new("ava", "acme", "u1", "And for sale items?").in_session(&session_id),
        )
        .await
        .unwrap();

    let request = &provider.requests()[0];
    let roles: Vec<Role> = request.messages.iter().map(|m| m.role).collect();
    assert_eq!(roles, vec![Role::System, Role::User, Role::Assistant, Role::User]);
    assert_eq!(request.messages[1].content, "Return window days?");
    assert_eq!(request.messages[2].content, "Reply 1");
}

#[tokio::test]
async fn human_request_escalates_and_runs_lifecycle() {
    let dir = tempfile::tempdir().unwrap();
    let (rt, _) = runtime(dir.path()).await;

    let reply = rt
        .orchestrator
        .handle_turn(TurnRequest::new("ava", "acme", "u1", "Can I talk to a person please"))
        .await
        .unwrap();

    let escalation = reply.escalation.expect("escalation opened");
    assert_eq!(escalation.status, EscalationStatus::Assigned);
    assert_eq!(escalation.assigned_agent.as_deref(), Some("h1"));
    assert!(escalation.summary.unwrap().contains("talk to a person"));

    let engine = rt.orchestrator.escalations();
    let started = engine.start(&escalation.id).await.unwrap();
    assert_eq!(started.status, EscalationStatus::InProgress);
    let resolved = engine.resolve(&escalation.id).await.unwrap();
    assert_eq!(resolved.status, EscalationStatus::Resolved);
    assert!(resolved.resolved_at.is_some());

    // The slot came back, so a second session can be assigned to h1.
    let other = rt
        .orchestrator
        .handle_turn(TurnRequest::new("ava", "acme", "u2", "I need a human agent"))
        .await
        .unwrap();
    assert_eq!(
        other.escalation.unwrap().assigned_agent.as_deref(),
        Some("h1")
    );
}

#[tokio::test]
async fn unknown_agent_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let (rt, provider) = runtime(dir.path()).await;

    let err = rt
        .orchestrator
        .handle_turn(TurnRequest::new("zed", "acme", "u1", "hello"))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::AgentNotFound { .. }));
    assert!(provider.requests().is_empty());
}
