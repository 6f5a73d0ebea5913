//! HTTP API v1.
//!
//! Endpoints:
//!
//! - `POST /v1/chat`                         : Run one turn
//! - `GET  /v1/sessions/{id}/history`        : Working-window messages (`?company_id=&limit=`)
//! - `GET  /v1/sessions/{id}/summary`        : Hand-over summary and key points (`?company_id=`)
//! - `POST /v1/escalations`                  : Explicitly request a human
//! - `GET  /v1/escalations?company_id=`      : List a company's escalations
//! - `GET  /v1/escalations/{id}`             : One escalation, with SLA status
//! - `POST /v1/escalations/{id}/assign`      : pending → assigned
//! - `POST /v1/escalations/{id}/start`       : assigned → in_progress
//! - `POST /v1/escalations/{id}/resolve`     : in_progress → resolved
//! - `POST /v1/escalations/{id}/close`       : any open state → closed
//! - `POST /v1/escalations/{id}/messages`    : Add to the escalation thread
//!
//! Status codes: validation errors are 400, unknown ids 404, and lifecycle
//! violations 409.

use axum::{
    Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use tierline_agent::{Orchestrator, Runtime, TurnReply, TurnRequest};
use tierline_agent::escalation::NewEscalation;
use tierline_core::error::{Error, EscalationError, ValidationError};
use tierline_core::escalation::{Escalation, Priority, SenderType};
use tierline_core::message::Message;

// ── State ─────────────────────────────────────────────────────────────────

/// Shared state for the v1 API.
pub struct ApiV1State {
    pub orchestrator: Arc<Orchestrator>,
    pub config: Arc<tierline_config::AppConfig>,
    pub start_time: DateTime<Utc>,
}

impl ApiV1State {
    pub fn new(runtime: Runtime) -> Self {
        Self {
            orchestrator: runtime.orchestrator,
            config: runtime.config,
            start_time: Utc::now(),
        }
    }
}

pub type SharedApiState = Arc<ApiV1State>;

// ── Router ────────────────────────────────────────────────────────────────

/// Build the v1 API router. Nest this under "/v1" in the main router.
pub fn v1_router(state: SharedApiState) -> Router {
    Router::new()
        .route("/chat", post(chat_handler))
        .route("/sessions/{id}/history", get(history_handler))
        .route("/sessions/{id}/summary", get(summary_handler))
        .route("/escalations", get(list_escalations_handler))
        .route("/escalations", post(create_escalation_handler))
        .route("/escalations/{id}", get(get_escalation_handler))
        .route("/escalations/{id}/assign", post(assign_handler))
        .route("/escalations/{id}/start", post(start_handler))
        .route("/escalations/{id}/resolve", post(resolve_handler))
        .route("/escalations/{id}/close", post(close_handler))
        .route("/escalations/{id}/messages", post(add_message_handler))
        .with_state(state)
}

// ── Request / Response types ──────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);
type ApiResult<T> = Result<Json<T>, ApiError>;

/// Map a domain error onto an HTTP status.
fn api_error(err: Error) -> ApiError {
    let status = match &err {
        Error::Validation(_) => StatusCode::BAD_REQUEST,
        Error::AgentNotFound { .. } => StatusCode::NOT_FOUND,
        Error::Escalation(EscalationError::NotFound(_)) => StatusCode::NOT_FOUND,
        Error::Escalation(EscalationError::MissingAssignee) => StatusCode::BAD_REQUEST,
        Error::Escalation(
            EscalationError::InvalidTransition { .. }
            | EscalationError::Terminal(_)
            | EscalationError::AgentUnavailable(_),
        ) => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        tracing::error!(error = %err, "Request failed");
    }
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
}

fn missing(field: &str) -> ApiError {
    api_error(ValidationError::MissingField(field.into()).into())
}

fn required_company(company_id: Option<String>) -> Result<String, ApiError> {
    company_id
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| missing("company_id"))
}

fn not_found(what: String) -> ApiError {
    (StatusCode::NOT_FOUND, Json(ErrorResponse { error: what }))
}

#[derive(Deserialize)]
pub struct HistoryQuery {
    #[serde(default)]
    pub company_id: Option<String>,
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Deserialize)]
pub struct SessionQuery {
    #[serde(default)]
    pub company_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub session_id: String,
    pub messages: Vec<Message>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SummaryResponse {
    pub session_id: String,
    pub summary: String,
    pub key_points: Vec<String>,
    pub unresolved_count: u32,
}

#[derive(Deserialize)]
pub struct CreateEscalationRequest {
    #[serde(default)]
    pub session_id: String,
    #[serde(default)]
    pub company_id: String,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub priority: Option<Priority>,
}

#[derive(Deserialize)]
pub struct ListEscalationsQuery {
    #[serde(default)]
    pub company_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EscalationView {
    #[serde(flatten)]
    pub escalation: Escalation,
    pub overdue: bool,
    pub sla_deadline: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EscalationListResponse {
    pub escalations: Vec<EscalationView>,
    pub count: usize,
}

#[derive(Deserialize, Default)]
pub struct AssignRequest {
    #[serde(default)]
    pub agent_id: Option<String>,
}

#[derive(Deserialize)]
pub struct AddMessageRequest {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub sender: String,
    #[serde(default = "default_sender_type")]
    pub sender_type: SenderType,
}

fn default_sender_type() -> SenderType {
    SenderType::Customer
}

const EXPLICIT_REQUEST_REASON: &str = "customer asked for a human";

impl ApiV1State {
    fn view(&self, escalation: Escalation) -> EscalationView {
        let engine = self.orchestrator.escalations();
        EscalationView {
            overdue: engine.is_overdue(&escalation, Utc::now()),
            sla_deadline: engine.sla().deadline(&escalation),
            escalation,
        }
    }
}

// ── Handlers ──────────────────────────────────────────────────────────────

async fn chat_handler(
    State(state): State<SharedApiState>,
    Json(payload): Json<TurnRequest>,
) -> ApiResult<TurnReply> {
    info!(agent_id = %payload.agent_id, "v1/chat request");
    state
        .orchestrator
        .handle_turn(payload)
        .await
        .map(Json)
        .map_err(api_error)
}

async fn history_handler(
    State(state): State<SharedApiState>,
    Path(id): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<HistoryResponse> {
    let company_id = required_company(query.company_id)?;
    let contexts = state.orchestrator.contexts();
    let limit = query.limit.unwrap_or(contexts.window_size());
    // A session owned by another company is reported as unknown.
    let messages = contexts
        .history(&id, &company_id, limit)
        .await
        .unwrap_or_default();
    if messages.is_empty() && limit > 0 {
        return Err(not_found(format!("Session not found: {id}")));
    }
    Ok(Json(HistoryResponse {
        session_id: id,
        messages,
    }))
}

async fn summary_handler(
    State(state): State<SharedApiState>,
    Path(id): Path<String>,
    Query(query): Query<SessionQuery>,
) -> ApiResult<SummaryResponse> {
    let company_id = required_company(query.company_id)?;
    let contexts = state.orchestrator.contexts();
    let unknown = || not_found(format!("Session not found: {id}"));
    if contexts
        .history(&id, &company_id, 1)
        .await
        .map_or(true, |m| m.is_empty())
    {
        return Err(unknown());
    }
    let summary = contexts
        .summarize(&id, &company_id, None)
        .await
        .map_err(|_| unknown())?;
    let key_points = contexts
        .key_points(&id, &company_id)
        .await
        .map_err(|_| unknown())?;
    let unresolved_count = contexts.unresolved_count(&id).await;
    Ok(Json(SummaryResponse {
        session_id: id,
        summary,
        key_points,
        unresolved_count,
    }))
}

async fn create_escalation_handler(
    State(state): State<SharedApiState>,
    Json(payload): Json<CreateEscalationRequest>,
) -> Result<(StatusCode, Json<EscalationView>), ApiError> {
    if payload.session_id.trim().is_empty() {
        return Err(missing("session_id"));
    }
    if payload.company_id.trim().is_empty() {
        return Err(missing("company_id"));
    }

    let reason = payload
        .reason
        .filter(|r| !r.trim().is_empty())
        .unwrap_or_else(|| EXPLICIT_REQUEST_REASON.to_string());
    let contexts = state.orchestrator.contexts();
    let has_history = !contexts
        .history(&payload.session_id, &payload.company_id, 1)
        .await
        .map_err(|e| api_error(e.into()))?
        .is_empty();
    let summary = if has_history {
        Some(
            contexts
                .summarize(&payload.session_id, &payload.company_id, Some(&reason))
                .await
                .map_err(|e| api_error(e.into()))?,
        )
    } else {
        None
    };

    let escalation = state
        .orchestrator
        .escalations()
        .create(NewEscalation {
            session_id: payload.session_id,
            company_id: payload.company_id,
            reason,
            priority: payload.priority.unwrap_or(Priority::Medium),
            summary,
        })
        .await
        .map_err(api_error)?;

    Ok((StatusCode::CREATED, Json(state.view(escalation))))
}

async fn list_escalations_handler(
    State(state): State<SharedApiState>,
    Query(query): Query<ListEscalationsQuery>,
) -> ApiResult<EscalationListResponse> {
    let company_id = query
        .company_id
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| missing("company_id"))?;

    let escalations: Vec<EscalationView> = state
        .orchestrator
        .escalations()
        .list(&company_id)
        .await
        .map_err(api_error)?
        .into_iter()
        .map(|e| state.view(e))
        .collect();

    Ok(Json(EscalationListResponse {
        count: escalations.len(),
        escalations,
    }))
}

async fn get_escalation_handler(
    State(state): State<SharedApiState>,
    Path(id): Path<String>,
) -> ApiResult<EscalationView> {
    let escalation = state
        .orchestrator
        .escalations()
        .get(&id)
        .await
        .map_err(api_error)?;
    Ok(Json(state.view(escalation)))
}

async fn assign_handler(
    State(state): State<SharedApiState>,
    Path(id): Path<String>,
    payload: Option<Json<AssignRequest>>,
) -> ApiResult<EscalationView> {
    let Json(payload) = payload.unwrap_or_default();
    let escalation = state
        .orchestrator
        .escalations()
        .assign(&id, payload.agent_id)
        .await
        .map_err(api_error)?;
    Ok(Json(state.view(escalation)))
}

async fn start_handler(
    State(state): State<SharedApiState>,
    Path(id): Path<String>,
) -> ApiResult<EscalationView> {
    let escalation = state
        .orchestrator
        .escalations()
        .start(&id)
        .await
        .map_err(api_error)?;
    Ok(Json(state.view(escalation)))
}

async fn resolve_handler(
    State(state): State<SharedApiState>,
    Path(id): Path<String>,
) -> ApiResult<EscalationView> {
    let escalation = state
        .orchestrator
        .escalations()
        .resolve(&id)
        .await
        .map_err(api_error)?;
    Ok(Json(state.view(escalation)))
}

async fn close_handler(
    State(state): State<SharedApiState>,
    Path(id): Path<String>,
) -> ApiResult<EscalationView> {
    let escalation = state
        .orchestrator
        .escalations()
        .close(&id)
        .await
        .map_err(api_error)?;
    Ok(Json(state.view(escalation)))
}

async fn add_message_handler(
    State(state): State<SharedApiState>,
    Path(id): Path<String>,
    Json(payload): Json<AddMessageRequest>,
) -> Result<(StatusCode, Json<EscalationView>), ApiError> {
    if payload.content.trim().is_empty() {
        return Err(api_error(ValidationError::EmptyMessage.into()));
    }
    if payload.sender.trim().is_empty() {
        return Err(missing("sender"));
    }
    let escalation = state
        .orchestrator
        .escalations()
        .add_message(&id, &payload.content, &payload.sender, payload.sender_type)
        .await
        .map_err(api_error)?;
    Ok((StatusCode::CREATED, Json(state.view(escalation))))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tierline_core::agent::AgentProfile;
    use tierline_core::error::ProviderError;
    use tierline_core::escalation::{EscalationStatus, HumanAgent, Presence};
    use tierline_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
    use tower::ServiceExt;

    /// Lightweight mock provider for gateway tests.
    struct MockProvider {
        response_text: String,
    }

    impl MockProvider {
        fn new(text: &str) -> Self {
            Self {
                response_text: text.to_string(),
            }
        }
    }

    #[async_trait::async_trait]
    impl Provider for MockProvider {
        fn name(&self) -> &str {
            "gateway_mock"
        }

        async fn complete(
            &self,
            _request: ProviderRequest,
        ) -> Result<ProviderResponse, ProviderError> {
            Ok(ProviderResponse {
                content: self.response_text.clone(),
                usage: Some(Usage {
                    prompt_tokens: 10,
                    completion_tokens: 5,
                    total_tokens: 15,
                }),
                model: "mock-model".into(),
            })
        }
    }

    pub(crate) async fn test_api_state() -> SharedApiState {
        let mut config = tierline_config::AppConfig::default();
        config.storage.backend = "in_memory".into();
        config.agents = vec![AgentProfile {
            enabled_tools: vec!["refund".into(), "escalate".into()],
            ..AgentProfile::new("ava", "acme", "Ava")
        }];
        // Offline so escalations stay pending until assigned by hand.
        config.human_agents = vec![HumanAgent {
            id: "h1".into(),
            company_id: "acme".into(),
            name: "Sam".into(),
            presence: Presence::Offline,
            active_chats: 0,
            max_chats: 1,
            availability: Vec::new(),
        }];
        let provider: Arc<dyn Provider> = Arc::new(MockProvider::new("Mock response from agent"));
        let runtime = Runtime::with_provider(config, provider).await.unwrap();
        Arc::new(ApiV1State::new(runtime))
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap()
    }

    fn post_empty(uri: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn json_body<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
        let body = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&body).unwrap()
    }

    async fn create_escalation(state: &SharedApiState, session: &str) -> EscalationView {
        let response = v1_router(state.clone())
            .oneshot(post_json(
                "/escalations",
                serde_json::json!({"session_id": session, "company_id": "acme"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        json_body(response).await
    }

    #[tokio::test]
    async fn chat_runs_a_turn() {
        let app = v1_router(test_api_state().await);
        let response = app
            .oneshot(post_json(
                "/chat",
                serde_json::json!({
                    "agent_id": "ava",
                    "company_id": "acme",
                    "user_id": "u1",
                    "message": "Hello there"
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json: serde_json::Value = json_body(response).await;
        assert_eq!(json["reply"], "Mock response from agent");
        assert_eq!(json["confidence_tier"], "none");
        assert_eq!(json["knowledge_used"], false);
        assert_eq!(json["tools_executed"], false);
        assert!(json["session_id"].as_str().is_some_and(|s| !s.is_empty()));
    }

    #[tokio::test]
    async fn chat_rejects_empty_message() {
        let app = v1_router(test_api_state().await);
        let response = app
            .oneshot(post_json(
                "/chat",
                serde_json::json!({"agent_id": "ava", "company_id": "acme", "user_id": "u1", "message": "  "}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn chat_rejects_missing_user() {
        let app = v1_router(test_api_state().await);
        let response = app
            .oneshot(post_json(
                "/chat",
                serde_json::json!({"agent_id": "ava", "company_id": "acme", "message": "hi"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let err: ErrorResponse = json_body(response).await;
        assert!(err.error.contains("user_id"));
    }

    #[tokio::test]
    async fn chat_unknown_agent_is_not_found() {
        let app = v1_router(test_api_state().await);
        let response = app
            .oneshot(post_json(
                "/chat",
                serde_json::json!({"agent_id": "zed", "company_id": "acme", "user_id": "u1", "message": "hi"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn chat_with_agent_keyword_escalates() {
        let state = test_api_state().await;
        let response = v1_router(state.clone())
            .oneshot(post_json(
                "/chat",
                serde_json::json!({
                    "agent_id": "ava",
                    "company_id": "acme",
                    "user_id": "u1",
                    "session_id": "s-esc",
                    "message": "I want a refund now, agent!"
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json: serde_json::Value = json_body(response).await;
        assert_eq!(json["tools_executed"], true);
        assert_eq!(json["escalation"]["reason"], "human-request keyword");
        assert_eq!(json["escalation"]["priority"], "medium");

        let response = v1_router(state)
            .oneshot(get("/escalations?company_id=acme"))
            .await
            .unwrap();
        let list: EscalationListResponse = json_body(response).await;
        assert_eq!(list.count, 1);
        assert_eq!(list.escalations[0].escalation.session_id, "s-esc");
    }

    #[tokio::test]
    async fn session_history_and_summary() {
        let state = test_api_state().await;
        v1_router(state.clone())
            .oneshot(post_json(
                "/chat",
                serde_json::json!({
                    "agent_id": "ava",
                    "company_id": "acme",
                    "user_id": "u1",
                    "session_id": "s1",
                    "message": "I have a problem with my order"
                }),
            ))
            .await
            .unwrap();

        let response = v1_router(state.clone())
            .oneshot(get("/sessions/s1/history?company_id=acme&limit=1"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let history: HistoryResponse = json_body(response).await;
        assert_eq!(history.messages.len(), 1);
        assert_eq!(history.messages[0].content, "Mock response from agent");

        let response = v1_router(state.clone())
            .oneshot(get("/sessions/s1/summary?company_id=acme"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let summary: SummaryResponse = json_body(response).await;
        assert!(summary.summary.contains("I have a problem with my order"));
        assert!(!summary.key_points.is_empty());

        let response = v1_router(state)
            .oneshot(get("/sessions/missing/summary?company_id=acme"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn sessions_are_scoped_to_their_company() {
        let state = test_api_state().await;
        v1_router(state.clone())
            .oneshot(post_json(
                "/chat",
                serde_json::json!({
                    "agent_id": "ava",
                    "company_id": "acme",
                    "user_id": "u1",
                    "session_id": "s1",
                    "message": "my card is 4111-secret"
                }),
            ))
            .await
            .unwrap();

        for uri in [
            "/sessions/s1/history?company_id=globex",
            "/sessions/s1/summary?company_id=globex",
        ] {
            let response = v1_router(state.clone()).oneshot(get(uri)).await.unwrap();
            assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
        }

        let response = v1_router(state.clone())
            .oneshot(get("/sessions/s1/history"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = v1_router(state)
            .oneshot(post_json(
                "/escalations",
                serde_json::json!({"session_id": "s1", "company_id": "globex"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn escalation_lifecycle_over_http() {
        let state = test_api_state().await;
        let created = create_escalation(&state, "s1").await;
        assert_eq!(created.escalation.status, EscalationStatus::Pending);
        assert!(!created.overdue);
        let id = created.escalation.id;

        let response = v1_router(state.clone())
            .oneshot(post_json(
                &format!("/escalations/{id}/assign"),
                serde_json::json!({"agent_id": "h1"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        for (step, expected) in [
            ("start", EscalationStatus::InProgress),
            ("resolve", EscalationStatus::Resolved),
        ] {
            let response = v1_router(state.clone())
                .oneshot(post_empty(&format!("/escalations/{id}/{step}")))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            let view: EscalationView = json_body(response).await;
            assert_eq!(view.escalation.status, expected);
        }

        let response = v1_router(state)
            .oneshot(post_empty(&format!("/escalations/{id}/close")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn invalid_transition_is_conflict() {
        let state = test_api_state().await;
        let created = create_escalation(&state, "s1").await;

        let response = v1_router(state.clone())
            .oneshot(post_empty(&format!("/escalations/{}/resolve", created.escalation.id)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let response = v1_router(state)
            .oneshot(get(&format!("/escalations/{}", created.escalation.id)))
            .await
            .unwrap();
        let view: EscalationView = json_body(response).await;
        assert_eq!(view.escalation.status, EscalationStatus::Pending);
    }

    #[tokio::test]
    async fn assign_without_agent_is_bad_request() {
        let state = test_api_state().await;
        let created = create_escalation(&state, "s1").await;
        let response = v1_router(state)
            .oneshot(post_empty(&format!("/escalations/{}/assign", created.escalation.id)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn assign_beyond_capacity_is_conflict() {
        let state = test_api_state().await;
        let first = create_escalation(&state, "s1").await.escalation.id;
        let second = create_escalation(&state, "s2").await.escalation.id;

        let response = v1_router(state.clone())
            .oneshot(post_json(
                &format!("/escalations/{first}/assign"),
                serde_json::json!({"agent_id": "h1"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        for agent in ["h1", "h9"] {
            let response = v1_router(state.clone())
                .oneshot(post_json(
                    &format!("/escalations/{second}/assign"),
                    serde_json::json!({"agent_id": agent}),
                ))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::CONFLICT);
        }

        let response = v1_router(state)
            .oneshot(get(&format!("/escalations/{second}")))
            .await
            .unwrap();
        let view: EscalationView = json_body(response).await;
        assert_eq!(view.escalation.status, EscalationStatus::Pending);
    }

    #[tokio::test]
    async fn unknown_escalation_is_not_found() {
        let app = v1_router(test_api_state().await);
        let response = app
            .oneshot(post_empty("/escalations/nonexistent/start"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn messages_on_closed_escalation_conflict() {
        let state = test_api_state().await;
        let created = create_escalation(&state, "s1").await;
        let id = created.escalation.id;

        let response = v1_router(state.clone())
            .oneshot(post_json(
                &format!("/escalations/{id}/messages"),
                serde_json::json!({"content": "Any news?", "sender": "u1"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let view: EscalationView = json_body(response).await;
        assert_eq!(view.escalation.messages.len(), 1);

        v1_router(state.clone())
            .oneshot(post_empty(&format!("/escalations/{id}/close")))
            .await
            .unwrap();

        let response = v1_router(state)
            .oneshot(post_json(
                &format!("/escalations/{id}/messages"),
                serde_json::json!({"content": "Hello?", "sender": "u1"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn list_requires_company() {
        let app = v1_router(test_api_state().await);
        let response = app.oneshot(get("/escalations")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn duplicate_request_returns_open_escalation() {
        let state = test_api_state().await;
        let first = create_escalation(&state, "s1").await;
        let second = create_escalation(&state, "s1").await;
        assert_eq!(first.escalation.id, second.escalation.id);
    }
}
