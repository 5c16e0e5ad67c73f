use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderMap, HeaderName, StatusCode,
    },
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::auth::CredentialVerifier;
use crate::catalog::{CatalogService, NewPaper, PaperFilter};
use crate::config::prompt::PromptConfig;
use crate::llm::{ChatGateway, GatewayError, GatewayMessage};
use crate::models::wire::{ChatRequest, Envelope, HISTORY_WINDOW};
use crate::monitor::UsageStats;

pub type ChatLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

const ADMIN_SECRET_HEADER: &str = "x-admin-secret";
const MONITOR_SECRET_HEADER: &str = "x-monitor-secret";

// The fixed user-safe strings; upstream detail stays in the logs.
const ERR_HIGH_DEMAND: &str =
    "The assistant is in high demand right now. Please wait a moment and try again.";
const ERR_CREDITS: &str = "The AI service has run out of credits. Please contact support.";
const ERR_CONFIG_ISSUE: &str =
    "There is a configuration issue with the AI service. Please contact support.";
const ERR_GENERIC: &str = "The assistant encountered an error. Please try again.";
const ERR_NOT_CONFIGURED: &str = "AI service is not configured. Please contact support.";
const ERR_UNEXPECTED: &str = "Something unexpected went wrong. Please try again.";
const ERR_STORE_MISSING: &str =
    "Catalog store is not configured. Set STORE_TYPE to enable the paper catalog.";

#[derive(Clone)]
pub struct AppState {
    pub gateway: Option<Arc<dyn ChatGateway>>,
    pub prompts: Arc<PromptConfig>,
    pub catalog: Option<CatalogService>,
    pub admin_gate: Arc<dyn CredentialVerifier>,
    pub monitor_gate: Arc<dyn CredentialVerifier>,
    pub usage: Arc<UsageStats>,
    pub limiter: Option<Arc<ChatLimiter>>,
}

/// Direct limiter for the chat endpoint; 0 disables it.
pub fn chat_limiter(per_second: u32) -> Option<Arc<ChatLimiter>> {
    NonZeroU32::new(per_second).map(|qps| Arc::new(RateLimiter::direct(Quota::per_second(qps))))
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers([
            AUTHORIZATION,
            HeaderName::from_static("x-client-info"),
            HeaderName::from_static("apikey"),
            CONTENT_TYPE,
        ]);

    Router::new()
        .route("/api/chat", post(chat_handler))
        .route("/api/papers", get(list_papers_handler))
        .route("/api/papers/options", get(paper_options_handler))
        .route("/api/admin/papers", post(add_paper_handler))
        .route("/api/admin/papers/{id}", delete(delete_paper_handler))
        .route("/api/monitor/stats", get(monitor_stats_handler))
        .layer(cors)
        .with_state(state)
}

/// Envelope-level failure: a user-safe message plus the outer status.
/// Everything except the missing-credential path stays HTTP 200 so the
/// widget always receives a parseable body.
struct ChatFailure {
    status: StatusCode,
    message: &'static str,
}

impl ChatFailure {
    fn handled(message: &'static str) -> Self {
        Self { status: StatusCode::OK, message }
    }

    fn not_configured() -> Self {
        Self { status: StatusCode::BAD_REQUEST, message: ERR_NOT_CONFIGURED }
    }
}

impl IntoResponse for ChatFailure {
    fn into_response(self) -> Response {
        (self.status, Json(Envelope::Failure { error: self.message.to_string() })).into_response()
    }
}

async fn chat_handler(State(state): State<AppState>, body: Bytes) -> Response {
    state.usage.record_chat_request();
    match run_chat(&state, &body).await {
        Ok(reply) => {
            state.usage.record_chat_answer();
            (StatusCode::OK, Json(Envelope::Success { response: reply })).into_response()
        }
        Err(failure) => {
            state.usage.record_chat_failure();
            failure.into_response()
        }
    }
}

async fn run_chat(state: &AppState, body: &[u8]) -> Result<String, ChatFailure> {
    let request: ChatRequest = serde_json::from_slice(body).map_err(|e| {
        warn!("Rejecting malformed chat body: {}", e);
        ChatFailure::handled(ERR_UNEXPECTED)
    })?;

    if request.message.trim().is_empty() {
        warn!("Rejecting chat request with an empty message");
        return Err(ChatFailure::handled(ERR_UNEXPECTED));
    }

    // The one configuration-fatal path; the upstream call is never made.
    let gateway = state.gateway.as_ref().ok_or_else(|| {
        error!("Chat request received but no upstream credential is configured");
        ChatFailure::not_configured()
    })?;

    if let Some(limiter) = &state.limiter {
        if limiter.check().is_err() {
            warn!("Chat rate limit exceeded; answering with the high-demand notice");
            return Err(ChatFailure::handled(ERR_HIGH_DEMAND));
        }
    }

    let messages = build_messages(&state.prompts, &request);
    info!("Relaying chat message ({} upstream turns)", messages.len());

    gateway.complete(&messages).await.map_err(|e| {
        error!("Upstream completion failed: {}", e);
        ChatFailure::handled(classify_gateway_error(&e))
    })
}

/// System instruction, then at most the last 10 history turns, then the new
/// user message. Over-long histories are truncated before forwarding.
fn build_messages(prompts: &PromptConfig, request: &ChatRequest) -> Vec<GatewayMessage> {
    let history = &request.conversation_history;
    let tail = history.len().saturating_sub(HISTORY_WINDOW);

    let mut messages = Vec::with_capacity(history.len().min(HISTORY_WINDOW) + 2);
    messages.push(GatewayMessage::system(prompts.system_instruction()));
    for entry in &history[tail..] {
        messages.push(if entry.is_bot {
            GatewayMessage::assistant(entry.text.clone())
        } else {
            GatewayMessage::user(entry.text.clone())
        });
    }
    messages.push(GatewayMessage::user(request.message.clone()));
    messages
}

fn classify_gateway_error(error: &GatewayError) -> &'static str {
    match error {
        GatewayError::RateLimited => ERR_HIGH_DEMAND,
        GatewayError::CreditsExhausted => ERR_CREDITS,
        GatewayError::Unauthorized => ERR_CONFIG_ISSUE,
        GatewayError::Upstream(_) => ERR_GENERIC,
        GatewayError::Transport(_) | GatewayError::EmptyCompletion => ERR_UNEXPECTED,
    }
}

#[derive(Serialize)]
struct ApiError {
    error: String,
}

fn service_unavailable(detail: &str) -> Response {
    (StatusCode::SERVICE_UNAVAILABLE, Json(ApiError { error: detail.to_string() }))
        .into_response()
}

fn unauthorized() -> Response {
    (StatusCode::UNAUTHORIZED, Json(ApiError { error: "Invalid credentials.".to_string() }))
        .into_response()
}

fn gate(headers: &HeaderMap, header: &str, verifier: &dyn CredentialVerifier) -> bool {
    headers
        .get(header)
        .and_then(|value| value.to_str().ok())
        .map(|candidate| verifier.verify(candidate))
        .unwrap_or(false)
}

async fn list_papers_handler(
    State(state): State<AppState>,
    Query(filter): Query<PaperFilter>,
) -> Response {
    let Some(catalog) = &state.catalog else {
        return service_unavailable(ERR_STORE_MISSING);
    };

    match catalog.list(&filter).await {
        Ok(papers) => {
            state.usage.record_papers_served(papers.len() as u64);
            (StatusCode::OK, Json(papers)).into_response()
        }
        Err(e) => {
            error!("Paper listing failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiError { error: "Could not load papers.".to_string() }),
            )
                .into_response()
        }
    }
}

#[derive(Deserialize)]
struct OptionsQuery {
    level: Option<String>,
    subject: Option<String>,
}

async fn paper_options_handler(
    State(state): State<AppState>,
    Query(query): Query<OptionsQuery>,
) -> Response {
    let Some(catalog) = &state.catalog else {
        return service_unavailable(ERR_STORE_MISSING);
    };

    match catalog.options(query.level.as_deref(), query.subject.as_deref()).await {
        Ok(options) => (StatusCode::OK, Json(options)).into_response(),
        Err(e) => {
            error!("Filter options failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiError { error: "Could not load filter options.".to_string() }),
            )
                .into_response()
        }
    }
}

async fn add_paper_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if !gate(&headers, ADMIN_SECRET_HEADER, state.admin_gate.as_ref()) {
        return unauthorized();
    }
    let Some(catalog) = &state.catalog else {
        return service_unavailable(ERR_STORE_MISSING);
    };

    let new: NewPaper = match serde_json::from_slice(&body) {
        Ok(new) => new,
        Err(e) => {
            warn!("Rejecting malformed paper payload: {}", e);
            return (
                StatusCode::BAD_REQUEST,
                Json(ApiError { error: "Malformed paper payload.".to_string() }),
            )
                .into_response();
        }
    };

    match catalog.add(new).await {
        Ok(paper) => {
            info!("Admin added paper '{}' ({})", paper.title, paper.id);
            (StatusCode::OK, Json(paper)).into_response()
        }
        Err(e) => {
            error!("Paper insert failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiError { error: "Could not save the paper.".to_string() }),
            )
                .into_response()
        }
    }
}

async fn delete_paper_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    if !gate(&headers, ADMIN_SECRET_HEADER, state.admin_gate.as_ref()) {
        return unauthorized();
    }
    let Some(catalog) = &state.catalog else {
        return service_unavailable(ERR_STORE_MISSING);
    };

    match catalog.remove(&id).await {
        Ok(deleted) => {
            info!("Admin deleted {} paper(s) with id {}", deleted, id);
            (StatusCode::OK, Json(serde_json::json!({ "deleted": deleted }))).into_response()
        }
        Err(e) => {
            error!("Paper delete failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiError { error: "Could not delete the paper.".to_string() }),
            )
                .into_response()
        }
    }
}

async fn monitor_stats_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if !gate(&headers, MONITOR_SECRET_HEADER, state.monitor_gate.as_ref()) {
        return unauthorized();
    }
    (StatusCode::OK, Json(state.usage.snapshot())).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::SharedSecretVerifier;
    use crate::models::wire::HistoryEntry;
    use crate::store::memory::MemoryStore;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::{json, Value};
    use std::sync::Mutex as StdMutex;
    use tower::ServiceExt;

    enum Script {
        Reply(&'static str),
        RateLimited,
        CreditsExhausted,
        Unauthorized,
        Status(u16),
    }

    struct ScriptedGateway {
        script: Script,
        seen: StdMutex<Vec<Vec<GatewayMessage>>>,
    }

    impl ScriptedGateway {
        fn new(script: Script) -> Arc<Self> {
            Arc::new(Self { script, seen: StdMutex::new(Vec::new()) })
        }
    }

    #[async_trait]
    impl ChatGateway for ScriptedGateway {
        async fn complete(&self, messages: &[GatewayMessage]) -> Result<String, GatewayError> {
            self.seen.lock().unwrap().push(messages.to_vec());
            match &self.script {
                Script::Reply(text) => Ok(text.to_string()),
                Script::RateLimited => Err(GatewayError::RateLimited),
                Script::CreditsExhausted => Err(GatewayError::CreditsExhausted),
                Script::Unauthorized => Err(GatewayError::Unauthorized),
                Script::Status(code) => Err(GatewayError::Upstream(*code)),
            }
        }
    }

    fn test_state(gateway: Option<Arc<dyn ChatGateway>>) -> AppState {
        AppState {
            gateway,
            prompts: Arc::new(PromptConfig::default()),
            catalog: Some(CatalogService::new(Arc::new(MemoryStore::new()))),
            admin_gate: Arc::new(SharedSecretVerifier::new("admin-pass")),
            monitor_gate: Arc::new(SharedSecretVerifier::new("monitor-pass")),
            usage: Arc::new(UsageStats::new()),
            limiter: None,
        }
    }

    async fn send_json(
        app: Router,
        method: &str,
        uri: &str,
        headers: &[(&str, &str)],
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("origin", "https://polypros.example");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let request = match body {
            Some(body) => builder
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn post_chat(state: AppState, body: Value) -> (StatusCode, Value) {
        send_json(router(state), "POST", "/api/chat", &[], Some(body)).await
    }

    #[tokio::test]
    async fn round_trip_returns_upstream_content() {
        let gateway = ScriptedGateway::new(Script::Reply("4"));
        let state = test_state(Some(gateway.clone()));

        let (status, body) = post_chat(state, json!({ "message": "2+2" })).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "response": "4" }));

        // system instruction + the lone user turn
        let seen = gateway.seen.lock().unwrap();
        assert_eq!(seen[0].len(), 2);
        assert_eq!(seen[0][0].role, "system");
        assert_eq!(seen[0][1].role, "user");
        assert_eq!(seen[0][1].content, "2+2");
    }

    #[tokio::test]
    async fn upstream_rate_limit_stays_http_200() {
        let state = test_state(Some(ScriptedGateway::new(Script::RateLimited)));
        let (status, body) = post_chat(state, json!({ "message": "hi" })).await;

        assert_eq!(status, StatusCode::OK);
        let error = body["error"].as_str().unwrap();
        assert!(error.contains("wait a moment"));
        assert!(body.get("response").is_none());
    }

    #[tokio::test]
    async fn upstream_402_maps_to_credits_message() {
        let state = test_state(Some(ScriptedGateway::new(Script::CreditsExhausted)));
        let (status, body) = post_chat(state, json!({ "message": "hi" })).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["error"].as_str().unwrap().contains("credits"));
    }

    #[tokio::test]
    async fn upstream_401_maps_to_configuration_message() {
        let state = test_state(Some(ScriptedGateway::new(Script::Unauthorized)));
        let (status, body) = post_chat(state, json!({ "message": "hi" })).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["error"].as_str().unwrap().contains("configuration issue"));
    }

    #[tokio::test]
    async fn other_upstream_statuses_map_to_generic_message() {
        let state = test_state(Some(ScriptedGateway::new(Script::Status(503))));
        let (status, body) = post_chat(state, json!({ "message": "hi" })).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["error"].as_str().unwrap(), ERR_GENERIC);
    }

    #[tokio::test]
    async fn missing_credential_is_400_and_skips_upstream() {
        let state = test_state(None);
        let (status, body) = post_chat(state, json!({ "message": "hi" })).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("not configured"));
    }

    #[tokio::test]
    async fn empty_message_yields_generic_error_envelope() {
        let gateway = ScriptedGateway::new(Script::Reply("unreachable"));
        let state = test_state(Some(gateway.clone()));

        let (status, body) = post_chat(state, json!({ "message": "   " })).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["error"].as_str().unwrap(), ERR_UNEXPECTED);
        assert!(gateway.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn malformed_body_yields_generic_error_envelope() {
        let state = test_state(Some(ScriptedGateway::new(Script::Reply("unreachable"))));
        let app = router(state);

        let request = Request::builder()
            .method("POST")
            .uri("/api/chat")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from("this is not json"))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"].as_str().unwrap(), ERR_UNEXPECTED);
    }

    #[tokio::test]
    async fn long_history_is_truncated_to_last_ten() {
        let gateway = ScriptedGateway::new(Script::Reply("ok"));
        let state = test_state(Some(gateway.clone()));

        let history: Vec<HistoryEntry> = (0..14)
            .map(|i| HistoryEntry { text: format!("turn {}", i), is_bot: i % 2 == 1 })
            .collect();
        let (status, _) = post_chat(
            state,
            json!({ "message": "latest", "conversationHistory": history }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let seen = gateway.seen.lock().unwrap();
        let messages = &seen[0];
        // system + 10 history turns + new user message
        assert_eq!(messages.len(), 12);
        assert_eq!(messages[1].content, "turn 4");
        assert_eq!(messages[10].content, "turn 13");
        assert_eq!(messages[10].role, "assistant");
        assert_eq!(messages[11].content, "latest");
        assert_eq!(messages[11].role, "user");
    }

    #[tokio::test]
    async fn history_roles_follow_is_bot() {
        let gateway = ScriptedGateway::new(Script::Reply("ok"));
        let state = test_state(Some(gateway.clone()));

        let (_, _) = post_chat(
            state,
            json!({
                "message": "next",
                "conversationHistory": [
                    { "text": "hello", "isBot": false },
                    { "text": "hi there", "isBot": true }
                ]
            }),
        )
        .await;

        let seen = gateway.seen.lock().unwrap();
        assert_eq!(seen[0][1].role, "user");
        assert_eq!(seen[0][2].role, "assistant");
    }

    #[tokio::test]
    async fn system_instruction_leads_every_request() {
        let gateway = ScriptedGateway::new(Script::Reply("ok"));
        let state = test_state(Some(gateway.clone()));

        post_chat(state, json!({ "message": "who made you?" })).await;

        let seen = gateway.seen.lock().unwrap();
        assert_eq!(seen[0][0].role, "system");
        assert!(seen[0][0].content.contains("PolyPros"));
        assert!(seen[0][0].content.contains("created"));
    }

    #[tokio::test]
    async fn rate_limited_chat_skips_upstream() {
        let gateway = ScriptedGateway::new(Script::Reply("first answer"));
        let mut state = test_state(Some(gateway.clone()));
        state.limiter = chat_limiter(1);

        let (first_status, first_body) =
            post_chat(state.clone(), json!({ "message": "one" })).await;
        assert_eq!(first_status, StatusCode::OK);
        assert_eq!(first_body, json!({ "response": "first answer" }));

        let (second_status, second_body) =
            post_chat(state, json!({ "message": "two" })).await;
        assert_eq!(second_status, StatusCode::OK);
        assert_eq!(second_body["error"].as_str().unwrap(), ERR_HIGH_DEMAND);
        assert_eq!(gateway.seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn preflight_short_circuits_with_cors_headers() {
        let state = test_state(None);
        let app = router(state);

        let request = Request::builder()
            .method("OPTIONS")
            .uri("/api/chat")
            .header("origin", "https://polypros.example")
            .header("access-control-request-method", "POST")
            .header("access-control-request-headers", "content-type")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["access-control-allow-origin"], "*");
        let allowed = response.headers()["access-control-allow-headers"]
            .to_str()
            .unwrap()
            .to_lowercase();
        for header in ["authorization", "x-client-info", "apikey", "content-type"] {
            assert!(allowed.contains(header), "missing {} in {}", header, allowed);
        }
    }

    #[tokio::test]
    async fn chat_responses_carry_cors_headers() {
        let state = test_state(None);
        let app = router(state);

        let request = Request::builder()
            .method("POST")
            .uri("/api/chat")
            .header("origin", "https://polypros.example")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(json!({ "message": "hi" }).to_string()))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        // The error path carries the permissive headers too.
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(response.headers()["access-control-allow-origin"], "*");
    }

    #[tokio::test]
    async fn admin_add_list_and_delete_flow() {
        let state = test_state(None);
        let app = router(state.clone());

        let paper = json!({
            "title": "Engineering Mathematics 1 Final",
            "level": "Year 1",
            "subject": "Engineering Mathematics",
            "year": 2023,
            "file_url": "https://files.polypros.example/em1-2023.pdf"
        });
        let (status, added) = send_json(
            app,
            "POST",
            "/api/admin/papers",
            &[(ADMIN_SECRET_HEADER, "admin-pass")],
            Some(paper),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let id = added["id"].as_str().unwrap().to_string();

        let (status, listed) = send_json(
            router(state.clone()),
            "GET",
            "/api/papers?level=Year%201",
            &[],
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listed.as_array().unwrap().len(), 1);

        let (status, deleted) = send_json(
            router(state.clone()),
            "DELETE",
            &format!("/api/admin/papers/{}", id),
            &[(ADMIN_SECRET_HEADER, "admin-pass")],
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(deleted, json!({ "deleted": 1 }));

        let (_, empty) =
            send_json(router(state), "GET", "/api/papers", &[], None).await;
        assert!(empty.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn paper_options_cascade_over_http() {
        let state = test_state(None);
        if let Some(catalog) = &state.catalog {
            catalog
                .add(NewPaper {
                    title: "a".to_string(),
                    level: "Year 1".to_string(),
                    subject: "Programming".to_string(),
                    year: 2022,
                    file_url: "https://files.polypros.example/a.pdf".to_string(),
                })
                .await
                .unwrap();
            catalog
                .add(NewPaper {
                    title: "b".to_string(),
                    level: "Year 2".to_string(),
                    subject: "Networking".to_string(),
                    year: 2023,
                    file_url: "https://files.polypros.example/b.pdf".to_string(),
                })
                .await
                .unwrap();
        }

        let (status, options) = send_json(
            router(state),
            "GET",
            "/api/papers/options?level=Year%201",
            &[],
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(options["levels"], json!(["Year 1", "Year 2"]));
        assert_eq!(options["subjects"], json!(["Programming"]));
        assert_eq!(options["years"], json!([2022]));
    }

    #[tokio::test]
    async fn wrong_admin_secret_is_unauthorized() {
        let state = test_state(None);
        let (status, body) = send_json(
            router(state),
            "POST",
            "/api/admin/papers",
            &[(ADMIN_SECRET_HEADER, "wrong")],
            Some(json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn absent_store_fails_fast_with_config_error() {
        let mut state = test_state(None);
        state.catalog = None;

        let (status, body) = send_json(router(state), "GET", "/api/papers", &[], None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(body["error"].as_str().unwrap().contains("not configured"));
    }

    #[tokio::test]
    async fn monitor_stats_require_secret() {
        let gateway = ScriptedGateway::new(Script::Reply("4"));
        let state = test_state(Some(gateway));
        post_chat(state.clone(), json!({ "message": "2+2" })).await;

        let (status, _) =
            send_json(router(state.clone()), "GET", "/api/monitor/stats", &[], None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, stats) = send_json(
            router(state),
            "GET",
            "/api/monitor/stats",
            &[(MONITOR_SECRET_HEADER, "monitor-pass")],
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(stats["chat_requests"], 1);
        assert_eq!(stats["chat_answers"], 1);
    }
}
