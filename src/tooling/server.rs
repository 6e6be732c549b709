//! HTTP transport.
//!
//! JSON endpoints over a shared [`ChatService`]. Unknown agents are 404;
//! every other service error is 500 with a `detail` message.

use crate::error::ApiError;
use crate::service::ChatService;
use crate::tooling::format::format_build_outcome_text;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared state accessible from handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ChatService>,
}

/// Body of the chat endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent: Option<String>,
}

/// Service error rendered as an HTTP response.
pub struct HttpError(ApiError);

impl From<ApiError> for HttpError {
    fn from(err: ApiError) -> Self {
        HttpError(err)
    }
}

impl HttpError {
    fn status(&self) -> StatusCode {
        match self.0 {
            ApiError::AgentNotFound { .. } => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self.0);
        }
        (status, Json(json!({ "detail": self.0.to_string() }))).into_response()
    }
}

type HttpResult<T> = Result<Json<T>, HttpError>;

/// Build the router with all routes.
pub fn build_router(service: Arc<ChatService>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/chat", post(chat_handler))
        .route("/chat/{agent}", post(chat_with_agent_handler))
        .route("/create-agents", post(create_agents_handler))
        .route("/process-documents", post(process_documents_handler))
        .route("/process-agent/{agent}", post(process_agent_handler))
        .route("/agents", get(list_agents_handler))
        .route("/agents/{agent}", get(agent_status_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { service })
}

/// Serve until ctrl-c.
pub async fn serve(service: Arc<ChatService>, host: &str, port: u16) -> Result<(), ApiError> {
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| ApiError::ConfigError(format!("Failed to bind {}: {}", addr, e)))?;
    info!(%addr, "Serving HTTP");
    eprintln!("Starting docdesk server on http://{}", addr);

    axum::serve(listener, build_router(service))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
        })
        .await
        .map_err(|e| ApiError::ConfigError(format!("Server error: {}", e)))
}

/// GET /health
async fn health_handler() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// POST /chat
async fn chat_handler(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> HttpResult<ChatResponse> {
    let reply = state.service.chat(&request.text).await?;
    Ok(Json(ChatResponse {
        response: reply.render(),
        agent: reply.agent().map(str::to_string),
    }))
}

/// POST /chat/{agent}
async fn chat_with_agent_handler(
    State(state): State<AppState>,
    Path(agent): Path<String>,
    Json(request): Json<ChatRequest>,
) -> HttpResult<ChatResponse> {
    let reply = state.service.chat_with_agent(&agent, &request.text).await?;
    Ok(Json(ChatResponse {
        response: reply.render(),
        agent: Some(reply.agent().map(str::to_string).unwrap_or(agent)),
    }))
}

/// POST /create-agents
async fn create_agents_handler(State(state): State<AppState>) -> HttpResult<Value> {
    let (report, agents) = state
        .service
        .run_blocking(|service| Ok((service.create_agents()?, service.list_agents()?)))
        .await?;
    Ok(Json(json!({
        "message": format!("Created {} agents", report.agent_count),
        "agents": agents,
        "report": report,
    })))
}

/// POST /process-documents
async fn process_documents_handler(State(state): State<AppState>) -> HttpResult<Value> {
    let report = state.service.process_all_documents().await?;
    let message = match report.failed() {
        0 => "All documents processed successfully".to_string(),
        failed => format!("{} of {} documents failed", failed, report.outcomes.len()),
    };
    let agents = state.service.run_blocking(|service| service.list_agents()).await?;
    Ok(Json(json!({
        "message": message,
        "results": report.outcomes,
        "agents": agents,
    })))
}

/// POST /process-agent/{agent}
async fn process_agent_handler(
    State(state): State<AppState>,
    Path(agent): Path<String>,
) -> HttpResult<Value> {
    let outcome = state.service.process_agent(&agent).await?;
    let status = state
        .service
        .run_blocking(move |service| service.get_agent_status(&agent))
        .await?;
    Ok(Json(json!({
        "message": format_build_outcome_text(&status.name, &outcome),
        "outcome": outcome,
        "agent": status,
    })))
}

/// GET /agents
async fn list_agents_handler(State(state): State<AppState>) -> HttpResult<Value> {
    let agents = state.service.run_blocking(|service| service.list_agents()).await?;
    Ok(Json(json!({ "agents": agents })))
}

/// GET /agents/{agent}
async fn agent_status_handler(
    State(state): State<AppState>,
    Path(agent): Path<String>,
) -> HttpResult<Value> {
    let status = state
        .service
        .run_blocking(move |service| service.get_agent_status(&agent))
        .await?;
    Ok(Json(json!({ "agent": status })))
}
