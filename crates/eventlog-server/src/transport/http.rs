//! HTTP transport: axum router for ingestion, queries, summaries and /health.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;

use eventlog::{intent_summary, query_logs, source_stats, summary, LogBatch, NameGenerator};

use crate::session::LogSessionManager;
use crate::types::{
    DataResponse, QueryParams, ReceiveResponse, ServerError, ServerResult, SourceNameResponse,
};

/// Shared server state passed to all handlers via axum State.
pub struct ServerState {
    pub session: Arc<Mutex<LogSessionManager>>,
    /// Source names handed out by `/source` since startup.
    pub used_names: Mutex<HashSet<String>>,
}

/// HTTP transport serving the event log API.
pub struct HttpTransport {
    state: Arc<ServerState>,
}

impl HttpTransport {
    pub fn new(session: Arc<Mutex<LogSessionManager>>) -> Self {
        Self {
            state: Arc::new(ServerState {
                session,
                used_names: Mutex::new(HashSet::new()),
            }),
        }
    }

    /// Build the router; exposed so tests can drive it without a socket.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/receive", post(handle_receive))
            .route("/query", get(handle_query))
            .route("/logs", get(handle_logs))
            .route("/timeSummary", get(handle_time_summary))
            .route("/intentSummary", get(handle_intent_summary))
            .route("/sourceStats", get(handle_source_stats))
            .route("/source", get(handle_source))
            .route("/health", get(handle_health))
            .layer(CorsLayer::permissive())
            .with_state(self.state.clone())
    }

    /// Run the HTTP server on the given address until Ctrl-C, then save.
    pub async fn run(&self, addr: &str) -> ServerResult<()> {
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(ServerError::Io)?;

        tracing::info!("HTTP transport listening on {addr}");

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| ServerError::Transport(e.to_string()))?;

        tracing::info!("Shutting down, saving event log");
        self.state.session.lock().await.save()
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
    }
}

async fn handle_receive(
    State(state): State<Arc<ServerState>>,
    Json(batch): Json<LogBatch>,
) -> ServerResult<Json<ReceiveResponse>> {
    let mut session = state.session.lock().await;
    let logs = session.ingest(batch)?;
    // Records stay in memory and marked dirty if the write fails.
    if let Err(e) = session.auto_save().await {
        tracing::error!("Auto-save failed: {e}");
    }
    Ok(Json(ReceiveResponse { logs }))
}

async fn handle_query(
    State(state): State<Arc<ServerState>>,
    Query(params): Query<QueryParams>,
) -> ServerResult<Response> {
    let source = params.require_source()?;
    let start = params.start()?.ok_or(ServerError::MissingParam("start_time"))?;
    let end = params.end()?;

    let session = state.session.lock().await;
    let data = query_logs(session.store(), Some(source), Some(start), end);
    tracing::debug!(source, results = data.len(), "log query");
    Ok(Json(DataResponse { data }).into_response())
}

async fn handle_logs(State(state): State<Arc<ServerState>>) -> Response {
    let session = state.session.lock().await;
    let data = query_logs(session.store(), None, None, None);
    Json(DataResponse { data }).into_response()
}

async fn handle_time_summary(
    State(state): State<Arc<ServerState>>,
    Query(params): Query<QueryParams>,
) -> ServerResult<Response> {
    let query = params.time_summary_query()?;
    let session = state.session.lock().await;
    let result = summary::time_summary(session.store(), &query)?;
    Ok(Json(result).into_response())
}

async fn handle_intent_summary(
    State(state): State<Arc<ServerState>>,
    Query(params): Query<QueryParams>,
) -> ServerResult<Response> {
    let filter = params.intent_filter()?;
    let started = Instant::now();
    let session = state.session.lock().await;
    let result = intent_summary(session.store(), &filter, params.count_sort());
    tracing::debug!(
        intents = result.count.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "intent summary"
    );
    Ok(Json(result).into_response())
}

async fn handle_source_stats(
    State(state): State<Arc<ServerState>>,
    Query(params): Query<QueryParams>,
) -> ServerResult<Response> {
    let source = params.require_source()?;
    let range = params.range()?;
    let session = state.session.lock().await;
    let stats = source_stats(session.store(), source, &range)?;
    Ok(Json(stats).into_response())
}

async fn handle_source(State(state): State<Arc<ServerState>>) -> Json<SourceNameResponse> {
    let mut used = state.used_names.lock().await;
    let name = NameGenerator::new().generate(|candidate| !used.insert(candidate.to_string()));

    Json(match name {
        Some(source) => {
            tracing::info!(source = %source, "assigned source name");
            SourceNameResponse::Assigned { source }
        }
        None => SourceNameResponse::exhausted(),
    })
}

/// Health check endpoint.
async fn handle_health(State(state): State<Arc<ServerState>>) -> Json<serde_json::Value> {
    let records = state.session.lock().await.store().count();
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "records": records,
    }))
}
