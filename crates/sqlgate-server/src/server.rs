// crates/sqlgate-server/src/server.rs
// ============================================================================
// Module: Gateway HTTP Server
// Description: axum routes for identifier issuance and statement execution.
// Purpose: Expose the gateway pipeline over HTTP with uniform envelopes.
// Dependencies: axum, tokio, tower-http, sqlgate-core, sqlgate-store-sqlite
// ============================================================================

//! ## Overview
//! [`GatewayServer`] establishes the storage root once at startup, then serves:
//! - `POST /new`: issue a fresh identifier
//! - `POST /api`: execute one statement for `{ "id", "sql" }`
//! - `GET /` and `GET /docs`: embedded documentation page
//!
//! Any other path or method is redirected to the configured fallback.
//! Statements run on the blocking pool so `SQLite` I/O never stalls the
//! runtime. Security posture: request bodies are untrusted; see
//! [`sqlgate_core::gateway`] for validation order.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::time::Instant;

use axum::Json;
use axum::Router;
use axum::body::Bytes;
use axum::extract::DefaultBodyLimit;
use axum::extract::State;
use axum::extract::rejection::BytesRejection;
use axum::http::HeaderValue;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Redirect;
use axum::response::Response;
use axum::routing::get;
use axum::routing::post;
use serde_json::Value;
use sqlgate_config::AuditSinkKind;
use sqlgate_config::GatewayConfig;
use sqlgate_core::ExecuteRequest;
use sqlgate_core::Gateway;
use sqlgate_core::GatewayError;
use sqlgate_core::ResponseEnvelope;
use sqlgate_core::StoreRoot;
use sqlgate_store_sqlite::SqliteTenantStore;
use tokio::net::TcpListener;
use tower_http::cors::AllowOrigin;
use tower_http::cors::Any;
use tower_http::cors::CorsLayer;

use crate::audit::AuditSink;
use crate::audit::LifecycleAuditEvent;
use crate::audit::NoopAuditSink;
use crate::audit::RequestAuditEvent;
use crate::audit::RequestAuditEventParams;
use crate::audit::StderrAuditSink;
use crate::docs::docs_page;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Message returned when the request body exceeds the configured limit.
pub const BODY_TOO_LARGE_MESSAGE: &str = "Request body too large.";
/// Audit route label for identifier issuance.
const ROUTE_NEW: &str = "new";
/// Audit route label for statement execution.
const ROUTE_API: &str = "api";

// ============================================================================
// SECTION: Gateway Server
// ============================================================================

/// HTTP gateway server instance.
pub struct GatewayServer {
    /// Validated server configuration.
    config: GatewayConfig,
    /// Shared handler state.
    state: Arc<ServerState>,
}

impl GatewayServer {
    /// Builds a server from configuration, selecting the configured audit sink.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] when configuration is invalid or the storage
    /// root cannot be established.
    pub fn from_config(config: GatewayConfig) -> Result<Self, ServerError> {
        let audit: Arc<dyn AuditSink> = match config.logging.sink {
            AuditSinkKind::Stderr => Arc::new(StderrAuditSink),
            AuditSinkKind::None => Arc::new(NoopAuditSink),
        };
        Self::with_audit(config, audit)
    }

    /// Builds a server that records audit events into `audit`.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] when configuration is invalid or the storage
    /// root cannot be established.
    pub fn with_audit(
        mut config: GatewayConfig,
        audit: Arc<dyn AuditSink>,
    ) -> Result<Self, ServerError> {
        config.validate().map_err(|err| ServerError::Config(err.to_string()))?;
        let root = StoreRoot::establish(&config.storage.root)
            .map_err(|err| ServerError::Init(err.to_string()))?;
        audit.record_lifecycle(&LifecycleAuditEvent::new(
            "storage_ready",
            root.path().display().to_string(),
        ));
        let store = SqliteTenantStore::new(config.storage.store_config());
        let state = Arc::new(ServerState {
            gateway: Gateway::new(root, store),
            max_body_bytes: config.server.max_body_bytes,
            fallback_redirect: config.server.fallback_redirect.clone(),
            audit,
        });
        Ok(Self {
            config,
            state,
        })
    }

    /// Builds the axum router for this server.
    #[must_use]
    pub fn router(&self) -> Router {
        build_router(Arc::clone(&self.state), &self.config.server.cors_allowed_origins)
    }

    /// Binds the configured address and serves until the listener fails.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] when binding or serving fails.
    pub async fn serve(self) -> Result<(), ServerError> {
        let addr =
            self.config.server.bind_addr().map_err(|err| ServerError::Config(err.to_string()))?;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|err| ServerError::Transport(format!("http bind failed: {err}")))?;
        self.serve_listener(listener).await
    }

    /// Serves requests on an already-bound listener.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] when the server fails.
    pub async fn serve_listener(self, listener: TcpListener) -> Result<(), ServerError> {
        let local = listener.local_addr().map(|addr| addr.to_string()).unwrap_or_default();
        self.state.audit.record_lifecycle(&LifecycleAuditEvent::new("listening", local));
        let app = self.router();
        axum::serve(listener, app)
            .await
            .map_err(|err| ServerError::Transport(format!("http server failed: {err}")))
    }
}

/// Shared server state for HTTP handlers.
struct ServerState {
    /// Request pipeline.
    gateway: Gateway<SqliteTenantStore>,
    /// Maximum allowed request body size.
    max_body_bytes: usize,
    /// Redirect target for unknown routes.
    fallback_redirect: String,
    /// Audit sink for request events.
    audit: Arc<dyn AuditSink>,
}

/// Builds the router with body limit and CORS layers.
fn build_router(state: Arc<ServerState>, cors_origins: &[String]) -> Router {
    let max_body_bytes = state.max_body_bytes;
    Router::new()
        .route("/", get(docs_page).fallback(redirect_fallback))
        .route("/docs", get(docs_page).fallback(redirect_fallback))
        .route("/new", post(handle_new).fallback(redirect_fallback))
        .route("/api", post(handle_api).fallback(redirect_fallback))
        .fallback(redirect_fallback)
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(cors_layer(cors_origins))
        .with_state(state)
}

/// Builds the CORS layer. An empty origin list allows any origin.
fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);
    }
    let origins: Vec<HeaderValue> =
        origins.iter().filter_map(|origin| origin.trim().parse().ok()).collect();
    CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
}

// ============================================================================
// SECTION: Handlers
// ============================================================================

/// Issues a fresh identifier. No store is created.
async fn handle_new(State(state): State<Arc<ServerState>>) -> Response {
    let started = Instant::now();
    let envelope = ResponseEnvelope::issued(state.gateway.issue_identifier());
    respond(&state, ROUTE_NEW, started, 0, StatusCode::OK, None, envelope)
}

/// Executes one statement for the tenant named in the body.
async fn handle_api(
    State(state): State<Arc<ServerState>>,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let started = Instant::now();
    let bytes = match body {
        Ok(bytes) if bytes.len() <= state.max_body_bytes => bytes,
        Ok(bytes) => return too_large(&state, started, bytes.len()),
        Err(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            return too_large(&state, started, 0);
        }
        Err(_) => {
            let error = GatewayError::MalformedRequest;
            return respond_error(&state, started, 0, &error);
        }
    };
    let request = parse_execute_request(&bytes);
    let worker = Arc::clone(&state);
    let result = tokio::task::spawn_blocking(move || worker.gateway.execute(&request))
        .await
        .unwrap_or_else(|err| Err(GatewayError::StoreUnavailable(err.to_string())));
    match result {
        Ok(outcome) => respond(
            &state,
            ROUTE_API,
            started,
            bytes.len(),
            StatusCode::OK,
            None,
            ResponseEnvelope::success(outcome),
        ),
        Err(error) => respond_error(&state, started, bytes.len(), &error),
    }
}

/// Redirects unknown routes and methods.
async fn redirect_fallback(State(state): State<Arc<ServerState>>) -> Redirect {
    Redirect::to(&state.fallback_redirect)
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Parses a JSON body into an execute request. Non-JSON bodies carry no fields.
fn parse_execute_request(bytes: &[u8]) -> ExecuteRequest {
    serde_json::from_slice::<Value>(bytes)
        .map(|body| ExecuteRequest::from_json(&body))
        .unwrap_or_default()
}

/// Maps a gateway failure to its HTTP status.
const fn status_for(error: &GatewayError) -> StatusCode {
    match error {
        GatewayError::MalformedRequest | GatewayError::Statement(_) => StatusCode::BAD_REQUEST,
        GatewayError::InvalidIdentifier => StatusCode::FORBIDDEN,
        GatewayError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

/// Builds the oversized-body response.
fn too_large(state: &ServerState, started: Instant, request_bytes: usize) -> Response {
    respond(
        state,
        ROUTE_API,
        started,
        request_bytes,
        StatusCode::PAYLOAD_TOO_LARGE,
        Some("payload_too_large"),
        ResponseEnvelope::failure(BODY_TOO_LARGE_MESSAGE),
    )
}

/// Builds the response for a classified gateway failure.
fn respond_error(
    state: &ServerState,
    started: Instant,
    request_bytes: usize,
    error: &GatewayError,
) -> Response {
    respond(
        state,
        ROUTE_API,
        started,
        request_bytes,
        status_for(error),
        Some(error.kind()),
        ResponseEnvelope::from_error(error),
    )
}

/// Records the audit event and serializes the envelope.
fn respond(
    state: &ServerState,
    route: &'static str,
    started: Instant,
    request_bytes: usize,
    status: StatusCode,
    error_kind: Option<&'static str>,
    envelope: ResponseEnvelope,
) -> Response {
    state.audit.record(&RequestAuditEvent::new(RequestAuditEventParams {
        route,
        status: status.as_u16(),
        error_kind,
        request_bytes,
        elapsed_ms: started.elapsed().as_millis(),
    }));
    (status, Json(envelope)).into_response()
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Gateway server errors.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Configuration errors.
    #[error("config error: {0}")]
    Config(String),
    /// Initialization errors.
    #[error("init error: {0}")]
    Init(String),
    /// Transport errors.
    #[error("transport error: {0}")]
    Transport(String),
}

// ============================================================================
// SECTION: Tests
// ============================================================================
