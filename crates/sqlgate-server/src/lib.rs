// crates/sqlgate-server/src/lib.rs
// ============================================================================
// Module: sqlgate Server Library
// Description: HTTP surface for the multi-tenant SQL gateway.
// Purpose: Map HTTP requests onto the gateway pipeline and shape responses.
// Dependencies: axum, tokio, tower-http, sqlgate-core, sqlgate-config
// ============================================================================

//! ## Overview
//! `sqlgate-server` exposes `POST /new` to issue identifiers and `POST /api`
//! to execute one statement against a tenant store. Every response uses the
//! [`sqlgate_core::ResponseEnvelope`] wire shape.
//! Security posture: request bodies are untrusted; tenant identifiers and SQL
//! text are never written to audit logs.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod audit;
pub mod docs;
pub mod server;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use audit::AuditSink;
pub use audit::LifecycleAuditEvent;
pub use audit::MemoryAuditSink;
pub use audit::NoopAuditSink;
pub use audit::RequestAuditEvent;
pub use audit::RequestAuditEventParams;
pub use audit::StderrAuditSink;
pub use server::BODY_TOO_LARGE_MESSAGE;
pub use server::GatewayServer;
pub use server::ServerError;
