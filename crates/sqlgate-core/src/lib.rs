// crates/sqlgate-core/src/lib.rs
// ============================================================================
// Module: sqlgate Core
// Description: Tenant identifiers, store interfaces, and the execute pipeline.
// Purpose: Engine-agnostic core of the multi-tenant SQL gateway.
// Dependencies: rand, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! `sqlgate-core` resolves an opaque tenant identifier to a private store and
//! executes one SQL statement against it. The embedded engine is reached only
//! through [`TenantStore`] and [`StoreHandle`]; see `sqlgate-store-sqlite`
//! for the `SQLite` backend.
//! Security posture: identifiers are the only credential and the only input
//! used to build a storage path; they are validated before any location is
//! computed.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod envelope;
pub mod gateway;
pub mod identifiers;
pub mod interfaces;
pub mod locator;
pub mod outcome;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use envelope::ResponseEnvelope;
pub use gateway::ExecuteRequest;
pub use gateway::Gateway;
pub use gateway::GatewayError;
pub use identifiers::InvalidTenantId;
pub use identifiers::TenantId;
pub use identifiers::is_valid_tenant_id;
pub use interfaces::StoreError;
pub use interfaces::StoreHandle;
pub use interfaces::StoreLease;
pub use interfaces::TenantStore;
pub use interfaces::with_store;
pub use locator::StoreLocation;
pub use locator::StoreRoot;
pub use outcome::MutationSummary;
pub use outcome::Row;
pub use outcome::StatementOutcome;
