// crates/sqlgate-core/src/gateway.rs
// ============================================================================
// Module: Gateway Pipeline
// Description: Validate, locate, lease, dispatch for one execute request.
// Purpose: Single ordered path from client input to statement outcome.
// Dependencies: serde_json, thiserror
// ============================================================================

//! ## Overview
//! [`Gateway::execute`] runs the request pipeline in a fixed order: required
//! fields, identifier validation, location, scoped handle lease, dispatch,
//! release. Requests share no mutable state; each one opens and closes its
//! own handle. Failures are classified as [`GatewayError`] so the transport
//! layer can shape a uniform envelope.
//! Security posture: request fields are untrusted; no store location is
//! computed until the identifier has been validated.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Value;
use thiserror::Error;

use crate::identifiers::TenantId;
use crate::interfaces::StoreError;
use crate::interfaces::TenantStore;
use crate::interfaces::with_store;
use crate::locator::StoreRoot;
use crate::outcome::StatementOutcome;

// ============================================================================
// SECTION: Client Messages
// ============================================================================

/// Message returned when `id` or `sql` is absent.
pub const MISSING_FIELDS_MESSAGE: &str = "Missing \"id\" or \"sql\" fields.";
/// Message returned when `id` fails validation.
pub const INVALID_ID_MESSAGE: &str = "Invalid ID format. Hex only.";
/// Message returned when the tenant store cannot be opened.
pub const STORE_UNAVAILABLE_MESSAGE: &str = "Store unavailable.";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Request-level failure taxonomy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// Required fields were missing.
    #[error("malformed request")]
    MalformedRequest,
    /// Identifier failed the alphabet check.
    #[error("invalid identifier")]
    InvalidIdentifier,
    /// Environment-level store failure. The detail is never sent to clients.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
    /// Engine diagnostic for a rejected or failed statement.
    #[error("{0}")]
    Statement(String),
}

impl GatewayError {
    /// Returns the message safe to show to the client.
    #[must_use]
    pub fn client_message(&self) -> &str {
        match self {
            Self::MalformedRequest => MISSING_FIELDS_MESSAGE,
            Self::InvalidIdentifier => INVALID_ID_MESSAGE,
            Self::StoreUnavailable(_) => STORE_UNAVAILABLE_MESSAGE,
            Self::Statement(message) => message,
        }
    }

    /// Returns a stable label for audit logging.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::MalformedRequest => "malformed_request",
            Self::InvalidIdentifier => "invalid_identifier",
            Self::StoreUnavailable(_) => "store_unavailable",
            Self::Statement(_) => "statement_error",
        }
    }
}

impl From<StoreError> for GatewayError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::Unavailable(message) | StoreError::Release(message) => {
                Self::StoreUnavailable(message)
            }
            StoreError::Statement(message) => Self::Statement(message),
        }
    }
}

// ============================================================================
// SECTION: Request
// ============================================================================

/// Raw execute request as received from a client.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecuteRequest {
    /// Client-supplied tenant identifier.
    pub id: Option<String>,
    /// Client-supplied SQL text.
    pub sql: Option<String>,
}

impl ExecuteRequest {
    /// Builds a request from explicit fields.
    #[must_use]
    pub fn new(id: impl Into<String>, sql: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            sql: Some(sql.into()),
        }
    }

    /// Extracts `id` and `sql` from a JSON body. Non-string fields count as absent.
    #[must_use]
    pub fn from_json(body: &Value) -> Self {
        let field = |name: &str| body.get(name).and_then(Value::as_str).map(str::to_string);
        Self {
            id: field("id"),
            sql: field("sql"),
        }
    }
}

// ============================================================================
// SECTION: Gateway
// ============================================================================

/// Tenant-store resolution and statement execution pipeline.
pub struct Gateway<S> {
    /// Storage root under which tenant stores are created.
    root: StoreRoot,
    /// Backend used to open tenant stores.
    store: S,
}

impl<S: TenantStore> Gateway<S> {
    /// Creates a gateway over an established storage root.
    #[must_use]
    pub fn new(root: StoreRoot, store: S) -> Self {
        Self {
            root,
            store,
        }
    }

    /// Issues a fresh identifier. No store is created until first use.
    #[must_use]
    pub fn issue_identifier(&self) -> TenantId {
        TenantId::generate()
    }

    /// Executes one statement for the tenant named in `request`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] classifying the first failing stage.
    pub fn execute(&self, request: &ExecuteRequest) -> Result<StatementOutcome, GatewayError> {
        let (Some(id), Some(sql)) = (present(request.id.as_deref()), present(request.sql.as_deref()))
        else {
            return Err(GatewayError::MalformedRequest);
        };
        let tenant = TenantId::parse(id).map_err(|_| GatewayError::InvalidIdentifier)?;
        let location = self.root.locate(&tenant);
        with_store(&self.store, &location, |lease| lease.dispatch(sql)).map_err(GatewayError::from)
    }
}

/// Treats empty strings as absent fields.
fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|text| !text.is_empty())
}
