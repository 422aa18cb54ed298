// crates/sqlgate-core/src/envelope.rs
// ============================================================================
// Module: Response Envelope
// Description: Uniform success/failure wire shape for gateway responses.
// Purpose: Never leak storage paths or internal detail to clients.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Every response carries a boolean `success` marker. Success envelopes carry
//! `data` or an issued `id`; failure envelopes carry `error`, built from
//! [`GatewayError::client_message`].

use serde::Serialize;

use crate::gateway::GatewayError;
use crate::identifiers::TenantId;
use crate::outcome::StatementOutcome;

/// Message attached to a freshly issued identifier.
pub const ISSUED_MESSAGE: &str = "Store reserved. Use this ID for all requests.";

/// Wire response envelope.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseEnvelope {
    /// Whether the request succeeded.
    pub success: bool,
    /// Issued identifier for create requests.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<TenantId>,
    /// Statement outcome for execute requests.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<StatementOutcome>,
    /// Informational message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Client-safe failure message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ResponseEnvelope {
    /// Success envelope for an issued identifier.
    #[must_use]
    pub fn issued(id: TenantId) -> Self {
        Self {
            success: true,
            id: Some(id),
            data: None,
            message: Some(ISSUED_MESSAGE.to_string()),
            error: None,
        }
    }

    /// Success envelope carrying a statement outcome.
    #[must_use]
    pub const fn success(data: StatementOutcome) -> Self {
        Self {
            success: true,
            id: None,
            data: Some(data),
            message: None,
            error: None,
        }
    }

    /// Failure envelope with an explicit message.
    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            id: None,
            data: None,
            message: None,
            error: Some(message.into()),
        }
    }

    /// Failure envelope for a classified gateway error.
    #[must_use]
    pub fn from_error(error: &GatewayError) -> Self {
        Self::failure(error.client_message())
    }

    /// Shapes a pipeline result.
    #[must_use]
    pub fn from_result(result: &Result<StatementOutcome, GatewayError>) -> Self {
        match result {
            Ok(outcome) => Self::success(outcome.clone()),
            Err(error) => Self::from_error(error),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test-only assertions."
    )]

    use serde_json::json;

    use super::ResponseEnvelope;
    use crate::gateway::GatewayError;
    use crate::outcome::MutationSummary;
    use crate::outcome::StatementOutcome;

    #[test]
    fn store_unavailable_hides_detail() {
        let error = GatewayError::StoreUnavailable("/srv/data/abc.db: permission denied".into());
        let value = serde_json::to_value(ResponseEnvelope::from_error(&error)).unwrap();
        assert_eq!(value, json!({"success": false, "error": "Store unavailable."}));
    }

    #[test]
    fn statement_error_is_forwarded_verbatim() {
        let error = GatewayError::Statement("near \"SELEC\": syntax error".into());
        let value = serde_json::to_value(ResponseEnvelope::from_error(&error)).unwrap();
        assert_eq!(value["error"], json!("near \"SELEC\": syntax error"));
    }

    #[test]
    fn mutation_summary_uses_wire_field_names() {
        let outcome = StatementOutcome::Mutation(MutationSummary {
            changes: 1,
            last_insert_rowid: 7,
        });
        let value = serde_json::to_value(ResponseEnvelope::success(outcome)).unwrap();
        assert_eq!(value, json!({"success": true, "data": {"changes": 1, "lastInsertRowid": 7}}));
    }

    #[test]
    fn empty_row_set_serializes_as_array() {
        let value =
            serde_json::to_value(ResponseEnvelope::success(StatementOutcome::Rows(Vec::new())))
                .unwrap();
        assert_eq!(value, json!({"success": true, "data": []}));
    }
}
