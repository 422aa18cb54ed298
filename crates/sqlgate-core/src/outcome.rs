// crates/sqlgate-core/src/outcome.rs
// ============================================================================
// Module: Statement Outcomes
// Description: Row sets and mutation summaries produced by one statement.
// Purpose: Define the data payload carried by a success envelope.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Read statements yield an ordered list of rows keyed by column name. All
//! other statements yield a [`MutationSummary`]. The serialized form is
//! untagged: rows become a JSON array, a summary becomes a JSON object.

use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

/// One result row, keyed by column name in column order.
pub type Row = Map<String, Value>;

/// Result of executing one statement.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StatementOutcome {
    /// Rows returned by a result-producing statement.
    Rows(Vec<Row>),
    /// Summary of a statement that produced no result columns.
    Mutation(MutationSummary),
}

/// Effect summary for a non-query statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MutationSummary {
    /// Rows changed by the statement.
    pub changes: u64,
    /// Rowid of the most recent successful insert on the handle.
    #[serde(rename = "lastInsertRowid")]
    pub last_insert_rowid: i64,
}
