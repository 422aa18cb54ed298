// crates/sqlgate-server/src/docs.rs
// ============================================================================
// Module: Documentation Page
// Description: Embedded HTML usage page served at `/` and `/docs`.
// Dependencies: axum
// ============================================================================

//! Static HTML page describing the HTTP API, with a small request console.

use axum::response::Html;

/// Static documentation and console page.
pub const DOCS_HTML: &str = include_str!("docs.html");

/// Serves the documentation page.
pub async fn docs_page() -> Html<&'static str> {
    Html(DOCS_HTML)
}
