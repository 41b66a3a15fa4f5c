//! Database operation instrumentation.
//!
//! Implements OpenTelemetry semantic conventions for SQLite queries.

use tracing::{span, Level, Span};

/// Longest query text recorded on a span.
const MAX_QUERY_TEXT: usize = 2048;

/// Create a span for one synthesized query.
///
/// # Arguments
///
/// * `query_text` - SQL about to run (recorded up to 2 KiB)
///
/// # Returns
///
/// Tracing span with `db.system.name = "sqlite"` and `db.query.text`
pub fn db_query_span(query_text: &str) -> Span {
    let text = crate::store::result::truncate_chars(query_text.trim(), MAX_QUERY_TEXT);
    let operation = text
        .split_whitespace()
        .next()
        .map(|w| w.to_ascii_uppercase())
        .unwrap_or_default();

    span!(
        Level::INFO,
        "db.query",
        otel.name = %format!("{} sqlite", operation),
        otel.kind = "client",
        db.system.name = "sqlite",
        db.namespace = ":memory:",
        db.operation.name = %operation,
        db.query.text = %text,
    )
}
