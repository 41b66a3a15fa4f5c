//! Tracing spans for the question-answering pipeline.
//!
//! Span attributes follow OpenTelemetry semantic conventions so that any
//! subscriber (fmt, JSON, or an OTLP bridge) sees stable field names:
//! - Database spans: https://opentelemetry.io/docs/specs/semconv/database/database-spans/
//! - GenAI spans: https://opentelemetry.io/docs/specs/semconv/gen-ai/gen-ai-spans/
//!
//! # Example
//!
//! ```rust,ignore
//! use sql_chat::otel::db_query_span;
//!
//! let span = db_query_span("SELECT COUNT(*) FROM T");
//! let _guard = span.enter();
//! ```

pub mod db;
pub mod llm;

pub use db::db_query_span;
pub use llm::{llm_span, pipeline_span, LlmOperation};
