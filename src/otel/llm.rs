//! Remote model and pipeline instrumentation.

use tracing::{span, Level, Span};
use uuid::Uuid;

/// Which remote call a span covers (maps to `gen_ai.operation.name`).
#[derive(Debug, Clone, Copy)]
pub enum LlmOperation {
    /// Single completed string (query synthesis)
    Complete,
    /// Incremental fragments (answer composition)
    Stream,
}

impl LlmOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Complete => "chat",
            Self::Stream => "chat.stream",
        }
    }
}

/// Create a span for a chat-completions request.
///
/// # Arguments
///
/// * `operation` - Completion or streaming request
/// * `model` - Model identifier sent to the provider
/// * `provider` - Provider name (`groq`, `openai`, `cerebras`)
pub fn llm_span(operation: LlmOperation, model: &str, provider: &str) -> Span {
    span!(
        Level::INFO,
        "gen_ai",
        otel.name = %format!("{} {}", operation.as_str(), model),
        otel.kind = "client",
        gen_ai.operation.name = operation.as_str(),
        gen_ai.system = provider,
        gen_ai.request.model = model,
    )
}

/// Create the span wrapping one question's trip through the pipeline.
pub fn pipeline_span(session_id: Uuid) -> Span {
    span!(
        Level::INFO,
        "pipeline",
        otel.kind = "internal",
        session.id = %session_id,
    )
}
