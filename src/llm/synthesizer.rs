//! Query Synthesizer: natural-language question to one SQL statement.

use crate::llm::client::CompletionModel;
use crate::llm::prompts;
use crate::types::{ChatError, LlmError, Result};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Marker some models emit after the query when imitating a transcript.
const RESULT_MARKER: &str = "SQLResult:";

/// Label some models put before the query.
const QUERY_LABEL: &str = "SQLQuery:";

/// SQL produced by the model for one question.
///
/// Not validated locally; the executor surfaces any engine error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesizedQuery(String);

impl SynthesizedQuery {
    pub fn new(sql: impl Into<String>) -> Self {
        Self(sql.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for SynthesizedQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Asks the model to write SQL for a question.
pub struct QuerySynthesizer {
    model: Arc<dyn CompletionModel>,
}

impl QuerySynthesizer {
    pub fn new(model: Arc<dyn CompletionModel>) -> Self {
        Self { model }
    }

    /// Convert a question to SQL against `schema_description`.
    ///
    /// # Arguments
    ///
    /// * `question` - Natural language question, inserted verbatim
    /// * `schema_description` - Output of `SchemaStore::describe_schema`
    /// * `top_k` - Default row limit suggested to the model
    ///
    /// # Errors
    ///
    /// Returns `ChatError::Synthesis` if the remote call fails or yields no SQL.
    pub async fn synthesize(
        &self,
        question: &str,
        schema_description: &str,
        top_k: usize,
    ) -> Result<SynthesizedQuery> {
        let prompt = prompts::sql_prompt(schema_description, top_k, question);
        let raw = self
            .model
            .complete(&prompt)
            .await
            .map_err(ChatError::Synthesis)?;

        debug!(model = self.model.model_name(), raw = %raw, "Model returned query text");

        let sql = clean_sql(&raw);
        if sql.is_empty() {
            return Err(ChatError::Synthesis(LlmError::Empty));
        }
        Ok(SynthesizedQuery(sql))
    }
}

/// Strip Markdown fences and transcript labels around the model's SQL.
///
/// Handles:
/// - ```sql ... ``` / ```SQL ... ``` / ``` ... ```
/// - `SQLQuery: SELECT ...`
/// - trailing `SQLResult: ...`
pub fn clean_sql(text: &str) -> String {
    let mut text = text.trim();

    if let Some(idx) = text.find(RESULT_MARKER) {
        text = text[..idx].trim();
    }

    if let Some(fenced) = text.strip_prefix("```") {
        // Drop the opening fence line (with any language tag) and the closing fence
        let body = match fenced.split_once('\n') {
            Some((_, rest)) => rest,
            None => strip_language_tag(fenced),
        };
        let end = body.rfind("```").unwrap_or(body.len());
        text = body[..end].trim();
    }

    if let Some(rest) = text.strip_prefix(QUERY_LABEL) {
        text = rest.trim();
    }

    text.to_string()
}

/// `sql SELECT ...` → `SELECT ...` for fences written on a single line.
fn strip_language_tag(text: &str) -> &str {
    let text = text.trim_start();
    match text.get(..3) {
        Some(tag) if tag.eq_ignore_ascii_case("sql") && text[3..].starts_with(char::is_whitespace) => {
            &text[3..]
        }
        _ => text,
    }
}
