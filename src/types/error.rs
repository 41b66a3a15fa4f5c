//! Error types for the question-answering pipeline.
//!
//! Uses `thiserror` for ergonomic error definitions with automatic `From` implementations.

use thiserror::Error;

/// Failure talking to the remote chat-completions API.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LlmError {
    /// No API key for the selected provider
    #[error("{0} environment variable not set")]
    MissingApiKey(&'static str),

    /// Transport failure (connect, TLS, body read)
    #[error("request failed: {0}")]
    Request(String),

    /// Non-success response from the API
    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    /// Response body or stream chunk could not be decoded
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// Model returned no text
    #[error("model returned an empty response")]
    Empty,
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        Self::Request(err.to_string())
    }
}

/// Error type for all session and pipeline operations.
#[derive(Error, Debug)]
pub enum ChatError {
    /// SQL script could not be loaded into a fresh database
    #[error("Error initializing database: {0}")]
    Init(String),

    /// Question asked before any script was loaded
    #[error("No database loaded. Upload a SQL file to begin.")]
    NoDatabase,

    /// Question was blank
    #[error("Question is empty")]
    EmptyQuestion,

    /// Remote model failed while writing the query
    #[error("Query synthesis failed: {0}")]
    Synthesis(#[source] LlmError),

    /// Synthesized SQL failed inside the engine (raw engine text)
    #[error("{0}")]
    Execution(String),

    /// Synthesized SQL would modify the database
    #[error("Refusing to run a statement that modifies the database: {0}")]
    ReadOnlyViolation(String),

    /// Remote model failed while writing the answer
    #[error("Answer composition failed: {0}")]
    Composer(#[source] LlmError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ChatError {
    /// Create a configuration error with context.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Text shown to the user when this error reaches the pipeline boundary.
    ///
    /// Load and lookup problems are shown as-is; everything raised while a
    /// question was in flight gets the generic prefix.
    pub fn user_message(&self) -> String {
        match self {
            Self::Init(_) | Self::NoDatabase | Self::EmptyQuestion | Self::Config(_) => {
                self.to_string()
            }
            other => format!("An error occurred: {}", other),
        }
    }

    /// Whether the error came from the remote model rather than local state.
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Synthesis(_) | Self::Composer(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_message_is_user_facing() {
        let err = ChatError::Init("near \"CREAT\": syntax error".to_string());
        assert_eq!(
            err.user_message(),
            "Error initializing database: near \"CREAT\": syntax error"
        );
    }

    #[test]
    fn test_remote_errors_get_generic_prefix() {
        let err = ChatError::Composer(LlmError::Api {
            status: 429,
            body: "rate limited".to_string(),
        });
        assert!(err.is_remote());
        assert!(err.user_message().starts_with("An error occurred: "));
        assert!(err.user_message().contains("429"));
    }

    #[test]
    fn test_execution_keeps_engine_text() {
        let err = ChatError::Execution("no such table: Users".to_string());
        assert!(!err.is_remote());
        assert!(err.user_message().contains("no such table: Users"));
    }
}
