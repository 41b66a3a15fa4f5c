//! Core types shared across the crate.
//!
//! - `ChatError`: Error type for all session and pipeline operations
//! - `LlmError`: Remote model failures
//! - `Result`: Convenient result type alias

pub mod error;

pub use error::{ChatError, LlmError};

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, ChatError>;
