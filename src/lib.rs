//! SQL Chat - ask questions about a SQL file in plain language
//!
//! Loads a user-supplied SQL script into an in-memory SQLite database and
//! answers natural-language questions about it:
//! - Query synthesis: an LLM writes one SQLite statement from the question and schema
//! - Execution: the statement runs against the session's database (read-only by default)
//! - Answer composition: the LLM explains the result, streamed fragment by fragment
//!
//! A `SessionContext` holds the active database and the question history; a
//! `Pipeline` runs one question at a time against it.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use sql_chat::{ChatClient, Config, Pipeline, PipelineEvent, SessionContext};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load(None)?;
//! let pipeline = Pipeline::new(Arc::new(ChatClient::from_config(&config)?), &config);
//!
//! let mut session = SessionContext::with_sample_rows(config.sample_rows);
//! session.load_script("CREATE TABLE T(x INT); INSERT INTO T VALUES (1),(2),(3);")?;
//!
//! let turn = pipeline
//!     .ask(&mut session, "how many rows are in T", |event| {
//!         if let PipelineEvent::Fragment(text) = event {
//!             print!("{}", text);
//!         }
//!     })
//!     .await?;
//! println!("\n{}", turn.query);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod executor;
pub mod llm;
pub mod logging;
pub mod otel;
pub mod pipeline;
pub mod session;
pub mod store;
pub mod types;

pub use config::Config;
pub use executor::QueryExecutor;
pub use llm::{ChatClient, CompletionModel, SynthesizedQuery};
pub use pipeline::{Pipeline, PipelineEvent, Turn};
pub use session::{LogEntry, PipelineStage, SessionContext, SessionLog};
pub use store::{Cell, ExecutionResult, SchemaStore};
pub use types::{ChatError, LlmError, Result};
