//! Shared fixtures for integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use sql_chat::llm::TextStream;
use sql_chat::{CompletionModel, LlmError};
use std::sync::Mutex;

/// Model double that answers from a script and records every prompt it sees.
pub struct ScriptedModel {
    sql: Result<String, LlmError>,
    fragments: Vec<Result<String, LlmError>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
    /// Returns `sql` for the query prompt and streams `fragments` for the answer.
    pub fn new(sql: &str, fragments: &[&str]) -> Self {
        Self {
            sql: Ok(sql.to_string()),
            fragments: fragments.iter().map(|f| Ok(f.to_string())).collect(),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Query synthesis fails with a remote error.
    pub fn failing_synthesis() -> Self {
        Self {
            sql: Err(LlmError::Api {
                status: 503,
                body: "service unavailable".to_string(),
            }),
            fragments: Vec::new(),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Append a stream error after the scripted fragments.
    pub fn then_fail(mut self) -> Self {
        self.fragments
            .push(Err(LlmError::Request("connection reset".to_string())));
        self
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionModel for ScriptedModel {
    fn model_name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.sql.clone()
    }

    async fn stream(&self, prompt: &str) -> Result<TextStream, LlmError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(Box::pin(tokio_stream::iter(self.fragments.clone())))
    }
}

pub const SHOP_SQL: &str = "
CREATE TABLE customers (id INTEGER PRIMARY KEY, name TEXT NOT NULL, city TEXT);
CREATE TABLE orders (id INTEGER PRIMARY KEY, customer_id INTEGER REFERENCES customers(id), total REAL);
INSERT INTO customers (name, city) VALUES ('Ada', 'London'), ('Grace', 'New York'), ('Linus', 'Helsinki');
INSERT INTO orders (customer_id, total) VALUES (1, 12.5), (1, 30.0), (2, 99.99);
";
