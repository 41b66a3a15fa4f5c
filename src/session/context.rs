//! Session Context: everything one running session owns.

use crate::session::log::SessionLog;
use crate::store::{SchemaStore, DEFAULT_SAMPLE_ROWS};
use crate::types::{ChatError, Result};
use std::fmt;
use std::path::Path;
use tracing::{info, warn};
use uuid::Uuid;

/// Stage of the question pipeline.
///
/// `Idle → Synthesizing → Executing → Composing → Logged`, with any stage able
/// to move to `Failed`. Every run ends back at `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Idle,
    Synthesizing,
    Executing,
    Composing,
    Logged,
    Failed,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Synthesizing => "synthesizing",
            Self::Executing => "executing",
            Self::Composing => "composing",
            Self::Logged => "logged",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State for one session: the active store, the log and the pending input.
///
/// At most one store is active. Loading a new script replaces it only if the
/// new script succeeds. Dropping the context ends the session.
#[derive(Debug)]
pub struct SessionContext {
    id: Uuid,
    pub(crate) store: Option<SchemaStore>,
    pub(crate) log: SessionLog,
    pub(crate) stage: PipelineStage,
    pending: String,
    sample_rows: usize,
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionContext {
    pub fn new() -> Self {
        Self::with_sample_rows(DEFAULT_SAMPLE_ROWS)
    }

    /// New session whose stores describe `sample_rows` rows per table.
    pub fn with_sample_rows(sample_rows: usize) -> Self {
        let id = Uuid::new_v4();
        info!(session_id = %id, "Session started");
        Self {
            id,
            store: None,
            log: SessionLog::new(),
            stage: PipelineStage::Idle,
            pending: String::new(),
            sample_rows,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn stage(&self) -> PipelineStage {
        self.stage
    }

    /// Replace the active store with one built from `script`.
    ///
    /// # Errors
    ///
    /// Returns `ChatError::Init`; the previous store stays active.
    pub fn load_script(&mut self, script: &str) -> Result<&SchemaStore> {
        let store = SchemaStore::initialize_with_samples(script, self.sample_rows)
            .map_err(|e| self.log_rejected(e))?;
        Ok(self.install(store))
    }

    /// Replace the active store from uploaded bytes (UTF-8 SQL).
    pub fn load_bytes(&mut self, bytes: &[u8]) -> Result<&SchemaStore> {
        let store = SchemaStore::from_bytes(bytes, self.sample_rows).map_err(|e| self.log_rejected(e))?;
        Ok(self.install(store))
    }

    /// Replace the active store from a SQL file on disk.
    pub fn load_file(&mut self, path: &Path) -> Result<&SchemaStore> {
        let bytes = std::fs::read(path)
            .map_err(|e| ChatError::Init(format!("cannot read {}: {}", path.display(), e)))?;
        self.load_bytes(&bytes)
    }

    fn install(&mut self, store: SchemaStore) -> &SchemaStore {
        let replaced = self.store.is_some();
        info!(
            session_id = %self.id,
            tables = store.tables().len(),
            replaced,
            "Database loaded"
        );
        self.store.insert(store)
    }

    fn log_rejected(&self, err: ChatError) -> ChatError {
        warn!(session_id = %self.id, error = %err, kept_previous = self.store.is_some(), "Upload rejected");
        err
    }

    pub fn has_database(&self) -> bool {
        self.store.is_some()
    }

    pub fn store(&self) -> Option<&SchemaStore> {
        self.store.as_ref()
    }

    /// Schema description of the active store.
    pub fn schema_description(&self) -> Result<&str> {
        self.store
            .as_ref()
            .map(|s| s.describe_schema())
            .ok_or(ChatError::NoDatabase)
    }

    pub fn log(&self) -> &SessionLog {
        &self.log
    }

    /// Forget every logged question and answer.
    pub fn clear_history(&mut self) {
        info!(session_id = %self.id, entries = self.log.len(), "History cleared");
        self.log.clear();
    }

    /// Add a line to the question being typed.
    pub fn push_pending(&mut self, line: &str) {
        if !self.pending.is_empty() {
            self.pending.push('\n');
        }
        self.pending.push_str(line);
    }

    pub fn pending(&self) -> &str {
        &self.pending
    }

    /// Take the pending question, leaving the input empty.
    pub fn take_pending(&mut self) -> String {
        std::mem::take(&mut self.pending)
    }

    /// Discard the question being typed.
    pub fn clear_pending(&mut self) {
        self.pending.clear();
    }
}
