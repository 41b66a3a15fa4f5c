//! Per-session state: the active store, the question log and pending input.

pub mod context;
pub mod log;

pub use context::{PipelineStage, SessionContext};
pub use log::{LogEntry, SessionLog};
