//! Schema Store: an in-memory SQLite database built from an uploaded script.
//!
//! A store is created fresh for every upload and owns its connection for the
//! rest of its life. Creation is all-or-nothing: if any statement in the script
//! fails the connection is dropped and the caller keeps whatever store it had.

pub mod result;
pub mod schema;

pub use result::{Cell, ExecutionLimits, ExecutionResult};
pub use schema::{ColumnInfo, TableInfo};

use crate::otel::db_query_span;
use crate::types::{ChatError, Result};
use rusqlite::limits::Limit;
use rusqlite::{Batch, Connection};
use tracing::{debug, info};

/// Sample rows per table shown in the schema description by default.
pub const DEFAULT_SAMPLE_ROWS: usize = 3;

/// Live in-memory database plus its cached schema.
pub struct SchemaStore {
    conn: Connection,
    tables: Vec<TableInfo>,
    description: String,
}

impl std::fmt::Debug for SchemaStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaStore")
            .field("tables", &self.tables.len())
            .finish_non_exhaustive()
    }
}

impl SchemaStore {
    /// Build a store from SQL script text.
    ///
    /// # Errors
    ///
    /// Returns `ChatError::Init` carrying the engine's message if the script
    /// fails to execute.
    pub fn initialize(script: &str) -> Result<Self> {
        Self::initialize_with_samples(script, DEFAULT_SAMPLE_ROWS)
    }

    /// Build a store, including `sample_rows` rows per table in the description.
    pub fn initialize_with_samples(script: &str, sample_rows: usize) -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| ChatError::Init(format!("failed to open in-memory database: {}", e)))?;

        // No ATTACH: the store never touches files on disk
        let _ = conn.set_limit(Limit::SQLITE_LIMIT_ATTACHED, 0);

        conn.execute_batch(script)
            .map_err(|e| ChatError::Init(e.to_string()))?;

        let tables = schema::load_tables(&conn).map_err(|e| ChatError::Init(e.to_string()))?;
        let description = schema::describe(&conn, &tables, sample_rows)
            .map_err(|e| ChatError::Init(e.to_string()))?;

        info!(tables = tables.len(), script_bytes = script.len(), "Database initialized");

        Ok(Self {
            conn,
            tables,
            description,
        })
    }

    /// Build a store from uploaded file bytes (must be UTF-8).
    pub fn from_bytes(bytes: &[u8], sample_rows: usize) -> Result<Self> {
        let script = std::str::from_utf8(bytes)
            .map_err(|e| ChatError::Init(format!("SQL file is not valid UTF-8: {}", e)))?;
        Self::initialize_with_samples(script, sample_rows)
    }

    /// Human/model-readable listing of tables, columns and sample rows.
    pub fn describe_schema(&self) -> &str {
        &self.description
    }

    /// Tables present when the store was created.
    pub fn tables(&self) -> &[TableInfo] {
        &self.tables
    }

    /// Run one statement and collect its rows.
    ///
    /// # Errors
    ///
    /// - `ChatError::Execution` with the engine's text if the statement fails,
    ///   or if `sql` holds more than one statement
    /// - `ChatError::ReadOnlyViolation` if `limits.read_only` is set and the
    ///   statement would write
    pub fn execute(&self, sql: &str, limits: &ExecutionLimits) -> Result<ExecutionResult> {
        let span = db_query_span(sql);
        let _guard = span.enter();

        let mut batch = Batch::new(&self.conn, sql);
        let mut stmt = batch
            .next()
            .map_err(|e| ChatError::Execution(e.to_string()))?
            .ok_or_else(|| ChatError::Execution("no statement to execute".to_string()))?;
        if batch
            .next()
            .map_err(|e| ChatError::Execution(e.to_string()))?
            .is_some()
        {
            return Err(ChatError::Execution(
                "You can only execute one statement at a time.".to_string(),
            ));
        }

        if limits.read_only && !stmt.readonly() {
            return Err(ChatError::ReadOnlyViolation(sql.trim().to_string()));
        }

        let columns: Vec<String> = stmt.column_names().iter().map(|s| s.to_string()).collect();
        let width = columns.len();

        let mut rows = stmt.query([]).map_err(|e| ChatError::Execution(e.to_string()))?;
        let mut result = ExecutionResult {
            columns,
            ..Default::default()
        };

        while let Some(row) = rows.next().map_err(|e| ChatError::Execution(e.to_string()))? {
            if result.rows.len() == limits.max_rows {
                result.truncated = true;
                break;
            }
            let mut cells = Vec::with_capacity(width);
            for i in 0..width {
                let value = row.get_ref(i).map_err(|e| ChatError::Execution(e.to_string()))?;
                cells.push(Cell::from_value_ref(value, limits.max_cell_chars));
            }
            result.rows.push(cells);
        }

        debug!(rows = result.rows.len(), truncated = result.truncated, "Query executed");
        Ok(result)
    }
}
