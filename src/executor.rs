//! Query Executor: runs a synthesized statement against the active store.

use crate::llm::SynthesizedQuery;
use crate::store::{ExecutionLimits, ExecutionResult, SchemaStore};
use crate::types::Result;
use tracing::warn;

/// Executes synthesized queries under fixed limits.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryExecutor {
    limits: ExecutionLimits,
}

impl QueryExecutor {
    pub fn new(limits: ExecutionLimits) -> Self {
        Self { limits }
    }

    /// Run `query` against `store`.
    ///
    /// Engine errors are returned as-is and never sent back to the model.
    pub fn execute(&self, store: &SchemaStore, query: &SynthesizedQuery) -> Result<ExecutionResult> {
        store.execute(query.as_str(), &self.limits).map_err(|e| {
            warn!(error = %e, "Synthesized query failed");
            e
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Cell;
    use crate::types::ChatError;

    #[test]
    fn test_users_names_query_runs() {
        let store = SchemaStore::initialize(
            "CREATE TABLE Users(id INTEGER PRIMARY KEY, name TEXT);
             INSERT INTO Users(name) VALUES ('Ada'), ('Grace');",
        )
        .unwrap();
        let executor = QueryExecutor::default();

        let result = executor
            .execute(&store, &SynthesizedQuery::new("SELECT Users.name FROM Users LIMIT 5"))
            .unwrap();
        assert_eq!(result.columns, vec!["name"]);
        assert_eq!(
            result.rows,
            vec![vec![Cell::Text("Ada".into())], vec![Cell::Text("Grace".into())]]
        );
    }

    #[test]
    fn test_missing_column_is_execution_error() {
        let store = SchemaStore::initialize("CREATE TABLE Users(id INT, name TEXT);").unwrap();
        let err = QueryExecutor::default()
            .execute(&store, &SynthesizedQuery::new("SELECT Users.email FROM Users"))
            .unwrap_err();
        match err {
            ChatError::Execution(msg) => assert!(msg.contains("no such column"), "{}", msg),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_shared_connection_sees_earlier_writes() {
        let store = SchemaStore::initialize("CREATE TABLE T(x INT);").unwrap();
        let executor = QueryExecutor::new(ExecutionLimits {
            read_only: false,
            ..Default::default()
        });
        executor
            .execute(&store, &SynthesizedQuery::new("INSERT INTO T VALUES (7)"))
            .unwrap();
        let result = executor
            .execute(&store, &SynthesizedQuery::new("SELECT x FROM T"))
            .unwrap();
        assert_eq!(result.scalar(), Some(&Cell::Integer(7)));
    }
}
