//! Tabular output of a synthesized query.

use rusqlite::types::ValueRef;
use std::fmt;

/// Limits applied when collecting a result set.
#[derive(Debug, Clone, Copy)]
pub struct ExecutionLimits {
    /// Maximum rows collected before the result is marked truncated
    pub max_rows: usize,
    /// Maximum characters kept per rendered cell
    pub max_cell_chars: usize,
    /// Reject statements that would modify the database
    pub read_only: bool,
}

impl Default for ExecutionLimits {
    fn default() -> Self {
        Self {
            max_rows: 100,
            max_cell_chars: 300,
            read_only: true,
        }
    }
}

/// A single value in a result row.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    /// Blob contents are not carried, only their length
    Blob(usize),
}

impl Cell {
    /// Convert a borrowed SQLite value, truncating text to `max_chars`.
    pub(crate) fn from_value_ref(value: ValueRef<'_>, max_chars: usize) -> Self {
        match value {
            ValueRef::Null => Cell::Null,
            ValueRef::Integer(n) => Cell::Integer(n),
            ValueRef::Real(f) => Cell::Real(f),
            ValueRef::Text(bytes) => {
                Cell::Text(truncate_chars(&String::from_utf8_lossy(bytes), max_chars))
            }
            ValueRef::Blob(bytes) => Cell::Blob(bytes.len()),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Null => write!(f, "NULL"),
            Cell::Integer(n) => write!(f, "{}", n),
            Cell::Real(v) => write!(f, "{}", v),
            Cell::Text(s) => write!(f, "{}", s),
            Cell::Blob(len) => write!(f, "<blob {} bytes>", len),
        }
    }
}

/// Result of executing one statement against the store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutionResult {
    /// Column names in result order
    pub columns: Vec<String>,
    /// Collected rows, at most `max_rows`
    pub rows: Vec<Vec<Cell>>,
    /// More rows existed than were collected
    pub truncated: bool,
}

impl ExecutionResult {
    /// Number of collected rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The only cell of a one-row, one-column result.
    ///
    /// # Example
    ///
    /// `SELECT COUNT(*) FROM T` over three rows yields `Some(&Cell::Integer(3))`.
    pub fn scalar(&self) -> Option<&Cell> {
        match self.rows.as_slice() {
            [row] if row.len() == 1 && !self.truncated => row.first(),
            _ => None,
        }
    }

    /// Text handed to the answer prompt.
    ///
    /// Header line of column names, then one line per row, cells joined by ` | `.
    pub fn render(&self) -> String {
        if self.rows.is_empty() {
            return "(no rows)".to_string();
        }

        let mut out = self.columns.join(" | ");
        for row in &self.rows {
            out.push('\n');
            let cells: Vec<String> = row.iter().map(|c| c.to_string()).collect();
            out.push_str(&cells.join(" | "));
        }
        if self.truncated {
            out.push_str(&format!("\n… (truncated to {} rows)", self.rows.len()));
        }
        out
    }
}

impl fmt::Display for ExecutionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Truncate on a char boundary, keeping at most `max` characters.
pub(crate) fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ExecutionResult {
        ExecutionResult {
            columns: vec!["id".to_string(), "name".to_string()],
            rows: vec![
                vec![Cell::Integer(1), Cell::Text("Ada".to_string())],
                vec![Cell::Integer(2), Cell::Null],
            ],
            truncated: false,
        }
    }

    #[test]
    fn test_render_table() {
        assert_eq!(sample().render(), "id | name\n1 | Ada\n2 | NULL");
    }

    #[test]
    fn test_render_empty() {
        let result = ExecutionResult {
            columns: vec!["id".to_string()],
            ..Default::default()
        };
        assert_eq!(result.render(), "(no rows)");
        assert!(result.scalar().is_none());
    }

    #[test]
    fn test_render_truncated_marker() {
        let mut result = sample();
        result.truncated = true;
        assert!(result.render().ends_with("… (truncated to 2 rows)"));
    }

    #[test]
    fn test_scalar() {
        let result = ExecutionResult {
            columns: vec!["COUNT(*)".to_string()],
            rows: vec![vec![Cell::Integer(3)]],
            truncated: false,
        };
        assert_eq!(result.scalar(), Some(&Cell::Integer(3)));
        assert!(sample().scalar().is_none());
    }

    #[test]
    fn test_truncate_chars_multibyte() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("", 0), "");
    }

    #[test]
    fn test_blob_display() {
        assert_eq!(Cell::Blob(16).to_string(), "<blob 16 bytes>");
    }
}
