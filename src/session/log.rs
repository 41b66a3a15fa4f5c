//! Session Log: ordered question/answer history for one session.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// One answered question. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEntry {
    question: String,
    answer: String,
    sql: String,
    asked_at: DateTime<Utc>,
}

impl LogEntry {
    pub fn new(question: impl Into<String>, answer: impl Into<String>, sql: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
            sql: sql.into(),
            asked_at: Utc::now(),
        }
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    pub fn answer(&self) -> &str {
        &self.answer
    }

    /// Query that produced the answer.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn asked_at(&self) -> DateTime<Utc> {
        self.asked_at
    }
}

/// Append-only history, cleared only on request.
#[derive(Debug, Clone, Default)]
pub struct SessionLog {
    entries: Vec<LogEntry>,
}

impl SessionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, entry: LogEntry) {
        self.entries.push(entry);
    }

    /// Entries, most recent first.
    pub fn all(&self) -> impl DoubleEndedIterator<Item = &LogEntry> + ExactSizeIterator {
        self.entries.iter().rev()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_is_reverse_chronological() {
        let mut log = SessionLog::new();
        for i in 1..=4 {
            log.append(LogEntry::new(format!("q{}", i), format!("a{}", i), "SELECT 1"));
        }

        let questions: Vec<&str> = log.all().map(|e| e.question()).collect();
        assert_eq!(questions, vec!["q4", "q3", "q2", "q1"]);
        assert_eq!(log.all().len(), 4);
        assert_eq!(log.all().next_back().unwrap().answer(), "a1");
    }

    #[test]
    fn test_clear_empties_log() {
        let mut log = SessionLog::new();
        log.append(LogEntry::new("q", "a", "SELECT 1"));
        assert!(!log.is_empty());

        log.clear();
        assert!(log.is_empty());
        assert_eq!(log.all().count(), 0);
    }

    #[test]
    fn test_entry_fields() {
        let before = Utc::now();
        let entry = LogEntry::new("how many?", "Three.", "SELECT COUNT(*) FROM T");
        assert_eq!(entry.question(), "how many?");
        assert_eq!(entry.answer(), "Three.");
        assert_eq!(entry.sql(), "SELECT COUNT(*) FROM T");
        assert!(entry.asked_at() >= before);
    }
}
