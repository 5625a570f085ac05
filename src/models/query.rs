use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::intent::{MatchStrategy, QueryIntent};
use super::result::{ResultSet, UnappliedClause};

/// SQL produced for a question, with how it was produced
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GeneratedQuery {
    pub sql: String,
    pub table: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<MatchStrategy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intent: Option<QueryIntent>,
    /// No rule recognized the question; `sql` is the full-scan fallback
    pub fallback: bool,
    /// The question was already SQL and was passed through untranslated
    pub passthrough: bool,
}

impl GeneratedQuery {
    pub fn passthrough(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            table: None,
            column: None,
            strategy: None,
            intent: None,
            fallback: false,
            passthrough: true,
        }
    }
}

/// One executed natural-language request
#[derive(Debug, Clone, Serialize)]
pub struct QueryRun {
    pub id: String,
    pub question: String,
    pub query_text: String,
    pub status: QueryStatus,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<serde_json::Value>>,
    pub row_count: Option<usize>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unapplied: Vec<UnappliedClause>,
    pub execution_time_ms: Option<u64>,
    pub error_message: Option<String>,
    pub executed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum QueryStatus {
    Pending,
    Executing,
    Completed,
    Failed,
}

impl QueryRun {
    pub fn new(question: String, query_text: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            question,
            query_text,
            status: QueryStatus::Pending,
            columns: Vec::new(),
            rows: Vec::new(),
            row_count: None,
            unapplied: Vec::new(),
            execution_time_ms: None,
            error_message: None,
            executed_at: None,
        }
    }

    pub fn mark_executing(&mut self) {
        self.status = QueryStatus::Executing;
    }

    pub fn mark_completed(&mut self, result: ResultSet, execution_time_ms: u64) {
        self.status = QueryStatus::Completed;
        self.row_count = Some(result.row_count());
        self.columns = result.columns;
        self.rows = result.rows;
        self.unapplied = result.unapplied;
        self.execution_time_ms = Some(execution_time_ms);
        self.executed_at = Some(Utc::now());
    }

    pub fn mark_failed(&mut self, error_message: String) {
        self.status = QueryStatus::Failed;
        self.error_message = Some(error_message);
        self.executed_at = Some(Utc::now());
    }
}

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub query: String,
}

#[derive(Debug, Deserialize)]
pub struct NaturalLanguageQueryRequest {
    pub question: String,
    #[serde(default)]
    pub table: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_query_run_lifecycle() {
        let mut run = QueryRun::new("show all".to_string(), "SELECT * FROM t;".to_string());
        assert_eq!(run.status, QueryStatus::Pending);

        run.mark_executing();
        assert_eq!(run.status, QueryStatus::Executing);

        let result = ResultSet::new(vec!["a".to_string()], vec![vec![json!(1)], vec![json!(2)]]);
        run.mark_completed(result, 4);
        assert_eq!(run.status, QueryStatus::Completed);
        assert_eq!(run.row_count, Some(2));
        assert_eq!(run.columns, vec!["a".to_string()]);
        assert!(run.executed_at.is_some());
    }

    #[test]
    fn test_query_run_failure() {
        let mut run = QueryRun::new("q".to_string(), "SELECT * FROM missing;".to_string());
        run.mark_failed("no such table: missing".to_string());
        assert_eq!(run.status, QueryStatus::Failed);
        assert_eq!(run.error_message.as_deref(), Some("no such table: missing"));
        assert!(run.row_count.is_none());
    }
}
