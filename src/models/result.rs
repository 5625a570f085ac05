use serde::Serialize;
use serde_json::Value;

/// A clause of the executed query that the backend did not apply
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UnappliedClause {
    Projection,
    OrderBy,
    Limit,
}

/// Uniform result of executing a query against any backend.
///
/// Column order is the backend's projection order and row order is the
/// backend's iteration order; nothing is sorted implicitly.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unapplied: Vec<UnappliedClause>,
}

impl ResultSet {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self {
            columns,
            rows,
            unapplied: Vec::new(),
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Value of `column` in the row at `row`, if both exist
    pub fn value(&self, row: usize, column: &str) -> Option<&Value> {
        let idx = self.columns.iter().position(|c| c == column)?;
        self.rows.get(row)?.get(idx)
    }
}
