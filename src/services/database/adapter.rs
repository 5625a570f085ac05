// Data source adapter trait for dual-backend execution
use crate::models::{ResultSet, TableSchema};
use thiserror::Error;

/// Failure while running a query against a backend.
///
/// Backend messages are carried verbatim.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExecutionError {
    /// Error text reported by the relational engine
    #[error("{0}")]
    Backend(String),

    /// The WHERE clause could not be parsed or evaluated as a row filter
    #[error("Filter error: {0}")]
    Filter(String),

    /// The data source could not be opened or read
    #[error("Failed to load data source: {0}")]
    Load(String),
}

impl From<rusqlite::Error> for ExecutionError {
    fn from(err: rusqlite::Error) -> Self {
        ExecutionError::Backend(err.to_string())
    }
}

/// Kind of backend behind an adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceType {
    /// Relational engine that runs SQL itself
    Sqlite,
    /// In-memory table loaded from a JSON records file; no query engine
    Json,
}

impl SourceType {
    pub fn from_str(s: &str) -> Result<Self, ExecutionError> {
        match s.to_lowercase().as_str() {
            "sqlite" | "sqlite3" | "db" => Ok(SourceType::Sqlite),
            "json" | "tabular" => Ok(SourceType::Json),
            _ => Err(ExecutionError::Load(format!("Unsupported source type: {}", s))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Sqlite => "sqlite",
            SourceType::Json => "json",
        }
    }
}

/// Backend abstraction: every source answers schema requests and executes
/// canonical queries into a uniform [`ResultSet`].
///
/// Calls are blocking and independent of each other.
pub trait DataSourceAdapter: Send + Sync {
    /// Execute a query string against the source
    fn execute_query(&self, sql: &str) -> Result<ResultSet, ExecutionError>;

    /// Tables and ordered column names of the source
    fn schema(&self) -> Result<Vec<TableSchema>, ExecutionError>;

    fn source_type(&self) -> SourceType;
}
