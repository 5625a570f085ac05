// Execution adapters for relational and tabular sources
pub mod adapter;
pub mod filter;
pub mod sqlite;
pub mod tabular;
pub mod where_clause;

pub use adapter::{DataSourceAdapter, ExecutionError, SourceType};
pub use filter::RowFilter;
pub use sqlite::SqliteAdapter;
pub use tabular::{TabularAdapter, TabularTable};
pub use where_clause::{extract_where_clause, rewrite_equality};

use crate::models::ResultSet;
use std::sync::Arc;

/// Factory function to open the adapter for a source location
pub fn create_adapter(
    source_type: SourceType,
    location: &str,
) -> Result<Arc<dyn DataSourceAdapter>, ExecutionError> {
    match source_type {
        SourceType::Sqlite => Ok(Arc::new(SqliteAdapter::new(location)?)),
        SourceType::Json => Ok(Arc::new(TabularAdapter::from_json_file(location)?)),
    }
}

/// Run `sql` on whichever backend `adapter` wraps.
///
/// Relational sources execute the text verbatim; tabular sources apply its
/// WHERE clause as a row filter.
pub fn execute(sql: &str, adapter: &dyn DataSourceAdapter) -> Result<ResultSet, ExecutionError> {
    tracing::debug!(source = adapter.source_type().as_str(), sql, "executing query");
    adapter.execute_query(sql)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    #[test]
    fn test_same_query_on_both_backends() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("t.db");
        let conn = rusqlite::Connection::open(&db_path).unwrap();
        conn.execute_batch(
            "CREATE TABLE t (city TEXT, age INTEGER);
             INSERT INTO t VALUES ('NY', 12);
             INSERT INTO t VALUES ('LA', 9);",
        )
        .unwrap();
        drop(conn);

        let json_path = dir.path().join("t.json");
        let mut file = std::fs::File::create(&json_path).unwrap();
        write!(file, r#"[{{"city": "NY", "age": 12}}, {{"city": "LA", "age": 9}}]"#).unwrap();

        let sql = "SELECT * FROM t WHERE age >= 10;";
        let relational = create_adapter(SourceType::Sqlite, db_path.to_str().unwrap()).unwrap();
        let tabular = create_adapter(SourceType::Json, json_path.to_str().unwrap()).unwrap();

        let a = execute(sql, relational.as_ref()).unwrap();
        let b = execute(sql, tabular.as_ref()).unwrap();

        assert_eq!(a.columns, b.columns);
        assert_eq!(a.rows, vec![vec![json!("NY"), json!(12)]]);
        assert_eq!(a.rows, b.rows);
    }

    #[test]
    fn test_create_adapter_missing_source() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.json");
        let result = create_adapter(SourceType::Json, missing.to_str().unwrap());
        assert!(matches!(result, Err(ExecutionError::Load(_))));
    }

    #[test]
    fn test_source_type_parsing() {
        assert_eq!(SourceType::from_str("SQLite").unwrap(), SourceType::Sqlite);
        assert_eq!(SourceType::from_str("json").unwrap(), SourceType::Json);
        assert!(SourceType::from_str("druid").is_err());
    }
}
