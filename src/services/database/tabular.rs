// Tabular adapter: an in-memory table with no query engine
//
// Only the WHERE clause of a query is honored. It is reinterpreted as a row
// filter; projection, ORDER BY and LIMIT are reported back as unapplied.

use crate::models::{ColumnInfo, QueryParts, ResultSet, TableSchema, UnappliedClause};
use crate::services::database::adapter::{DataSourceAdapter, ExecutionError, SourceType};
use crate::services::database::filter::RowFilter;
use crate::services::database::where_clause::rewrite_equality;
use serde_json::{Map, Value};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Named table of rows in column order
#[derive(Debug, Clone, PartialEq)]
pub struct TabularTable {
    name: String,
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl TabularTable {
    pub fn new(
        name: impl Into<String>,
        columns: Vec<String>,
        rows: Vec<Vec<Value>>,
    ) -> Result<Self, ExecutionError> {
        if let Some((idx, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != columns.len()) {
            return Err(ExecutionError::Load(format!(
                "row {} has {} values, expected {}",
                idx,
                row.len(),
                columns.len()
            )));
        }

        Ok(Self {
            name: name.into(),
            columns,
            rows,
        })
    }

    /// Build a table from JSON objects.
    ///
    /// Columns appear in first-seen key order; missing keys become null.
    pub fn from_records(name: impl Into<String>, records: Vec<Map<String, Value>>) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for record in &records {
            for key in record.keys() {
                if !columns.contains(key) {
                    columns.push(key.clone());
                }
            }
        }

        let rows = records
            .into_iter()
            .map(|mut record| {
                columns
                    .iter()
                    .map(|col| record.remove(col).unwrap_or(Value::Null))
                    .collect()
            })
            .collect();

        Self {
            name: name.into(),
            columns,
            rows,
        }
    }

    /// Load a JSON array of records. The table is named after the file stem.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ExecutionError> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| ExecutionError::Load(format!("{}: {}", path.display(), e)))?;
        let records: Vec<Map<String, Value>> = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| ExecutionError::Load(format!("{}: {}", path.display(), e)))?;

        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "data".to_string());

        tracing::debug!(table = %name, rows = records.len(), "loaded tabular source");
        Ok(Self::from_records(name, records))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    /// Rows satisfying a filter-language predicate, in table order
    pub fn filter(&self, predicate: &str) -> Result<Vec<Vec<Value>>, ExecutionError> {
        let filter = RowFilter::compile(predicate, &self.columns)?;
        Ok(self
            .rows
            .iter()
            .filter(|row| filter.matches(row))
            .cloned()
            .collect())
    }
}

pub struct TabularAdapter {
    table: TabularTable,
}

impl TabularAdapter {
    pub fn new(table: TabularTable) -> Self {
        Self { table }
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ExecutionError> {
        TabularTable::from_json_file(path).map(Self::new)
    }

    pub fn table(&self) -> &TabularTable {
        &self.table
    }
}

impl DataSourceAdapter for TabularAdapter {
    fn execute_query(&self, sql: &str) -> Result<ResultSet, ExecutionError> {
        let parts = QueryParts::split(sql);

        let rows = match parts.predicate.as_deref() {
            Some(clause) => self.table.filter(&rewrite_equality(clause))?,
            None => self.table.rows.clone(),
        };

        let mut unapplied = Vec::new();
        if parts.projection.as_deref().is_some_and(|p| p.trim() != "*") {
            unapplied.push(UnappliedClause::Projection);
        }
        if parts.order_by.is_some() {
            unapplied.push(UnappliedClause::OrderBy);
        }
        if parts.limit.is_some() {
            unapplied.push(UnappliedClause::Limit);
        }
        if !unapplied.is_empty() {
            tracing::debug!(?unapplied, "clauses not applied by tabular source");
        }

        let mut result = ResultSet::new(self.table.columns.clone(), rows);
        result.unapplied = unapplied;
        Ok(result)
    }

    fn schema(&self) -> Result<Vec<TableSchema>, ExecutionError> {
        let columns = self.table.columns.iter().map(ColumnInfo::untyped).collect();
        Ok(vec![TableSchema::new(self.table.name.clone(), columns)])
    }

    fn source_type(&self) -> SourceType {
        SourceType::Json
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    fn records(value: Value) -> Vec<Map<String, Value>> {
        serde_json::from_value(value).unwrap()
    }

    fn city_table() -> TabularAdapter {
        TabularAdapter::new(TabularTable::from_records(
            "t",
            records(json!([
                {"city": "NY", "age": 12},
                {"city": "LA", "age": 9},
                {"city": "SF", "age": 30},
            ])),
        ))
    }

    #[test]
    fn test_where_clause_filters_rows() {
        let adapter = TabularAdapter::new(TabularTable::from_records(
            "t",
            records(json!([{"city": "NY", "age": 12}, {"city": "LA", "age": 9}])),
        ));

        let result = adapter.execute_query("SELECT * FROM t WHERE age >= 10;").unwrap();

        assert_eq!(result.columns, vec!["city", "age"]);
        assert_eq!(result.rows, vec![vec![json!("NY"), json!(12)]]);
        assert!(result.unapplied.is_empty());
    }

    #[test]
    fn test_sql_equality_is_rewritten() {
        let result = city_table()
            .execute_query("SELECT * FROM t WHERE city = 'LA';")
            .unwrap();
        assert_eq!(result.row_count(), 1);
        assert_eq!(result.value(0, "age"), Some(&json!(9)));
    }

    #[test]
    fn test_no_where_returns_every_row() {
        let result = city_table().execute_query("SELECT * FROM t;").unwrap();
        assert_eq!(result.row_count(), 3);
        assert!(result.unapplied.is_empty());
    }

    #[test]
    fn test_unknown_column_fails() {
        let err = city_table()
            .execute_query("SELECT * FROM t WHERE height > 3;")
            .unwrap_err();
        assert!(matches!(err, ExecutionError::Filter(_)));
    }

    #[test]
    fn test_order_by_and_limit_are_reported_unapplied() {
        let result = city_table()
            .execute_query("SELECT * FROM t ORDER BY age DESC LIMIT 1;")
            .unwrap();

        // Every row comes back in table order
        assert_eq!(result.row_count(), 3);
        assert_eq!(result.value(0, "city"), Some(&json!("NY")));
        assert_eq!(
            result.unapplied,
            vec![UnappliedClause::OrderBy, UnappliedClause::Limit]
        );
    }

    #[test]
    fn test_aggregate_projection_is_reported_unapplied() {
        let result = city_table()
            .execute_query("SELECT COUNT(*) FROM t WHERE age > 10;")
            .unwrap();

        assert_eq!(result.columns, vec!["city", "age"]);
        assert_eq!(result.row_count(), 2);
        assert_eq!(result.unapplied, vec![UnappliedClause::Projection]);
    }

    #[test]
    fn test_records_with_missing_keys() {
        let table = TabularTable::from_records(
            "people",
            records(json!([{"name": "Ann"}, {"age": 4, "name": "Bo"}])),
        );
        assert_eq!(table.columns(), ["name", "age"]);
        assert_eq!(table.rows()[0], vec![json!("Ann"), Value::Null]);
        assert_eq!(table.rows()[1], vec![json!("Bo"), json!(4)]);
    }

    #[test]
    fn test_new_rejects_ragged_rows() {
        let result = TabularTable::new(
            "t",
            vec!["a".to_string(), "b".to_string()],
            vec![vec![json!(1), json!(2)], vec![json!(3)]],
        );
        assert!(matches!(result, Err(ExecutionError::Load(_))));
    }

    #[test]
    fn test_load_json_file_and_schema() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"[{{"season": 2008, "city": "Mumbai"}}, {{"season": 2009, "city": "Durban"}}]"#).unwrap();

        let adapter = TabularAdapter::from_json_file(file.path()).unwrap();
        let schema = adapter.schema().unwrap();

        assert_eq!(schema.len(), 1);
        assert_eq!(schema[0].name, adapter.table().name());
        assert_eq!(schema[0].column_names(), vec!["season", "city"]);
        assert_eq!(adapter.source_type(), SourceType::Json);
    }

    #[test]
    fn test_load_invalid_json_is_a_load_error() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, "not json").unwrap();
        let result = TabularAdapter::from_json_file(file.path());
        assert!(matches!(result, Err(ExecutionError::Load(_))));
    }
}
