// SQLite adapter: canonical queries run verbatim on the relational engine
use crate::models::{ColumnInfo, ResultSet, TableSchema};
use crate::services::database::adapter::{DataSourceAdapter, ExecutionError, SourceType};
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};

/// Relational handle. A fresh read-only connection is opened for every call.
pub struct SqliteAdapter {
    path: PathBuf,
}

impl SqliteAdapter {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self, ExecutionError> {
        // Accept sqlite:./path and sqlite://path as well as bare paths
        let path_str = db_path.as_ref().to_string_lossy();
        let clean_path = path_str
            .strip_prefix("sqlite:")
            .map(|rest| rest.trim_start_matches("//"))
            .unwrap_or(&*path_str);

        let path = PathBuf::from(clean_path);
        if !path.exists() {
            return Err(ExecutionError::Load(format!(
                "SQLite database not found: {}",
                path.display()
            )));
        }

        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open(&self) -> Result<Connection, ExecutionError> {
        Connection::open_with_flags(
            &self.path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| ExecutionError::Load(format!("{}: {}", self.path.display(), e)))
    }

    fn list_tables(conn: &Connection) -> Result<Vec<String>, ExecutionError> {
        let mut stmt = conn.prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY rowid")?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(names
            .into_iter()
            .filter(|name| !name.starts_with("sqlite_"))
            .collect())
    }

    fn table_columns(conn: &Connection, table: &str) -> Result<Vec<ColumnInfo>, ExecutionError> {
        let pragma = format!("PRAGMA table_info(\"{}\")", table.replace('"', "\"\""));
        let mut stmt = conn.prepare(&pragma)?;
        let columns = stmt
            .query_map([], |row| {
                Ok(ColumnInfo {
                    name: row.get(1)?,
                    data_type: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                    is_nullable: row.get::<_, i64>(3)? == 0,
                    is_primary_key: row.get::<_, i64>(5)? > 0,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(columns)
    }
}

impl DataSourceAdapter for SqliteAdapter {
    fn execute_query(&self, sql: &str) -> Result<ResultSet, ExecutionError> {
        let conn = self.open()?;
        let mut stmt = conn.prepare(sql)?;

        // Statements without a result descriptor report zero columns
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let column_count = columns.len();

        let mut rows = stmt.query([])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let mut values = Vec::with_capacity(column_count);
            for idx in 0..column_count {
                values.push(value_to_json(row.get_ref(idx)?));
            }
            out.push(values);
        }

        tracing::debug!(rows = out.len(), "sqlite query returned");
        Ok(ResultSet::new(columns, out))
    }

    fn schema(&self) -> Result<Vec<TableSchema>, ExecutionError> {
        let conn = self.open()?;
        Self::list_tables(&conn)?
            .into_iter()
            .map(|name| {
                let columns = Self::table_columns(&conn, &name)?;
                Ok(TableSchema::new(name, columns))
            })
            .collect()
    }

    fn source_type(&self) -> SourceType {
        SourceType::Sqlite
    }
}

fn value_to_json(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(v) => json!(v),
        ValueRef::Real(v) => serde_json::Number::from_f64(v)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            Value::String(String::from_utf8_lossy(bytes).into_owned())
        }
    }
}
