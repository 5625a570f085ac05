use crate::api::middleware::AppError;
use sqlparser::ast::Statement;
use sqlparser::dialect::SQLiteDialect;
use sqlparser::parser::Parser;

/// Leading keywords that mark a question as already being SQL
const SQL_LEADERS: &[&str] = &["select", "with", "insert", "update", "delete"];

/// SQL validation service for ensuring queries are safe and valid
pub struct SqlValidator;

impl SqlValidator {
    /// Whether `text` is raw SQL rather than a natural-language question
    pub fn looks_like_sql(text: &str) -> bool {
        let first = text
            .trim_start()
            .split(|c: char| c.is_whitespace() || c == '(' || c == '*')
            .next()
            .unwrap_or_default()
            .to_lowercase();
        SQL_LEADERS.contains(&first.as_str())
    }

    /// Validate SQL query and ensure it's a read-only SELECT statement
    pub fn validate_select_only(sql: &str) -> Result<(), AppError> {
        let dialect = SQLiteDialect {};
        let ast = Parser::parse_sql(&dialect, sql)
            .map_err(|e| AppError::InvalidSql(format!("SQL parsing error: {}", e)))?;

        if ast.is_empty() {
            return Err(AppError::InvalidSql("Empty SQL query".to_string()));
        }
        if ast.len() > 1 {
            return Err(AppError::InvalidSql(
                "Multiple statements are not allowed".to_string(),
            ));
        }

        match &ast[0] {
            Statement::Query(_) => Ok(()),
            Statement::Insert { .. } => Err(not_allowed("INSERT")),
            Statement::Update { .. } => Err(not_allowed("UPDATE")),
            Statement::Delete { .. } => Err(not_allowed("DELETE")),
            Statement::Drop { .. } => Err(not_allowed("DROP")),
            Statement::CreateTable { .. } => Err(not_allowed("CREATE TABLE")),
            Statement::AlterTable { .. } => Err(not_allowed("ALTER TABLE")),
            other => {
                let keyword = other
                    .to_string()
                    .split_whitespace()
                    .next()
                    .unwrap_or_default()
                    .to_uppercase();
                Err(not_allowed(&keyword))
            }
        }
    }
}

fn not_allowed(kind: &str) -> AppError {
    AppError::InvalidSql(format!(
        "{} statements are not allowed. Only SELECT queries are permitted.",
        kind
    ))
}
