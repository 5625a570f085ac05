use std::sync::Arc;
use std::time::Instant;

use crate::api::middleware::AppError;
use crate::models::{GeneratedQuery, QueryRun, ResultSet, TableSchema};
use crate::services::database::{self, DataSourceAdapter, SourceType};
use crate::services::intent_translator::{IntentTranslator, TranslateError, Translation};
use crate::validation::SqlValidator;

/// Question-to-result pipeline over one data source
pub struct NlQueryService {
    adapter: Arc<dyn DataSourceAdapter>,
    default_table: Option<String>,
}

impl NlQueryService {
    pub fn new(adapter: Arc<dyn DataSourceAdapter>, default_table: Option<String>) -> Self {
        Self {
            adapter,
            default_table,
        }
    }

    pub fn source_type(&self) -> SourceType {
        self.adapter.source_type()
    }

    pub fn schema(&self) -> Result<Vec<TableSchema>, AppError> {
        Ok(self.adapter.schema()?)
    }

    /// Pick the table a question runs against.
    ///
    /// An explicit table wins, then the configured default, then the first
    /// table the source reports. Names match case-insensitively.
    fn select_table(&self, requested: Option<&str>) -> Result<TableSchema, AppError> {
        let schema = self.schema()?;
        let wanted = requested
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .or(self.default_table.as_deref());

        match wanted {
            Some(name) => schema
                .into_iter()
                .find(|table| table.name.eq_ignore_ascii_case(name))
                .ok_or_else(|| AppError::NotFound(format!("Table '{}' not found", name))),
            None => schema
                .into_iter()
                .next()
                .ok_or_else(|| AppError::NotFound("Data source has no tables".to_string())),
        }
    }

    /// Turn a question into SQL without running it.
    ///
    /// Text that is already SQL is passed through untouched.
    pub fn generate_sql(&self, question: &str, table: Option<&str>) -> Result<GeneratedQuery, AppError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(TranslateError::EmptyPhrase.into());
        }

        if SqlValidator::looks_like_sql(question) {
            tracing::info!("Question is already SQL, passing it through");
            return Ok(GeneratedQuery::passthrough(question));
        }

        let table = self.select_table(table)?;
        let columns: Vec<String> = table
            .columns
            .iter()
            .map(|c| c.name.to_lowercase())
            .collect();

        let translator = IntentTranslator::new(table.name.clone(), columns);
        let Translation { query, resolution } = translator.translate(question)?;

        if query.is_fallback() {
            tracing::warn!("No intent recognized in question, returning full table: {}", question);
        }
        tracing::info!(
            "Generated SQL for table {} via {:?} match on {}: {}",
            table.name,
            resolution.strategy,
            resolution.column,
            query.sql
        );

        let fallback = query.is_fallback();
        Ok(GeneratedQuery {
            sql: query.sql,
            table: Some(table.name),
            column: Some(resolution.column),
            strategy: Some(resolution.strategy),
            intent: Some(query.intent),
            fallback,
            passthrough: false,
        })
    }

    /// Validate and execute SQL against the source
    pub fn execute_sql(&self, sql: &str) -> Result<ResultSet, AppError> {
        SqlValidator::validate_select_only(sql)?;
        Ok(database::execute(sql, self.adapter.as_ref())?)
    }

    /// Generate SQL for a question and execute it
    pub fn run(&self, question: &str, table: Option<&str>) -> Result<(GeneratedQuery, QueryRun), AppError> {
        let generated = self.generate_sql(question, table)?;

        let start_time = Instant::now();
        let mut run = QueryRun::new(question.trim().to_string(), generated.sql.clone());
        run.mark_executing();

        let result = self.execute_sql(&generated.sql).map_err(|e| {
            tracing::error!("Query execution failed: {}", e);
            run.mark_failed(e.to_string());
            e
        })?;

        let execution_time_ms = start_time.elapsed().as_millis() as u64;
        if !result.unapplied.is_empty() {
            tracing::warn!(
                "Source {} ignored clauses {:?} of: {}",
                self.source_type().as_str(),
                result.unapplied,
                generated.sql
            );
        }
        run.mark_completed(result, execution_time_ms);

        Ok((generated, run))
    }
}
