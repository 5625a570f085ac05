use axum::{extract::State, Json};

use crate::api::handlers::AppState;
use crate::api::middleware::AppError;
use crate::models::{NaturalLanguageQueryRequest, QueryRequest};

/// Translate a question to SQL without executing it
pub async fn translate_question(
    State(state): State<AppState>,
    Json(payload): Json<NaturalLanguageQueryRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let question = payload.question.trim().to_string();
    if question.is_empty() {
        return Err(AppError::Validation("Question cannot be empty".to_string()));
    }

    tracing::info!("Translating question: {}", question);

    let service = state.service.clone();
    let generated = tokio::task::spawn_blocking(move || {
        service.generate_sql(&question, payload.table.as_deref())
    })
    .await??;

    Ok(Json(serde_json::json!({
        "generated": generated,
    })))
}

/// Execute SQL against the configured source
pub async fn execute_query(
    State(state): State<AppState>,
    Json(payload): Json<QueryRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let sql = payload.query.trim().to_string();
    if sql.is_empty() {
        return Err(AppError::Validation("SQL query cannot be empty".to_string()));
    }

    tracing::info!("Executing SQL query: {}", sql);

    let service = state.service.clone();
    let result = tokio::task::spawn_blocking(move || service.execute_sql(&sql)).await??;

    Ok(Json(serde_json::json!({
        "columns": result.columns,
        "rows": result.rows,
        "unapplied": result.unapplied,
    })))
}

/// Translate a question and execute the generated SQL
pub async fn execute_natural_language_query(
    State(state): State<AppState>,
    Json(payload): Json<NaturalLanguageQueryRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let question = payload.question.trim().to_string();
    if question.is_empty() {
        return Err(AppError::Validation("Question cannot be empty".to_string()));
    }

    tracing::info!("Executing natural language query: {}", question);

    let service = state.service.clone();
    let (generated, run) = tokio::task::spawn_blocking(move || {
        service.run(&question, payload.table.as_deref())
    })
    .await??;

    tracing::info!(
        "Question answered with {} rows in {:?} ms",
        run.row_count.unwrap_or_default(),
        run.execution_time_ms
    );

    Ok(Json(serde_json::json!({
        "query": run,
        "generated": generated,
    })))
}
