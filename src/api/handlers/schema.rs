use axum::{extract::State, Json};

use crate::api::handlers::AppState;
use crate::api::middleware::AppError;

/// Tables and columns of the configured source
pub async fn get_schema(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    let service = state.service.clone();
    let tables = tokio::task::spawn_blocking(move || service.schema()).await??;

    Ok(Json(serde_json::json!({
        "source": state.service.source_type().as_str(),
        "default_table": state.config.source.table,
        "tables": tables,
    })))
}
