use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::api::handlers::{query, schema, AppState};
use crate::config::Config;
use crate::services::NlQueryService;

/// Create router with application state
pub fn create_router_with_state(service: Arc<NlQueryService>, config: Config) -> Router {
    let state = AppState { service, config };

    Router::new()
        .route("/health", get(health_check))
        .route("/api/schema", get(schema::get_schema))
        .route("/api/translate", post(query::translate_question))
        .route("/api/query", post(query::execute_query))
        .route("/api/nl-query", post(query::execute_natural_language_query))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
