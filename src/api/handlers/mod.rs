pub mod query;
pub mod schema;

use std::sync::Arc;

use crate::config::Config;
use crate::services::NlQueryService;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<NlQueryService>,
    pub config: Config,
}
