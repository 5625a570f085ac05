pub mod column_resolver;
pub mod database; // Relational and tabular execution adapters
pub mod intent_translator;
pub mod query_service;
pub mod synonyms;

pub use column_resolver::{resolve, resolve_column, ColumnResolver};
pub use database::{create_adapter, execute, DataSourceAdapter, ExecutionError, SourceType};
pub use intent_translator::{translate, IntentTranslator, TranslateError, Translation};
pub use query_service::*;
pub use synonyms::SynonymTable;
