use serde::Deserialize;
use std::env;

use crate::services::database::{ExecutionError, SourceType};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub source: SourceConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Data source the service answers questions about
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// `sqlite` or `json`
    pub kind: String,
    pub path: String,
    /// Table used when a request names none
    #[serde(default)]
    pub table: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Config {
    pub fn from_env() -> Result<Self, config::ConfigError> {
        // Values from a .env file land in the process environment first
        let _ = dotenv::dotenv();

        let mut builder = config::Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("source.kind", "sqlite")?
            .set_default("source.path", "./data.db")?
            .set_default("logging.level", "info")?;

        if let Ok(host) = env::var("HOST") {
            builder = builder.set_override("server.host", host)?;
        }

        if let Ok(port) = env::var("PORT") {
            builder = builder.set_override("server.port", port)?;
        }

        if let Ok(kind) = env::var("SOURCE_KIND") {
            builder = builder.set_override("source.kind", kind)?;
        }

        if let Ok(path) = env::var("SOURCE_PATH") {
            builder = builder.set_override("source.path", path)?;
        }

        if let Ok(table) = env::var("SOURCE_TABLE") {
            builder = builder.set_override("source.table", Some(table))?;
        }

        if let Ok(log_level) = env::var("RUST_LOG") {
            builder = builder.set_override("logging.level", log_level)?;
        }

        builder.build()?.try_deserialize()
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn source_type(&self) -> Result<SourceType, ExecutionError> {
        SourceType::from_str(&self.source.kind)
    }
}
