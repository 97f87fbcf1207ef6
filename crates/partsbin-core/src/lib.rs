//! Shared domain types and configuration for the partsbin Quick-Add client.

mod app_config;
mod config;
pub mod types;

pub use app_config::{AppConfig, Environment, ProxyPolicy};
pub use config::{load_app_config, load_app_config_from_env};
pub use types::{
    CreatedPart, CreatedStockEntry, ImageSuggestion, Location, PartImage, QuickAddRequest,
    QuickAddResponse, SearchCandidate, SpecDataType, SpecDefinition,
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
