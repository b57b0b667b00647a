pub mod app_config;
pub mod config;
pub mod providers;
pub mod rewards;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use providers::{
    load_providers, ProviderConfig, ProviderKind, ProviderRegistry, ProvidersFile,
    OFFER_SOURCE_LETTER, UNKNOWN_SOURCE_LETTER,
};
pub use rewards::{
    membership_key, Availability, CatalogMembership, GroupedReward, NormalizedReward, RewardKind,
    RewardStatus, ValueRange, ValueType, UNTITLED_CATALOG,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read providers file {path}: {source}")]
    ProvidersFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse providers file: {0}")]
    ProvidersFileParse(#[source] serde_yaml::Error),

    #[error("provider config validation failed: {0}")]
    Validation(String),
}
