use rewardhub_core::{ProviderKind, RewardKind};
use rewardhub_db::DbError;
use thiserror::Error;

/// Terminal failure of an overview request.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to fetch {kind} source records: {source}")]
    SourceFetch {
        kind: RewardKind,
        #[source]
        source: DbError,
    },

    #[error("failed to read {kind} registry links: {source}")]
    RegistryLookup {
        kind: RewardKind,
        #[source]
        source: DbError,
    },
}

/// A single raw record could not be normalized. Recovered by the degraded
/// transform path and never returned to callers.
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("unknown status '{0}'")]
    UnknownStatus(String),

    #[error("malformed {provider} raw_data: {source}")]
    RawData {
        provider: ProviderKind,
        #[source]
        source: serde_json::Error,
    },
}

/// Image payload could not be turned into a URL. Always swallowed.
#[derive(Debug, Error)]
pub enum ImageParseError {
    #[error("image payload is empty")]
    Empty,

    #[error("image payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("image payload contains no URL")]
    NoUrl,
}

/// CPID could not be canonicalized. The normalizer falls back to the raw
/// value when this happens.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CpidError {
    #[error("cpid is empty")]
    Empty,

    #[error("cpid is {len} characters long; limit is {max}")]
    TooLong { len: usize, max: usize },

    #[error("cpid contains a control character")]
    ControlCharacter,
}
