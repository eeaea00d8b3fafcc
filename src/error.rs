//! Error types for every fallible concern in the crate.
//!
//! The XP engine, limit evaluator and availability filter are infallible; the
//! variants here cover storage, configuration, catalog input and the purchase flow.

use thiserror::Error;

use crate::schema::SchemaError;

pub type StoreResult<T> = core::result::Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("schema violation: {0}")]
    Schema(#[from] SchemaError),
    #[error("no progress recorded for profile '{0}'")]
    UnknownProfile(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error reading config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("generated content is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid catalog entry: {0}")]
    Invalid(String),
    #[error("no quest found matching '{0}'")]
    TaskNotFound(String),
    #[error("no reward found matching '{0}'")]
    RewardNotFound(String),
    #[error("'{identifier}' is ambiguous, matches: {candidates}. Use the id instead.")]
    Ambiguous {
        identifier: String,
        candidates: String,
    },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PurchaseError {
    #[error("not enough XP: costs {cost}, have {available}")]
    InsufficientXp { cost: u64, available: u64 },
    #[error("purchase limit reached for '{0}'")]
    LimitReached(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TimerError {
    #[error("quest '{0}' has no timer")]
    NotTimed(String),
    #[error("no active timer for quest '{0}'")]
    NotRunning(String),
}
