//! Error types for the stats collector

use thiserror::Error;

use crate::client::StatsEndpoint;

/// Failures raised while fetching and decoding an endpoint
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Request to {endpoint} failed: {reason}")]
    Transport {
        endpoint: StatsEndpoint,
        reason: String,
    },

    #[error("Request to {endpoint} returned HTTP {status}")]
    Status { endpoint: StatsEndpoint, status: u16 },

    #[error("Could not decode response from {endpoint}: {source}")]
    Decode {
        endpoint: StatsEndpoint,
        source: serde_json::Error,
    },
}

/// Errors raised by the collection flows
#[derive(Error, Debug)]
pub enum CollectError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("Cannot set metric response, missing {0} name")]
    MissingIdentity(&'static str),

    #[error("Index '{0}' not contained in common index stats")]
    IndexNotFound(String),

    #[error("Index '{0}' has no store sizes in common index stats")]
    MissingStoreSize(String),

    #[error(
        "Attempting to collect {count} indices which exceeds the maximum of {limit}. \
         Use the indices regex configuration parameter to limit collection size."
    )]
    CardinalityExceeded { count: usize, limit: usize },

    #[error("Could not create entity '{namespace}:{name}'")]
    EntityCreation { name: String, namespace: String },

    #[error("Invalid indices regex: {0}")]
    InvalidIndexPattern(#[from] regex::Error),

    #[error("Common stats unavailable, cannot cross-reference indices")]
    CommonStatsUnavailable,
}

/// Startup configuration errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Hostname must not be empty")]
    EmptyHostname,

    #[error("Port must be non-zero")]
    InvalidPort,

    #[error("Both username and password must be specified")]
    IncompleteCredentials,

    #[error("Timeout must be at least one second")]
    InvalidTimeout,

    #[error("Interval must be at least one second")]
    InvalidInterval,

    #[error("CA bundle file requires --use-ssl")]
    CaBundleWithoutSsl,

    #[error("Could not read CA bundle '{path}': {reason}")]
    CaBundle { path: String, reason: String },

    #[error("Could not build HTTP client: {0}")]
    HttpClient(String),
}

pub type Result<T> = std::result::Result<T, CollectError>;
