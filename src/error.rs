//! Error types for the route construction pipeline.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// A single geocoding call failed. Always local to one address.
#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("geocoding request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("no provider API key configured")]
    MissingApiKey,

    #[error("provider returned HTTP {0}")]
    Http(u16),

    #[error("provider returned status {status}")]
    Provider { status: String },

    #[error("provider response had no usable location")]
    MalformedResponse,
}

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cache serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("zone {0} needs at least three polygon vertices")]
    DegeneratePolygon(String),

    #[error("{0} has a non-finite coordinate")]
    NonFiniteCoordinate(String),

    #[error("zone {0} is declared more than once")]
    DuplicateZone(String),

    #[error("resolver needs at least one worker")]
    NoWorkers,
}

/// Conditions that abort a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("no delivery points could be resolved ({unresolved} addresses unresolved)")]
    NoDeliveryPoints { unresolved: usize },

    #[error("cannot start geocoding workers: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Cache(#[from] CacheError),
}
