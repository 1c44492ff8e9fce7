use std::io;
use std::path::PathBuf;

use layer_harvest_core::EndpointError;

use crate::persist::PersistError;
use crate::records::{GeometryKind, RecordSchema};
use crate::types::{AttemptFailure, FetchError};

/// Capabilities or identifier lookup failed. Nothing has been extracted yet.
#[derive(Debug, thiserror::Error)]
pub enum ResolutionError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: FetchError,
    },
    #[error("request to {url} returned status {status}")]
    HttpStatus { url: String, status: u16 },
    #[error("response from {url} is not valid json: {source}")]
    InvalidJson {
        url: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("response from {url} has no usable `{key}`")]
    MissingKey { url: String, key: &'static str },
    #[error("server reported an error for {url}: {message}")]
    ServerError { url: String, message: String },
}

#[derive(Debug, thiserror::Error)]
pub enum ConversionError {
    #[error("payload is not valid json: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("payload is a server error: {0}")]
    ServerError(String),
    #[error("payload has no `{0}` member")]
    MissingMember(&'static str),
    #[error("payload geometry {found} does not match target {expected}")]
    GeometryMismatch {
        expected: GeometryKind,
        found: String,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    #[error("invalid collection name {0:?}")]
    InvalidName(String),
    #[error("io error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to serialize records: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("collection {name} is missing")]
    Missing { name: String },
    #[error("collection {name} is corrupt at line {line}")]
    Corrupt { name: String, line: usize },
}

impl MergeError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Everything that can end a harvest run. Transport and soft server errors
/// only surface here once a configured retry ceiling is hit.
#[derive(Debug, thiserror::Error)]
pub enum HarvestError {
    #[error("invalid endpoint: {0}")]
    Endpoint(#[from] EndpointError),
    #[error(
        "{first} ({}) and {second} ({}) must be separate directories",
        .first_path.display(),
        .second_path.display()
    )]
    OverlappingDirectories {
        first: &'static str,
        first_path: PathBuf,
        second: &'static str,
        second_path: PathBuf,
    },
    #[error("could not build http client: {0}")]
    Client(FetchError),
    #[error("service metadata: {0}")]
    Resolution(#[from] ResolutionError),
    #[error("extraction of chunk {ordinal} aborted after {attempts} attempts, last failure: {last_failure}")]
    ExtractionAborted {
        ordinal: usize,
        attempts: u32,
        last_failure: AttemptFailure,
    },
    #[error("staging: {0}")]
    Persist(#[from] PersistError),
    #[error("conversion of chunk {ordinal} failed: {source}")]
    Conversion {
        ordinal: usize,
        #[source]
        source: ConversionError,
    },
    #[error("chunk {ordinal} schema differs from the first chunk")]
    SchemaMismatch {
        ordinal: usize,
        expected: Box<RecordSchema>,
        found: Box<RecordSchema>,
    },
    #[error("destination: {0}")]
    Merge(#[from] MergeError),
}
