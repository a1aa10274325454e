use std::path::PathBuf;
use thiserror::Error;

/// A payload that could not be turned into a field event. Never fatal.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Malformed payload on {topic}: {source}")]
    InvalidJson {
        topic: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("Non-finite {what} on {topic}")]
    NonFinite {
        topic: &'static str,
        what: &'static str,
    },

    #[error("Topic {topic} does not carry a joinable field")]
    UnjoinableTopic { topic: String },
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Corrupt entry in {path} at line {line}: {reason}")]
    Corrupt {
        path: PathBuf,
        line: usize,
        reason: String,
    },
}

impl StoreError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("No subscriber for topic {topic}")]
    Unrouted { topic: &'static str },
}

#[derive(Error, Debug)]
pub enum AggregatorError {
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("Event log failure: {0}")]
    EventLog(#[source] StoreError),

    #[error("Error series failure: {0}")]
    ErrorSeries(#[source] StoreError),

    #[error("Transport failure: {0}")]
    Transport(#[from] TransportError),
}

impl AggregatorError {
    /// Only malformed payloads are recovered locally; everything else ends the run.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, AggregatorError::Decode(_))
    }
}

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Failed to read model {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid model {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Model expects {expected} features, got {actual}")]
    Dimension { expected: usize, actual: usize },
}

pub type Result<T> = std::result::Result<T, AggregatorError>;
