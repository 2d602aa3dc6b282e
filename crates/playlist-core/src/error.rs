use std::path::PathBuf;
use thiserror::Error;

/// A single request/response exchange that did not produce a usable answer.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransportError {
    #[error("request to {path} failed: {message}")]
    Request { path: String, message: String },

    #[error("{path} returned {status}: {body}")]
    Status {
        path: String,
        status: u16,
        body: String,
    },

    #[error("unexpected response from {path}: {reason}")]
    Decode { path: String, reason: String },
}

impl TransportError {
    /// The response body when the backend answered with a non-success status.
    pub fn body(&self) -> Option<&str> {
        match self {
            Self::Status { body, .. } => Some(body),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum AcquireError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("pre-upload info failed: {0}")]
    PreUpload(#[source] TransportError),

    #[error("upload failed: {0}")]
    Upload(#[source] TransportError),

    #[error("upload response carried no usable id")]
    MissingId,
}

/// Failures after which no later step can meaningfully run.
#[derive(Debug, Error)]
pub enum FatalError {
    #[error("media file not found: {0}")]
    InputMissing(PathBuf),

    #[error("token request failed: {0}")]
    Auth(#[source] TransportError),

    #[error("file acquisition failed: {0}")]
    AssetAcquisition(#[source] AcquireError),

    #[error("create playlist failed: {0}")]
    ResourceCreation(#[source] TransportError),

    #[error("screen discovery failed: {0}")]
    ScreenDiscovery(String),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScheduleError {
    #[error("a {days}-day window starting {start} is out of range")]
    OutOfRange { start: String, days: i64 },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

pub type Result<T> = std::result::Result<T, TransportError>;
