//! Errors for icebreaker exporter
use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExporterError {
    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("Configuration error")]
    ConfigError(#[from] config::ConfigError),

    #[error("Invalid configuration: {message}")]
    ConfigurationError { message: String },

    #[error("IO error")]
    IoError(#[from] std::io::Error),

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    HttpStatus {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("fetch {what}: {source}")]
    Fetch {
        what: &'static str,
        #[source]
        source: Box<ExporterError>,
    },

    #[error("Invalid MMSI: {0}")]
    InvalidMmsi(String),

    #[error("no positions found for configured icebreakers")]
    NoPositions,
}

impl ExporterError {
    /// Tag an error with the payload it happened on
    pub fn fetching(what: &'static str) -> impl FnOnce(ExporterError) -> ExporterError {
        move |source| ExporterError::Fetch {
            what,
            source: Box::new(source),
        }
    }
}
