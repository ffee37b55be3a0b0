//! Error types for the CLI runtime.

use std::io;

use camino::Utf8PathBuf;
use thiserror::Error;

use shutter_config::{ConfigError, SocketParseError};
use shutter_session::SessionError;

use crate::telemetry::TelemetryError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to load configuration: {0}")]
    LoadConfiguration(#[from] ConfigError),
    #[error("invalid endpoint '{value}': {source}")]
    InvalidEndpoint {
        value: String,
        #[source]
        source: SocketParseError,
    },
    #[error("failed to initialise telemetry: {0}")]
    Telemetry(#[from] TelemetryError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("an output surface needs width, height, and format together")]
    PartialSurface,
    #[error("failed to create output directory '{path}': {source}")]
    CreateOutputDir {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write '{path}': {source}")]
    WriteFile {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to serialise output: {0}")]
    SerialiseOutput(serde_json::Error),
    #[error("failed to render output: {0}")]
    RenderOutput(io::Error),
}
