//! Shared configuration for the shutter host tooling.
//!
//! The session library and the CLI both need to agree on where the device's
//! forwarded control socket lives, how long a single socket read may block,
//! and how telemetry is rendered. This crate owns those knobs, their
//! defaults, and the environment-variable overrides that sit beneath any
//! command-line flags.

mod defaults;
mod logging;
mod socket;

use std::env;
use std::num::ParseIntError;
use std::time::Duration;

use thiserror::Error;

pub use defaults::{
    DEFAULT_IO_TIMEOUT_SECS, DEFAULT_LOG_FILTER, DEFAULT_TCP_HOST, DEFAULT_TCP_PORT,
    default_endpoint, default_io_timeout,
};
pub use logging::{LogFormat, LogFormatParseError};
pub use socket::{SocketEndpoint, SocketParseError};

/// Environment variable naming the device endpoint (`tcp://` or `unix://`).
pub const ENV_ENDPOINT: &str = "SHUTTER_ENDPOINT";
/// Environment variable overriding the per-read socket timeout in seconds.
pub const ENV_TIMEOUT_SECS: &str = "SHUTTER_TIMEOUT_SECS";
/// Environment variable overriding the tracing filter expression.
pub const ENV_LOG_FILTER: &str = "SHUTTER_LOG_FILTER";
/// Environment variable overriding the log output format.
pub const ENV_LOG_FORMAT: &str = "SHUTTER_LOG_FORMAT";

/// Resolved configuration shared by the session library and the CLI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Endpoint of the device's forwarded control socket.
    pub endpoint: SocketEndpoint,
    /// Timeout applied to every individual socket read and write.
    pub io_timeout: Duration,
    /// Tracing filter expression (`info`, `shutter=debug`, ...).
    pub log_filter: String,
    /// Rendering format for log output.
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            io_timeout: default_io_timeout(),
            log_filter: DEFAULT_LOG_FILTER.to_owned(),
            log_format: LogFormat::default(),
        }
    }
}

impl Config {
    /// Builds a configuration from defaults plus `SHUTTER_*` environment
    /// overrides.
    ///
    /// Variables that are unset are left at their defaults. Command-line
    /// flags are expected to be applied on top of the returned value by the
    /// caller.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a variable is present but cannot be
    /// parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(value) = read_env(ENV_ENDPOINT) {
            config.endpoint = value
                .parse()
                .map_err(|source| ConfigError::InvalidEndpoint { value, source })?;
        }
        if let Some(value) = read_env(ENV_TIMEOUT_SECS) {
            let secs: u64 = value
                .parse()
                .map_err(|source| ConfigError::InvalidTimeout { value, source })?;
            config.io_timeout = Duration::from_secs(secs);
        }
        if let Some(value) = read_env(ENV_LOG_FILTER) {
            config.log_filter = value;
        }
        if let Some(value) = read_env(ENV_LOG_FORMAT) {
            config.log_format = value
                .parse()
                .map_err(|source| ConfigError::InvalidLogFormat { value, source })?;
        }
        Ok(config)
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.is_empty())
}

/// Errors raised while resolving configuration from the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The endpoint variable did not parse as a socket URL.
    #[error("invalid endpoint '{value}': {source}")]
    InvalidEndpoint {
        value: String,
        #[source]
        source: SocketParseError,
    },
    /// The timeout variable was not a whole number of seconds.
    #[error("invalid timeout '{value}': {source}")]
    InvalidTimeout {
        value: String,
        #[source]
        source: ParseIntError,
    },
    /// The log format variable named an unknown format.
    #[error("invalid log format '{value}': {source}")]
    InvalidLogFormat {
        value: String,
        #[source]
        source: LogFormatParseError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_targets_forwarded_port() {
        let config = Config::default();
        assert_eq!(
            config.endpoint,
            SocketEndpoint::tcp(DEFAULT_TCP_HOST, DEFAULT_TCP_PORT)
        );
        assert_eq!(config.io_timeout, Duration::from_secs(10));
        assert_eq!(config.log_filter, "info");
    }
}
