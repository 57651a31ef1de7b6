//! CLI error types.

use std::fmt;

use geoalarm::alarm::SessionError;
use geoalarm::config::ConfigError;
use geoalarm::logging::LoggingError;
use geoalarm::session::ControllerError;

/// Errors surfaced to the user by the `geoalarm` binary.
#[derive(Debug)]
pub enum CliError {
    /// Configuration problem described in a message.
    Config(String),

    /// Failed to load or save the configuration file.
    ConfigFile(ConfigError),

    /// A track file could not be read or parsed.
    Track(String),

    /// The session controller refused an operation.
    Controller(ControllerError),

    /// Failed to install the logging subscriber.
    Logging(LoggingError),

    /// Failed to create the Tokio runtime.
    Runtime(String),

    /// Failed to install the Ctrl-C handler.
    Signal(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::ConfigFile(e) => write!(f, "Configuration file error: {}", e),
            CliError::Track(msg) => write!(f, "Track error: {}", msg),
            CliError::Controller(e) => write!(f, "{}", e),
            CliError::Logging(e) => write!(f, "{}", e),
            CliError::Runtime(msg) => write!(f, "Failed to create Tokio runtime: {}", msg),
            CliError::Signal(msg) => write!(f, "Failed to set signal handler: {}", msg),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::ConfigFile(e) => Some(e),
            CliError::Controller(e) => Some(e),
            CliError::Logging(e) => Some(e),
            CliError::Config(_)
            | CliError::Track(_)
            | CliError::Runtime(_)
            | CliError::Signal(_) => None,
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::ConfigFile(e)
    }
}

impl From<ControllerError> for CliError {
    fn from(e: ControllerError) -> Self {
        CliError::Controller(e)
    }
}

impl From<SessionError> for CliError {
    fn from(e: SessionError) -> Self {
        CliError::Controller(ControllerError::Session(e))
    }
}

impl From<LoggingError> for CliError {
    fn from(e: LoggingError) -> Self {
        CliError::Logging(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_cli_error_display() {
        let err = CliError::Track("line 3: invalid latitude".to_string());
        assert_eq!(err.to_string(), "Track error: line 3: invalid latitude");

        let err = CliError::Runtime("no threads".to_string());
        assert_eq!(
            err.to_string(),
            "Failed to create Tokio runtime: no threads"
        );
    }

    #[test]
    fn test_session_error_passes_through() {
        let err: CliError = SessionError::NoDestination.into();
        assert_eq!(err.to_string(), "No destination selected");
        assert!(err.source().is_some());
    }

    #[test]
    fn test_config_error_source() {
        let err: CliError = ConfigError::UnknownKey("alarm.nope".to_string()).into();
        assert!(err.to_string().contains("alarm.nope"));
        assert!(err.source().is_some());
    }
}
