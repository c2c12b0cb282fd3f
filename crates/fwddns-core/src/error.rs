//! Error types for fwddns
//!
//! Every failure of a sync run ends up as one of these variants. The binary
//! matches on them exactly once, at the process boundary.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for fwddns operations
pub type Result<T> = std::result::Result<T, Error>;

/// Broad failure category, used to pick the user-facing message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Missing or invalid settings / environment
    Config,
    /// Transport failure, or non-2xx from the IP discovery service
    Network,
    /// A response body was not the JSON we expected
    Parse,
    /// The firewall API rejected the request
    Api,
}

/// Core error type for fwddns
#[derive(Error, Debug)]
pub enum Error {
    /// One or more required environment variables are unset
    #[error("Missing required environment variables: {}", .0.join(", "))]
    MissingEnv(Vec<String>),

    /// The settings file does not exist
    #[error("Settings file not found: {}", .0.display())]
    SettingsNotFound(PathBuf),

    /// The settings file lacks a required key
    #[error("Missing key in settings file: {0}")]
    MissingSettingsKey(String),

    /// The settings file is not valid JSON or has a wrongly typed value
    #[error("Invalid settings file: {0}")]
    InvalidSettings(String),

    /// Any other configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Transport-level failure (or non-2xx from an unauthenticated endpoint)
    #[error("Network error: {message}")]
    Network {
        /// What went wrong
        message: String,
        /// HTTP status, if a response was received
        status: Option<u16>,
        /// Raw response body, if one was read
        body: Option<String>,
    },

    /// Malformed response body
    #[error("Parse error: {0}")]
    Parse(String),

    /// The remote API answered with a non-2xx status
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Contextual description of the rejection
        message: String,
        /// Raw response body
        body: String,
    },
}

impl Error {
    /// Create a generic configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid-settings error
    pub fn invalid_settings(msg: impl Into<String>) -> Self {
        Self::InvalidSettings(msg.into())
    }

    /// Create a transport error with no HTTP response attached
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network {
            message: msg.into(),
            status: None,
            body: None,
        }
    }

    /// Create a network error for an unexpected HTTP status
    pub fn http_status(status: u16, body: impl Into<String>) -> Self {
        Self::Network {
            message: format!("HTTP error: {}", status),
            status: Some(status),
            body: Some(body.into()),
        }
    }

    /// Create a parse error
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Create an API rejection error
    pub fn api(status: u16, message: impl Into<String>, body: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
            body: body.into(),
        }
    }

    /// Category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::MissingEnv(_)
            | Error::SettingsNotFound(_)
            | Error::MissingSettingsKey(_)
            | Error::InvalidSettings(_)
            | Error::Config(_) => ErrorKind::Config,
            Error::Network { .. } => ErrorKind::Network,
            Error::Parse(_) => ErrorKind::Parse,
            Error::Api { .. } => ErrorKind::Api,
        }
    }

    /// HTTP status code, when the error came from an HTTP response
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Network { status, .. } => *status,
            Error::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The single message printed to the operator for this failure
    pub fn user_message(&self) -> String {
        match self {
            Error::Network { .. } | Error::Api { .. } => format!("An error occurred: {}", self),
            Error::Parse(msg) => format!("Error decoding JSON response: {}", msg),
            Error::InvalidSettings(msg) => format!("Error reading settings file: {}", msg),
            Error::SettingsNotFound(path) => format!(
                "{} not found. Please make sure it exists or point FWDDNS_SETTINGS at it.",
                path.display()
            ),
            Error::MissingSettingsKey(key) => format!("Missing key in settings file: {}", key),
            Error::MissingEnv(_) | Error::Config(_) => format!("Environment error: {}", self),
        }
    }

    /// Response status and body, shown in debug mode when available
    pub fn diagnostics(&self) -> Option<String> {
        match self {
            Error::Network {
                status: Some(status),
                body,
                ..
            } => Some(format!(
                "Response status code: {}\nResponse content: {}",
                status,
                body.as_deref().unwrap_or_default()
            )),
            Error::Api { status, body, .. } => Some(format!(
                "Response status code: {}\nResponse content: {}",
                status, body
            )),
            _ => None,
        }
    }
}
