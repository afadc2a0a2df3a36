//! WolfCDN Error Types

use thiserror::Error;

/// Result type alias for WolfCDN operations
pub type Result<T> = std::result::Result<T, Error>;

/// WolfCDN error types
///
/// These cover startup and process-level failures. Per-request failures
/// never surface as `Error`; the dispatcher turns them into envelopes.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Configuration serialization error: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    #[error("Invalid .env file: {0}")]
    DotEnv(#[from] dotenvy::Error),

    // Credential errors
    #[error("Invalid user entry {entry:?}: {reason}")]
    InvalidUserEntry { entry: String, reason: String },

    // Storage errors
    #[error("No disk found for content root {0}")]
    DiskNotFound(String),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Network errors
    #[error("Network error: {0}")]
    Network(String),
}

impl Error {
    /// Check if this error came from user-supplied configuration
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Error::Config(_)
                | Error::ConfigParse(_)
                | Error::DotEnv(_)
                | Error::InvalidUserEntry { .. }
        )
    }
}
