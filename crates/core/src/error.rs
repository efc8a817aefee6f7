//! Error types for ud-core
//!
//! Provides a unified error type that can be converted to appropriate exit codes.

use thiserror::Error;

/// Result type alias for ud-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for transfer operations
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid path format
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Argument outside the accepted values
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// URL parsing error
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Authentication error
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Local file, remote object or prefix does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Storage backend failure (network or server side)
    #[error("Remote error: {0}")]
    Network(String),
}

impl Error {
    /// Get the appropriate exit code for this error
    pub const fn exit_code(&self) -> i32 {
        match self {
            Error::InvalidPath(_) | Error::InvalidArgument(_) => 2, // UsageError
            Error::Config(_) | Error::TomlParse(_) | Error::InvalidUrl(_) => 2,
            Error::Network(_) => 3, // NetworkError
            Error::Auth(_) => 4,    // AuthError
            Error::NotFound(_) => 5,
            _ => 1,
        }
    }
}
