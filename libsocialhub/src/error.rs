//! Error types for SocialHub

use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SocialHubError>;

#[derive(Error, Debug)]
pub enum SocialHubError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Credential storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    #[error("Invalid input: {0}")]
    InvalidInput(#[from] ValidationError),
}

impl SocialHubError {
    /// Returns the appropriate exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            SocialHubError::InvalidInput(_) => 3,
            SocialHubError::Platform(PlatformError::Authentication(_))
            | SocialHubError::Platform(PlatformError::Credentials(_)) => 2,
            SocialHubError::Platform(_) => 1,
            SocialHubError::Config(_) => 1,
            SocialHubError::Store(_) => 1,
        }
    }
}

/// Rejected before anything is dispatched to a platform
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Message cannot be empty")]
    EmptyMessage,

    #[error("At least one platform must be selected")]
    NoPlatforms,

    #[error("Unknown platform '{0}'. Valid platforms: bluesky, x, threads")]
    UnknownPlatform(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Credential persistence failures, surfaced to the setup flow
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("No credentials found: {0}")]
    NotFound(String),

    #[error("OS keyring unavailable: {0}")]
    KeyringUnavailable(String),

    #[error("Keyring operation failed: {0}")]
    Keyring(String),

    #[error("Encryption failed: {0}")]
    Encryption(String),

    #[error("Decryption failed: wrong master password or corrupted file")]
    DecryptionFailed,

    #[error("Master password not set")]
    MasterPasswordNotSet,

    #[error("Master password must be at least 8 characters")]
    WeakPassword,

    #[error("No secure credential storage available")]
    NoStoreAvailable,

    #[error("Credential record is malformed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Publisher-level failures; always folded into a per-platform result
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlatformError {
    #[error("Missing/invalid credentials: {0}")]
    Credentials(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Content rejected by platform: {0}")]
    Validation(String),

    #[error("Posting failed: {0}")]
    Posting(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Unexpected response from platform: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for PlatformError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            PlatformError::Network(format!("request timed out: {}", error))
        } else if error.is_decode() {
            PlatformError::InvalidResponse(error.to_string())
        } else {
            PlatformError::Network(error.to_string())
        }
    }
}
