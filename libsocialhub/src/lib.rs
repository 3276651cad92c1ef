//! SocialHub - publish one message to Bluesky, X and Threads at once
//!
//! This library provides the publish orchestrator, the platform publishers
//! and the credential store they share. The `hub-post` and `hub-creds`
//! binaries are thin front ends over [`service::SocialHub`].

pub mod config;
pub mod credentials;
pub mod error;
pub mod logging;
pub mod platforms;
pub mod poster;
pub mod service;
pub mod types;

// Re-export commonly used types
pub use config::Config;
pub use credentials::{
    CredentialConfig, CredentialManager, CredentialStore, PlatformCredentials, StorageBackend,
};
pub use error::{SocialHubError, Result};
pub use service::SocialHub;
pub use types::{exit_code_for, Message, PlatformId, PublishRequest, PublishResult};
