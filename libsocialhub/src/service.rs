//! Service facade for SocialHub
//!
//! `SocialHub` is the single entry point front ends call: publishing on one
//! side, the credential setup flow on the other. It owns the configuration,
//! the credential store and the orchestrator.
//!
//! # Example
//!
//! ```no_run
//! use libsocialhub::service::SocialHub;
//! use libsocialhub::PlatformId;
//!
//! # async fn example() -> libsocialhub::Result<()> {
//! let hub = SocialHub::new()?;
//!
//! if !hub.credentials_exist() {
//!     eprintln!("Run `hub-creds set` first");
//!     return Ok(());
//! }
//!
//! let results = hub
//!     .publish_selected("Hello from SocialHub!", [PlatformId::Bluesky, PlatformId::Threads])
//!     .await?;
//! println!("Published to {} platforms", results.iter().filter(|r| r.success).count());
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use crate::config::Config;
use crate::credentials::{CredentialManager, CredentialStore, PlatformCredentials};
use crate::error::Result;
use crate::platforms::Publishers;
use crate::poster::MultiPlatformPoster;
use crate::types::{PlatformId, PublishResult};

pub struct SocialHub {
    config: Arc<Config>,
    store: Arc<dyn CredentialStore>,
    poster: MultiPlatformPoster,
}

impl SocialHub {
    /// Create a service from the default configuration file
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be loaded or no credential
    /// backend is usable.
    pub fn new() -> Result<Self> {
        let config = Config::load()?;
        Self::from_config(config)
    }

    /// Create a service with a custom configuration
    ///
    /// The credential backend is picked from `config.credentials`; the
    /// master password falls back to `SOCIALHUB_MASTER_PASSWORD`.
    pub fn from_config(mut config: Config) -> Result<Self> {
        if config.credentials.master_password.is_none() {
            config.credentials.load_master_password_from_env();
        }

        let manager = CredentialManager::new(config.credentials.clone())?;
        Self::with_store(config, Arc::new(manager))
    }

    /// Create a service over an explicit credential store
    pub fn with_store(config: Config, store: Arc<dyn CredentialStore>) -> Result<Self> {
        let publishers = Publishers::from_config(&config, Arc::clone(&store))?;
        Ok(Self::with_publishers(config, store, publishers))
    }

    /// Create a service over explicit publishers (used by tests)
    pub fn with_publishers(
        config: Config,
        store: Arc<dyn CredentialStore>,
        publishers: Publishers,
    ) -> Self {
        let poster = MultiPlatformPoster::new(publishers, config.publish.timeout());

        Self {
            config: Arc::new(config),
            store,
            poster,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Name of the credential backend in use
    pub fn backend_name(&self) -> &str {
        self.store.backend_name()
    }

    /// Publish `message` to `platforms` concurrently
    ///
    /// See [`MultiPlatformPoster::publish_selected`].
    pub async fn publish_selected(
        &self,
        message: &str,
        platforms: impl IntoIterator<Item = PlatformId>,
    ) -> Result<Vec<PublishResult>> {
        self.poster.publish_selected(message, platforms).await
    }

    /// Publish to the platforms listed under `[defaults]` in the config
    pub async fn publish_default(&self, message: &str) -> Result<Vec<PublishResult>> {
        let platforms = self.config.defaults.platforms.clone();
        self.publish_selected(message, platforms).await
    }

    /// Persist the whole credential record, replacing any previous one
    pub fn save_credentials(&self, credentials: &PlatformCredentials) -> Result<()> {
        self.store.save(credentials)?;
        tracing::info!(
            backend = self.store.backend_name(),
            platforms = ?credentials.configured_platforms(),
            "Saved credentials"
        );
        Ok(())
    }

    /// Most recently saved credential record
    pub fn load_credentials(&self) -> Result<PlatformCredentials> {
        Ok(self.store.load()?)
    }

    /// Whether a credential record exists
    ///
    /// A store failure while checking reads as `false` (setup required).
    pub fn credentials_exist(&self) -> bool {
        match self.store.exists() {
            Ok(exists) => exists,
            Err(e) => {
                tracing::warn!("Could not check for saved credentials: {}", e);
                false
            }
        }
    }

    /// Remove the credential record
    pub fn delete_credentials(&self) -> Result<()> {
        self.store.delete()?;
        tracing::info!(backend = self.store.backend_name(), "Deleted credentials");
        Ok(())
    }
}
