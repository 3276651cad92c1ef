//! Platform publishers
//!
//! Each supported platform gets one [`Publisher`] implementation wrapping its
//! HTTP API. Publishers load credentials from the injected
//! [`CredentialStore`] on every call and never cache them.
//!
//! # Examples
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use libsocialhub::credentials::MemoryStore;
//! use libsocialhub::platforms::{publish, Publishers};
//! use libsocialhub::{Config, Message, PlatformId};
//!
//! # async fn example() -> libsocialhub::Result<()> {
//! let store = Arc::new(MemoryStore::new());
//! let publishers = Publishers::from_config(&Config::default(), store)?;
//!
//! let message = Message::new("Hello from SocialHub")?;
//! let result = publish(
//!     publishers.get(PlatformId::Bluesky).as_ref(),
//!     &message,
//!     Duration::from_secs(30),
//! )
//! .await;
//! println!("{:?}", result);
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use reqwest::StatusCode;
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::credentials::{CredentialStore, PlatformCredentials};
use crate::error::{PlatformError, StoreError};
use crate::types::{Message, PlatformId, PublishResult};

pub mod bluesky;
pub mod oauth;
pub mod threads;
pub mod x;

// Mock publisher is available for all builds (not just tests) to support integration tests
pub mod mock;

/// Longest slice of a platform's error body carried into a failure reason
const MAX_ERROR_BODY_CHARS: usize = 500;

/// Uniform contract over one platform's "create post" capability
#[async_trait]
pub trait Publisher: Send + Sync {
    /// The platform this publisher posts to
    fn platform(&self) -> PlatformId;

    /// Publish `message` once, with no retry
    ///
    /// Returns the canonical post URL when the platform provides one.
    ///
    /// # Errors
    ///
    /// - `PlatformError::Credentials` if the stored record lacks this
    ///   platform's fields (no network call is made)
    /// - `PlatformError::Authentication` / `Validation` / `RateLimit` /
    ///   `Posting` when the platform rejects the request
    /// - `PlatformError::Network` / `InvalidResponse` for transport and
    ///   decoding failures
    async fn post(&self, message: &Message) -> Result<Option<String>, PlatformError>;
}

/// Publish through `publisher`, converting every outcome into a result value
///
/// The call is bounded by `timeout`; expiry yields a failure result.
pub async fn publish(
    publisher: &dyn Publisher,
    message: &Message,
    timeout: Duration,
) -> PublishResult {
    let platform = publisher.platform();

    match tokio::time::timeout(timeout, publisher.post(message)).await {
        Ok(Ok(url)) => {
            tracing::info!(platform = %platform, url = ?url, "Published");
            PublishResult::success(platform, url)
        }
        Ok(Err(e)) => {
            tracing::warn!(platform = %platform, error = %e, "Publish failed");
            PublishResult::from_error(platform, &e)
        }
        Err(_) => {
            let error = PlatformError::Timeout(timeout);
            tracing::warn!(platform = %platform, error = %error, "Publish timed out");
            PublishResult::from_error(platform, &error)
        }
    }
}

/// Closed table of publishers, one per [`PlatformId`]
#[derive(Clone)]
pub struct Publishers {
    bluesky: Arc<dyn Publisher>,
    x: Arc<dyn Publisher>,
    threads: Arc<dyn Publisher>,
}

impl Publishers {
    pub fn new(
        bluesky: Arc<dyn Publisher>,
        x: Arc<dyn Publisher>,
        threads: Arc<dyn Publisher>,
    ) -> Self {
        Self {
            bluesky,
            x,
            threads,
        }
    }

    /// Build the real HTTP publishers, sharing one client
    pub fn from_config(
        config: &Config,
        store: Arc<dyn CredentialStore>,
    ) -> Result<Self, PlatformError> {
        let client = http_client(config.publish.timeout())?;

        Ok(Self::new(
            Arc::new(bluesky::BlueskyPublisher::new(
                client.clone(),
                &config.bluesky.pds_url,
                Arc::clone(&store),
            )),
            Arc::new(x::XPublisher::new(
                client.clone(),
                &config.x.api_url,
                Arc::clone(&store),
            )),
            Arc::new(threads::ThreadsPublisher::new(
                client,
                &config.threads.graph_url,
                store,
            )),
        ))
    }

    pub fn get(&self, platform: PlatformId) -> Arc<dyn Publisher> {
        match platform {
            PlatformId::Bluesky => Arc::clone(&self.bluesky),
            PlatformId::X => Arc::clone(&self.x),
            PlatformId::Threads => Arc::clone(&self.threads),
        }
    }
}

/// HTTP client shared by the publishers
pub fn http_client(timeout: Duration) -> Result<reqwest::Client, PlatformError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("socialhub/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| PlatformError::Network(format!("Failed to build HTTP client: {}", e)))
}

/// Read the credential record on the blocking pool
///
/// OS keyrings block, so the store is never called on a runtime worker.
pub(crate) async fn load_credentials(
    store: &Arc<dyn CredentialStore>,
) -> Result<PlatformCredentials, PlatformError> {
    let store = Arc::clone(store);

    tokio::task::spawn_blocking(move || store.load())
        .await
        .map_err(|e| PlatformError::Credentials(format!("credential lookup aborted: {}", e)))?
        .map_err(|e| match e {
            StoreError::NotFound(_) => PlatformError::Credentials(
                "no credentials saved; run `hub-creds set` first".to_string(),
            ),
            other => PlatformError::Credentials(other.to_string()),
        })
}

/// Map a non-success HTTP status to a platform error
///
/// The response body is kept in the reason so the user sees what the
/// platform said.
pub fn classify_status(
    platform: PlatformId,
    context: &str,
    status: StatusCode,
    body: &str,
) -> PlatformError {
    let body: String = body.trim().chars().take(MAX_ERROR_BODY_CHARS).collect();
    let detail = format!(
        "{} {} returned {}: {}",
        platform.display_name(),
        context,
        status,
        body
    );

    match status.as_u16() {
        401 | 403 => PlatformError::Authentication(detail),
        400 | 422 => PlatformError::Validation(detail),
        429 => PlatformError::RateLimit(detail),
        _ => PlatformError::Posting(detail),
    }
}

/// Pass a successful response through, or classify the failure
pub(crate) async fn check_response(
    platform: PlatformId,
    context: &str,
    response: reqwest::Response,
) -> Result<reqwest::Response, PlatformError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(classify_status(platform, context, status, &body))
}

/// Decode a JSON response body, tagging failures with the platform
pub(crate) async fn read_json<T: serde::de::DeserializeOwned>(
    platform: PlatformId,
    context: &str,
    response: reqwest::Response,
) -> Result<T, PlatformError> {
    response.json::<T>().await.map_err(|e| {
        PlatformError::InvalidResponse(format!(
            "{} {} response could not be decoded: {}",
            platform.display_name(),
            context,
            e
        ))
    })
}

/// Join a configured base URL and a path without doubling slashes
pub(crate) fn endpoint(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
