//! Multi-platform publish orchestration
//!
//! Dispatches one task per selected platform onto a `JoinSet`, waits for all
//! of them, and returns the results in canonical platform order. A failing
//! platform never affects the others.

use std::any::Any;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::{self, JoinError, JoinSet};
use tracing::{error, info, warn};

use crate::error::Result;
use crate::platforms::{publish, Publishers};
use crate::types::{PlatformId, PublishRequest, PublishResult};

pub struct MultiPlatformPoster {
    publishers: Publishers,
    timeout: Duration,
}

impl MultiPlatformPoster {
    /// # Arguments
    ///
    /// * `publishers` - One publisher per platform
    /// * `timeout` - Upper bound on each platform's publish call
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use std::sync::Arc;
    /// use libsocialhub::config::Config;
    /// use libsocialhub::credentials::{CredentialManager, CredentialStore};
    /// use libsocialhub::platforms::Publishers;
    /// use libsocialhub::poster::MultiPlatformPoster;
    ///
    /// # fn example() -> libsocialhub::Result<()> {
    /// let config = Config::load()?;
    /// let store: Arc<dyn CredentialStore> =
    ///     Arc::new(CredentialManager::new(config.credentials.clone())?);
    /// let publishers = Publishers::from_config(&config, store)?;
    /// let poster = MultiPlatformPoster::new(publishers, config.publish.timeout());
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(publishers: Publishers, timeout: Duration) -> Self {
        Self {
            publishers,
            timeout,
        }
    }

    /// Validate the input, then publish to every selected platform
    ///
    /// # Errors
    ///
    /// Returns `SocialHubError::InvalidInput` for an empty (or whitespace-only)
    /// message or an empty platform selection. Nothing is dispatched in that
    /// case. Per-platform failures are reported in the returned results, never
    /// as an error.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use libsocialhub::poster::MultiPlatformPoster;
    /// use libsocialhub::PlatformId;
    ///
    /// # async fn example(poster: MultiPlatformPoster) -> libsocialhub::Result<()> {
    /// let results = poster
    ///     .publish_selected("Hello, everyone!", [PlatformId::Bluesky, PlatformId::X])
    ///     .await?;
    /// for result in results {
    ///     match (result.success, result.url, result.error) {
    ///         (true, Some(url), _) => println!("{}: {}", result.platform, url),
    ///         (true, None, _) => println!("{}: published", result.platform),
    ///         (false, _, error) => {
    ///             eprintln!("{}: {}", result.platform, error.unwrap_or_default())
    ///         }
    ///     }
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub async fn publish_selected(
        &self,
        message: &str,
        platforms: impl IntoIterator<Item = PlatformId>,
    ) -> Result<Vec<PublishResult>> {
        let request = PublishRequest::new(message, platforms)?;
        Ok(self.publish(&request).await)
    }

    /// Publish a validated request
    ///
    /// Returns exactly one result per requested platform, ordered Bluesky, X,
    /// Threads. If dispatch itself breaks down, a single aggregate failure is
    /// returned instead.
    pub async fn publish(&self, request: &PublishRequest) -> Vec<PublishResult> {
        let message = Arc::new(request.message.clone());
        let mut tasks = JoinSet::new();
        let mut task_platforms = HashMap::with_capacity(request.platforms.len());

        for &platform in &request.platforms {
            let publisher = self.publishers.get(platform);
            let message = Arc::clone(&message);
            let timeout = self.timeout;

            info!(platform = %platform, "Dispatching publish");
            let handle =
                tasks.spawn(async move { publish(publisher.as_ref(), &message, timeout).await });
            task_platforms.insert(handle.id(), platform);
        }

        let mut outcomes = Vec::with_capacity(request.platforms.len());
        while let Some(joined) = tasks.join_next_with_id().await {
            outcomes.push(joined);
        }

        collect_results(&request.platforms, task_platforms, outcomes)
    }
}

/// What `JoinSet::join_next_with_id` yields for one publish task
type JoinOutcome = std::result::Result<(task::Id, PublishResult), JoinError>;

/// Fold finished publish tasks into one result per requested platform
///
/// Results come back in canonical platform order. A cancelled task, a task
/// id that maps to no platform, or a platform left without a result turns
/// the whole call into a single aggregate failure.
fn collect_results(
    requested: &BTreeSet<PlatformId>,
    mut task_platforms: HashMap<task::Id, PlatformId>,
    outcomes: impl IntoIterator<Item = JoinOutcome>,
) -> Vec<PublishResult> {
    let mut results: BTreeMap<PlatformId, PublishResult> = BTreeMap::new();

    for joined in outcomes {
        let (platform, result) = match joined {
            Ok((id, result)) => match task_platforms.remove(&id) {
                Some(platform) => (platform, result),
                None => return dispatch_failure("a publish task finished with an unknown id"),
            },
            Err(e) if e.is_panic() => {
                let Some(platform) = task_platforms.remove(&e.id()) else {
                    return dispatch_failure("a publish task panicked with an unknown id");
                };
                let reason = format!("publish task panicked: {}", panic_message(e.into_panic()));
                warn!(platform = %platform, error = %reason, "Publish task panicked");
                (platform, PublishResult::failure(platform, reason))
            }
            Err(e) => return dispatch_failure(&format!("publish task was cancelled: {}", e)),
        };

        results.insert(platform, result);
    }

    let covered =
        results.len() == requested.len() && requested.iter().all(|p| results.contains_key(p));
    if !covered {
        return dispatch_failure("publish results did not cover every selected platform");
    }

    let succeeded = results.values().filter(|r| r.success).count();
    info!("Published to {}/{} platform(s)", succeeded, requested.len());

    results.into_values().collect()
}

fn dispatch_failure(reason: &str) -> Vec<PublishResult> {
    error!("Publish dispatch failed: {}", reason);
    vec![PublishResult::aggregate_failure(reason)]
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
