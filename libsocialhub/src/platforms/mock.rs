//! Mock publisher for testing
//!
//! A configurable publisher that can succeed, fail, stall or panic. It lets
//! integration tests exercise the orchestrator without platform credentials
//! or network access.

use async_trait::async_trait;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::time::sleep;

use crate::error::PlatformError;
use crate::platforms::Publisher;
use crate::types::{Message, PlatformId};

/// What a mock publisher does once its delay has elapsed
#[derive(Debug, Clone)]
pub enum MockOutcome {
    /// Succeed; `None` generates a fresh URL per call
    Succeed(Option<String>),
    /// Fail with the given error
    Fail(PlatformError),
    /// Panic with the given message
    Panic(String),
}

/// Configuration for mock publisher behavior
#[derive(Debug, Clone)]
pub struct MockConfig {
    pub platform: PlatformId,

    pub outcome: MockOutcome,

    /// Delay before completing (simulates network latency)
    pub delay: Duration,

    /// Number of times post has been called
    pub post_call_count: Arc<Mutex<usize>>,

    /// Messages that have been posted (for verification)
    pub posted_content: Arc<Mutex<Vec<String>>>,
}

impl MockConfig {
    pub fn new(platform: PlatformId) -> Self {
        Self {
            platform,
            outcome: MockOutcome::Succeed(None),
            delay: Duration::ZERO,
            post_call_count: Arc::new(Mutex::new(0)),
            posted_content: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

/// Mock publisher for testing
pub struct MockPublisher {
    config: MockConfig,
}

impl MockPublisher {
    pub fn new(config: MockConfig) -> Self {
        Self { config }
    }

    /// A publisher that always succeeds
    pub fn success(platform: PlatformId) -> Self {
        Self::new(MockConfig::new(platform))
    }

    /// A publisher that always fails with `error`
    pub fn failing(platform: PlatformId, error: PlatformError) -> Self {
        let mut config = MockConfig::new(platform);
        config.outcome = MockOutcome::Fail(error);
        Self::new(config)
    }

    /// A publisher whose task panics
    pub fn panicking(platform: PlatformId, message: &str) -> Self {
        let mut config = MockConfig::new(platform);
        config.outcome = MockOutcome::Panic(message.to_string());
        Self::new(config)
    }

    /// Succeed with a fixed URL, or with none at all
    pub fn with_url(mut self, url: Option<&str>) -> Self {
        self.config.outcome = MockOutcome::Succeed(url.map(str::to_string));
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.config.delay = delay;
        self
    }

    pub fn post_count(&self) -> usize {
        *self
            .config
            .post_call_count
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn posted_content(&self) -> Vec<String> {
        self.config
            .posted_content
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Shared call counter, readable after the publisher has been moved
    pub fn call_counter(&self) -> Arc<Mutex<usize>> {
        Arc::clone(&self.config.post_call_count)
    }

    /// Shared record of posted messages
    pub fn content_log(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.config.posted_content)
    }
}

#[async_trait]
impl Publisher for MockPublisher {
    fn platform(&self) -> PlatformId {
        self.config.platform
    }

    async fn post(&self, message: &Message) -> Result<Option<String>, PlatformError> {
        *self
            .config
            .post_call_count
            .lock()
            .unwrap_or_else(PoisonError::into_inner) += 1;

        if !self.config.delay.is_zero() {
            sleep(self.config.delay).await;
        }

        match &self.config.outcome {
            MockOutcome::Succeed(url) => {
                self.config
                    .posted_content
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(message.as_str().to_string());

                let url = url.clone().unwrap_or_else(|| {
                    format!(
                        "https://mock.{}.invalid/post/{}",
                        self.config.platform,
                        uuid::Uuid::new_v4()
                    )
                });
                Ok(Some(url))
            }
            MockOutcome::Fail(error) => Err(error.clone()),
            MockOutcome::Panic(message) => panic!("{}", message),
        }
    }
}
