//! Core types for SocialHub

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::str::FromStr;

use crate::error::{PlatformError, ValidationError};

/// Label used on the single result returned when the orchestration layer
/// itself fails, as opposed to an individual platform.
pub const AGGREGATE_FAILURE_LABEL: &str = "Multiple";

/// Supported platforms
///
/// Variant order is the canonical result order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformId {
    Bluesky,
    X,
    Threads,
}

impl PlatformId {
    pub const ALL: [PlatformId; 3] = [PlatformId::Bluesky, PlatformId::X, PlatformId::Threads];

    /// Lowercase identifier used in config, CLI flags and results
    pub fn as_str(&self) -> &'static str {
        match self {
            PlatformId::Bluesky => "bluesky",
            PlatformId::X => "x",
            PlatformId::Threads => "threads",
        }
    }

    /// Human-facing name
    pub fn display_name(&self) -> &'static str {
        match self {
            PlatformId::Bluesky => "Bluesky",
            PlatformId::X => "X",
            PlatformId::Threads => "Threads",
        }
    }

    /// Parse a comma-separated platform list such as `"bluesky,x"`
    pub fn parse_list(input: &str) -> Result<BTreeSet<PlatformId>, ValidationError> {
        input
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::parse)
            .collect()
    }
}

impl FromStr for PlatformId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "bluesky" | "bsky" => Ok(PlatformId::Bluesky),
            "x" | "twitter" => Ok(PlatformId::X),
            "threads" => Ok(PlatformId::Threads),
            _ => Err(ValidationError::UnknownPlatform(s.to_string())),
        }
    }
}

impl std::fmt::Display for PlatformId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Text to publish
///
/// Guaranteed non-empty after trimming. The original text (including any
/// surrounding whitespace) is what gets published.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message(String);

impl Message {
    pub fn new(text: impl Into<String>) -> Result<Self, ValidationError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(ValidationError::EmptyMessage);
        }
        Ok(Self(text))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Message {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A validated publish request: one message, a non-empty set of platforms
#[derive(Debug, Clone)]
pub struct PublishRequest {
    pub message: Message,
    pub platforms: BTreeSet<PlatformId>,
}

impl PublishRequest {
    pub fn new(
        message: &str,
        platforms: impl IntoIterator<Item = PlatformId>,
    ) -> Result<Self, ValidationError> {
        let message = Message::new(message)?;
        let platforms: BTreeSet<PlatformId> = platforms.into_iter().collect();
        if platforms.is_empty() {
            return Err(ValidationError::NoPlatforms);
        }
        Ok(Self { message, platforms })
    }
}

/// Outcome of publishing to a single platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishResult {
    /// Platform id (e.g. "bluesky") or the aggregate marker
    pub platform: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Failed because credentials were missing or rejected
    #[serde(skip)]
    pub credential_failure: bool,
}

impl PublishResult {
    pub fn success(platform: PlatformId, url: Option<String>) -> Self {
        Self {
            platform: platform.as_str().to_string(),
            success: true,
            url,
            error: None,
            credential_failure: false,
        }
    }

    pub fn failure(platform: PlatformId, error: impl Into<String>) -> Self {
        Self {
            platform: platform.as_str().to_string(),
            success: false,
            url: None,
            error: Some(non_empty_reason(error.into())),
            credential_failure: false,
        }
    }

    /// Failure result carrying the error's classification
    pub fn from_error(platform: PlatformId, error: &PlatformError) -> Self {
        let mut result = Self::failure(platform, error.to_string());
        result.credential_failure = matches!(
            error,
            PlatformError::Credentials(_) | PlatformError::Authentication(_)
        );
        result
    }

    /// Single entry reported when dispatch itself failed
    pub fn aggregate_failure(error: impl Into<String>) -> Self {
        Self {
            platform: AGGREGATE_FAILURE_LABEL.to_string(),
            success: false,
            url: None,
            error: Some(non_empty_reason(error.into())),
            credential_failure: false,
        }
    }

    /// Whether this is the single entry reported when dispatch itself failed
    pub fn is_aggregate(&self) -> bool {
        self.platform == AGGREGATE_FAILURE_LABEL
    }
}

/// Process exit status summarizing a publish
///
/// 0 when every platform succeeded, 2 when every platform failed on
/// credentials or authentication, 1 otherwise.
pub fn exit_code_for(results: &[PublishResult]) -> i32 {
    if !results.is_empty() && results.iter().all(|r| r.success) {
        0
    } else if !results.is_empty() && results.iter().all(|r| r.credential_failure) {
        2
    } else {
        1
    }
}

fn non_empty_reason(reason: String) -> String {
    if reason.trim().is_empty() {
        "Unknown error".to_string()
    } else {
        reason
    }
}
