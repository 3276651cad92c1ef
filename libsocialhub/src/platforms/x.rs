//! X (Twitter) publisher, API v2 with OAuth 1.0a user context

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

use crate::credentials::CredentialStore;
use crate::error::PlatformError;
use crate::platforms::{check_response, endpoint, load_credentials, oauth, read_json, Publisher};
use crate::types::{Message, PlatformId};

pub const DEFAULT_API_URL: &str = "https://api.twitter.com";

#[derive(Debug, Deserialize)]
struct CreateTweetResponse {
    data: TweetData,
}

#[derive(Debug, Deserialize)]
struct TweetData {
    id: String,
}

pub struct XPublisher {
    client: reqwest::Client,
    api_url: String,
    store: Arc<dyn CredentialStore>,
}

impl XPublisher {
    pub fn new(client: reqwest::Client, api_url: &str, store: Arc<dyn CredentialStore>) -> Self {
        Self {
            client,
            api_url: api_url.to_string(),
            store,
        }
    }
}

pub fn post_url(tweet_id: &str) -> String {
    format!("https://x.com/i/web/status/{}", tweet_id)
}

#[async_trait]
impl Publisher for XPublisher {
    fn platform(&self) -> PlatformId {
        PlatformId::X
    }

    async fn post(&self, message: &Message) -> Result<Option<String>, PlatformError> {
        let credentials = load_credentials(&self.store).await?.x()?;

        let url = endpoint(&self.api_url, "2/tweets");
        let authorization = oauth::authorization_header("POST", &url, &credentials);

        tracing::debug!("Posting to X: {} characters", message.as_str().chars().count());

        let response = self
            .client
            .post(&url)
            .header(reqwest::header::AUTHORIZATION, authorization)
            .json(&serde_json::json!({ "text": message.as_str() }))
            .send()
            .await?;

        let response = check_response(PlatformId::X, "create tweet", response).await?;
        let tweet: CreateTweetResponse = read_json(PlatformId::X, "create tweet", response).await?;

        tracing::debug!("Posted to X: {}", tweet.data.id);
        Ok(Some(post_url(&tweet.data.id)))
    }
}
