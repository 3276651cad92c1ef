//! Threads publisher (Meta Graph API)
//!
//! Publishing is a two-step flow: create a TEXT media container, then publish
//! it. The permalink is looked up afterwards; if that lookup fails the post
//! still counts as published, just without a URL.

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

use crate::credentials::{CredentialStore, ThreadsCredentials};
use crate::error::PlatformError;
use crate::platforms::{check_response, endpoint, load_credentials, read_json, Publisher};
use crate::types::{Message, PlatformId};

pub const DEFAULT_GRAPH_URL: &str = "https://graph.threads.net/v1.0";

#[derive(Debug, Deserialize)]
struct IdResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct PermalinkResponse {
    #[serde(default)]
    permalink: Option<String>,
}

pub struct ThreadsPublisher {
    client: reqwest::Client,
    graph_url: String,
    store: Arc<dyn CredentialStore>,
}

impl ThreadsPublisher {
    pub fn new(client: reqwest::Client, graph_url: &str, store: Arc<dyn CredentialStore>) -> Self {
        Self {
            client,
            graph_url: graph_url.to_string(),
            store,
        }
    }

    async fn create_container(
        &self,
        credentials: &ThreadsCredentials,
        text: &str,
    ) -> Result<String, PlatformError> {
        let response = self
            .client
            .post(endpoint(&self.graph_url, &format!("{}/threads", credentials.user_id)))
            .query(&[
                ("media_type", "TEXT"),
                ("text", text),
                ("access_token", credentials.access_token.as_str()),
            ])
            .send()
            .await?;

        let response = check_response(PlatformId::Threads, "create container", response).await?;
        let container: IdResponse =
            read_json(PlatformId::Threads, "create container", response).await?;

        Ok(container.id)
    }

    async fn publish_container(
        &self,
        credentials: &ThreadsCredentials,
        creation_id: &str,
    ) -> Result<String, PlatformError> {
        let response = self
            .client
            .post(endpoint(
                &self.graph_url,
                &format!("{}/threads_publish", credentials.user_id),
            ))
            .query(&[
                ("creation_id", creation_id),
                ("access_token", credentials.access_token.as_str()),
            ])
            .send()
            .await?;

        let response = check_response(PlatformId::Threads, "publish", response).await?;
        let media: IdResponse = read_json(PlatformId::Threads, "publish", response).await?;

        Ok(media.id)
    }

    async fn permalink(
        &self,
        credentials: &ThreadsCredentials,
        media_id: &str,
    ) -> Result<Option<String>, PlatformError> {
        let response = self
            .client
            .get(endpoint(&self.graph_url, media_id))
            .query(&[
                ("fields", "permalink"),
                ("access_token", credentials.access_token.as_str()),
            ])
            .send()
            .await?;

        let response = check_response(PlatformId::Threads, "permalink lookup", response).await?;
        let lookup: PermalinkResponse =
            read_json(PlatformId::Threads, "permalink lookup", response).await?;

        Ok(lookup.permalink.filter(|url| !url.is_empty()))
    }
}

#[async_trait]
impl Publisher for ThreadsPublisher {
    fn platform(&self) -> PlatformId {
        PlatformId::Threads
    }

    async fn post(&self, message: &Message) -> Result<Option<String>, PlatformError> {
        let credentials = load_credentials(&self.store).await?.threads()?;

        tracing::debug!("Posting to Threads: {} characters", message.as_str().chars().count());

        let creation_id = self.create_container(&credentials, message.as_str()).await?;
        let media_id = self.publish_container(&credentials, &creation_id).await?;
        tracing::debug!("Posted to Threads: {}", media_id);

        match self.permalink(&credentials, &media_id).await {
            Ok(url) => Ok(url),
            Err(e) => {
                tracing::warn!(
                    "Threads post {} published but permalink lookup failed: {}",
                    media_id,
                    e
                );
                Ok(None)
            }
        }
    }
}
