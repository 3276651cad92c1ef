//! Bluesky publisher (AT Protocol XRPC over HTTPS)

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

use crate::credentials::{BlueskyCredentials, CredentialStore};
use crate::error::PlatformError;
use crate::platforms::{check_response, endpoint, load_credentials, read_json, Publisher};
use crate::types::{Message, PlatformId};

pub const DEFAULT_PDS_URL: &str = "https://bsky.social";

const POST_COLLECTION: &str = "app.bsky.feed.post";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Session {
    access_jwt: String,
    did: String,
    handle: String,
}

#[derive(Debug, Deserialize)]
struct CreateRecordResponse {
    uri: String,
}

pub struct BlueskyPublisher {
    client: reqwest::Client,
    pds_url: String,
    store: Arc<dyn CredentialStore>,
}

impl BlueskyPublisher {
    /// # Arguments
    ///
    /// * `pds_url` - Base URL of the user's PDS (e.g. "https://bsky.social")
    pub fn new(client: reqwest::Client, pds_url: &str, store: Arc<dyn CredentialStore>) -> Self {
        Self {
            client,
            pds_url: pds_url.to_string(),
            store,
        }
    }

    async fn create_session(
        &self,
        credentials: &BlueskyCredentials,
    ) -> Result<Session, PlatformError> {
        tracing::debug!("Creating Bluesky session for {}", credentials.identifier);

        let response = self
            .client
            .post(endpoint(&self.pds_url, "xrpc/com.atproto.server.createSession"))
            .json(&serde_json::json!({
                "identifier": credentials.identifier,
                "password": credentials.app_password,
            }))
            .send()
            .await?;

        let response = check_response(PlatformId::Bluesky, "createSession", response).await?;
        let session: Session = read_json(PlatformId::Bluesky, "createSession", response).await?;

        tracing::debug!("Bluesky session created for {}", session.did);
        Ok(session)
    }

    async fn create_record(&self, session: &Session, text: &str) -> Result<String, PlatformError> {
        let created_at = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true);

        let response = self
            .client
            .post(endpoint(&self.pds_url, "xrpc/com.atproto.repo.createRecord"))
            .bearer_auth(&session.access_jwt)
            .json(&serde_json::json!({
                "repo": session.did,
                "collection": POST_COLLECTION,
                "record": {
                    "$type": POST_COLLECTION,
                    "text": text,
                    "createdAt": created_at,
                },
            }))
            .send()
            .await?;

        let response = check_response(PlatformId::Bluesky, "createRecord", response).await?;
        let record: CreateRecordResponse =
            read_json(PlatformId::Bluesky, "createRecord", response).await?;

        Ok(record.uri)
    }
}

/// Public web URL for a post, from the author handle and the record's AT URI
///
/// `at://did:plc:abc/app.bsky.feed.post/3k2y` becomes
/// `https://bsky.app/profile/{handle}/post/3k2y`.
pub fn post_url(handle: &str, at_uri: &str) -> Result<String, PlatformError> {
    let rkey = at_uri
        .strip_prefix("at://")
        .and_then(|rest| match rest.split('/').collect::<Vec<_>>().as_slice() {
            [_, _, rkey] if !rkey.is_empty() => Some(rkey.to_string()),
            _ => None,
        })
        .ok_or_else(|| {
            PlatformError::InvalidResponse(format!(
                "Bluesky returned an invalid record URI: {}",
                at_uri
            ))
        })?;

    Ok(format!("https://bsky.app/profile/{}/post/{}", handle, rkey))
}

#[async_trait]
impl Publisher for BlueskyPublisher {
    fn platform(&self) -> PlatformId {
        PlatformId::Bluesky
    }

    async fn post(&self, message: &Message) -> Result<Option<String>, PlatformError> {
        let credentials = load_credentials(&self.store).await?.bluesky()?;

        tracing::debug!("Posting to Bluesky: {} characters", message.as_str().chars().count());

        let session = self.create_session(&credentials).await?;
        let at_uri = self.create_record(&session, message.as_str()).await?;
        tracing::debug!("Posted to Bluesky: {}", at_uri);

        // The record exists at this point, so a URI we can't parse only costs the URL
        match post_url(&session.handle, &at_uri) {
            Ok(url) => Ok(Some(url)),
            Err(e) => {
                tracing::warn!("Bluesky post {} published but has no web URL: {}", at_uri, e);
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::{MemoryStore, PlatformCredentials};
    use crate::platforms::http_client;
    use std::time::Duration;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn publisher(server: &MockServer, credentials: PlatformCredentials) -> BlueskyPublisher {
        BlueskyPublisher::new(
            http_client(Duration::from_secs(5)).unwrap(),
            &server.uri(),
            Arc::new(MemoryStore::with_credentials(credentials)),
        )
    }

    fn bluesky_credentials() -> PlatformCredentials {
        PlatformCredentials::default().with_bluesky("alice.bsky.social", "app-pass")
    }

    async fn mount_session(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/xrpc/com.atproto.server.createSession"))
            .and(body_partial_json(serde_json::json!({
                "identifier": "alice.bsky.social",
                "password": "app-pass",
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "accessJwt": "jwt-token",
                "refreshJwt": "refresh",
                "did": "did:plc:alice",
                "handle": "alice.bsky.social",
            })))
            .expect(1)
            .mount(server)
            .await;
    }

    #[test]
    fn test_post_url_from_at_uri() {
        assert_eq!(
            post_url(
                "alice.bsky.social",
                "at://did:plc:alice/app.bsky.feed.post/3k2yihcrp6f2c"
            )
            .unwrap(),
            "https://bsky.app/profile/alice.bsky.social/post/3k2yihcrp6f2c"
        );
    }

    #[test]
    fn test_post_url_rejects_malformed_uri() {
        assert!(matches!(
            post_url("alice", "not-a-uri"),
            Err(PlatformError::InvalidResponse(_))
        ));
        assert!(matches!(
            post_url("alice", "at://did:plc:alice/app.bsky.feed.post/"),
            Err(PlatformError::InvalidResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_post_success() {
        let server = MockServer::start().await;
        mount_session(&server).await;

        Mock::given(method("POST"))
            .and(path("/xrpc/com.atproto.repo.createRecord"))
            .and(header("authorization", "Bearer jwt-token"))
            .and(body_partial_json(serde_json::json!({
                "repo": "did:plc:alice",
                "collection": "app.bsky.feed.post",
                "record": { "$type": "app.bsky.feed.post", "text": "hello" },
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "uri": "at://did:plc:alice/app.bsky.feed.post/3kabc",
                "cid": "bafyrei",
            })))
            .expect(1)
            .mount(&server)
            .await;

        let message = Message::new("hello").unwrap();
        let url = publisher(&server, bluesky_credentials())
            .post(&message)
            .await
            .unwrap();

        assert_eq!(
            url.as_deref(),
            Some("https://bsky.app/profile/alice.bsky.social/post/3kabc")
        );
    }

    #[tokio::test]
    async fn test_invalid_login_is_authentication_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/xrpc/com.atproto.server.createSession"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "error": "AuthenticationRequired",
                "message": "Invalid identifier or password",
            })))
            .mount(&server)
            .await;

        let message = Message::new("hello").unwrap();
        let error = publisher(&server, bluesky_credentials())
            .post(&message)
            .await
            .unwrap_err();

        match error {
            PlatformError::Authentication(reason) => {
                assert!(reason.contains("Invalid identifier or password"));
            }
            other => panic!("Expected Authentication error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_credentials_makes_no_request() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let credentials = PlatformCredentials::default().with_threads("1", "token");
        let message = Message::new("hello").unwrap();
        let error = publisher(&server, credentials).post(&message).await.unwrap_err();

        assert!(matches!(error, PlatformError::Credentials(_)));
    }

    #[tokio::test]
    async fn test_malformed_record_response() {
        let server = MockServer::start().await;
        mount_session(&server).await;

        Mock::given(method("POST"))
            .and(path("/xrpc/com.atproto.repo.createRecord"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let message = Message::new("hello").unwrap();
        let error = publisher(&server, bluesky_credentials())
            .post(&message)
            .await
            .unwrap_err();

        assert!(matches!(error, PlatformError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_unparseable_record_uri_still_counts_as_published() {
        let server = MockServer::start().await;
        mount_session(&server).await;

        Mock::given(method("POST"))
            .and(path("/xrpc/com.atproto.repo.createRecord"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "uri": "at://did:plc:alice/app.bsky.feed.post",
            })))
            .expect(1)
            .mount(&server)
            .await;

        let message = Message::new("hello").unwrap();
        let bluesky = publisher(&server, bluesky_credentials());
        let result = crate::platforms::publish(&bluesky, &message, Duration::from_secs(5)).await;

        assert!(result.success);
        assert_eq!(result.platform, "bluesky");
        assert!(result.url.is_none());
        assert!(result.error.is_none());
    }
}
