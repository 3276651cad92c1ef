//! OAuth 1.0a request signing (HMAC-SHA1)
//!
//! Implements the user-context signature X requires for `POST /2/tweets`.
//! JSON request bodies are not part of the signature base string; only the
//! `oauth_*` parameters and any URL query parameters are.

use base64::Engine;
use hmac::{Hmac, Mac};
use rand::distributions::Alphanumeric;
use rand::Rng;
use sha1::Sha1;

use crate::credentials::XCredentials;

type HmacSha1 = Hmac<Sha1>;

/// Percent-encode per RFC 3986 (unreserved characters pass through)
pub fn percent_encode(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

/// Random 32-character alphanumeric nonce
pub fn generate_nonce() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect()
}

/// Undo query-string percent-encoding, keeping the raw text if it is not valid UTF-8
fn decode_component(raw: &str) -> String {
    urlencoding::decode(raw)
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| raw.to_string())
}

/// Build the signature base string
///
/// `url` may carry a query string; its parameters are folded into the
/// normalized parameter list and stripped from the base URL.
pub fn signature_base_string(method: &str, url: &str, params: &[(String, String)]) -> String {
    let (base_url, query) = match url.split_once('?') {
        Some((base, query)) => (base, Some(query)),
        None => (url, None),
    };

    let mut encoded: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| (percent_encode(k), percent_encode(v)))
        .collect();

    if let Some(query) = query {
        for pair in query.split('&').filter(|p| !p.is_empty()) {
            let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
            let k = decode_component(k);
            let v = decode_component(v);
            encoded.push((percent_encode(&k), percent_encode(&v)));
        }
    }

    encoded.sort();

    let normalized = encoded
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    format!(
        "{}&{}&{}",
        method.to_uppercase(),
        percent_encode(base_url),
        percent_encode(&normalized)
    )
}

/// HMAC-SHA1 signature over a base string, base64-encoded
pub fn sign(base_string: &str, consumer_secret: &str, token_secret: &str) -> String {
    let key = format!(
        "{}&{}",
        percent_encode(consumer_secret),
        percent_encode(token_secret)
    );

    let mut mac = HmacSha1::new_from_slice(key.as_bytes()).expect("HMAC can take key of any size");
    mac.update(base_string.as_bytes());

    base64::engine::general_purpose::STANDARD.encode(mac.finalize().into_bytes())
}

/// `Authorization` header value with an explicit nonce and timestamp
pub fn authorization_header_with(
    method: &str,
    url: &str,
    credentials: &XCredentials,
    nonce: &str,
    timestamp: i64,
) -> String {
    let mut oauth_params = vec![
        ("oauth_consumer_key".to_string(), credentials.consumer_key.clone()),
        ("oauth_nonce".to_string(), nonce.to_string()),
        ("oauth_signature_method".to_string(), "HMAC-SHA1".to_string()),
        ("oauth_timestamp".to_string(), timestamp.to_string()),
        ("oauth_token".to_string(), credentials.access_token.clone()),
        ("oauth_version".to_string(), "1.0".to_string()),
    ];

    let base_string = signature_base_string(method, url, &oauth_params);
    let signature = sign(
        &base_string,
        &credentials.consumer_secret,
        &credentials.access_token_secret,
    );
    oauth_params.push(("oauth_signature".to_string(), signature));
    oauth_params.sort();

    let fields = oauth_params
        .iter()
        .map(|(k, v)| format!("{}=\"{}\"", percent_encode(k), percent_encode(v)))
        .collect::<Vec<_>>()
        .join(", ");

    format!("OAuth {}", fields)
}

/// `Authorization` header value for a request made now
pub fn authorization_header(method: &str, url: &str, credentials: &XCredentials) -> String {
    authorization_header_with(
        method,
        url,
        credentials,
        &generate_nonce(),
        chrono::Utc::now().timestamp(),
    )
}
