//! Twitter API adapter for fetching posts missing from the archive

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tweet_archive_domain::{FetchError, StatusFetcher};

pub const DEFAULT_API_BASE_URL: &str = "https://api.twitter.com";

/// Exchange application credentials for an app-only bearer token
/// (OAuth2 client-credentials grant)
pub async fn obtain_bearer_token(
    base_url: &str,
    consumer_key: &str,
    consumer_secret: &SecretString,
    timeout: Duration,
) -> Result<SecretString, FetchError> {
    let client = build_client(timeout)?;
    let url = format!("{}/oauth2/token", base_url.trim_end_matches('/'));

    let response = client
        .post(&url)
        .basic_auth(consumer_key, Some(consumer_secret.expose_secret()))
        .form(&[("grant_type", "client_credentials")])
        .send()
        .await
        .map_err(|e| FetchError::Network(e.to_string()))?;

    let status = response.status();
    if status == 401 || status == 403 {
        return Err(FetchError::Auth(
            "Consumer key or secret rejected".to_string(),
        ));
    }
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(FetchError::Status {
            status: status.as_u16(),
            body,
        });
    }

    let token: TokenResponse = response
        .json()
        .await
        .map_err(|e| FetchError::Decode(e.to_string()))?;

    if token.token_type.to_ascii_lowercase() != "bearer" {
        return Err(FetchError::Auth(format!(
            "Unexpected token type: {}",
            token.token_type
        )));
    }

    tracing::debug!("Obtained app-only bearer token");
    Ok(SecretString::new(token.access_token.into()))
}

fn build_client(timeout: Duration) -> Result<Client, FetchError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| FetchError::Network(format!("Failed to build HTTP client: {}", e)))
}

#[derive(Deserialize)]
struct TokenResponse {
    token_type: String,
    access_token: String,
}

/// Fetches single statuses with an app-only bearer token
pub struct TwitterStatusFetcher {
    client: Client,
    bearer_token: SecretString,
    base_url: String,
}

impl TwitterStatusFetcher {
    pub fn new(bearer_token: SecretString, timeout: Duration) -> Result<Self, FetchError> {
        Self::with_base_url(bearer_token, DEFAULT_API_BASE_URL.to_string(), timeout)
    }

    pub fn with_base_url(
        bearer_token: SecretString,
        base_url: String,
        timeout: Duration,
    ) -> Result<Self, FetchError> {
        Ok(Self {
            client: build_client(timeout)?,
            bearer_token,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl StatusFetcher for TwitterStatusFetcher {
    async fn fetch_status(&self, id: &str) -> Result<Value, FetchError> {
        let url = format!("{}/1.1/statuses/show.json", self.base_url);
        tracing::info!(id = %id, "Fetching post from Twitter");

        let response = self
            .client
            .get(&url)
            .query(&[("id", id), ("tweet_mode", "extended")])
            .header(
                "Authorization",
                format!("Bearer {}", self.bearer_token.expose_secret()),
            )
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(id = %id, status = status.as_u16(), "Twitter rejected status lookup");
            return Err(FetchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| FetchError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher(server: &MockServer) -> TwitterStatusFetcher {
        TwitterStatusFetcher::with_base_url(
            SecretString::new("test-token".into()),
            server.uri(),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_fetch_status_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/1.1/statuses/show.json"))
            .and(query_param("id", "20"))
            .and(query_param("tweet_mode", "extended"))
            .and(header("Authorization", "Bearer test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": 20,
                "full_text": "just setting up my twttr",
                "user": {"screen_name": "jack", "name": "jack"}
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let raw = fetcher(&mock_server).fetch_status("20").await.unwrap();
        assert_eq!(raw["full_text"], "just setting up my twttr");
    }

    #[tokio::test]
    async fn test_fetch_status_surfaces_upstream_status() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/1.1/statuses/show.json"))
            .respond_with(
                ResponseTemplate::new(404)
                    .set_body_string(r#"{"errors":[{"code":144,"message":"No status found"}]}"#),
            )
            .mount(&mock_server)
            .await;

        let err = fetcher(&mock_server).fetch_status("1").await.unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 404, ref body } if body.contains("No status found")));
    }

    #[tokio::test]
    async fn test_fetch_status_rate_limited() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/1.1/statuses/show.json"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&mock_server)
            .await;

        let err = fetcher(&mock_server).fetch_status("1").await.unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 429, .. }));
    }

    #[tokio::test]
    async fn test_obtain_bearer_token() {
        let mock_server = MockServer::start().await;

        // base64("key:secret")
        Mock::given(method("POST"))
            .and(path("/oauth2/token"))
            .and(header("Authorization", "Basic a2V5OnNlY3JldA=="))
            .and(body_string_contains("grant_type=client_credentials"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "token_type": "bearer",
                "access_token": "AAAA-token"
            })))
            .mount(&mock_server)
            .await;

        let token = obtain_bearer_token(
            &mock_server.uri(),
            "key",
            &SecretString::new("secret".into()),
            Duration::from_secs(5),
        )
        .await
        .unwrap();
        assert_eq!(token.expose_secret(), "AAAA-token");
    }

    #[tokio::test]
    async fn test_obtain_bearer_token_rejected() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/oauth2/token"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&mock_server)
            .await;

        let result = obtain_bearer_token(
            &mock_server.uri(),
            "key",
            &SecretString::new("wrong".into()),
            Duration::from_secs(5),
        )
        .await;
        assert!(matches!(result, Err(FetchError::Auth(_))));
    }
}
