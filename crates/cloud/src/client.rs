//! REST client for the remote table service.
//!
//! Speaks PostgREST conventions: an upsert is a keyed insert with
//! `Prefer: resolution=merge-duplicates`, reads are `select=*`, and
//! owner-scoped filtering happens server-side (row-level security under the
//! bearer token).

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::Deserialize;

use apiario_core::identity::Identity;
use apiario_core::remote::{RemoteError, RemoteStore};
use apiario_core::sync::EntityKind;

use crate::error::{CloudError, Result};

/// Default timeout for API requests.
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const MAX_LOG_BODY_CHARS: usize = 512;

/// Connection settings for the cloud table service.
#[derive(Debug, Clone)]
pub struct CloudConfig {
    /// Base URL of the cloud API (e.g. "https://project.example.co")
    pub base_url: String,
    /// Project (anon) key; doubles as the bearer in the no-auth variant
    pub api_key: String,
}

impl CloudConfig {
    /// Read `APIARIO_API_URL` / `APIARIO_API_KEY` from the environment.
    /// `None` disables the remote side entirely.
    pub fn from_env() -> Option<Self> {
        let base_url = std::env::var("APIARIO_API_URL")
            .ok()
            .map(|v| v.trim().trim_end_matches('/').to_string())
            .filter(|v| !v.is_empty())?;
        let api_key = std::env::var("APIARIO_API_KEY")
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())?;
        Some(CloudConfig { base_url, api_key })
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    message: String,
    #[serde(default)]
    code: Option<String>,
}

/// Client for the cloud table service.
#[derive(Debug, Clone)]
pub struct CloudTableClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl CloudTableClient {
    pub fn new(config: CloudConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .expect("Failed to build HTTP client");

        CloudTableClient {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key,
        }
    }

    fn table_url(&self, kind: EntityKind) -> String {
        format!("{}/rest/v1/{}", self.base_url, kind.table_name())
    }

    /// Headers for an API request: project key plus bearer token. Without a
    /// session the project key doubles as the bearer.
    fn headers(&self, identity: Option<&Identity>) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let api_key_value = HeaderValue::from_str(&self.api_key)
            .map_err(|_| CloudError::auth("Invalid API key format"))?;
        headers.insert("apikey", api_key_value);

        let bearer = identity
            .map(|identity| identity.access_token.as_str())
            .unwrap_or(self.api_key.as_str());
        let auth_value = HeaderValue::from_str(&format!("Bearer {}", bearer))
            .map_err(|_| CloudError::auth("Invalid access token format"))?;
        headers.insert(AUTHORIZATION, auth_value);

        Ok(headers)
    }

    fn log_response(status: reqwest::StatusCode, body: &str) {
        if status.is_success() {
            debug!("API response status: {}", status);
            return;
        }

        let mut preview = body.chars().take(MAX_LOG_BODY_CHARS).collect::<String>();
        if body.chars().count() > MAX_LOG_BODY_CHARS {
            preview.push_str("...");
        }
        debug!("API response error ({}): {}", status, preview);
    }

    /// Read the body and turn non-success statuses into API errors.
    async fn check_response(response: reqwest::Response) -> Result<String> {
        let status = response.status();
        let body = response.text().await?;
        Self::log_response(status, &body);

        if !status.is_success() {
            if let Ok(error) = serde_json::from_str::<ApiErrorResponse>(&body) {
                let message = match error.code {
                    Some(code) => format!("{}: {}", code, error.message),
                    None => error.message,
                };
                return Err(CloudError::api(status.as_u16(), message));
            }
            return Err(CloudError::api(status.as_u16(), body));
        }

        Ok(body)
    }

    async fn upsert_record(
        &self,
        identity: Option<&Identity>,
        kind: EntityKind,
        record: &serde_json::Value,
    ) -> Result<()> {
        let response = self
            .client
            .post(self.table_url(kind))
            .headers(self.headers(identity)?)
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            // PostgREST bulk format; a single record still ships as an array.
            .json(&[record])
            .send()
            .await?;
        Self::check_response(response).await?;
        Ok(())
    }

    async fn fetch_table(
        &self,
        identity: Option<&Identity>,
        kind: EntityKind,
    ) -> Result<Vec<serde_json::Value>> {
        let response = self
            .client
            .get(format!("{}?select=*", self.table_url(kind)))
            .headers(self.headers(identity)?)
            .send()
            .await?;
        let body = Self::check_response(response).await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn delete_record(
        &self,
        identity: Option<&Identity>,
        kind: EntityKind,
        id: &str,
    ) -> Result<()> {
        let response = self
            .client
            .delete(format!(
                "{}?id=eq.{}",
                self.table_url(kind),
                urlencoding::encode(id)
            ))
            .headers(self.headers(identity)?)
            .header("Prefer", "return=minimal")
            .send()
            .await?;
        // Deleting an absent row answers 204 with no rows; still a success.
        Self::check_response(response).await?;
        Ok(())
    }
}

#[async_trait]
impl RemoteStore for CloudTableClient {
    async fn upsert(
        &self,
        identity: Option<&Identity>,
        kind: EntityKind,
        record: &serde_json::Value,
    ) -> std::result::Result<(), RemoteError> {
        self.upsert_record(identity, kind, record)
            .await
            .map_err(RemoteError::from)
    }

    async fn fetch_all(
        &self,
        identity: Option<&Identity>,
        kind: EntityKind,
    ) -> std::result::Result<Vec<serde_json::Value>, RemoteError> {
        self.fetch_table(identity, kind)
            .await
            .map_err(RemoteError::from)
    }

    async fn delete(
        &self,
        identity: Option<&Identity>,
        kind: EntityKind,
        id: &str,
    ) -> std::result::Result<(), RemoteError> {
        self.delete_record(identity, kind, id)
            .await
            .map_err(RemoteError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> CloudTableClient {
        CloudTableClient::new(CloudConfig {
            base_url: "https://project.example.co/".to_string(),
            api_key: "anon-key".to_string(),
        })
    }

    #[test]
    fn table_urls_drop_trailing_slash() {
        let client = client();
        assert_eq!(
            client.table_url(EntityKind::Apiary),
            "https://project.example.co/rest/v1/apiaries"
        );
        assert_eq!(
            client.table_url(EntityKind::Inspection),
            "https://project.example.co/rest/v1/inspections"
        );
    }

    #[test]
    fn headers_fall_back_to_the_project_key_without_a_session() {
        let client = client();

        let anon = client.headers(None).unwrap();
        assert_eq!(anon.get("apikey").unwrap(), "anon-key");
        assert_eq!(anon.get(AUTHORIZATION).unwrap(), "Bearer anon-key");

        let identity = Identity {
            user_id: "beekeeper-1".to_string(),
            access_token: "session-token".to_string(),
        };
        let signed = client.headers(Some(&identity)).unwrap();
        assert_eq!(signed.get(AUTHORIZATION).unwrap(), "Bearer session-token");
    }

    #[test]
    fn headers_reject_unprintable_tokens() {
        let client = client();
        let identity = Identity {
            user_id: "beekeeper-1".to_string(),
            access_token: "bad\ntoken".to_string(),
        };
        assert!(matches!(
            client.headers(Some(&identity)),
            Err(CloudError::Auth(_))
        ));
    }
}
