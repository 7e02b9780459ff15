//! Wazuh REST API client

use std::time::Duration;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{SmokeError, SmokeResult};

const AUTHENTICATE_PATH: &str = "/security/user/authenticate";

/// Error body returned by the API on non-200 responses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorBody {
    pub title: String,
    pub detail: String,
}

/// Body of `GET <api_url>`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionResponse {
    pub data: VersionData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionData {
    pub title: String,
    pub api_version: String,
    pub hostname: String,
    pub license_url: String,
}

/// Outcome of an API call that reached the server
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiReply<T> {
    Ok(T),
    Rejected { status: StatusCode, error: ApiErrorBody },
}

/// HTTP client for the Wazuh API. Certificate verification is off because
/// deployments under test serve self-signed certificates.
#[derive(Debug, Clone)]
pub struct WazuhApi {
    client: reqwest::Client,
}

impl WazuhApi {
    pub fn new() -> SmokeResult<Self> {
        let client = reqwest::Client::builder()
            .danger_accept_invalid_certs(true)
            .build()?;
        warn!("TLS certificate verification is disabled for API and dashboard probes");
        Ok(Self { client })
    }

    /// Request a raw token with basic auth
    pub async fn authenticate(
        &self,
        api_url: &str,
        user: &str,
        password: &str,
        timeout: Duration,
    ) -> SmokeResult<ApiReply<String>> {
        let url = format!("{}{}", api_url.trim_end_matches('/'), AUTHENTICATE_PATH);
        debug!("POST {}", url);

        let resp = self
            .client
            .post(&url)
            .basic_auth(user, Some(password))
            .query(&[("raw", "true")])
            .timeout(timeout)
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;

        if status != StatusCode::OK {
            return Ok(ApiReply::Rejected {
                status,
                error: decode(&body, "authentication error")?,
            });
        }

        Ok(ApiReply::Ok(body))
    }

    /// Fetch API version information with a bearer token
    pub async fn version(
        &self,
        api_url: &str,
        token: &str,
        timeout: Duration,
    ) -> SmokeResult<ApiReply<VersionData>> {
        debug!("GET {}", api_url);

        let resp = self
            .client
            .get(api_url)
            .bearer_auth(token)
            .timeout(timeout)
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;

        if status != StatusCode::OK {
            return Ok(ApiReply::Rejected {
                status,
                error: decode(&body, "version error")?,
            });
        }

        let version: VersionResponse = decode(&body, "version")?;
        Ok(ApiReply::Ok(version.data))
    }

    /// Plain GET returning the body text, whatever the status
    pub async fn fetch_page(&self, url: &str, timeout: Duration) -> SmokeResult<String> {
        let resp = self.client.get(url).timeout(timeout).send().await?;
        Ok(resp.text().await?)
    }
}

fn decode<T: serde::de::DeserializeOwned>(body: &str, what: &str) -> SmokeResult<T> {
    serde_json::from_str(body).map_err(|e| SmokeError::MalformedResponse(format!("{}: {}", what, e)))
}
