//! Shared HTTP client and immutable endpoint configuration

use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use url::Url;

use crate::config::ArduinoConfig;
use crate::error::AppError;

use super::token::AccessToken;

/// Endpoint configuration. Built once at startup and never mutated.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub auth_url: Url,
    pub api_url: Url,
    pub timeout: Duration,
}

impl ApiConfig {
    pub fn new(auth_url: &str, api_url: &str, timeout: Duration) -> Result<Self, AppError> {
        Ok(Self {
            auth_url: parse_base(auth_url)?,
            api_url: parse_base(api_url)?,
            timeout,
        })
    }

    pub fn from_settings(settings: &ArduinoConfig) -> Result<Self, AppError> {
        Self::new(
            &settings.auth_url,
            &settings.api_url,
            Duration::from_secs(settings.timeout_secs),
        )
    }
}

fn parse_base(raw: &str) -> Result<Url, AppError> {
    let url = Url::parse(raw).map_err(|e| AppError::Config(format!("invalid URL {raw:?}: {e}")))?;
    if url.cannot_be_a_base() {
        return Err(AppError::Config(format!("URL {raw:?} cannot be used as a base")));
    }
    Ok(url)
}

/// Appends path segments to a base URL, tolerating a trailing slash on the base
pub(crate) fn join_segments(base: &Url, segments: &[&str]) -> Url {
    let mut url = base.clone();
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments);
    }
    url
}

/// reqwest client plus the endpoints it talks to
#[derive(Debug, Clone)]
pub struct ApiClient {
    http_client: Client,
    config: ApiConfig,
}

impl ApiClient {
    pub fn new(config: ApiConfig) -> Result<Self, AppError> {
        let http_client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AppError::Config(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            http_client,
            config,
        })
    }

    pub(crate) fn http(&self) -> &Client {
        &self.http_client
    }

    pub fn token_url(&self) -> Url {
        join_segments(&self.config.auth_url, &["clients", "token"])
    }

    pub fn api_url(&self, segments: &[&str]) -> Url {
        join_segments(&self.config.api_url, segments)
    }

    /// Authenticated GET returning a decoded JSON body.
    /// `resource` names what is being fetched in error messages.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        query: &[(&str, &str)],
        token: &AccessToken,
        resource: &str,
    ) -> Result<T, AppError> {
        tracing::debug!("GET {}", url);

        let resp = self
            .http_client
            .get(url)
            .query(query)
            .bearer_auth(token.secret())
            .send()
            .await
            .map_err(|e| AppError::upstream(resource, None, format!("request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            tracing::warn!("Fetching {} returned {}: {}", resource, status, body);
            return Err(AppError::upstream(resource, Some(status.as_u16()), body));
        }

        resp.json::<T>().await.map_err(|e| {
            AppError::upstream(resource, Some(status.as_u16()), format!("parse failed: {e}"))
        })
    }
}
