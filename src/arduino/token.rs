//! OAuth2 client-credentials token exchange
//!
//! One exchange per pipeline run. Tokens are neither cached nor reused.

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::config::ArduinoConfig;
use crate::error::AppError;

use super::client::ApiClient;

/// Service-level client credentials
#[derive(Debug)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: SecretString,
    pub audience: String,
}

impl Credentials {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        audience: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: SecretString::from(client_secret.into()),
            audience: audience.into(),
        }
    }

    pub fn from_settings(settings: &ArduinoConfig) -> Self {
        Self::new(
            settings.client_id.clone(),
            settings.client_secret.clone(),
            settings.audience.clone(),
        )
    }
}

/// Opaque bearer token, valid for the current pipeline run only
#[derive(Debug)]
pub struct AccessToken(SecretString);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(SecretString::from(token.into()))
    }

    pub(crate) fn secret(&self) -> &str {
        self.0.expose_secret()
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    expires_in: Option<i64>,
}

pub struct TokenProvider<'a> {
    client: &'a ApiClient,
}

impl<'a> TokenProvider<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn fetch_token(&self, credentials: &Credentials) -> Result<AccessToken, AppError> {
        if credentials.client_id.trim().is_empty() {
            return Err(AppError::authentication(None, "client id is empty"));
        }
        if credentials.client_secret.expose_secret().trim().is_empty() {
            return Err(AppError::authentication(None, "client secret is empty"));
        }

        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", credentials.client_id.as_str()),
            ("client_secret", credentials.client_secret.expose_secret()),
            ("audience", credentials.audience.as_str()),
        ];

        let resp = self
            .client
            .http()
            .post(self.client.token_url())
            .form(&form)
            .send()
            .await
            .map_err(|e| AppError::authentication(None, format!("token request failed: {e}")))?;

        let status = resp.status();
        let code = Some(status.as_u16());
        let body = resp.text().await.map_err(|e| {
            AppError::authentication(code, format!("token body unreadable: {e}"))
        })?;

        if !status.is_success() {
            tracing::warn!("Token exchange rejected with {}", status);
            return Err(AppError::authentication(code, body));
        }

        let parsed: TokenResponse = serde_json::from_str(&body).map_err(|e| {
            AppError::authentication(code, format!("token parse failed: {e}"))
        })?;

        let access_token = parsed
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::authentication(code, "no access_token in response"))?;

        match parsed.expires_in {
            Some(secs) => tracing::info!("Access token acquired, expires in {} sec", secs),
            None => tracing::info!("Access token acquired"),
        }

        Ok(AccessToken::new(access_token))
    }
}
