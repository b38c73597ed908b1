//! Google OAuth 2.0 identity provider.

use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use super::{AuthError, IdentityProvider, PROFILE_SCOPE, UserProfile};

/// Google OAuth endpoints, overridable for tests and proxies.
#[derive(Debug, Clone)]
pub struct GoogleEndpoints {
    pub authorize: String,
    pub token: String,
    pub userinfo: String,
}

impl Default for GoogleEndpoints {
    fn default() -> Self {
        Self {
            authorize: "https://accounts.google.com/o/oauth2/v2/auth".to_string(),
            token: "https://oauth2.googleapis.com/token".to_string(),
            userinfo: "https://www.googleapis.com/oauth2/v3/userinfo".to_string(),
        }
    }
}

/// Token endpoint response (RFC 6749 §5.1). Only the access token is used.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// OpenID Connect userinfo response, as much as the `profile` scope yields.
#[derive(Debug, Deserialize)]
struct GoogleUserInfo {
    sub: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    given_name: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    picture: Option<String>,
}

impl From<GoogleUserInfo> for UserProfile {
    fn from(info: GoogleUserInfo) -> Self {
        let display_name = info
            .name
            .or(info.given_name)
            .unwrap_or_else(|| info.sub.clone());
        Self {
            id: info.sub,
            display_name,
            email: info.email,
            picture: info.picture,
            provider: "google".to_string(),
        }
    }
}

/// Google identity provider.
pub struct GoogleProvider {
    http: reqwest::Client,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    endpoints: GoogleEndpoints,
}

impl GoogleProvider {
    /// Create a provider using Google's public endpoints.
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self::with_endpoints(
            client_id,
            client_secret,
            redirect_uri,
            GoogleEndpoints::default(),
        )
    }

    /// Create a provider talking to custom endpoints.
    pub fn with_endpoints(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_uri: impl Into<String>,
        endpoints: GoogleEndpoints,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_uri: redirect_uri.into(),
            endpoints,
        }
    }
}

#[async_trait]
impl IdentityProvider for GoogleProvider {
    fn name(&self) -> &'static str {
        "google"
    }

    fn authorize_url(&self, state: &str) -> Result<String, AuthError> {
        let url = Url::parse_with_params(
            &self.endpoints.authorize,
            &[
                ("response_type", "code"),
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("scope", PROFILE_SCOPE),
                ("prompt", "select_account"),
                ("state", state),
            ],
        )?;
        Ok(url.into())
    }

    async fn exchange(&self, code: &str) -> Result<UserProfile, AuthError> {
        let token: TokenResponse = self
            .http
            .post(&self.endpoints.token)
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
            ])
            .send()
            .await
            .context("token request failed")?
            .error_for_status()
            .context("token endpoint rejected the authorization code")?
            .json()
            .await
            .context("malformed token response")?;

        let info: GoogleUserInfo = self
            .http
            .get(&self.endpoints.userinfo)
            .bearer_auth(&token.access_token)
            .send()
            .await
            .context("userinfo request failed")?
            .error_for_status()
            .context("userinfo endpoint rejected the access token")?
            .json()
            .await
            .context("malformed userinfo response")?;

        debug!(sub = %info.sub, "fetched Google profile");
        Ok(info.into())
    }
}

impl std::fmt::Debug for GoogleProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleProvider")
            .field("client_id", &self.client_id)
            .field("redirect_uri", &self.redirect_uri)
            .field("endpoints", &self.endpoints)
            .finish_non_exhaustive()
    }
}
