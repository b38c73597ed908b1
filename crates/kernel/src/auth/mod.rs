//! Authentication against an external OAuth identity provider.
//!
//! The kernel never verifies credentials itself: it sends the browser to the
//! provider, exchanges the returned authorization code for a profile, and
//! keeps that profile in the session.

mod google;
mod state_token;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use google::{GoogleEndpoints, GoogleProvider};
pub use state_token::{generate_state_token, verify_state_token};

/// Scope requested from the provider: the basic profile only.
pub const PROFILE_SCOPE: &str = "profile";

/// Profile returned by the identity provider and stored in the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Provider-scoped subject identifier.
    pub id: String,
    /// Human readable name.
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
    /// Identity provider that vouched for this profile (e.g. "google").
    pub provider: String,
}

/// Authentication errors.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("OAuth state parameter missing or mismatched")]
    StateMismatch,

    #[error("identity provider denied the request: {0}")]
    ProviderDenied(String),

    #[error("authorization code missing from callback")]
    MissingCode,

    #[error("failed to build authorization URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("code exchange failed: {0:#}")]
    Exchange(#[from] anyhow::Error),
}

/// External OAuth identity provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Provider name as it appears in `/auth/{provider}`.
    fn name(&self) -> &'static str;

    /// URL that starts the authorization-code flow.
    ///
    /// Implementations must request only the basic profile and force the
    /// provider's account chooser on every login.
    fn authorize_url(&self, state: &str) -> Result<String, AuthError>;

    /// Exchange an authorization code for the user's profile.
    async fn exchange(&self, code: &str) -> Result<UserProfile, AuthError>;
}
