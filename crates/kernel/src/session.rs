//! Session management.
//!
//! Sessions live in Redis when `REDIS_URL` is configured and in process
//! memory otherwise. Cookies are signed with a key derived from
//! `SESSION_SECRET`.

use anyhow::{Context, Result};
use axum::Router;
use fred::prelude::*;
use sha2::{Digest, Sha512};
use tower_sessions::cookie::time::Duration;
use tower_sessions::cookie::{Key, SameSite};
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer, SessionStore};
use tower_sessions_redis_store::RedisStore;

/// Default session expiry (24 hours).
pub const DEFAULT_SESSION_EXPIRY_HOURS: i64 = 24;

/// Cookie settings shared by every session backend.
#[derive(Clone)]
pub struct SessionSettings {
    key: Key,
    secure: bool,
}

impl SessionSettings {
    /// Derive the cookie signing key from a secret of at least 32 bytes.
    pub fn new(secret: &str, secure: bool) -> Self {
        let digest = Sha512::digest(secret.as_bytes());
        Self {
            key: Key::from(digest.as_slice()),
            secure,
        }
    }
}

impl std::fmt::Debug for SessionSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionSettings")
            .field("secure", &self.secure)
            .finish_non_exhaustive()
    }
}

/// Wrap a router in a session layer backed by `store`.
pub fn with_session_store<S>(router: Router, store: S, settings: &SessionSettings) -> Router
where
    S: SessionStore + Clone,
{
    let layer = SessionManagerLayer::new(store)
        .with_secure(settings.secure)
        .with_http_only(true)
        // Lax so the cookie survives the top-level redirect back from the identity provider.
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(Duration::hours(
            DEFAULT_SESSION_EXPIRY_HOURS,
        )))
        .with_signed(settings.key.clone());

    router.layer(layer)
}

/// Wrap a router in an in-memory session layer.
pub fn with_memory_sessions(router: Router, settings: &SessionSettings) -> Router {
    with_session_store(router, MemoryStore::default(), settings)
}

/// Wrap a router in a Redis-backed session layer.
pub async fn with_redis_sessions(
    router: Router,
    redis_url: &str,
    settings: &SessionSettings,
) -> Result<Router> {
    let config = Config::from_url(redis_url).context("failed to parse Redis URL")?;

    let pool = Builder::from_config(config)
        .build_pool(1)
        .context("failed to create Redis pool")?;

    pool.init()
        .await
        .context("failed to connect to Redis for sessions")?;

    Ok(with_session_store(router, RedisStore::new(pool), settings))
}
