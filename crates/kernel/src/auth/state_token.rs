//! OAuth `state` nonce generation and verification.

use anyhow::Result;
use rand::RngCore;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use tower_sessions::Session;

/// Session key for the pending OAuth state nonce.
const OAUTH_STATE_SESSION_KEY: &str = "oauth_state";

/// Generate a state nonce and store it in the session.
///
/// A new login replaces any nonce left over from an abandoned one.
pub async fn generate_state_token(session: &Session) -> Result<String> {
    let mut random_bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut random_bytes);

    let timestamp = chrono::Utc::now().timestamp();

    let mut hasher = Sha256::new();
    hasher.update(random_bytes);
    hasher.update(timestamp.to_le_bytes());
    let token = hex::encode(hasher.finalize());

    session
        .insert(OAUTH_STATE_SESSION_KEY, &token)
        .await
        .map_err(|e| anyhow::anyhow!("failed to store OAuth state: {e}"))?;

    Ok(token)
}

/// Verify a returned state nonce against the session.
///
/// Nonces are single-use: the stored value is removed whether or not it matches.
pub async fn verify_state_token(session: &Session, submitted: &str) -> Result<bool> {
    let stored: Option<String> = session
        .remove(OAUTH_STATE_SESSION_KEY)
        .await
        .map_err(|e| anyhow::anyhow!("failed to read OAuth state: {e}"))?;

    let Some(stored) = stored else {
        return Ok(false);
    };

    if submitted.is_empty() || stored.len() != submitted.len() {
        return Ok(false);
    }

    Ok(stored.as_bytes().ct_eq(submitted.as_bytes()).into())
}
