//! Bearer token cache shared by the backends.

use std::future::Future;
use std::time::Duration;

use cirrus_ai::tools::Result;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

/// Tokens are refreshed once they are this close to expiry.
pub const REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// Lifetime assumed when the token endpoint omits `expires_in`.
pub const DEFAULT_TOKEN_LIFETIME: Duration = Duration::from_secs(3600);

/// A freshly issued token.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub access_token: String,
    pub expires_in: Duration,
}

impl IssuedToken {
    pub fn new(access_token: impl Into<String>, expires_in_secs: Option<u64>) -> Self {
        Self {
            access_token: access_token.into(),
            expires_in: expires_in_secs
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_TOKEN_LIFETIME),
        }
    }
}

#[derive(Debug)]
struct CachedToken {
    value: String,
    expires_at: Instant,
}

/// Lazily refreshed bearer token.
///
/// The lock is held across a refresh, so concurrent callers wait for one
/// token request instead of issuing their own.
#[derive(Debug, Default)]
pub struct TokenCache {
    slot: Mutex<Option<CachedToken>>,
}

impl TokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached token, or obtain a new one with `fetch`.
    pub async fn get_or_refresh<F, Fut>(&self, fetch: F) -> Result<String>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<IssuedToken>>,
    {
        let mut slot = self.slot.lock().await;
        if let Some(cached) = slot.as_ref()
            && Instant::now() + REFRESH_MARGIN < cached.expires_at
        {
            return Ok(cached.value.clone());
        }

        // Take the issue time before the request so latency shortens the lifetime.
        let issued_at = Instant::now();
        let token = fetch().await?;
        debug!(expires_in = token.expires_in.as_secs(), "Obtained access token");

        *slot = Some(CachedToken {
            value: token.access_token.clone(),
            expires_at: issued_at + token.expires_in,
        });
        Ok(token.access_token)
    }

    /// Drop the cached token.
    pub async fn invalidate(&self) {
        *self.slot.lock().await = None;
    }
}
