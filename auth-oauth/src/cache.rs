//! Client-side access token cache
//!
//! One slot for the token obtained with the client's default identity. A
//! token is reused while `now < expires_at - safety_margin`; after that the
//! next caller re-acquires it while holding the slot lock, so concurrent
//! callers wait for one acquisition instead of racing.
//!
//! Acquisitions with an override identity bypass the slot in both directions.

use crate::error::AcquisitionError;
use crate::models::TokenResponse;
use chrono::{DateTime, Duration, Utc};
use std::future::Future;
use tokio::sync::Mutex;

pub const DEFAULT_SAFETY_MARGIN_SECS: i64 = 30;

/// A bearer token and the instant it stops being accepted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub value: String,
    pub expires_at: DateTime<Utc>,
}

impl AccessToken {
    /// Token from an issuer response received at `now`.
    ///
    /// # Errors
    ///
    /// `AcquisitionError::InvalidResponse` if `expires_in` is not positive or
    /// does not fit the calendar.
    pub fn from_response(response: &TokenResponse, now: DateTime<Utc>) -> Result<Self, AcquisitionError> {
        if response.expires_in <= 0 {
            return Err(AcquisitionError::InvalidResponse(format!(
                "non-positive expires_in: {}",
                response.expires_in
            )));
        }

        let expires_at = Duration::try_seconds(response.expires_in)
            .and_then(|lifetime| now.checked_add_signed(lifetime))
            .ok_or_else(|| {
                AcquisitionError::InvalidResponse(format!("expires_in out of range: {}", response.expires_in))
            })?;

        Ok(Self {
            value: response.access_token.clone(),
            expires_at,
        })
    }

    pub fn is_usable_at(&self, now: DateTime<Utc>, safety_margin: Duration) -> bool {
        self.expires_at
            .checked_sub_signed(safety_margin)
            .is_some_and(|deadline| now < deadline)
    }
}

#[derive(Debug)]
pub struct TokenCache<I> {
    default_identity: I,
    slot: Mutex<Option<AccessToken>>,
    safety_margin: Duration,
}

impl<I> TokenCache<I> {
    pub fn new(default_identity: I) -> Self {
        Self {
            default_identity,
            slot: Mutex::new(None),
            safety_margin: Duration::seconds(DEFAULT_SAFETY_MARGIN_SECS),
        }
    }

    #[must_use]
    pub fn with_safety_margin(mut self, safety_margin: Duration) -> Self {
        self.safety_margin = safety_margin;
        self
    }

    pub fn default_identity(&self) -> &I {
        &self.default_identity
    }

    /// Return a usable token, acquiring one through `acquire` when needed.
    ///
    /// # Errors
    ///
    /// Whatever `acquire` returns. The slot is left empty on failure and no
    /// retry is attempted.
    pub async fn get_token<'a, F, Fut>(
        &'a self,
        now: DateTime<Utc>,
        override_identity: Option<&'a I>,
        acquire: F,
    ) -> Result<AccessToken, AcquisitionError>
    where
        F: FnOnce(&'a I) -> Fut,
        Fut: Future<Output = Result<TokenResponse, AcquisitionError>>,
    {
        if let Some(identity) = override_identity {
            tracing::debug!("Acquiring token with override identity, cache bypassed");
            let response = acquire(identity).await?;
            return AccessToken::from_response(&response, now);
        }

        let mut slot = self.slot.lock().await;
        if let Some(token) = slot.as_ref() {
            if token.is_usable_at(now, self.safety_margin) {
                tracing::debug!(expires_at = %token.expires_at, "Using cached access token");
                return Ok(token.clone());
            }
            tracing::debug!(expires_at = %token.expires_at, "Cached access token near expiry");
        }
        *slot = None;

        let response = acquire(&self.default_identity).await?;
        let token = AccessToken::from_response(&response, now)?;
        tracing::info!(
            token = %telemetry::redact_token(&token.value),
            expires_at = %token.expires_at,
            "Access token acquired"
        );
        *slot = Some(token.clone());
        Ok(token)
    }

    /// Drop the cached token so the next call re-acquires.
    pub async fn invalidate(&self) {
        *self.slot.lock().await = None;
    }

    /// The cached token, usable or not
    pub async fn current(&self) -> Option<AccessToken> {
        self.slot.lock().await.clone()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use reqwest::StatusCode;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn response(token: &str, expires_in: i64) -> TokenResponse {
        TokenResponse {
            access_token: token.to_string(),
            token_type: "Bearer".to_string(),
            expires_in,
            client_id: "CN=client".to_string(),
        }
    }

    fn counting_acquire(
        calls: &Arc<AtomicUsize>,
        expires_in: i64,
    ) -> impl FnOnce(&String) -> std::future::Ready<Result<TokenResponse, AcquisitionError>> {
        let calls = Arc::clone(calls);
        move |identity: &String| {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            std::future::ready(Ok(response(&format!("{}-token-{}", identity, n), expires_in)))
        }
    }

    #[tokio::test]
    async fn test_reuses_token_within_margin() {
        let cache = TokenCache::new("default".to_string());
        let calls = Arc::new(AtomicUsize::new(0));
        let t0 = Utc::now();

        let first = cache.get_token(t0, None, counting_acquire(&calls, 3600)).await.unwrap();
        let second = cache
            .get_token(t0 + Duration::seconds(100), None, counting_acquire(&calls, 3600))
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_refreshes_inside_safety_margin() {
        let cache = TokenCache::new("default".to_string());
        let calls = Arc::new(AtomicUsize::new(0));
        let t0 = Utc::now();

        cache.get_token(t0, None, counting_acquire(&calls, 3600)).await.unwrap();

        // 3571s later is 29s before expiry
        let refreshed = cache
            .get_token(t0 + Duration::seconds(3571), None, counting_acquire(&calls, 3600))
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(refreshed.value, "default-token-2");
    }

    #[tokio::test]
    async fn test_override_identity_bypasses_slot() {
        let cache = TokenCache::new("default".to_string());
        let calls = Arc::new(AtomicUsize::new(0));
        let other = "other".to_string();
        let now = Utc::now();

        let cached = cache.get_token(now, None, counting_acquire(&calls, 3600)).await.unwrap();
        let overridden = cache
            .get_token(now, Some(&other), counting_acquire(&calls, 3600))
            .await
            .unwrap();

        assert_eq!(overridden.value, "other-token-2");
        assert_eq!(cache.current().await, Some(cached));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failure_leaves_slot_empty() {
        let cache = TokenCache::new("default".to_string());
        let now = Utc::now();

        let err = cache
            .get_token(now, None, |_: &String| async {
                Err::<TokenResponse, _>(AcquisitionError::Status {
                    status: StatusCode::UNAUTHORIZED,
                    body: r#"{"error":"Certificate thumbprint mismatch"}"#.to_string(),
                })
            })
            .await
            .unwrap_err();

        assert!(err.is_unauthorized());
        assert!(cache.current().await.is_none());
    }

    #[tokio::test]
    async fn test_failed_refresh_clears_stale_token() {
        let cache = TokenCache::new("default".to_string());
        let calls = Arc::new(AtomicUsize::new(0));
        let t0 = Utc::now();

        cache.get_token(t0, None, counting_acquire(&calls, 60)).await.unwrap();

        let later = t0 + Duration::seconds(120);
        let result = cache
            .get_token(later, None, |_: &String| async { Err::<TokenResponse, _>(AcquisitionError::Timeout) })
            .await;
        assert!(matches!(result, Err(AcquisitionError::Timeout)));
        assert!(cache.current().await.is_none());
    }

    #[test]
    fn test_lifetime_must_be_positive_and_representable() {
        let now = Utc::now();

        for expires_in in [0, -60, i64::MAX] {
            let err = AccessToken::from_response(&response("t", expires_in), now).unwrap_err();
            assert!(matches!(err, AcquisitionError::InvalidResponse(_)), "{}", expires_in);
        }

        let token = AccessToken::from_response(&response("t", 60), now).unwrap();
        assert_eq!(token.expires_at, now + Duration::seconds(60));
    }

    #[tokio::test]
    async fn test_unrepresentable_lifetime_is_not_cached() {
        let cache = TokenCache::new("default".to_string());
        let calls = Arc::new(AtomicUsize::new(0));

        let err = cache
            .get_token(Utc::now(), None, counting_acquire(&calls, i64::MAX))
            .await
            .unwrap_err();

        assert!(matches!(err, AcquisitionError::InvalidResponse(_)));
        assert!(cache.current().await.is_none());
    }

    #[tokio::test]
    async fn test_invalidate() {
        let cache = TokenCache::new("default".to_string());
        let calls = Arc::new(AtomicUsize::new(0));
        let now = Utc::now();

        cache.get_token(now, None, counting_acquire(&calls, 3600)).await.unwrap();
        cache.invalidate().await;
        cache.get_token(now, None, counting_acquire(&calls, 3600)).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_acquisition() {
        let cache = TokenCache::new("default".to_string());
        let calls = Arc::new(AtomicUsize::new(0));
        let now = Utc::now();

        let slow_acquire = || {
            let calls = Arc::clone(&calls);
            move |_: &String| async move {
                calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(std::time::Duration::from_millis(20)).await;
                Ok::<_, AcquisitionError>(response("shared", 3600))
            }
        };

        let (a, b, c) = tokio::join!(
            cache.get_token(now, None, slow_acquire()),
            cache.get_token(now, None, slow_acquire()),
            cache.get_token(now, None, slow_acquire()),
        );

        assert_eq!(a.unwrap().value, "shared");
        assert_eq!(b.unwrap().value, "shared");
        assert_eq!(c.unwrap().value, "shared");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
