//! OTP-gated credential reset.
//!
//! Lifecycle of a code: issued (stored under the owner's email with a TTL),
//! then either consumed by a successful verification, superseded by a newer
//! code for the same email, or expired by the cache. At most one live code
//! exists per email, and consumption is a single compare-and-delete so only
//! one of two racing verifications can win.

use std::time::Duration;

use crate::auth::credentials::generate_otp;
use crate::cache::{ConsumeOutcome, OtpCache};
use crate::config::OtpConfig;
use crate::error::ApiError;

fn cache_key(email: &str) -> String {
    format!("otp:{email}")
}

/// Issue a fresh code for `email`, replacing any outstanding one and
/// restarting the expiry clock.
pub async fn issue_code(
    cache: &dyn OtpCache,
    cfg: &OtpConfig,
    email: &str,
) -> Result<String, ApiError> {
    let code = generate_otp(cfg.length);
    cache
        .put(&cache_key(email), &code, Duration::from_secs(cfg.ttl_secs))
        .await?;
    Ok(code)
}

/// Check `candidate` against the outstanding code for `email` and consume it
/// on a match. A mismatch leaves the code in place so the caller may retry
/// until it expires; an absent or expired code reports the same outward
/// signal either way.
pub async fn consume_code(
    cache: &dyn OtpCache,
    email: &str,
    candidate: &str,
) -> Result<(), ApiError> {
    match cache.consume(&cache_key(email), candidate).await? {
        ConsumeOutcome::Missing => Err(ApiError::OtpExpired),
        ConsumeOutcome::Mismatch => Err(ApiError::OtpInvalid),
        ConsumeOutcome::Consumed => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryOtpCache;

    fn cfg() -> OtpConfig {
        OtpConfig {
            ttl_secs: 300,
            length: 6,
        }
    }

    #[tokio::test]
    async fn issued_code_verifies_exactly_once() {
        let cache = MemoryOtpCache::new();
        let code = issue_code(&cache, &cfg(), "a@example.com").await.unwrap();

        assert!(consume_code(&cache, "a@example.com", &code).await.is_ok());

        // Second attempt with the same code: already consumed.
        let err = consume_code(&cache, "a@example.com", &code)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::OtpExpired));
    }

    #[tokio::test]
    async fn reissue_supersedes_previous_code() {
        let cache = MemoryOtpCache::new();
        let first = issue_code(&cache, &cfg(), "a@example.com").await.unwrap();
        let second = loop {
            // Codes are random; retry until the two differ.
            let c = issue_code(&cache, &cfg(), "a@example.com").await.unwrap();
            if c != first {
                break c;
            }
        };

        let err = consume_code(&cache, "a@example.com", &first)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::OtpInvalid));

        assert!(consume_code(&cache, "a@example.com", &second).await.is_ok());
    }

    #[tokio::test]
    async fn mismatch_keeps_code_alive_for_retry() {
        let cache = MemoryOtpCache::new();
        let code = issue_code(&cache, &cfg(), "a@example.com").await.unwrap();
        let wrong = if code == "000000" { "000001" } else { "000000" };

        let err = consume_code(&cache, "a@example.com", wrong)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::OtpInvalid));

        assert!(consume_code(&cache, "a@example.com", &code).await.is_ok());
    }

    #[tokio::test]
    async fn expired_code_reports_expired() {
        let cache = MemoryOtpCache::new();
        let expired_cfg = OtpConfig {
            ttl_secs: 0,
            length: 6,
        };
        let code = issue_code(&cache, &expired_cfg, "a@example.com")
            .await
            .unwrap();

        let err = consume_code(&cache, "a@example.com", &code)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::OtpExpired));
    }

    #[tokio::test]
    async fn never_issued_reports_expired() {
        let cache = MemoryOtpCache::new();
        let err = consume_code(&cache, "nobody@example.com", "123456")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::OtpExpired));
    }

    #[tokio::test]
    async fn codes_for_different_emails_are_independent() {
        let cache = MemoryOtpCache::new();
        let a = issue_code(&cache, &cfg(), "a@example.com").await.unwrap();
        let b = loop {
            let c = issue_code(&cache, &cfg(), "b@example.com").await.unwrap();
            if c != a {
                break c;
            }
        };

        assert!(consume_code(&cache, "a@example.com", &a).await.is_ok());
        // Consuming a's code did not touch b's entry.
        let err = consume_code(&cache, "b@example.com", &a).await.unwrap_err();
        assert!(matches!(err, ApiError::OtpInvalid));
        assert!(consume_code(&cache, "b@example.com", &b).await.is_ok());
    }
}
