use std::collections::HashMap;
use std::time::Duration;

use axum::async_trait;
use time::OffsetDateTime;
use tokio::sync::Mutex;

/// Outcome of an atomic compare-and-delete on a cached code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumeOutcome {
    /// No live value under the key (never set, expired, or already consumed).
    Missing,
    /// A live value exists but does not match; it is left in place.
    Mismatch,
    /// The value matched and has been removed.
    Consumed,
}

/// Key-value store with per-key expiry, used to hold outstanding one-time
/// codes. `consume` is the only way to read-and-delete a code: it compares and
/// removes in one step so two concurrent verifications cannot both succeed.
#[async_trait]
pub trait OtpCache: Send + Sync {
    /// Store `value` under `key`, replacing any previous value and restarting
    /// the expiry clock.
    async fn put(&self, key: &str, value: &str, ttl: Duration) -> anyhow::Result<()>;

    /// Fetch the live value under `key`, if any.
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>>;

    /// Compare `candidate` against the live value under `key` and delete the
    /// entry on a match.
    async fn consume(&self, key: &str, candidate: &str) -> anyhow::Result<ConsumeOutcome>;
}

struct Entry {
    value: String,
    expires_at: OffsetDateTime,
}

impl Entry {
    fn is_expired(&self, now: OffsetDateTime) -> bool {
        self.expires_at <= now
    }
}

/// In-process cache with lazy expiry. Expired entries are dropped when read
/// and swept whenever a new value is stored.
#[derive(Default)]
pub struct MemoryOtpCache {
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryOtpCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OtpCache for MemoryOtpCache {
    async fn put(&self, key: &str, value: &str, ttl: Duration) -> anyhow::Result<()> {
        let now = OffsetDateTime::now_utc();
        let mut entries = self.entries.lock().await;
        entries.retain(|_, e| !e.is_expired(now));
        entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: now + ttl,
            },
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        let now = OffsetDateTime::now_utc();
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some(e) if e.is_expired(now) => {
                entries.remove(key);
                Ok(None)
            }
            Some(e) => Ok(Some(e.value.clone())),
            None => Ok(None),
        }
    }

    async fn consume(&self, key: &str, candidate: &str) -> anyhow::Result<ConsumeOutcome> {
        let now = OffsetDateTime::now_utc();
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some(e) if e.is_expired(now) => {
                entries.remove(key);
                Ok(ConsumeOutcome::Missing)
            }
            Some(e) if e.value != candidate => Ok(ConsumeOutcome::Mismatch),
            Some(_) => {
                entries.remove(key);
                Ok(ConsumeOutcome::Consumed)
            }
            None => Ok(ConsumeOutcome::Missing),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_secs(300);

    #[tokio::test]
    async fn put_then_get_returns_value() {
        let cache = MemoryOtpCache::new();
        cache.put("otp:a@example.com", "123456", TTL).await.unwrap();
        let got = cache.get("otp:a@example.com").await.unwrap();
        assert_eq!(got.as_deref(), Some("123456"));
    }

    #[tokio::test]
    async fn put_overwrites_previous_value() {
        let cache = MemoryOtpCache::new();
        cache.put("otp:a@example.com", "111111", TTL).await.unwrap();
        cache.put("otp:a@example.com", "222222", TTL).await.unwrap();

        // The superseded code no longer verifies.
        let stale = cache.consume("otp:a@example.com", "111111").await.unwrap();
        assert_eq!(stale, ConsumeOutcome::Mismatch);
        let fresh = cache.consume("otp:a@example.com", "222222").await.unwrap();
        assert_eq!(fresh, ConsumeOutcome::Consumed);
    }

    #[tokio::test]
    async fn expired_entry_is_not_returned() {
        let cache = MemoryOtpCache::new();
        cache
            .put("otp:a@example.com", "123456", Duration::ZERO)
            .await
            .unwrap();
        assert_eq!(cache.get("otp:a@example.com").await.unwrap(), None);
    }

    #[tokio::test]
    async fn consume_of_expired_entry_reports_missing() {
        let cache = MemoryOtpCache::new();
        cache
            .put("otp:a@example.com", "123456", Duration::ZERO)
            .await
            .unwrap();
        let outcome = cache.consume("otp:a@example.com", "123456").await.unwrap();
        assert_eq!(outcome, ConsumeOutcome::Missing);
    }

    #[tokio::test]
    async fn consume_mismatch_keeps_entry() {
        let cache = MemoryOtpCache::new();
        cache.put("otp:a@example.com", "123456", TTL).await.unwrap();

        let outcome = cache.consume("otp:a@example.com", "654321").await.unwrap();
        assert_eq!(outcome, ConsumeOutcome::Mismatch);

        // Retry with the right code still works.
        let outcome = cache.consume("otp:a@example.com", "123456").await.unwrap();
        assert_eq!(outcome, ConsumeOutcome::Consumed);
    }

    #[tokio::test]
    async fn consume_is_one_time() {
        let cache = MemoryOtpCache::new();
        cache.put("otp:a@example.com", "123456", TTL).await.unwrap();

        assert_eq!(
            cache.consume("otp:a@example.com", "123456").await.unwrap(),
            ConsumeOutcome::Consumed
        );
        assert_eq!(
            cache.consume("otp:a@example.com", "123456").await.unwrap(),
            ConsumeOutcome::Missing
        );
    }

    #[tokio::test]
    async fn consume_unknown_key_reports_missing() {
        let cache = MemoryOtpCache::new();
        let outcome = cache.consume("otp:nobody@example.com", "123456").await.unwrap();
        assert_eq!(outcome, ConsumeOutcome::Missing);
    }
}
