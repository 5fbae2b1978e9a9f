//! Expiring in-memory cache for OAuth2 access tokens.

use crate::types::SystemId;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
struct CachedToken {
    token: String,
    expires_at: Instant,
}

/// Token cache keyed by `(system id, token url)`.
///
/// Owned by one [`AuthResolver`](super::AuthResolver) for the process
/// lifetime; entries expire naturally via the buffer rule, there is no
/// explicit teardown. Two callers racing on the same key may both perform a
/// token exchange; the exchange is idempotent and the last write wins.
#[derive(Debug)]
pub struct TokenCache {
    /// Tokens within this buffer of expiry are treated as already expired.
    buffer: Duration,
    entries: RwLock<HashMap<String, CachedToken>>,
}

impl TokenCache {
    pub fn new(buffer: Duration) -> Self {
        Self {
            buffer,
            entries: RwLock::new(HashMap::new()),
        }
    }

    fn key(system_id: &SystemId, token_url: &str) -> String {
        format!("{}::{}", system_id, token_url)
    }

    /// Return a still-usable token, or `None` when no entry exists or the
    /// entry is within the expiry buffer.
    pub async fn get(&self, system_id: &SystemId, token_url: &str) -> Option<String> {
        let entries = self.entries.read().await;
        let entry = entries.get(&Self::key(system_id, token_url))?;
        let remaining = entry.expires_at.checked_duration_since(Instant::now())?;
        if remaining <= self.buffer {
            return None;
        }
        Some(entry.token.clone())
    }

    /// Store a token, overwriting any previous entry for the key.
    pub async fn put(
        &self,
        system_id: &SystemId,
        token_url: &str,
        token: impl Into<String>,
        ttl: Duration,
    ) {
        let entry = CachedToken {
            token: token.into(),
            expires_at: Instant::now() + ttl,
        };
        self.entries
            .write()
            .await
            .insert(Self::key(system_id, token_url), entry);
    }
}

impl Default for TokenCache {
    fn default() -> Self {
        Self::new(Duration::from_secs(60))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sys(id: &str) -> SystemId {
        SystemId::from_string(id.into()).unwrap()
    }

    const URL: &str = "https://auth.example.com/token";

    #[test]
    fn test_miss_on_empty_cache() {
        tokio_test::block_on(async {
            let cache = TokenCache::default();
            assert!(cache.get(&sys("a"), URL).await.is_none());
        });
    }

    #[test]
    fn test_hit_within_validity_window() {
        tokio_test::block_on(async {
            let cache = TokenCache::default();
            cache.put(&sys("a"), URL, "tok-1", Duration::from_secs(3600)).await;
            assert_eq!(cache.get(&sys("a"), URL).await.as_deref(), Some("tok-1"));
        });
    }

    #[test]
    fn test_entry_within_buffer_is_absent() {
        tokio_test::block_on(async {
            let cache = TokenCache::default();
            // TTL below the 60s buffer: expired on arrival
            cache.put(&sys("a"), URL, "tok-1", Duration::from_secs(30)).await;
            assert!(cache.get(&sys("a"), URL).await.is_none());
        });
    }

    #[test]
    fn test_put_overwrites() {
        tokio_test::block_on(async {
            let cache = TokenCache::default();
            cache.put(&sys("a"), URL, "old", Duration::from_secs(3600)).await;
            cache.put(&sys("a"), URL, "new", Duration::from_secs(3600)).await;
            assert_eq!(cache.get(&sys("a"), URL).await.as_deref(), Some("new"));
        });
    }

    #[test]
    fn test_keys_are_system_and_url_scoped() {
        tokio_test::block_on(async {
            let cache = TokenCache::default();
            cache.put(&sys("a"), URL, "tok-a", Duration::from_secs(3600)).await;
            assert!(cache.get(&sys("b"), URL).await.is_none());
            assert!(cache.get(&sys("a"), "https://other/token").await.is_none());
        });
    }

    #[test]
    fn test_concurrent_access_does_not_corrupt() {
        tokio_test::block_on(async {
            let cache = std::sync::Arc::new(TokenCache::default());
            let mut handles = Vec::new();
            for i in 0..16 {
                let cache = cache.clone();
                handles.push(tokio::spawn(async move {
                    let id = sys("shared");
                    cache
                        .put(&id, URL, format!("tok-{}", i), Duration::from_secs(3600))
                        .await;
                    cache.get(&id, URL).await
                }));
            }
            for handle in handles {
                // Every reader observes some writer's token, never a torn value
                let token = handle.await.unwrap().unwrap();
                assert!(token.starts_with("tok-"));
            }
        });
    }
}
