//! Snapshot cache
//!
//! Holds one serialized snapshot for a fixed lifetime. Concurrent misses
//! may each rebuild; the last writer wins.

use crate::entry::DirectoryEntry;
use crate::metrics;
use crate::snapshot::SnapshotBuilder;
use std::time::Duration;
use teabridge_core::config::CacheConfig;
use teabridge_core::Result;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, warn};

struct CachedSnapshot {
    bytes: Vec<u8>,
    stored_at: Instant,
}

pub struct SnapshotCache {
    builder: SnapshotBuilder,
    slot: RwLock<Option<CachedSnapshot>>,
    ttl: Duration,
    max_bytes: usize,
}

impl SnapshotCache {
    pub fn new(builder: SnapshotBuilder, config: &CacheConfig) -> Self {
        Self {
            builder,
            slot: RwLock::new(None),
            ttl: Duration::from_secs(config.ttl_seconds),
            max_bytes: config.size_bytes,
        }
    }

    pub fn enabled(&self) -> bool {
        !self.ttl.is_zero()
    }

    /// Cached snapshot if still fresh, otherwise a newly built one
    pub async fn get_snapshot(&self) -> Result<Vec<DirectoryEntry>> {
        if !self.enabled() {
            return self.builder.build().await;
        }

        if let Some(entries) = self.lookup().await {
            metrics::record_cache_hit();
            return Ok(entries);
        }
        metrics::record_cache_miss();

        let entries = self.builder.build().await?;
        if let Err(e) = self.store(&entries).await {
            warn!(error = %e, "Failed to cache snapshot");
        }
        Ok(entries)
    }

    async fn lookup(&self) -> Option<Vec<DirectoryEntry>> {
        let slot = self.slot.read().await;
        let cached = slot.as_ref()?;

        if cached.stored_at.elapsed() >= self.ttl {
            debug!("Snapshot expired");
            return None;
        }

        match decode(&cached.bytes) {
            Ok(entries) => Some(entries),
            Err(e) => {
                warn!(error = %e, "Discarding undecodable snapshot");
                None
            }
        }
    }

    async fn store(&self, entries: &[DirectoryEntry]) -> Result<()> {
        let bytes = encode(entries)?;

        if bytes.len() > self.max_bytes {
            warn!(
                size = bytes.len(),
                limit = self.max_bytes,
                "Snapshot exceeds cache size, not caching"
            );
            return Ok(());
        }

        *self.slot.write().await = Some(CachedSnapshot {
            bytes,
            stored_at: Instant::now(),
        });
        Ok(())
    }
}

fn encode(entries: &[DirectoryEntry]) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(entries)?)
}

fn decode(bytes: &[u8]) -> Result<Vec<DirectoryEntry>> {
    Ok(serde_json::from_slice(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::DirectoryLayout;
    use crate::testing::FakeProvider;
    use std::sync::Arc;
    use teabridge_core::Error;

    fn cache_for(provider: Arc<FakeProvider>, ttl_seconds: u64, size_bytes: usize) -> SnapshotCache {
        let builder = SnapshotBuilder::new(provider, DirectoryLayout::default());
        SnapshotCache::new(
            builder,
            &CacheConfig {
                size_bytes,
                ttl_seconds,
            },
        )
    }

    fn provider() -> Arc<FakeProvider> {
        Arc::new(
            FakeProvider::new()
                .with_user(FakeProvider::user(1, "alice"))
                .with_user(FakeProvider::user(2, "bob")),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_hit_within_ttl() {
        let provider = provider();
        let cache = cache_for(provider.clone(), 60, 1024 * 1024);

        let first = cache.get_snapshot().await.unwrap();
        tokio::time::advance(Duration::from_secs(30)).await;
        let second = cache.get_snapshot().await.unwrap();

        assert_eq!(first, second);
        assert_eq!(provider.list_users_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rebuild_after_expiry() {
        let provider = provider();
        let cache = cache_for(provider.clone(), 60, 1024 * 1024);

        cache.get_snapshot().await.unwrap();
        tokio::time::advance(Duration::from_secs(61)).await;
        cache.get_snapshot().await.unwrap();

        assert_eq!(provider.list_users_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disabled_cache_always_builds() {
        let provider = provider();
        let cache = cache_for(provider.clone(), 0, 1024 * 1024);

        cache.get_snapshot().await.unwrap();
        cache.get_snapshot().await.unwrap();

        assert!(!cache.enabled());
        assert_eq!(provider.list_users_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_oversized_snapshot_is_not_cached() {
        let provider = provider();
        let cache = cache_for(provider.clone(), 60, 16);

        let entries = cache.get_snapshot().await.unwrap();
        cache.get_snapshot().await.unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(provider.list_users_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_corrupt_entry_is_a_miss() {
        let provider = provider();
        let cache = cache_for(provider.clone(), 60, 1024 * 1024);

        *cache.slot.write().await = Some(CachedSnapshot {
            bytes: b"not json".to_vec(),
            stored_at: Instant::now(),
        });

        let entries = cache.get_snapshot().await.unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(provider.list_users_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_build_is_not_cached() {
        let provider = Arc::new(FakeProvider::new().fail_listing());
        let cache = cache_for(provider.clone(), 60, 1024 * 1024);

        assert!(cache.get_snapshot().await.is_err());
        assert!(cache.get_snapshot().await.is_err());
        assert_eq!(provider.list_users_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_misses_both_build() {
        let provider = Arc::new(
            FakeProvider::new()
                .with_user(FakeProvider::user(1, "alice"))
                .with_user(FakeProvider::user(2, "bob"))
                .with_listing_delay(Duration::from_millis(50)),
        );
        let cache = cache_for(provider.clone(), 60, 1024 * 1024);

        let (first, second) = tokio::join!(cache.get_snapshot(), cache.get_snapshot());
        let first = first.unwrap();
        let second = second.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
        assert_eq!(provider.list_users_count(), 2);

        // one of the two builds now serves later lookups
        let third = cache.get_snapshot().await.unwrap();
        assert_eq!(third, first);
        assert_eq!(provider.list_users_count(), 2);
    }

    #[test]
    fn test_undecodable_bytes_are_a_serialization_error() {
        assert!(matches!(decode(b"not json"), Err(Error::Serialization(_))));

        let entries = vec![DirectoryEntry::new("uid=alice,ou=users,dc=domain,dc=com")];
        assert_eq!(decode(&encode(&entries).unwrap()).unwrap(), entries);
    }
}
