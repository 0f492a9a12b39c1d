//! In-Memory Synthesis Cache Implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::application::ports::{CacheError, CacheStats, SynthesisCachePort};
use crate::domain::synthesis::AudioArtifact;

/// 缓存条目
#[derive(Debug, Clone)]
struct CacheEntry {
    artifact: AudioArtifact,
    expires_at: Option<DateTime<Utc>>,
}

impl CacheEntry {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map(|at| at <= now).unwrap_or(false)
    }
}

/// 内存合成缓存
pub struct InMemorySynthesisCache {
    entries: DashMap<String, CacheEntry>,
    ttl: Option<Duration>,
    hit_count: AtomicU64,
    miss_count: AtomicU64,
}

impl InMemorySynthesisCache {
    pub fn new(ttl: Option<Duration>) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            hit_count: AtomicU64::new(0),
            miss_count: AtomicU64::new(0),
        }
    }

    fn expires_at(&self, created_at: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.ttl
            .and_then(|ttl| chrono::Duration::from_std(ttl).ok())
            .map(|ttl| created_at + ttl)
    }
}

#[async_trait]
impl SynthesisCachePort for InMemorySynthesisCache {
    async fn get(&self, content_hash: &str) -> Result<Option<AudioArtifact>, CacheError> {
        let now = Utc::now();
        let hit = self
            .entries
            .get(content_hash)
            .filter(|e| !e.is_expired(now))
            .map(|e| e.artifact.clone());

        if hit.is_some() {
            self.hit_count.fetch_add(1, Ordering::Relaxed);
        } else {
            self.entries.remove_if(content_hash, |_, e| e.is_expired(now));
            self.miss_count.fetch_add(1, Ordering::Relaxed);
        }
        Ok(hit)
    }

    async fn put(&self, content_hash: &str, artifact: AudioArtifact) -> Result<(), CacheError> {
        let now = Utc::now();
        // 内容相同且未过期则保持原条目
        let unchanged = self
            .entries
            .get(content_hash)
            .map(|e| !e.is_expired(now) && e.artifact.audio_data == artifact.audio_data)
            .unwrap_or(false);

        if !unchanged {
            tracing::debug!(
                content_hash = %content_hash,
                size_bytes = artifact.size_bytes(),
                "Audio cached"
            );
            self.entries.insert(
                content_hash.to_string(),
                CacheEntry {
                    artifact,
                    expires_at: self.expires_at(now),
                },
            );
        }
        Ok(())
    }

    async fn invalidate(&self, content_hash: &str) -> Result<bool, CacheError> {
        let removed = self.entries.remove(content_hash).is_some();
        tracing::debug!(content_hash = %content_hash, removed, "Cache entry invalidated");
        Ok(removed)
    }

    async fn clear(&self) -> Result<usize, CacheError> {
        let removed = self.entries.len();
        self.entries.clear();
        tracing::info!(removed, "Synthesis cache cleared");
        Ok(removed)
    }

    async fn stats(&self) -> CacheStats {
        CacheStats {
            backend: "memory",
            total_entries: self.entries.len(),
            total_size_bytes: self.entries.iter().map(|e| e.artifact.size_bytes()).sum(),
            hit_count: self.hit_count.load(Ordering::Relaxed),
            miss_count: self.miss_count.load(Ordering::Relaxed),
        }
    }
}
