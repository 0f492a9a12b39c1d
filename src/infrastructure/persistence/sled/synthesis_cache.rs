//! Sled-based Synthesis Cache Implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sled::Db;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::application::ports::{CacheError, CacheStats, SynthesisCachePort};
use crate::domain::synthesis::{AudioArtifact, ProviderId};

const KEY_PREFIX: &str = "cache:";

/// Sled 缓存配置
#[derive(Debug, Clone)]
pub struct SledCacheConfig {
    /// 数据库路径
    pub db_path: String,
    /// 条目有效期，None 表示永不过期
    pub ttl: Option<Duration>,
}

impl Default for SledCacheConfig {
    fn default() -> Self {
        Self {
            db_path: "data/tts_cache.sled".to_string(),
            ttl: Some(Duration::from_secs(168 * 3600)),
        }
    }
}

/// 内部缓存条目
#[derive(Debug, Clone, Serialize, Deserialize)]
struct InternalCacheEntry {
    audio_data: Vec<u8>,
    size_bytes: u64,
    content_hash: String,
    content_type: String,
    sample_rate: Option<u32>,
    provider: ProviderId,
    created_at: i64,
    expires_at: Option<i64>,
}

impl InternalCacheEntry {
    fn from_artifact(artifact: AudioArtifact, now: i64, ttl: Option<Duration>) -> Self {
        Self {
            size_bytes: artifact.audio_data.len() as u64,
            audio_data: artifact.audio_data,
            content_hash: artifact.content_hash,
            content_type: artifact.content_type,
            sample_rate: artifact.sample_rate,
            provider: artifact.provider,
            created_at: artifact.created_at.timestamp_millis(),
            expires_at: ttl.map(|ttl| now + ttl.as_millis() as i64),
        }
    }

    fn is_expired(&self, now: i64) -> bool {
        self.expires_at.map(|at| at <= now).unwrap_or(false)
    }

    fn into_artifact(self) -> AudioArtifact {
        AudioArtifact {
            content_hash: self.content_hash,
            audio_data: self.audio_data,
            content_type: self.content_type,
            sample_rate: self.sample_rate,
            provider: self.provider,
            created_at: DateTime::from_timestamp_millis(self.created_at).unwrap_or_else(Utc::now),
        }
    }
}

/// Sled 合成缓存
pub struct SledSynthesisCache {
    db: Db,
    ttl: Option<Duration>,
    current_size: AtomicU64,
    hit_count: AtomicU64,
    miss_count: AtomicU64,
}

impl SledSynthesisCache {
    /// 创建新的缓存实例
    pub fn new(config: &SledCacheConfig) -> Result<Self, CacheError> {
        let db = sled::open(&config.db_path)
            .map_err(|e| CacheError::DatabaseError(e.to_string()))?;

        // 计算当前缓存大小
        let current_size = Self::calculate_total_size(&db)?;

        tracing::info!(
            db_path = %config.db_path,
            ttl_secs = config.ttl.map(|t| t.as_secs()),
            current_size = current_size,
            "SledSynthesisCache initialized"
        );

        Ok(Self {
            db,
            ttl: config.ttl,
            current_size: AtomicU64::new(current_size),
            hit_count: AtomicU64::new(0),
            miss_count: AtomicU64::new(0),
        })
    }

    /// 打开现有缓存
    pub fn open<P: AsRef<Path>>(path: P, ttl: Option<Duration>) -> Result<Self, CacheError> {
        let config = SledCacheConfig {
            db_path: path.as_ref().to_string_lossy().to_string(),
            ttl,
        };
        Self::new(&config)
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    fn key(content_hash: &str) -> String {
        format!("{}{}", KEY_PREFIX, content_hash)
    }

    /// 计算数据库中所有条目的总大小
    fn calculate_total_size(db: &Db) -> Result<u64, CacheError> {
        let mut total = 0u64;
        for item in db.scan_prefix(KEY_PREFIX) {
            let (_, value) = item.map_err(|e| CacheError::DatabaseError(e.to_string()))?;
            if let Ok(entry) = bincode::deserialize::<InternalCacheEntry>(&value) {
                total += entry.size_bytes;
            }
        }
        Ok(total)
    }

    fn read_entry(&self, key: &str) -> Result<Option<InternalCacheEntry>, CacheError> {
        match self
            .db
            .get(key)
            .map_err(|e| CacheError::DatabaseError(e.to_string()))?
        {
            Some(value) => bincode::deserialize(&value)
                .map(Some)
                .map_err(|e| CacheError::SerializationError(e.to_string())),
            None => Ok(None),
        }
    }

    fn remove_entry(&self, key: &str) -> Result<bool, CacheError> {
        let removed = self
            .db
            .remove(key)
            .map_err(|e| CacheError::DatabaseError(e.to_string()))?;

        match removed {
            Some(value) => {
                if let Ok(entry) = bincode::deserialize::<InternalCacheEntry>(&value) {
                    self.current_size.fetch_sub(entry.size_bytes, Ordering::Relaxed);
                }
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// 刷新到磁盘
    pub async fn flush(&self) -> Result<(), CacheError> {
        self.db
            .flush_async()
            .await
            .map_err(|e| CacheError::DatabaseError(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl SynthesisCachePort for SledSynthesisCache {
    async fn get(&self, content_hash: &str) -> Result<Option<AudioArtifact>, CacheError> {
        let key = Self::key(content_hash);
        let now = Utc::now().timestamp_millis();

        let entry = match self.read_entry(&key) {
            Ok(entry) => entry,
            Err(CacheError::SerializationError(e)) => {
                // 无法解码的条目（旧格式）直接丢弃，按 miss 处理
                tracing::warn!(content_hash = %content_hash, error = %e, "Dropping undecodable cache entry");
                self.remove_entry(&key)?;
                self.miss_count.fetch_add(1, Ordering::Relaxed);
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        match entry {
            Some(entry) if !entry.is_expired(now) => {
                self.hit_count.fetch_add(1, Ordering::Relaxed);
                Ok(Some(entry.into_artifact()))
            }
            Some(_) => {
                self.remove_entry(&key)?;
                self.miss_count.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(content_hash = %content_hash, "Cache entry expired");
                Ok(None)
            }
            None => {
                self.miss_count.fetch_add(1, Ordering::Relaxed);
                Ok(None)
            }
        }
    }

    async fn put(&self, content_hash: &str, artifact: AudioArtifact) -> Result<(), CacheError> {
        let key = Self::key(content_hash);
        let now = Utc::now().timestamp_millis();

        // 内容相同且未过期则保持原条目，无法解码的旧条目直接覆盖
        match self.read_entry(&key) {
            Ok(Some(existing))
                if !existing.is_expired(now) && existing.audio_data == artifact.audio_data =>
            {
                return Ok(());
            }
            Ok(_) => {}
            Err(CacheError::SerializationError(e)) => {
                tracing::warn!(content_hash = %content_hash, error = %e, "Overwriting undecodable cache entry");
            }
            Err(e) => return Err(e),
        }

        let entry = InternalCacheEntry::from_artifact(artifact, now, self.ttl);
        let size_bytes = entry.size_bytes;
        let value = bincode::serialize(&entry)
            .map_err(|e| CacheError::SerializationError(e.to_string()))?;

        let previous = self
            .db
            .insert(&key, value)
            .map_err(|e| CacheError::DatabaseError(e.to_string()))?;

        if let Some(old) = previous {
            if let Ok(old) = bincode::deserialize::<InternalCacheEntry>(&old) {
                self.current_size.fetch_sub(old.size_bytes, Ordering::Relaxed);
            }
        }
        self.current_size.fetch_add(size_bytes, Ordering::Relaxed);

        tracing::debug!(
            content_hash = %content_hash,
            size_bytes = size_bytes,
            "Audio cached"
        );

        Ok(())
    }

    async fn invalidate(&self, content_hash: &str) -> Result<bool, CacheError> {
        let removed = self.remove_entry(&Self::key(content_hash))?;
        tracing::debug!(content_hash = %content_hash, removed, "Cache entry invalidated");
        Ok(removed)
    }

    async fn clear(&self) -> Result<usize, CacheError> {
        let keys: Vec<_> = self
            .db
            .scan_prefix(KEY_PREFIX)
            .keys()
            .collect::<Result<_, _>>()
            .map_err(|e| CacheError::DatabaseError(e.to_string()))?;

        let mut removed = 0;
        for key in keys {
            if self
                .db
                .remove(&key)
                .map_err(|e| CacheError::DatabaseError(e.to_string()))?
                .is_some()
            {
                removed += 1;
            }
        }
        self.current_size.store(0, Ordering::Relaxed);

        tracing::info!(removed, "Synthesis cache cleared");
        Ok(removed)
    }

    async fn stats(&self) -> CacheStats {
        CacheStats {
            backend: "sled",
            total_entries: self.db.scan_prefix(KEY_PREFIX).count(),
            total_size_bytes: self.current_size.load(Ordering::Relaxed),
            hit_count: self.hit_count.load(Ordering::Relaxed),
            miss_count: self.miss_count.load(Ordering::Relaxed),
        }
    }
}
