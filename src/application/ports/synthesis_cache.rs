//! Synthesis Cache Port - 内容寻址的合成缓存
//!
//! key 为规范化合成请求的内容哈希，value 为音频产物

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::domain::synthesis::AudioArtifact;

/// Synthesis Cache 错误
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

/// 缓存统计信息
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub backend: &'static str,
    pub total_entries: usize,
    pub total_size_bytes: u64,
    pub hit_count: u64,
    pub miss_count: u64,
}

/// Synthesis Cache Port
///
/// - get: 过期或已失效的条目一律视为 miss
/// - put: 幂等；同 key 不同内容时后写者胜
/// - 并发安全，不需要跨 key 加锁
#[async_trait]
pub trait SynthesisCachePort: Send + Sync {
    async fn get(&self, content_hash: &str) -> Result<Option<AudioArtifact>, CacheError>;

    async fn put(&self, content_hash: &str, artifact: AudioArtifact) -> Result<(), CacheError>;

    /// 返回条目是否存在
    async fn invalidate(&self, content_hash: &str) -> Result<bool, CacheError>;

    /// 清空所有条目，返回删除数量
    async fn clear(&self) -> Result<usize, CacheError>;

    async fn stats(&self) -> CacheStats;
}
