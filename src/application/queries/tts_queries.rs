//! TTS Queries - 提供方健康、缓存与合成统计查询

/// 提供方健康与当前首选
#[derive(Debug, Clone, Default)]
pub struct GetTtsHealth;

/// 缓存统计
#[derive(Debug, Clone, Default)]
pub struct GetCacheStats;

/// 最近若干天的合成统计
#[derive(Debug, Clone)]
pub struct GetTtsAnalytics {
    pub days: u32,
}

impl Default for GetTtsAnalytics {
    fn default() -> Self {
        Self { days: 1 }
    }
}
