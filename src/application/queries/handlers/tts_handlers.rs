//! TTS Query Handlers

use serde::Serialize;
use std::sync::Arc;

use crate::application::error::ApplicationError;
use crate::application::ports::{
    CacheStats, ProviderHealthPort, ProviderHealthStatus, SynthesisCachePort, TtsAnalyticsPort,
    TtsAnalyticsStats,
};
use crate::application::queries::{GetCacheStats, GetTtsAnalytics, GetTtsHealth};
use crate::application::services::TtsAdapter;
use crate::domain::synthesis::ProviderId;

// ============================================================================
// Response DTOs
// ============================================================================

/// 单个提供方报告
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderReport {
    #[serde(flatten)]
    pub status: ProviderHealthStatus,
    pub configured: bool,
}

/// 输入与重试限制
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TtsLimits {
    pub max_input_chars: usize,
    pub max_attempts: u32,
    pub retry_delay_ms: u64,
    pub attempt_timeout_ms: u64,
    pub failure_threshold: u32,
    pub cooldown_secs: u64,
}

/// TTS 健康报告
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TtsHealthReport {
    /// 当前首选
    pub current_provider: ProviderId,
    pub default_provider: ProviderId,
    /// 管理员覆盖，未设置为 None
    pub override_provider: Option<ProviderId>,
    pub providers: Vec<ProviderReport>,
    pub limits: TtsLimits,
}

// ============================================================================
// Handlers
// ============================================================================

/// GetTtsHealth Handler
pub struct GetTtsHealthHandler {
    tts: Arc<TtsAdapter>,
    health: Arc<dyn ProviderHealthPort>,
}

impl GetTtsHealthHandler {
    pub fn new(tts: Arc<TtsAdapter>, health: Arc<dyn ProviderHealthPort>) -> Self {
        Self { tts, health }
    }

    pub fn handle(&self, _query: GetTtsHealth) -> TtsHealthReport {
        let config = self.tts.config();
        let providers = self
            .health
            .all()
            .into_iter()
            .map(|status| ProviderReport {
                configured: self.tts.is_configured(status.provider),
                status,
            })
            .collect();

        TtsHealthReport {
            current_provider: self.tts.preferred_provider(),
            default_provider: config.default_provider,
            override_provider: self.tts.preference_override(),
            providers,
            limits: TtsLimits {
                max_input_chars: config.max_input_chars,
                max_attempts: config.max_attempts,
                retry_delay_ms: config.retry_delay.as_millis() as u64,
                attempt_timeout_ms: config.attempt_timeout.as_millis() as u64,
                failure_threshold: config.failure_threshold,
                cooldown_secs: config.cooldown.as_secs(),
            },
        }
    }
}

/// GetCacheStats Handler
pub struct GetCacheStatsHandler {
    cache: Arc<dyn SynthesisCachePort>,
}

impl GetCacheStatsHandler {
    pub fn new(cache: Arc<dyn SynthesisCachePort>) -> Self {
        Self { cache }
    }

    pub async fn handle(&self, _query: GetCacheStats) -> CacheStats {
        self.cache.stats().await
    }
}

/// 统计窗口上限（天）
pub const MAX_ANALYTICS_DAYS: u32 = 365;

/// GetTtsAnalytics Handler
pub struct GetTtsAnalyticsHandler {
    analytics: Arc<dyn TtsAnalyticsPort>,
}

impl GetTtsAnalyticsHandler {
    pub fn new(analytics: Arc<dyn TtsAnalyticsPort>) -> Self {
        Self { analytics }
    }

    pub fn handle(&self, query: GetTtsAnalytics) -> Result<TtsAnalyticsStats, ApplicationError> {
        if query.days == 0 || query.days > MAX_ANALYTICS_DAYS {
            return Err(ApplicationError::ValidationError(format!(
                "days must be between 1 and {}",
                MAX_ANALYTICS_DAYS
            )));
        }
        Ok(self.analytics.stats(query.days))
    }
}
