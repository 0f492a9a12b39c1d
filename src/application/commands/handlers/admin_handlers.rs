//! Admin Command Handlers

use std::sync::Arc;

use crate::application::commands::{ClearCache, InvalidateCache, SetTtsProvider};
use crate::application::error::ApplicationError;
use crate::application::ports::SynthesisCachePort;
use crate::application::services::TtsAdapter;
use crate::domain::synthesis::ProviderId;

/// SetTtsProvider Handler
///
/// 只改变首选顺序，不关闭 fallback；未知名称不修改当前设置
pub struct SetTtsProviderHandler {
    tts: Arc<TtsAdapter>,
}

impl SetTtsProviderHandler {
    pub fn new(tts: Arc<TtsAdapter>) -> Self {
        Self { tts }
    }

    pub fn handle(&self, cmd: SetTtsProvider) -> Result<ProviderId, ApplicationError> {
        let provider: ProviderId = cmd
            .provider
            .parse()
            .map_err(ApplicationError::validation)?;

        if !self.tts.is_configured(provider) {
            tracing::warn!(provider = %provider, "Preferring a provider that is not configured");
        }

        self.tts.set_preferred_provider(Some(provider));
        Ok(provider)
    }
}

/// InvalidateCache Handler
pub struct InvalidateCacheHandler {
    cache: Arc<dyn SynthesisCachePort>,
}

impl InvalidateCacheHandler {
    pub fn new(cache: Arc<dyn SynthesisCachePort>) -> Self {
        Self { cache }
    }

    /// 返回条目是否存在
    pub async fn handle(&self, cmd: InvalidateCache) -> Result<bool, ApplicationError> {
        let hash = cmd.content_hash.trim();
        if hash.is_empty() {
            return Err(ApplicationError::validation("Content hash is required"));
        }

        let removed = self.cache.invalidate(hash).await?;
        tracing::info!(content_hash = %hash, removed, "Cache invalidation requested");
        Ok(removed)
    }
}

/// ClearCache Handler
pub struct ClearCacheHandler {
    cache: Arc<dyn SynthesisCachePort>,
}

impl ClearCacheHandler {
    pub fn new(cache: Arc<dyn SynthesisCachePort>) -> Self {
        Self { cache }
    }

    /// 返回删除的条目数
    pub async fn handle(&self, _cmd: ClearCache) -> Result<usize, ApplicationError> {
        Ok(self.cache.clear().await?)
    }
}
