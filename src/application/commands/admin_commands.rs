//! Admin Commands - 管理操作

/// 设置首选 TTS 提供方
#[derive(Debug, Clone)]
pub struct SetTtsProvider {
    pub provider: String,
}

/// 使缓存条目失效
#[derive(Debug, Clone)]
pub struct InvalidateCache {
    pub content_hash: String,
}

/// 清空整个合成缓存
#[derive(Debug, Clone, Default)]
pub struct ClearCache;
