//! TTS HTTP Handlers - 健康、缓存、合成统计与管理员操作

use axum::{
    extract::{Query, State},
    Json,
};
use std::sync::Arc;

use crate::application::ports::{CacheStats, TtsAnalyticsStats};
use crate::application::{
    ClearCache, GetCacheStats, GetTtsAnalytics, GetTtsHealth, InvalidateCache, SetTtsProvider,
    TtsHealthReport,
};
use crate::infrastructure::http::dto::{
    AnalyticsQuery, ApiResponse, ClearCacheResponse, InvalidateCacheRequest,
    InvalidateCacheResponse, SetTtsProviderRequest, SetTtsProviderResponse,
};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

/// 提供方健康状态
pub async fn tts_health(State(state): State<Arc<AppState>>) -> Json<ApiResponse<TtsHealthReport>> {
    Json(ApiResponse::success(
        state.get_tts_health_handler.handle(GetTtsHealth),
    ))
}

/// 缓存统计
pub async fn cache_stats(State(state): State<Arc<AppState>>) -> Json<ApiResponse<CacheStats>> {
    Json(ApiResponse::success(
        state.get_cache_stats_handler.handle(GetCacheStats).await,
    ))
}

/// 合成统计，`days` 默认 1
pub async fn tts_analytics(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<ApiResponse<TtsAnalyticsStats>>, ApiError> {
    let mut analytics_query = GetTtsAnalytics::default();
    if let Some(days) = query.days {
        analytics_query.days = days;
    }
    let stats = state.get_tts_analytics_handler.handle(analytics_query)?;
    Ok(Json(ApiResponse::success(stats)))
}

/// 设置首选提供方
pub async fn set_tts_provider(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SetTtsProviderRequest>,
) -> Result<Json<ApiResponse<SetTtsProviderResponse>>, ApiError> {
    let provider = state.set_tts_provider_handler.handle(SetTtsProvider {
        provider: req.provider,
    })?;

    state.event_publisher.publish_provider_changed(provider, true);

    Ok(Json(ApiResponse::success(SetTtsProviderResponse {
        provider,
        message: format!("TTS provider set to {}", provider),
    })))
}

/// 使缓存条目失效
pub async fn invalidate_cache(
    State(state): State<Arc<AppState>>,
    Json(req): Json<InvalidateCacheRequest>,
) -> Result<Json<ApiResponse<InvalidateCacheResponse>>, ApiError> {
    let hash = req.hash.trim().to_string();
    let removed = state
        .invalidate_cache_handler
        .handle(InvalidateCache {
            content_hash: hash.clone(),
        })
        .await?;

    if removed {
        state.event_publisher.publish_cache_invalidated(&hash);
    }

    Ok(Json(ApiResponse::success(InvalidateCacheResponse {
        hash,
        removed,
    })))
}

/// 清空合成缓存
pub async fn clear_cache(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<ClearCacheResponse>>, ApiError> {
    let removed = state.clear_cache_handler.handle(ClearCache).await?;
    state.event_publisher.publish_cache_cleared(removed);

    Ok(Json(ApiResponse::success(ClearCacheResponse {
        removed,
        message: format!("Cleared {} cache entries", removed),
    })))
}
