//! Application State
//!
//! 包含所有 Command/Query Handlers 的应用状态

use std::sync::Arc;

use crate::application::{
    ports::{JobManagerPort, ProviderHealthPort, SynthesisCachePort, TtsAnalyticsPort},
    // Command handlers
    CancelJobHandler, ClearCacheHandler, InvalidateCacheHandler, SetTtsProviderHandler,
    SubmitVideoHandler,
    // Query handlers
    GetCacheStatsHandler, GetJobStatsHandler, GetJobStatusHandler, GetTtsAnalyticsHandler,
    GetTtsHealthHandler, ListJobsHandler,
    TtsAdapter,
};
use crate::infrastructure::events::EventPublisher;

/// 应用状态
pub struct AppState {
    // ========== Shared ==========
    pub event_publisher: Arc<EventPublisher>,

    // ========== Command Handlers ==========
    pub submit_video_handler: SubmitVideoHandler,
    pub cancel_job_handler: CancelJobHandler,
    pub set_tts_provider_handler: SetTtsProviderHandler,
    pub invalidate_cache_handler: InvalidateCacheHandler,
    pub clear_cache_handler: ClearCacheHandler,

    // ========== Query Handlers ==========
    pub get_job_status_handler: GetJobStatusHandler,
    pub list_jobs_handler: ListJobsHandler,
    pub get_job_stats_handler: GetJobStatsHandler,
    pub get_tts_health_handler: GetTtsHealthHandler,
    pub get_cache_stats_handler: GetCacheStatsHandler,
    pub get_tts_analytics_handler: GetTtsAnalyticsHandler,
}

impl AppState {
    /// 创建应用状态
    pub fn new(
        job_manager: Arc<dyn JobManagerPort>,
        tts: Arc<TtsAdapter>,
        cache: Arc<dyn SynthesisCachePort>,
        health: Arc<dyn ProviderHealthPort>,
        analytics: Arc<dyn TtsAnalyticsPort>,
        event_publisher: Arc<EventPublisher>,
    ) -> Self {
        Self {
            event_publisher,

            // Command handlers
            submit_video_handler: SubmitVideoHandler::new(job_manager.clone()),
            cancel_job_handler: CancelJobHandler::new(job_manager.clone()),
            set_tts_provider_handler: SetTtsProviderHandler::new(tts.clone()),
            invalidate_cache_handler: InvalidateCacheHandler::new(cache.clone()),
            clear_cache_handler: ClearCacheHandler::new(cache.clone()),

            // Query handlers
            get_job_status_handler: GetJobStatusHandler::new(job_manager.clone()),
            list_jobs_handler: ListJobsHandler::new(job_manager.clone()),
            get_job_stats_handler: GetJobStatsHandler::new(job_manager),
            get_tts_health_handler: GetTtsHealthHandler::new(tts, health),
            get_cache_stats_handler: GetCacheStatsHandler::new(cache),
            get_tts_analytics_handler: GetTtsAnalyticsHandler::new(analytics),
        }
    }
}
