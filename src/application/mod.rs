//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（JobManager、TtsProvider、SynthesisCache、ProviderHealth、TtsAnalytics 等）
//! - services: TtsAdapter（缓存、重试、fallback 编排）
//! - commands: CQRS 命令及处理器
//! - queries: CQRS 查询及处理器
//! - error: 应用层错误定义

pub mod commands;
pub mod error;
pub mod ports;
pub mod queries;
pub mod services;

// Re-exports
pub use commands::{
    handlers::{
        CancelJobHandler, ClearCacheHandler, InvalidateCacheHandler, SetTtsProviderHandler,
        SubmitVideoHandler,
    },
    CancelJob, ClearCache, InvalidateCache, SetTtsProvider, SubmitVideo,
};

pub use error::ApplicationError;

pub use queries::{
    handlers::{
        GetCacheStatsHandler, GetJobStatsHandler, GetJobStatusHandler, GetTtsAnalyticsHandler,
        GetTtsHealthHandler, ListJobsHandler, ProviderReport, TtsHealthReport, TtsLimits,
    },
    GetCacheStats, GetJobStats, GetJobStatus, GetTtsAnalytics, GetTtsHealth, ListJobs,
};

pub use services::{
    ProviderFailure, SynthesisError, SynthesisOutcome, TtsAdapter, TtsAdapterConfig,
};
