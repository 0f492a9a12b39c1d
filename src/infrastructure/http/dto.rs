//! Data Transfer Objects

use serde::{Deserialize, Serialize};

use crate::domain::job::{Job, JobErrorKind};
use crate::domain::synthesis::{ProviderId, TtsProvenance};

// ============================================================================
// 统一响应结构
// ============================================================================

/// 统一 API 响应格式
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub errno: i32,
    pub error: String,
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    /// 成功响应
    pub fn success(data: T) -> Self {
        Self {
            errno: 0,
            error: String::new(),
            data: Some(data),
        }
    }
}

// ============================================================================
// Video DTOs
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateVideoRequest {
    /// 缺失时按空脚本处理，由校验返回错误
    #[serde(default)]
    pub script: String,
    #[serde(default = "default_template")]
    pub template: String,
    #[serde(default = "default_user")]
    pub user_id: String,
}

fn default_template() -> String {
    "default".to_string()
}

fn default_user() -> String {
    "anonymous".to_string()
}

/// 提交后立即返回
#[derive(Debug, Serialize)]
pub struct JobStartedResponse {
    pub id: String,
    pub status: &'static str,
    pub message: String,
}

impl From<&Job> for JobStartedResponse {
    fn from(job: &Job) -> Self {
        Self {
            id: job.id().to_string(),
            status: "started",
            message: job.stage_message().to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct JobErrorDto {
    pub kind: JobErrorKind,
    pub message: String,
}

/// 任务快照
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatusResponse {
    pub id: String,
    pub status: &'static str,
    pub message: String,
    pub progress: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JobErrorDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tts_provenance: Option<TtsProvenance>,
    pub user_id: String,
    pub template: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&Job> for JobStatusResponse {
    fn from(job: &Job) -> Self {
        Self {
            id: job.id().to_string(),
            status: job.status().as_str(),
            message: job.stage_message().to_string(),
            progress: job.progress(),
            video_url: job.video_url().map(str::to_string),
            error: job.error().map(|e| JobErrorDto {
                kind: e.kind,
                message: e.message.clone(),
            }),
            tts_provenance: job.tts_provenance().cloned(),
            user_id: job.user_id().to_string(),
            template: job.template().to_string(),
            created_at: job.created_at().to_rfc3339(),
            updated_at: job.updated_at().to_rfc3339(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserFilter {
    pub user_id: Option<String>,
}

// ============================================================================
// Admin DTOs
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct SetTtsProviderRequest {
    #[serde(default)]
    pub provider: String,
}

#[derive(Debug, Serialize)]
pub struct SetTtsProviderResponse {
    pub provider: ProviderId,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct InvalidateCacheRequest {
    #[serde(default)]
    pub hash: String,
}

#[derive(Debug, Serialize)]
pub struct InvalidateCacheResponse {
    pub hash: String,
    pub removed: bool,
}

#[derive(Debug, Serialize)]
pub struct ClearCacheResponse {
    pub removed: usize,
    pub message: String,
}

// ============================================================================
// Analytics DTOs
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct AnalyticsQuery {
    pub days: Option<u32>,
}
