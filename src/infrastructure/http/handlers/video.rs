//! Video HTTP Handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::application::{GetJobStatus, SubmitVideo};
use crate::domain::job::JobId;
use crate::infrastructure::http::dto::{
    ApiResponse, GenerateVideoRequest, JobStartedResponse, JobStatusResponse,
};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

/// 提交视频生成任务，立即返回
pub async fn generate_video(
    State(state): State<Arc<AppState>>,
    Json(req): Json<GenerateVideoRequest>,
) -> Result<(StatusCode, Json<ApiResponse<JobStartedResponse>>), ApiError> {
    let job = state.submit_video_handler.handle(SubmitVideo {
        script: req.script,
        template: req.template,
        user_id: req.user_id,
    })?;

    Ok((
        StatusCode::ACCEPTED,
        Json(ApiResponse::success(JobStartedResponse::from(&job))),
    ))
}

/// 查询任务状态
pub async fn video_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<JobStatusResponse>>, ApiError> {
    let job_id = parse_job_id(&id)?;
    let job = state
        .get_job_status_handler
        .handle(GetJobStatus { job_id })?;

    Ok(Json(ApiResponse::success(JobStatusResponse::from(&job))))
}

/// 非法 ID 与不存在的任务同样处理
pub(super) fn parse_job_id(id: &str) -> Result<JobId, ApiError> {
    id.parse()
        .map_err(|_| ApiError::NotFound(format!("Job not found: {}", id)))
}
