//! Job HTTP Handlers

use axum::{
    extract::{Path, Query, State},
    Json,
};
use std::sync::Arc;

use super::video::parse_job_id;
use crate::application::ports::JobStats;
use crate::application::{CancelJob, GetJobStats, ListJobs};
use crate::infrastructure::http::dto::{ApiResponse, JobStatusResponse, UserFilter};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

/// 列出任务（按创建顺序）
pub async fn list_jobs(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<UserFilter>,
) -> Json<ApiResponse<Vec<JobStatusResponse>>> {
    let jobs = state.list_jobs_handler.handle(ListJobs {
        user_id: filter.user_id,
    });

    Json(ApiResponse::success(
        jobs.iter().map(JobStatusResponse::from).collect(),
    ))
}

/// 任务统计
pub async fn job_stats(State(state): State<Arc<AppState>>) -> Json<ApiResponse<JobStats>> {
    Json(ApiResponse::success(
        state.get_job_stats_handler.handle(GetJobStats),
    ))
}

/// 请求取消任务
pub async fn cancel_job(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<JobStatusResponse>>, ApiError> {
    let job_id = parse_job_id(&id)?;
    let job = state.cancel_job_handler.handle(CancelJob { job_id })?;

    Ok(Json(ApiResponse::success(JobStatusResponse::from(&job))))
}
