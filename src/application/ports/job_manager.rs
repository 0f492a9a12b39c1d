//! Job Manager Port - 视频任务管理
//!
//! 任务记录与调度队列的抽象接口，具体实现在 infrastructure/memory 层。
//! 每个方法在单条记录上原子地完成“校验 + 修改”，并返回提交后的快照

use serde::Serialize;
use thiserror::Error;

use crate::domain::job::{Job, JobError, JobFailure, JobId, PipelineStage};
use crate::domain::synthesis::TtsProvenance;

/// Job Manager 错误
#[derive(Debug, Error)]
pub enum JobManagerError {
    #[error("Job not found: {0}")]
    NotFound(JobId),

    #[error(transparent)]
    Domain(#[from] JobError),

    #[error("Failed to schedule job: {0}")]
    Schedule(String),
}

/// 任务统计
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct JobStats {
    pub total: usize,
    pub pending: usize,
    pub processing: usize,
    pub completed: usize,
    pub failed: usize,
}

/// Job Manager Port
pub trait JobManagerPort: Send + Sync {
    /// 保存任务并调度后台执行（非阻塞）
    fn submit(&self, job: Job) -> Result<JobId, JobManagerError>;

    /// 获取任务快照
    fn get(&self, job_id: JobId) -> Option<Job>;

    /// 按创建顺序列出任务，可按 user_id 过滤
    fn list(&self, user_id: Option<&str>) -> Vec<Job>;

    fn begin_stage(&self, job_id: JobId, stage: PipelineStage) -> Result<Job, JobManagerError>;

    fn set_stage_message(&self, job_id: JobId, message: &str) -> Result<Job, JobManagerError>;

    fn record_provenance(
        &self,
        job_id: JobId,
        provenance: TtsProvenance,
    ) -> Result<Job, JobManagerError>;

    fn complete(&self, job_id: JobId, video_url: &str) -> Result<Job, JobManagerError>;

    fn fail(&self, job_id: JobId, failure: JobFailure) -> Result<Job, JobManagerError>;

    /// 标记取消（协作式）
    fn request_cancel(&self, job_id: JobId) -> Result<Job, JobManagerError>;

    fn is_cancel_requested(&self, job_id: JobId) -> bool;

    fn stats(&self) -> JobStats;
}
