//! Job Queries - 任务查询

use crate::domain::job::JobId;

/// 获取任务状态
#[derive(Debug, Clone)]
pub struct GetJobStatus {
    pub job_id: JobId,
}

/// 列出任务，可按用户过滤
#[derive(Debug, Clone, Default)]
pub struct ListJobs {
    pub user_id: Option<String>,
}

/// 任务统计
#[derive(Debug, Clone, Default)]
pub struct GetJobStats;
