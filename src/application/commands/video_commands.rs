//! Video Commands - 视频任务命令

use crate::domain::job::JobId;

/// 提交视频生成任务
#[derive(Debug, Clone)]
pub struct SubmitVideo {
    pub script: String,
    pub template: String,
    pub user_id: String,
}

/// 请求取消任务（协作式）
#[derive(Debug, Clone)]
pub struct CancelJob {
    pub job_id: JobId,
}
