//! Job Context - Errors

use thiserror::Error;

use super::{JobId, JobStatus};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum JobError {
    #[error("脚本不能为空")]
    EmptyScript,

    #[error("非法状态迁移: {from} -> {to}")]
    InvalidTransition { from: JobStatus, to: JobStatus },

    #[error("进度不能回退: {current} -> {requested}")]
    ProgressRegression { current: u8, requested: u8 },

    #[error("任务已结束: {0}")]
    Terminal(JobId),
}
