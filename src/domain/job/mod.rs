//! Job Context - 视频生成任务限界上下文
//!
//! 职责:
//! - 任务状态机（pending → processing → completed | failed）
//! - 进度检查点与阶段描述
//! - 结构化失败信息

mod aggregate;
mod errors;
mod value_objects;

pub use aggregate::Job;
pub use errors::JobError;
pub use value_objects::{JobErrorKind, JobFailure, JobId, JobStatus, PipelineStage};
