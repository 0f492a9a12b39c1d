//! Job Context - Value Objects

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// 任务唯一标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for JobId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// 任务状态
///
/// 只能沿 pending → processing → {completed | failed} 前进，
/// completed / failed 为终态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    /// processing → processing 表示阶段推进，允许
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        match (self, next) {
            (JobStatus::Pending, JobStatus::Processing) => true,
            (JobStatus::Pending, JobStatus::Failed) => true,
            (JobStatus::Processing, JobStatus::Processing) => true,
            (JobStatus::Processing, JobStatus::Completed) => true,
            (JobStatus::Processing, JobStatus::Failed) => true,
            _ => false,
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 流水线阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Enhance,
    Synthesize,
    Render,
    Upload,
}

impl PipelineStage {
    /// 严格按顺序执行
    pub const ALL: [PipelineStage; 4] = [
        PipelineStage::Enhance,
        PipelineStage::Synthesize,
        PipelineStage::Render,
        PipelineStage::Upload,
    ];

    /// 阶段开始时写入的进度检查点
    pub fn progress(&self) -> u8 {
        match self {
            PipelineStage::Enhance => 10,
            PipelineStage::Synthesize => 30,
            PipelineStage::Render => 60,
            PipelineStage::Upload => 85,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            PipelineStage::Enhance => "Enhancing script...",
            PipelineStage::Synthesize => "Generating voiceover...",
            PipelineStage::Render => "Creating avatar video...",
            PipelineStage::Upload => "Uploading final video...",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::Enhance => "enhance",
            PipelineStage::Synthesize => "synthesize",
            PipelineStage::Render => "render",
            PipelineStage::Upload => "upload",
        }
    }
}

/// 失败类型（对外稳定的 kind 标签）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobErrorKind {
    ValidationError,
    ProviderTimeout,
    ProviderTransportError,
    #[serde(rename = "TTSFailure")]
    TtsFailure,
    EnhanceFailure,
    RenderFailure,
    StorageFailure,
    CancellationError,
}

impl JobErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobErrorKind::ValidationError => "ValidationError",
            JobErrorKind::ProviderTimeout => "ProviderTimeout",
            JobErrorKind::ProviderTransportError => "ProviderTransportError",
            JobErrorKind::TtsFailure => "TTSFailure",
            JobErrorKind::EnhanceFailure => "EnhanceFailure",
            JobErrorKind::RenderFailure => "RenderFailure",
            JobErrorKind::StorageFailure => "StorageFailure",
            JobErrorKind::CancellationError => "CancellationError",
        }
    }
}

impl fmt::Display for JobErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 结构化失败信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobFailure {
    pub kind: JobErrorKind,
    pub message: String,
}

impl JobFailure {
    /// message 为空时使用 kind 作为兜底，保证对外永远非空
    pub fn new(kind: JobErrorKind, message: impl Into<String>) -> Self {
        let message = message.into();
        let message = if message.trim().is_empty() {
            kind.as_str().to_string()
        } else {
            message
        };
        Self { kind, message }
    }

    pub fn cancelled() -> Self {
        Self::new(JobErrorKind::CancellationError, "Job cancelled by administrator")
    }
}

impl fmt::Display for JobFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_transitions() {
        assert!(JobStatus::Pending.can_transition_to(JobStatus::Processing));
        assert!(JobStatus::Processing.can_transition_to(JobStatus::Completed));
        assert!(!JobStatus::Completed.can_transition_to(JobStatus::Failed));
        assert!(!JobStatus::Failed.can_transition_to(JobStatus::Processing));
        assert!(!JobStatus::Processing.can_transition_to(JobStatus::Pending));
        assert!(!JobStatus::Pending.can_transition_to(JobStatus::Completed));
    }

    #[test]
    fn test_stage_progress_is_increasing() {
        let checkpoints: Vec<u8> = PipelineStage::ALL.iter().map(|s| s.progress()).collect();
        assert!(checkpoints.windows(2).all(|w| w[0] < w[1]));
        assert!(checkpoints.iter().all(|p| *p < 100));
    }

    #[test]
    fn test_error_kind_serialization() {
        let json = serde_json::to_string(&JobErrorKind::TtsFailure).unwrap();
        assert_eq!(json, "\"TTSFailure\"");
        let json = serde_json::to_string(&JobErrorKind::ValidationError).unwrap();
        assert_eq!(json, "\"ValidationError\"");
    }

    #[test]
    fn test_failure_message_never_empty() {
        let failure = JobFailure::new(JobErrorKind::RenderFailure, "  ");
        assert_eq!(failure.message, "RenderFailure");
    }

    #[test]
    fn test_job_id_parse() {
        let id = JobId::new();
        let parsed: JobId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
        assert!("not-a-uuid".parse::<JobId>().is_err());
    }
}
