//! Job Context - Aggregate Root

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{JobError, JobFailure, JobId, JobStatus, PipelineStage};
use crate::domain::synthesis::TtsProvenance;

/// Job 聚合根
///
/// 不变量:
/// - status 单调前进，completed / failed 为终态
/// - progress 单调不减，completed 时恰好为 100
/// - completed 必有 video_url，failed 必有 error
/// - script / template / user_id 创建后不可变
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    id: JobId,
    status: JobStatus,
    progress: u8,
    stage_message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    current_stage: Option<PipelineStage>,
    script: String,
    template: String,
    user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    video_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<JobFailure>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tts_provenance: Option<TtsProvenance>,
    cancel_requested: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Job {
    /// 创建新任务（pending）
    pub fn new(
        script: impl Into<String>,
        template: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Result<Self, JobError> {
        let script = script.into();
        if script.trim().is_empty() {
            return Err(JobError::EmptyScript);
        }

        let now = Utc::now();
        Ok(Self {
            id: JobId::new(),
            status: JobStatus::Pending,
            progress: 0,
            stage_message: "Video generation initiated".to_string(),
            current_stage: None,
            script,
            template: template.into(),
            user_id: user_id.into(),
            video_url: None,
            error: None,
            tts_provenance: None,
            cancel_requested: false,
            created_at: now,
            updated_at: now,
        })
    }

    /// 进入流水线阶段
    pub fn begin_stage(&mut self, stage: PipelineStage) -> Result<(), JobError> {
        self.ensure_transition(JobStatus::Processing)?;
        self.advance_progress(stage.progress())?;

        self.status = JobStatus::Processing;
        self.current_stage = Some(stage);
        self.stage_message = stage.message().to_string();
        self.touch();
        Ok(())
    }

    /// 阶段内更新描述（不改变状态与进度）
    pub fn set_stage_message(&mut self, message: impl Into<String>) -> Result<(), JobError> {
        if self.status.is_terminal() {
            return Err(JobError::Terminal(self.id));
        }
        self.stage_message = message.into();
        self.touch();
        Ok(())
    }

    pub fn record_provenance(&mut self, provenance: TtsProvenance) -> Result<(), JobError> {
        if self.status.is_terminal() {
            return Err(JobError::Terminal(self.id));
        }
        self.tts_provenance = Some(provenance);
        self.touch();
        Ok(())
    }

    /// 完成任务，video_url 与 completed 状态同时写入
    pub fn complete(&mut self, video_url: impl Into<String>) -> Result<(), JobError> {
        self.ensure_transition(JobStatus::Completed)?;
        self.advance_progress(100)?;

        self.status = JobStatus::Completed;
        self.video_url = Some(video_url.into());
        self.current_stage = None;
        self.stage_message = "Video generation complete!".to_string();
        self.touch();
        Ok(())
    }

    /// 任务失败，保留当前进度
    pub fn fail(&mut self, failure: JobFailure) -> Result<(), JobError> {
        self.ensure_transition(JobStatus::Failed)?;

        self.status = JobStatus::Failed;
        self.stage_message = format!("Error: {}", failure.message);
        self.error = Some(failure);
        self.touch();
        Ok(())
    }

    /// 管理员取消（协作式，由后台任务在阶段之间检查）
    pub fn request_cancel(&mut self) -> Result<(), JobError> {
        if self.status.is_terminal() {
            return Err(JobError::Terminal(self.id));
        }
        self.cancel_requested = true;
        self.touch();
        Ok(())
    }

    fn ensure_transition(&self, next: JobStatus) -> Result<(), JobError> {
        if self.status.is_terminal() {
            return Err(JobError::Terminal(self.id));
        }
        if !self.status.can_transition_to(next) {
            return Err(JobError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        Ok(())
    }

    fn advance_progress(&mut self, requested: u8) -> Result<(), JobError> {
        let requested = requested.min(100);
        if requested < self.progress {
            return Err(JobError::ProgressRegression {
                current: self.progress,
                requested,
            });
        }
        self.progress = requested;
        Ok(())
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    // Getters
    pub fn id(&self) -> JobId {
        self.id
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn stage_message(&self) -> &str {
        &self.stage_message
    }

    pub fn current_stage(&self) -> Option<PipelineStage> {
        self.current_stage
    }

    pub fn script(&self) -> &str {
        &self.script
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn video_url(&self) -> Option<&str> {
        self.video_url.as_deref()
    }

    pub fn error(&self) -> Option<&JobFailure> {
        self.error.as_ref()
    }

    pub fn tts_provenance(&self) -> Option<&TtsProvenance> {
        self.tts_provenance.as_ref()
    }

    pub fn is_cancel_requested(&self) -> bool {
        self.cancel_requested
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::job::JobErrorKind;

    fn new_job() -> Job {
        Job::new("Hello world", "presenter1", "u1").unwrap()
    }

    #[test]
    fn test_job_creation() {
        let job = new_job();
        assert_eq!(job.status(), JobStatus::Pending);
        assert_eq!(job.progress(), 0);
        assert!(job.video_url().is_none());
        assert!(job.error().is_none());
        assert_eq!(job.template(), "presenter1");
    }

    #[test]
    fn test_empty_script_rejected() {
        assert_eq!(Job::new("   ", "presenter1", "u1").unwrap_err(), JobError::EmptyScript);
    }

    #[test]
    fn test_full_lifecycle() {
        let mut job = new_job();
        for stage in PipelineStage::ALL {
            job.begin_stage(stage).unwrap();
            assert_eq!(job.status(), JobStatus::Processing);
            assert_eq!(job.progress(), stage.progress());
        }
        job.complete("http://localhost/media/videos/x.mp4").unwrap();
        assert_eq!(job.status(), JobStatus::Completed);
        assert_eq!(job.progress(), 100);
        assert!(job.video_url().is_some());
    }

    #[test]
    fn test_terminal_states_are_final() {
        let mut job = new_job();
        job.begin_stage(PipelineStage::Enhance).unwrap();
        job.fail(JobFailure::new(JobErrorKind::EnhanceFailure, "boom"))
            .unwrap();

        assert!(matches!(
            job.begin_stage(PipelineStage::Synthesize),
            Err(JobError::Terminal(_))
        ));
        assert!(job.complete("url").is_err());
        assert!(job.request_cancel().is_err());
        assert_eq!(job.status(), JobStatus::Failed);
        assert_eq!(job.error().unwrap().kind, JobErrorKind::EnhanceFailure);
    }

    #[test]
    fn test_progress_never_regresses() {
        let mut job = new_job();
        job.begin_stage(PipelineStage::Render).unwrap();
        let err = job.begin_stage(PipelineStage::Enhance).unwrap_err();
        assert_eq!(
            err,
            JobError::ProgressRegression {
                current: 60,
                requested: 10
            }
        );
        assert_eq!(job.progress(), 60);
        assert_eq!(job.current_stage(), Some(PipelineStage::Render));
    }

    #[test]
    fn test_pending_cannot_complete() {
        let mut job = new_job();
        assert!(matches!(
            job.complete("url"),
            Err(JobError::InvalidTransition { .. })
        ));
        assert!(job.video_url().is_none());
    }

    #[test]
    fn test_failure_keeps_progress() {
        let mut job = new_job();
        job.begin_stage(PipelineStage::Synthesize).unwrap();
        job.fail(JobFailure::cancelled()).unwrap();
        assert_eq!(job.progress(), 30);
        assert!(job.stage_message().starts_with("Error:"));
    }

    #[test]
    fn test_snapshot_serialization() {
        let job = new_job();
        let value = serde_json::to_value(&job).unwrap();
        assert_eq!(value["status"], "pending");
        assert_eq!(value["userId"], "u1");
        assert!(value.get("videoUrl").is_none());
    }
}
