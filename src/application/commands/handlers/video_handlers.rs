//! Video Command Handlers

use std::sync::Arc;

use crate::application::commands::{CancelJob, SubmitVideo};
use crate::application::error::ApplicationError;
use crate::application::ports::{JobManagerError, JobManagerPort};
use crate::domain::job::Job;

/// SubmitVideo Handler - 创建任务并立即返回
pub struct SubmitVideoHandler {
    job_manager: Arc<dyn JobManagerPort>,
}

impl SubmitVideoHandler {
    pub fn new(job_manager: Arc<dyn JobManagerPort>) -> Self {
        Self { job_manager }
    }

    pub fn handle(&self, cmd: SubmitVideo) -> Result<Job, ApplicationError> {
        let job =
            Job::new(cmd.script, cmd.template, cmd.user_id).map_err(JobManagerError::from)?;
        let snapshot = job.clone();

        let job_id = self.job_manager.submit(job)?;

        tracing::info!(
            job_id = %job_id,
            user_id = %snapshot.user_id(),
            script_chars = snapshot.script().chars().count(),
            "Video generation started"
        );

        Ok(snapshot)
    }
}

/// CancelJob Handler
pub struct CancelJobHandler {
    job_manager: Arc<dyn JobManagerPort>,
}

impl CancelJobHandler {
    pub fn new(job_manager: Arc<dyn JobManagerPort>) -> Self {
        Self { job_manager }
    }

    pub fn handle(&self, cmd: CancelJob) -> Result<Job, ApplicationError> {
        let job = self.job_manager.request_cancel(cmd.job_id)?;
        tracing::info!(job_id = %cmd.job_id, status = %job.status(), "Job cancellation requested");
        Ok(job)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::job::JobStatus;
    use crate::infrastructure::events::EventPublisher;
    use crate::infrastructure::memory::InMemoryJobManager;
    use tokio::sync::mpsc;

    fn manager() -> (Arc<InMemoryJobManager>, mpsc::Receiver<crate::domain::job::JobId>) {
        let (tx, rx) = mpsc::channel(8);
        (InMemoryJobManager::new(tx, EventPublisher::new().arc()).arc(), rx)
    }

    #[tokio::test]
    async fn test_submit_returns_pending_snapshot() {
        let (manager, mut rx) = manager();
        let handler = SubmitVideoHandler::new(manager.clone());

        let job = handler
            .handle(SubmitVideo {
                script: "Hello world".into(),
                template: "presenter1".into(),
                user_id: "u1".into(),
            })
            .unwrap();

        assert_eq!(job.status(), JobStatus::Pending);
        assert_eq!(rx.recv().await.unwrap(), job.id());
        assert!(manager.get(job.id()).is_some());
    }

    #[tokio::test]
    async fn test_submit_rejects_blank_script() {
        let (manager, _rx) = manager();
        let handler = SubmitVideoHandler::new(manager.clone());

        let err = handler
            .handle(SubmitVideo {
                script: "   ".into(),
                template: "presenter1".into(),
                user_id: "u1".into(),
            })
            .unwrap_err();

        assert!(matches!(err, ApplicationError::ValidationError(_)));
        assert_eq!(manager.stats().total, 0);
    }

    #[tokio::test]
    async fn test_cancel_terminal_job_is_invalid_state() {
        let (manager, _rx) = manager();
        let job = Job::new("Hello", "t", "u1").unwrap();
        let job_id = manager.submit(job).unwrap();
        manager.begin_stage(job_id, crate::domain::job::PipelineStage::Enhance).unwrap();
        manager.complete(job_id, "http://x/v.mp4").unwrap();

        let err = CancelJobHandler::new(manager)
            .handle(CancelJob { job_id })
            .unwrap_err();
        assert!(matches!(err, ApplicationError::InvalidState(_)));
    }
}
