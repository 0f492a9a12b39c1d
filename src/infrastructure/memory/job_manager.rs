//! In-Memory Job Manager Implementation

use dashmap::DashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

use crate::application::ports::{JobManagerError, JobManagerPort, JobStats};
use crate::domain::job::{Job, JobError, JobFailure, JobId, JobStatus, PipelineStage};
use crate::domain::synthesis::TtsProvenance;
use crate::infrastructure::events::EventPublisher;

/// 内存任务管理器
///
/// 每次修改在 DashMap 的分片锁内完成校验与写入，读者只会拿到提交后的克隆快照
pub struct InMemoryJobManager {
    /// job_id -> Job
    jobs: DashMap<JobId, Job>,
    /// 创建顺序
    order: Mutex<Vec<JobId>>,
    /// 任务队列发送端
    queue_sender: mpsc::Sender<JobId>,
    event_publisher: Arc<EventPublisher>,
}

impl InMemoryJobManager {
    pub fn new(queue_sender: mpsc::Sender<JobId>, event_publisher: Arc<EventPublisher>) -> Self {
        Self {
            jobs: DashMap::new(),
            order: Mutex::new(Vec::new()),
            queue_sender,
            event_publisher,
        }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    fn update<F>(&self, job_id: JobId, f: F) -> Result<Job, JobManagerError>
    where
        F: FnOnce(&mut Job) -> Result<(), JobError>,
    {
        let snapshot = {
            let mut job = self
                .jobs
                .get_mut(&job_id)
                .ok_or(JobManagerError::NotFound(job_id))?;
            let old_status = job.status();
            f(job.value_mut())?;

            tracing::debug!(
                job_id = %job_id,
                old_status = %old_status,
                new_status = %job.status(),
                progress = job.progress(),
                "Job updated"
            );
            job.clone()
        };

        self.event_publisher.publish_job_updated(&snapshot);
        Ok(snapshot)
    }

    fn ordered_ids(&self) -> Vec<JobId> {
        self.order
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl JobManagerPort for InMemoryJobManager {
    fn submit(&self, job: Job) -> Result<JobId, JobManagerError> {
        let job_id = job.id();
        let user_id = job.user_id().to_string();

        self.jobs.insert(job_id, job);
        self.order
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(job_id);

        // 发送到队列
        if let Err(e) = self.queue_sender.try_send(job_id) {
            tracing::warn!(job_id = %job_id, error = %e, "Failed to enqueue job");
            self.jobs.remove(&job_id);
            self.order
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .retain(|id| *id != job_id);
            return Err(JobManagerError::Schedule(e.to_string()));
        }

        tracing::info!(job_id = %job_id, user_id = %user_id, "Job submitted");
        Ok(job_id)
    }

    fn get(&self, job_id: JobId) -> Option<Job> {
        self.jobs.get(&job_id).map(|j| j.clone())
    }

    fn list(&self, user_id: Option<&str>) -> Vec<Job> {
        self.ordered_ids()
            .into_iter()
            .filter_map(|id| self.jobs.get(&id).map(|j| j.clone()))
            .filter(|job| user_id.map(|u| job.user_id() == u).unwrap_or(true))
            .collect()
    }

    fn begin_stage(&self, job_id: JobId, stage: PipelineStage) -> Result<Job, JobManagerError> {
        self.update(job_id, |job| job.begin_stage(stage))
    }

    fn set_stage_message(&self, job_id: JobId, message: &str) -> Result<Job, JobManagerError> {
        self.update(job_id, |job| job.set_stage_message(message))
    }

    fn record_provenance(
        &self,
        job_id: JobId,
        provenance: TtsProvenance,
    ) -> Result<Job, JobManagerError> {
        self.update(job_id, |job| job.record_provenance(provenance))
    }

    fn complete(&self, job_id: JobId, video_url: &str) -> Result<Job, JobManagerError> {
        self.update(job_id, |job| job.complete(video_url))
    }

    fn fail(&self, job_id: JobId, failure: JobFailure) -> Result<Job, JobManagerError> {
        self.update(job_id, |job| job.fail(failure))
    }

    fn request_cancel(&self, job_id: JobId) -> Result<Job, JobManagerError> {
        self.update(job_id, |job| job.request_cancel())
    }

    fn is_cancel_requested(&self, job_id: JobId) -> bool {
        self.jobs
            .get(&job_id)
            .map(|j| j.is_cancel_requested())
            .unwrap_or(true) // 不存在的任务视为已取消
    }

    fn stats(&self) -> JobStats {
        let mut stats = JobStats::default();
        for job in self.jobs.iter() {
            stats.total += 1;
            match job.status() {
                JobStatus::Pending => stats.pending += 1,
                JobStatus::Processing => stats.processing += 1,
                JobStatus::Completed => stats.completed += 1,
                JobStatus::Failed => stats.failed += 1,
            }
        }
        stats
    }
}
