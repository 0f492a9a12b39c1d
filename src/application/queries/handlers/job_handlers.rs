//! Job Query Handlers

use std::sync::Arc;

use crate::application::error::ApplicationError;
use crate::application::ports::{JobManagerPort, JobStats};
use crate::application::queries::{GetJobStats, GetJobStatus, ListJobs};
use crate::domain::job::Job;

/// GetJobStatus Handler
pub struct GetJobStatusHandler {
    job_manager: Arc<dyn JobManagerPort>,
}

impl GetJobStatusHandler {
    pub fn new(job_manager: Arc<dyn JobManagerPort>) -> Self {
        Self { job_manager }
    }

    pub fn handle(&self, query: GetJobStatus) -> Result<Job, ApplicationError> {
        self.job_manager
            .get(query.job_id)
            .ok_or_else(|| ApplicationError::not_found("Job", query.job_id))
    }
}

/// ListJobs Handler
pub struct ListJobsHandler {
    job_manager: Arc<dyn JobManagerPort>,
}

impl ListJobsHandler {
    pub fn new(job_manager: Arc<dyn JobManagerPort>) -> Self {
        Self { job_manager }
    }

    pub fn handle(&self, query: ListJobs) -> Vec<Job> {
        let user_id = query
            .user_id
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty());
        self.job_manager.list(user_id)
    }
}

/// GetJobStats Handler
pub struct GetJobStatsHandler {
    job_manager: Arc<dyn JobManagerPort>,
}

impl GetJobStatsHandler {
    pub fn new(job_manager: Arc<dyn JobManagerPort>) -> Self {
        Self { job_manager }
    }

    pub fn handle(&self, _query: GetJobStats) -> JobStats {
        self.job_manager.stats()
    }
}
