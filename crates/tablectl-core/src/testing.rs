//! In-memory [`JobService`] for exercising polling code without a network
//!
//! Each job is scripted with the status reads it should return in order.
//! Once the script runs out the last status is repeated, and once a terminal
//! status has been served it is returned for every later read.
//!
//! ```rust
//! use tablectl_core::testing::ScriptedJobService;
//! use tablectl_core::JobStatus;
//!
//! let service = ScriptedJobService::new("test-project").job(
//!     "j1",
//!     JobStatus::running(),
//!     vec![Ok(JobStatus::running()), Ok(JobStatus::succeeded())],
//! );
//! # let _ = service;
//! ```

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::context::Context;
use crate::error::ServiceError;
use crate::job::{Job, JobId, JobRef, JobStatus};
use crate::params::JobConfiguration;
use crate::service::{JobService, ServiceResult};

#[derive(Debug)]
struct ScriptedJob {
    reads: VecDeque<ServiceResult<JobStatus>>,
    last: JobStatus,
    polls: usize,
}

#[derive(Debug, Default)]
struct State {
    queued: VecDeque<(JobId, JobStatus)>,
    rejections: VecDeque<ServiceError>,
    jobs: HashMap<JobId, ScriptedJob>,
    submissions: Vec<JobConfiguration>,
    next_id: usize,
}

/// Scripted fake of the warehouse job service
#[derive(Debug)]
pub struct ScriptedJobService {
    project_id: String,
    state: Mutex<State>,
}

impl ScriptedJobService {
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            state: Mutex::new(State::default()),
        }
    }

    /// Queue a job for the next `create_job` call
    ///
    /// `initial` is the status returned with the handle; `reads` are the
    /// results of successive `get_status` calls.
    pub fn job(
        self,
        job_id: impl Into<JobId>,
        initial: JobStatus,
        reads: Vec<ServiceResult<JobStatus>>,
    ) -> Self {
        let job_id = job_id.into();
        {
            let mut state = self.lock();
            state.jobs.insert(
                job_id.clone(),
                ScriptedJob {
                    reads: reads.into(),
                    last: initial.clone(),
                    polls: 0,
                },
            );
            state.queued.push_back((job_id, initial));
        }
        self
    }

    /// Make the next `create_job` call fail with `err`
    pub fn reject_next(self, err: ServiceError) -> Self {
        self.lock().rejections.push_back(err);
        self
    }

    /// Configurations received by `create_job`, in order
    pub fn submissions(&self) -> Vec<JobConfiguration> {
        self.lock().submissions.clone()
    }

    /// Number of `get_status` calls made for `job_id`
    pub fn poll_count(&self, job_id: &str) -> usize {
        self.lock()
            .jobs
            .get(&JobId::from(job_id))
            .map(|job| job.polls)
            .unwrap_or(0)
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // A panicking test thread must not hide the script from the others
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl JobService for ScriptedJobService {
    fn project_id(&self) -> &str {
        &self.project_id
    }

    async fn create_job(
        &self,
        _ctx: &Context,
        configuration: &JobConfiguration,
    ) -> ServiceResult<Job> {
        let mut state = self.lock();

        if let Some(err) = state.rejections.pop_front() {
            return Err(err);
        }
        state.submissions.push(configuration.clone());

        let (job_id, initial) = match state.queued.pop_front() {
            Some(queued) => queued,
            None => {
                state.next_id += 1;
                let job_id = JobId::new(format!("job_{}", state.next_id));
                state.jobs.insert(
                    job_id.clone(),
                    ScriptedJob {
                        reads: VecDeque::new(),
                        last: JobStatus::pending(),
                        polls: 0,
                    },
                );
                (job_id, JobStatus::pending())
            }
        };

        let reference = JobRef::new(self.project_id.clone(), job_id);
        Ok(Job::new(reference, initial))
    }

    async fn get_status(&self, _ctx: &Context, job: &JobRef) -> ServiceResult<JobStatus> {
        let mut state = self.lock();
        let scripted = state
            .jobs
            .get_mut(&job.job_id)
            .ok_or_else(|| ServiceError::NotFound {
                message: format!("Not found: Job {}:{}", job.project_id, job.job_id),
            })?;

        scripted.polls += 1;

        if scripted.last.is_terminal() {
            return Ok(scripted.last.clone());
        }

        match scripted.reads.pop_front() {
            Some(Ok(status)) => {
                scripted.last = status.clone();
                Ok(status)
            }
            Some(Err(err)) => Err(err),
            None => Ok(scripted.last.clone()),
        }
    }
}
