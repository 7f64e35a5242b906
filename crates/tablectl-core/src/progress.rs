//! Job submission and completion polling
//!
//! Warehouse operations such as table copies run as asynchronous jobs.
//! [`submit`] creates the job once; [`await_completion`] then reads its
//! status until the service reports a terminal state, with optional
//! progress callbacks for UI updates.
//!
//! The wait is bounded by [`PollOptions::timeout`] and by the caller's
//! [`Context`]; both the status reads and the sleeps between them give way
//! as soon as the context is cancelled.

use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::context::{Context, Interrupted};
use crate::error::{CoreError, Result, ServiceError};
use crate::job::{Job, JobId, JobRef, JobState, JobStatus};
use crate::params::JobConfiguration;
use crate::service::JobService;

/// Default time between status reads
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Default upper bound on a single wait
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(600);

/// How to wait for a job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollOptions {
    /// Sleep between status reads
    pub interval: Duration,
    /// Give up after this long; `None` waits until the context fires
    pub timeout: Option<Duration>,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            timeout: Some(DEFAULT_WAIT_TIMEOUT),
        }
    }
}

impl PollOptions {
    pub fn new(interval: Duration, timeout: Option<Duration>) -> Self {
        Self { interval, timeout }
    }

    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn unbounded(mut self) -> Self {
        self.timeout = None;
        self
    }
}

/// Progress events emitted while waiting on a job
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// Waiting has begun
    Started { job_id: JobId },
    /// Polling iteration with current state
    Polling {
        job_id: JobId,
        state: JobState,
        elapsed: Duration,
    },
    /// Job finished successfully
    Completed { job_id: JobId },
    /// Job finished with a failure outcome
    Failed { job_id: JobId, error: String },
}

/// Callback type for progress updates
///
/// The CLI uses this to drive its spinner.
pub type ProgressCallback = Box<dyn Fn(ProgressEvent) + Send + Sync>;

/// Validate and submit a job
///
/// Unqualified table references resolve against the service's project.
/// Rejections come back as [`CoreError::Submission`]; a configuration that fails
/// local checks never reaches the service.
pub async fn submit<S>(service: &S, ctx: &Context, configuration: &JobConfiguration) -> Result<Job>
where
    S: JobService + ?Sized,
{
    let configuration = configuration.resolve(service.project_id());
    configuration.validate()?;

    info!(kind = configuration.kind(), "Submitting job");

    let job = ctx
        .run(service.create_job(ctx, &configuration))
        .await?
        .map_err(CoreError::submission)?;

    info!(
        job_id = %job.id(),
        state = %job.status.state,
        "Job created"
    );
    Ok(job)
}

/// Poll a job until it reaches a terminal state
///
/// # Arguments
///
/// * `service` - The service boundary to query
/// * `ctx` - Cancellation and deadline for the whole wait
/// * `job` - The job to poll
/// * `options` - Poll interval and wait bound
/// * `on_progress` - Optional callback for progress updates
///
/// # Returns
///
/// The terminal status on success. A job that finishes with a failure
/// outcome yields [`CoreError::JobFailed`] carrying the service's detail;
/// a transport failure while reading status yields [`CoreError::Poll`].
///
/// # Example
///
/// ```rust,ignore
/// use tablectl_core::{await_completion, submit, PollOptions, ProgressEvent};
/// use std::time::Duration;
///
/// let job = submit(&client, &ctx, &spec.into()).await?;
///
/// let status = await_completion(
///     &client,
///     &ctx,
///     &job.reference,
///     &PollOptions::default().interval(Duration::from_secs(5)),
///     Some(Box::new(|event| {
///         if let ProgressEvent::Polling { state, elapsed, .. } = event {
///             println!("{} ({:.0}s)", state, elapsed.as_secs());
///         }
///     })),
/// )
/// .await?;
/// ```
pub async fn await_completion<S>(
    service: &S,
    ctx: &Context,
    job: &JobRef,
    options: &PollOptions,
    on_progress: Option<ProgressCallback>,
) -> Result<JobStatus>
where
    S: JobService + ?Sized,
{
    let start = Instant::now();
    let job_id = &job.job_id;
    let wait_ctx = match options.timeout {
        Some(timeout) => ctx.with_timeout(timeout),
        None => ctx.child(),
    };
    let interrupted = |interrupt: Interrupted| interrupt_error(interrupt, ctx, options);

    emit(
        &on_progress,
        ProgressEvent::Started {
            job_id: job_id.clone(),
        },
    );

    let mut last_state: Option<JobState> = None;

    loop {
        let status = match wait_ctx.run(service.get_status(&wait_ctx, job)).await {
            Ok(Ok(status)) => status,
            Ok(Err(ServiceError::Interrupted(interrupt))) | Err(interrupt) => {
                return Err(interrupted(interrupt));
            }
            Ok(Err(err)) => {
                warn!(job_id = %job_id, error = %err, "Status check failed");
                return Err(CoreError::poll(job_id, err));
            }
        };

        let elapsed = start.elapsed();
        debug!(
            job_id = %job_id,
            state = %status.state,
            elapsed_secs = elapsed.as_secs(),
            "Polled job status"
        );

        if let Some(previous) = last_state
            && !previous.can_transition_to(status.state)
        {
            warn!(
                job_id = %job_id,
                from = %previous,
                to = %status.state,
                "Job state moved backwards"
            );
        }
        last_state = Some(status.state);

        emit(
            &on_progress,
            ProgressEvent::Polling {
                job_id: job_id.clone(),
                state: status.state,
                elapsed,
            },
        );

        if status.is_terminal() {
            if let Some(error) = status.err() {
                warn!(job_id = %job_id, error = %error, "Job failed");
                emit(
                    &on_progress,
                    ProgressEvent::Failed {
                        job_id: job_id.clone(),
                        error: error.to_string(),
                    },
                );
                return Err(CoreError::JobFailed {
                    job_id: job_id.clone(),
                    error: error.clone(),
                });
            }

            info!(
                job_id = %job_id,
                elapsed_secs = elapsed.as_secs(),
                "Job completed"
            );
            emit(
                &on_progress,
                ProgressEvent::Completed {
                    job_id: job_id.clone(),
                },
            );
            return Ok(status);
        }

        wait_ctx
            .sleep(options.interval)
            .await
            .map_err(interrupted)?;
    }
}

/// Our own wait bound reports as `TaskTimeout`; the caller's context keeps
/// its own meaning.
fn interrupt_error(interrupt: Interrupted, ctx: &Context, options: &PollOptions) -> CoreError {
    match (interrupt, options.timeout) {
        (Interrupted::DeadlineExceeded, Some(timeout)) if ctx.check().is_ok() => {
            CoreError::TaskTimeout(timeout)
        }
        (interrupt, _) => interrupt.into(),
    }
}

/// Helper to emit progress events
fn emit(callback: &Option<ProgressCallback>, event: ProgressEvent) {
    if let Some(cb) = callback {
        cb(event);
    }
}
