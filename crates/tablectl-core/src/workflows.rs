//! Warehouse workflows - multi-step operations
//!
//! These workflows compose submission and polling with progress tracking.
//! For one-call operations, use [`WarehouseClient`](crate::WarehouseClient)
//! directly.

use serde::Serialize;
use tracing::info;

use crate::context::Context;
use crate::error::Result;
use crate::job::{JobId, JobRef, JobStatus};
use crate::params::{CopySpec, JobConfiguration, TableRef, WriteDisposition};
use crate::progress::{PollOptions, ProgressCallback, await_completion, submit};
use crate::service::JobService;

/// Outcome of a completed copy
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CopyResult {
    pub job_id: JobId,
    pub job: JobRef,
    pub source: TableRef,
    pub destination: TableRef,
    pub write_disposition: WriteDisposition,
    pub status: JobStatus,
}

/// Copy a table and wait for completion
///
/// This is a convenience workflow that:
/// 1. Submits a copy job
/// 2. Polls the job until it reaches a terminal state
/// 3. Returns the job reference and final status
///
/// # Arguments
///
/// * `service` - The service boundary
/// * `ctx` - Cancellation and deadline for the whole workflow
/// * `spec` - Source, destination and write disposition
/// * `options` - Poll interval and wait bound
/// * `on_progress` - Optional callback for progress updates
///
/// # Example
///
/// ```rust,ignore
/// use tablectl_core::{copy_table_and_wait, Context, CopySpec, PollOptions, TableRef, WriteDisposition};
///
/// let spec = CopySpec::new(TableRef::parse("d.tableA")?, TableRef::parse("d.tableB")?)
///     .write_disposition(WriteDisposition::Truncate);
///
/// let result = copy_table_and_wait(
///     &client,
///     &Context::background(),
///     &spec,
///     &PollOptions::default(),
///     None,  // No progress callback
/// ).await?;
/// ```
pub async fn copy_table_and_wait<S>(
    service: &S,
    ctx: &Context,
    spec: &CopySpec,
    options: &PollOptions,
    on_progress: Option<ProgressCallback>,
) -> Result<CopyResult>
where
    S: JobService + ?Sized,
{
    let configuration = JobConfiguration::Copy(spec.clone());

    // Step 1: Submit (returns job handle)
    let job = submit(service, ctx, &configuration).await?;

    // Step 2: Poll until terminal
    let status = await_completion(service, ctx, &job.reference, options, on_progress).await?;

    let resolved = spec.resolve(service.project_id());
    info!(
        job_id = %job.id(),
        source = %resolved.source,
        destination = %resolved.destination,
        "Table copy completed"
    );

    Ok(CopyResult {
        job_id: job.id().clone(),
        job: job.reference,
        source: resolved.source,
        destination: resolved.destination,
        write_disposition: resolved.write_disposition,
        status,
    })
}

/// Wait on a job submitted earlier
///
/// Used when the caller only has a job reference, e.g. `tablectl job wait`.
pub async fn wait_for_job<S>(
    service: &S,
    ctx: &Context,
    job: &JobRef,
    options: &PollOptions,
    on_progress: Option<ProgressCallback>,
) -> Result<JobStatus>
where
    S: JobService + ?Sized,
{
    await_completion(service, ctx, job, options, on_progress).await
}
