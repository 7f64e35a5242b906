//! Job command implementations

use serde::Serialize;
use tablectl_core::{Context, Job, JobRef, JobService, WarehouseClient, wait_for_job};

use super::async_utils::{describe_status, format_job_state, job_spinner, spinner_callback};
use crate::cli::{JobCommands, OutputFormat};
use crate::connection::ConnectionManager;
use crate::error::Result as CliResult;
use crate::output::print_output;

pub async fn handle_job_command(
    cmd: &JobCommands,
    conn_mgr: &ConnectionManager,
    ctx: &Context,
    profile_name: Option<&str>,
    output_format: OutputFormat,
) -> CliResult<()> {
    match cmd {
        JobCommands::Get { job_id, location } => {
            let client = conn_mgr.create_client(profile_name)?;
            let job = client
                .get_job(ctx, &job_ref(&client, job_id, location.as_deref()))
                .await?;

            if output_format.is_structured() {
                print_output(&job, output_format)?;
            } else {
                print_output(JobSummary::from(&job), output_format)?;
            }
            Ok(())
        }
        JobCommands::Wait {
            job_id,
            location,
            wait_timeout,
            wait_interval,
        } => {
            let client = conn_mgr.create_client(profile_name)?;
            let options = conn_mgr.poll_options(profile_name, *wait_timeout, *wait_interval)?;
            let job = job_ref(&client, job_id, location.as_deref());

            let pb = job_spinner(&format!("job {}", job_id));
            let result = wait_for_job(&client, ctx, &job, &options, Some(spinner_callback(&pb))).await;
            let status = match result {
                Ok(status) => {
                    pb.finish_and_clear();
                    status
                }
                Err(e) => {
                    pb.abandon();
                    return Err(e.into());
                }
            };

            if output_format.is_structured() {
                print_output(&status, output_format)?;
            } else {
                println!("Job {}: {}", job_id, describe_status(&status));
            }
            Ok(())
        }
    }
}

/// Job reference in the client's project, located explicitly or by the profile default
fn job_ref(client: &WarehouseClient, job_id: &str, location: Option<&str>) -> JobRef {
    let job = JobRef::new(client.project_id(), job_id);
    match location.or(client.location()) {
        Some(location) => job.location(location),
        None => job,
    }
}

/// Flat view of a job for table output
#[derive(Debug, Serialize)]
struct JobSummary {
    job_id: String,
    project_id: String,
    location: Option<String>,
    state: String,
    error: Option<String>,
    created: Option<String>,
}

impl From<&Job> for JobSummary {
    fn from(job: &Job) -> Self {
        Self {
            job_id: job.id().to_string(),
            project_id: job.reference.project_id.clone(),
            location: job.reference.location.clone(),
            state: format_job_state(job.status.state),
            error: job.status.err().map(ToString::to_string),
            created: job.created_at.map(|t| t.to_rfc3339()),
        }
    }
}
