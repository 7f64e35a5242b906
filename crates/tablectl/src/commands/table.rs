//! Table command implementations

use serde::Serialize;
use tablectl_core::{
    Context, CopySpec, JobConfiguration, JobService, TableRef, WriteDisposition,
    copy_table_and_wait, submit,
};
use tracing::{debug, info};

use super::async_utils::{describe_status, job_spinner, print_wait_hint, spinner_callback};
use crate::cli::{AsyncOperationArgs, OutputFormat, TableCommands};
use crate::connection::ConnectionManager;
use crate::error::{Result as CliResult, TableCtlError};
use crate::output::print_output;

/// Handle table commands
pub async fn handle_table_command(
    cmd: &TableCommands,
    conn_mgr: &ConnectionManager,
    ctx: &Context,
    profile_name: Option<&str>,
    output_format: OutputFormat,
) -> CliResult<()> {
    match cmd {
        TableCommands::Copy {
            source,
            destination,
            write_disposition,
            async_ops,
        } => {
            handle_copy(
                conn_mgr,
                ctx,
                profile_name,
                source,
                destination,
                *write_disposition,
                async_ops,
                output_format,
            )
            .await
        }
        TableCommands::Delete { table } => {
            handle_delete(conn_mgr, ctx, profile_name, table, output_format).await
        }
    }
}

/// Submission result for a copy run without `--wait`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SubmittedCopy {
    job_id: String,
    project_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    location: Option<String>,
    state: String,
    source: String,
    destination: String,
    write_disposition: WriteDisposition,
}

#[allow(clippy::too_many_arguments)]
async fn handle_copy(
    conn_mgr: &ConnectionManager,
    ctx: &Context,
    profile_name: Option<&str>,
    source: &str,
    destination: &str,
    write_disposition: WriteDisposition,
    async_ops: &AsyncOperationArgs,
    output_format: OutputFormat,
) -> CliResult<()> {
    let spec = parse_copy_spec(source, destination, write_disposition)?;
    let client = conn_mgr.create_client(profile_name)?;
    let resolved = spec.resolve(client.project_id());
    debug!(source = %resolved.source, destination = %resolved.destination, "Copy requested");

    if !async_ops.wait {
        let job = submit(&client, ctx, &JobConfiguration::Copy(spec)).await?;
        if let Some(error) = job.status.err() {
            return Err(TableCtlError::JobFailed {
                job_id: job.id().to_string(),
                message: error.to_string(),
            });
        }
        let submitted = SubmittedCopy {
            job_id: job.id().to_string(),
            project_id: job.reference.project_id.clone(),
            location: job.reference.location.clone(),
            state: job.status.state.to_string(),
            source: resolved.source.to_string(),
            destination: resolved.destination.to_string(),
            write_disposition: resolved.write_disposition,
        };

        if output_format.is_structured() {
            print_output(&submitted, output_format)?;
        } else {
            println!(
                "Copy job {} submitted: {} -> {}",
                submitted.job_id, submitted.source, submitted.destination
            );
            print_wait_hint(&submitted.job_id, output_format);
        }
        return Ok(());
    }

    let options =
        conn_mgr.poll_options(profile_name, async_ops.wait_timeout, async_ops.wait_interval)?;
    let pb = job_spinner(&format!("copy {} -> {}", resolved.source, resolved.destination));
    let result = copy_table_and_wait(&client, ctx, &spec, &options, Some(spinner_callback(&pb))).await;

    match result {
        Ok(result) => {
            pb.finish_and_clear();
            info!(job_id = %result.job_id, "Copy finished");
            if output_format.is_structured() {
                print_output(&result, output_format)?;
            } else {
                println!(
                    "Copied {} -> {} (job {}, {})",
                    result.source,
                    result.destination,
                    result.job_id,
                    describe_status(&result.status)
                );
            }
            Ok(())
        }
        Err(e) => {
            pb.abandon();
            Err(e.into())
        }
    }
}

async fn handle_delete(
    conn_mgr: &ConnectionManager,
    ctx: &Context,
    profile_name: Option<&str>,
    table: &str,
    output_format: OutputFormat,
) -> CliResult<()> {
    let table = TableRef::parse(table)?;
    let client = conn_mgr.create_client(profile_name)?;
    let resolved = table.resolve(client.project_id());

    client.delete_table(ctx, &table).await?;

    if output_format.is_structured() {
        print_output(
            serde_json::json!({ "deleted": resolved.to_string() }),
            output_format,
        )?;
    } else {
        println!("Table {} deleted.", resolved);
    }
    Ok(())
}

fn parse_copy_spec(
    source: &str,
    destination: &str,
    write_disposition: WriteDisposition,
) -> CliResult<CopySpec> {
    let source = TableRef::parse(source).map_err(|e| TableCtlError::InvalidInput {
        message: format!("source table: {}", e),
    })?;
    let destination = TableRef::parse(destination).map_err(|e| TableCtlError::InvalidInput {
        message: format!("destination table: {}", e),
    })?;
    Ok(CopySpec::new(source, destination).write_disposition(write_disposition))
}
