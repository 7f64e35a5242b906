//! Dataset command implementations

use tablectl_core::{Context, JobService};
use tracing::debug;

use crate::cli::{DatasetCommands, OutputFormat};
use crate::connection::ConnectionManager;
use crate::error::Result as CliResult;
use crate::output::print_output;

pub async fn handle_dataset_command(
    cmd: &DatasetCommands,
    conn_mgr: &ConnectionManager,
    ctx: &Context,
    profile_name: Option<&str>,
    output_format: OutputFormat,
) -> CliResult<()> {
    let client = conn_mgr.create_client(profile_name)?;

    match cmd {
        DatasetCommands::Create { dataset_id } => {
            let dataset = client.create_dataset(ctx, dataset_id).await?;
            if output_format.is_structured() {
                print_output(&dataset, output_format)?;
            } else {
                println!(
                    "Dataset {}:{} created.",
                    dataset.project_id, dataset.dataset_id
                );
            }
        }
        DatasetCommands::List => {
            let datasets = client.list_datasets(ctx).await?;
            debug!("Found {} datasets", datasets.len());

            if datasets.is_empty() && !output_format.is_structured() {
                println!("No datasets in project {}.", client.project_id());
            } else {
                print_output(&datasets, output_format)?;
            }
        }
    }

    Ok(())
}
