use anyhow::Result;
use clap::Parser;
use tablectl_core::{Config, Context};
use tracing::{debug, error, info, trace, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod commands;
mod connection;
mod error;
mod output;

use cli::{Cli, Commands};
use connection::ConnectionManager;
use error::TableCtlError;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity level
    init_tracing(cli.verbose);

    // Load configuration from specified path or default location
    let (config, config_path) = if let Some(config_file) = &cli.config_file {
        let path = std::path::PathBuf::from(config_file);
        debug!("Loading config from explicit path: {:?}", path);
        let config = Config::load_from_path(&path)?;
        (config, Some(path))
    } else {
        debug!("Loading config from default location");
        (Config::load()?, None)
    };
    let conn_mgr = ConnectionManager::with_config_path(config, config_path);

    // Ctrl-C cancels whatever the command is waiting on
    let ctx = Context::background();
    let token = ctx.token().clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling");
            token.cancel();
        }
    });

    if let Err(e) = execute_command(&cli, &conn_mgr, &ctx).await {
        e.print_diagnostic();
        std::process::exit(e.exit_code());
    }

    Ok(())
}

fn init_tracing(verbose: u8) {
    // Check for RUST_LOG env var first, then fall back to verbosity flag
    let filter = if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::EnvFilter::from_default_env()
    } else {
        let level = match verbose {
            0 => "tablectl=warn,tablectl_core=warn",
            1 => "tablectl=info,tablectl_core=info",
            2 => "tablectl=debug,tablectl_core=debug",
            _ => "tablectl=trace,tablectl_core=trace",
        };
        tracing_subscriber::EnvFilter::new(level)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(false)
                .with_thread_names(false)
                .compact(),
        )
        .init();

    debug!("Tracing initialized with verbosity level: {}", verbose);
}

async fn execute_command(
    cli: &Cli,
    conn_mgr: &ConnectionManager,
    ctx: &Context,
) -> Result<(), TableCtlError> {
    trace!("Executing command: {:?}", cli.command);
    info!("Command: {}", format_command(&cli.command));

    let profile = cli.profile.as_deref();
    let start = std::time::Instant::now();
    let result = match &cli.command {
        Commands::Version => {
            debug!("Showing version information");
            if cli.output.is_structured() {
                let output_data = serde_json::json!({
                    "version": env!("CARGO_PKG_VERSION"),
                    "name": env!("CARGO_PKG_NAME"),
                });
                output::print_output(&output_data, cli.output)?;
            } else {
                println!("tablectl {}", env!("CARGO_PKG_VERSION"));
            }
            Ok(())
        }

        Commands::Profile(profile_cmd) => {
            debug!("Executing profile command");
            commands::profile::handle_profile_command(profile_cmd, conn_mgr, cli.output).await
        }

        Commands::Dataset(dataset_cmd) => {
            commands::dataset::handle_dataset_command(dataset_cmd, conn_mgr, ctx, profile, cli.output)
                .await
        }

        Commands::Table(table_cmd) => {
            commands::table::handle_table_command(table_cmd, conn_mgr, ctx, profile, cli.output)
                .await
        }

        Commands::Job(job_cmd) => {
            commands::job::handle_job_command(job_cmd, conn_mgr, ctx, profile, cli.output).await
        }
    };

    let duration = start.elapsed();
    match &result {
        Ok(_) => info!("Command completed successfully in {:?}", duration),
        Err(e) => error!("Command failed after {:?}: {}", duration, e),
    }

    result
}

/// Command name for logging, with secrets left out
fn format_command(command: &Commands) -> String {
    match command {
        Commands::Version => "version".to_string(),
        Commands::Profile(cmd) => {
            use cli::ProfileCommands::*;
            match cmd {
                List => "profile list".to_string(),
                Path => "profile path".to_string(),
                Show { name } => format!("profile show {}", name),
                Set { name, .. } => format!("profile set {} [credentials redacted]", name),
                Remove { name } => format!("profile remove {}", name),
                Default { name } => format!("profile default {}", name),
            }
        }
        Commands::Dataset(cmd) => format!("dataset {:?}", cmd),
        Commands::Table(cmd) => {
            use cli::TableCommands::*;
            match cmd {
                Copy {
                    source,
                    destination,
                    async_ops,
                    ..
                } => format!(
                    "table copy {} {}{}",
                    source,
                    destination,
                    if async_ops.wait { " --wait" } else { "" }
                ),
                Delete { table } => format!("table delete {}", table),
            }
        }
        Commands::Job(cmd) => format!("job {:?}", cmd),
    }
}
