//! CLI structure and command definitions

use clap::{Args, Parser, Subcommand};
use tablectl_core::WriteDisposition;

/// Warehouse job CLI: copy tables and wait for the jobs to finish
#[derive(Parser, Debug)]
#[command(name = "tablectl")]
#[command(version, about = "Warehouse table jobs from the command line")]
#[command(long_about = "
Warehouse table jobs from the command line

Table copies run as asynchronous jobs. Submit one and return immediately,
or pass --wait to poll it until the service reports a terminal state.

EXAMPLES:
    # Set up a profile
    tablectl profile set prod --project-id analytics-prod --location EU

    # Copy a table, replacing the destination, and wait for it
    tablectl table copy sales.orders sales.orders_backup --write-disposition truncate --wait

    # Check on a job later
    tablectl job wait job_abc123

    # Get JSON output for scripting
    tablectl dataset list -o json

For more help on a specific command, run:
    tablectl <command> --help
")]
pub struct Cli {
    /// Profile to use for this command
    #[arg(long, short, global = true, env = "TABLECTL_PROFILE")]
    pub profile: Option<String>,

    /// Path to alternate configuration file
    #[arg(long, global = true, env = "TABLECTL_CONFIG_FILE")]
    pub config_file: Option<String>,

    /// Output format
    #[arg(long, short = 'o', global = true, value_enum, default_value = "auto")]
    pub output: OutputFormat,

    /// Enable verbose logging
    #[arg(long, short, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output, tables for lists
    Auto,
    /// JSON output
    Json,
    /// YAML output
    Yaml,
    /// Human-readable table format
    Table,
}

impl OutputFormat {
    /// True for formats meant to be parsed rather than read
    pub fn is_structured(self) -> bool {
        matches!(self, Self::Json | Self::Yaml)
    }
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Profile management
    #[command(subcommand, visible_alias = "prof")]
    #[command(after_help = "EXAMPLES:
    # Create a profile
    tablectl profile set prod --project-id analytics-prod

    # Create a profile against a local emulator, waiting at most 2 minutes per job
    tablectl profile set local --project-id test-project \\
        --api-url http://localhost:9050 --poll-timeout 120

    # List all profiles
    tablectl profile list

    # Make 'prod' the default
    tablectl profile default prod
")]
    Profile(ProfileCommands),

    /// Dataset operations
    #[command(subcommand, visible_alias = "ds")]
    Dataset(DatasetCommands),

    /// Table operations
    #[command(subcommand, visible_alias = "tbl")]
    Table(TableCommands),

    /// Job inspection and waiting
    #[command(subcommand)]
    Job(JobCommands),

    /// Version information
    #[command(visible_alias = "ver")]
    Version,
}

/// Profile management commands
#[derive(Subcommand, Debug)]
pub enum ProfileCommands {
    /// List all configured profiles
    #[command(visible_alias = "ls")]
    List,

    /// Show the path to the configuration file
    Path,

    /// Show details of a specific profile
    #[command(visible_alias = "get")]
    Show {
        /// Profile name to show
        name: String,
    },

    /// Set or create a profile
    #[command(visible_alias = "add")]
    Set {
        /// Profile name
        name: String,

        /// Project that jobs run in (required for new profiles)
        #[arg(long)]
        project_id: Option<String>,

        /// API root URL
        #[arg(long)]
        api_url: Option<String>,

        /// Bearer access token
        #[arg(long)]
        access_token: Option<String>,

        /// Default processing location (e.g. US, EU)
        #[arg(long)]
        location: Option<String>,

        /// Seconds between job status reads
        #[arg(long)]
        poll_interval: Option<u64>,

        /// Seconds to wait for a job before giving up (0 waits until interrupted)
        #[arg(long)]
        poll_timeout: Option<u64>,

        /// Store the access token in the OS keyring instead of the config file
        #[cfg(feature = "secure-storage")]
        #[arg(long, requires = "access_token")]
        use_keyring: bool,
    },

    /// Remove a profile
    #[command(visible_alias = "rm")]
    Remove {
        /// Profile name to remove
        name: String,
    },

    /// Set the default profile
    Default {
        /// Profile name to use when --profile is not given
        name: String,
    },
}

/// Dataset commands
#[derive(Subcommand, Debug)]
pub enum DatasetCommands {
    /// Create an empty dataset in the profile's project
    Create {
        /// Dataset ID (letters, digits and underscores)
        dataset_id: String,
    },

    /// List datasets in the profile's project
    #[command(visible_alias = "ls")]
    List,
}

/// Table commands
#[derive(Subcommand, Debug)]
pub enum TableCommands {
    /// Copy a table into another table
    #[command(after_help = "TABLE REFERENCES:
    dataset.table            resolved against the profile's project
    project:dataset.table
    project.dataset.table

EXAMPLES:
    # Submit and return immediately
    tablectl table copy sales.orders sales.orders_copy

    # Overwrite the destination and wait, up to 5 minutes
    tablectl table copy sales.orders backup.orders \\
        --write-disposition truncate --wait --wait-timeout 300
")]
    Copy {
        /// Source table
        source: String,

        /// Destination table
        destination: String,

        /// What to do when the destination already has data
        #[arg(long, value_enum, default_value_t = WriteDisposition::Empty)]
        write_disposition: WriteDisposition,

        #[command(flatten)]
        async_ops: AsyncOperationArgs,
    },

    /// Delete a table
    #[command(visible_alias = "rm")]
    Delete {
        /// Table to delete
        table: String,
    },
}

/// Job commands
#[derive(Subcommand, Debug)]
pub enum JobCommands {
    /// Show a job's current status
    Get {
        /// Job ID
        job_id: String,

        /// Location the job runs in (defaults to the profile's)
        #[arg(long)]
        location: Option<String>,
    },

    /// Wait for a submitted job to finish
    Wait {
        /// Job ID
        job_id: String,

        /// Location the job runs in (defaults to the profile's)
        #[arg(long)]
        location: Option<String>,

        /// Maximum time to wait in seconds (0 waits until interrupted)
        #[arg(long)]
        wait_timeout: Option<u64>,

        /// Polling interval in seconds
        #[arg(long)]
        wait_interval: Option<u64>,
    },
}

/// Common CLI arguments for job-submitting commands
#[derive(Args, Debug, Clone, Default)]
pub struct AsyncOperationArgs {
    /// Wait for the job to complete
    #[arg(long)]
    pub wait: bool,

    /// Maximum time to wait in seconds (0 waits until interrupted)
    #[arg(long, requires = "wait")]
    pub wait_timeout: Option<u64>,

    /// Polling interval in seconds
    #[arg(long, requires = "wait")]
    pub wait_interval: Option<u64>,
}
