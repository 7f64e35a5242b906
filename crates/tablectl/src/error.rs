//! Error types for tablectl
//!
//! Library errors are folded into [`TableCtlError`], which knows how to
//! suggest a next step and print itself as a cargo-style diagnostic.

use colored::Colorize;
use tablectl_core::{ConfigError, CoreError, ServiceError};
use thiserror::Error;

/// Cargo-style diagnostic formatter for CLI errors.
///
/// Produces structured output like:
/// ```text
/// error: Job job_abc123 failed: permission denied (accessDenied)
///
///   tip: Inspect the job's errors: tablectl job get job_abc123 -o json
/// ```
pub struct CliDiagnostic {
    message: String,
    tips: Vec<(String, Vec<String>)>,
}

impl CliDiagnostic {
    /// Start a new error diagnostic with the given message.
    pub fn error(message: &str) -> Self {
        Self {
            message: message.to_string(),
            tips: Vec::new(),
        }
    }

    /// Add a tip with optional example commands.
    pub fn tip(mut self, description: &str, commands: &[&str]) -> Self {
        self.tips.push((
            description.to_string(),
            commands.iter().map(|s| s.to_string()).collect(),
        ));
        self
    }

    /// Print the diagnostic to stderr with colored formatting.
    pub fn print(&self) {
        eprint!("{}{}", "error".red().bold(), ": ".bold());
        eprintln!("{}", self.message);

        for (description, commands) in &self.tips {
            eprintln!();
            eprint!("  {}{}", "tip".yellow().bold(), ": ".bold());
            eprintln!("{}", description);
            for cmd in commands {
                eprintln!("      {}", cmd);
            }
        }
    }
}

/// Main error type for the tablectl application
#[derive(Error, Debug)]
pub enum TableCtlError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Profile '{name}' not found")]
    ProfileNotFound { name: String },

    #[error("No profile configured. Use 'tablectl profile set' to configure a profile.")]
    NoProfileConfigured,

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("{message}")]
    NotFound { message: String },

    #[error("API error: {message}")]
    ApiError { message: String },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Connection error: {message}")]
    ConnectionError { message: String },

    #[error("Job {job_id} failed: {message}")]
    JobFailed { job_id: String, message: String },

    #[error("Timeout: {message}")]
    Timeout { message: String },

    #[error("Interrupted")]
    Cancelled,

    #[error("Output formatting error: {message}")]
    OutputError { message: String },
}

/// Result type for tablectl operations
pub type Result<T> = std::result::Result<T, TableCtlError>;

impl TableCtlError {
    /// Get helpful suggestions for resolving this error
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            TableCtlError::ProfileNotFound { name } => vec![
                "List available profiles: tablectl profile list".to_string(),
                format!(
                    "Create profile '{}': tablectl profile set {} --project-id <project>",
                    name, name
                ),
            ],
            TableCtlError::NoProfileConfigured => vec![
                "Create a profile: tablectl profile set <name> --project-id <project>".to_string(),
                "View profile documentation: tablectl profile --help".to_string(),
            ],
            TableCtlError::AuthenticationFailed { .. } => vec![
                "Check the profile's token: tablectl profile show <profile>".to_string(),
                "Supply a fresh token through TABLECTL_ACCESS_TOKEN".to_string(),
            ],
            TableCtlError::ConnectionError { .. } => vec![
                "Check network connectivity".to_string(),
                "Verify the API URL is correct: tablectl profile show <profile>".to_string(),
            ],
            TableCtlError::JobFailed { job_id, .. } => vec![format!(
                "Inspect the job's errors: tablectl job get {} -o json",
                job_id
            )],
            TableCtlError::Timeout { .. } => vec![
                "The job may still be running; wait longer with: tablectl job wait <job-id> --wait-timeout <secs>".to_string(),
            ],
            TableCtlError::InvalidInput { .. } => vec![
                "Check the command syntax: tablectl <command> --help".to_string(),
            ],
            _ => vec![],
        }
    }

    /// Print a cargo-style diagnostic to stderr using colored formatting.
    pub fn print_diagnostic(&self) {
        let mut diag = CliDiagnostic::error(&self.to_string());

        for suggestion in self.suggestions() {
            diag = diag.tip(&suggestion, &[]);
        }

        diag.print();
    }

    /// Process exit code; 130 follows the shell convention for SIGINT
    pub fn exit_code(&self) -> i32 {
        match self {
            TableCtlError::Cancelled => 130,
            _ => 1,
        }
    }
}

fn from_service_error(err: &ServiceError, message: String) -> TableCtlError {
    match err {
        ServiceError::Unauthorized { .. } | ServiceError::Forbidden { .. } => {
            TableCtlError::AuthenticationFailed { message }
        }
        ServiceError::NotFound { .. } => TableCtlError::NotFound { message },
        ServiceError::BadRequest { .. } => TableCtlError::InvalidInput { message },
        ServiceError::Connection(_) => TableCtlError::ConnectionError { message },
        _ => TableCtlError::ApiError { message },
    }
}

impl From<CoreError> for TableCtlError {
    fn from(err: CoreError) -> Self {
        let message = err.to_string();
        match err {
            CoreError::Submission(ref e) | CoreError::Service(ref e) => {
                from_service_error(e, message)
            }
            CoreError::Poll { ref source, .. } => match source {
                ServiceError::NotFound { .. } => TableCtlError::NotFound { message },
                ServiceError::Unauthorized { .. } | ServiceError::Forbidden { .. } => {
                    TableCtlError::AuthenticationFailed { message }
                }
                _ => TableCtlError::ConnectionError { message },
            },
            CoreError::JobFailed { job_id, error } => TableCtlError::JobFailed {
                job_id: job_id.to_string(),
                message: error.to_string(),
            },
            CoreError::TaskTimeout(duration) => TableCtlError::Timeout {
                message: format!("Job did not finish within {} seconds", duration.as_secs()),
            },
            CoreError::DeadlineExceeded => TableCtlError::Timeout { message },
            CoreError::Cancelled => TableCtlError::Cancelled,
            CoreError::Validation(message) => TableCtlError::InvalidInput { message },
            CoreError::Config(config_err) => config_err.into(),
        }
    }
}

impl From<ConfigError> for TableCtlError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::ProfileNotFound { name } => TableCtlError::ProfileNotFound { name },
            ConfigError::NoProfiles { .. } => TableCtlError::NoProfileConfigured,
            other => TableCtlError::Configuration(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for TableCtlError {
    fn from(err: serde_json::Error) -> Self {
        TableCtlError::OutputError {
            message: format!("JSON error: {}", err),
        }
    }
}

impl From<std::io::Error> for TableCtlError {
    fn from(err: std::io::Error) -> Self {
        TableCtlError::OutputError {
            message: format!("IO error: {}", err),
        }
    }
}

impl From<anyhow::Error> for TableCtlError {
    fn from(err: anyhow::Error) -> Self {
        TableCtlError::OutputError {
            message: format!("{:#}", err),
        }
    }
}
