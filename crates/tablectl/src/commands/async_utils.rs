//! Spinner-driven waiting for warehouse jobs
//!
//! Wraps the core poller's progress callback with an `indicatif` spinner and
//! prints the terminal status in the requested format.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tablectl_core::{JobState, JobStatus, ProgressCallback, ProgressEvent};

use crate::cli::OutputFormat;

/// Spinner shown on stderr while a job is polled; hidden when stderr is not a terminal
pub fn job_spinner(job_label: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::default_spinner()
        .template("{spinner:.green} {msg} [{elapsed_precise}]")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    pb.set_style(style);
    pb.set_message(format!("Waiting for {}", job_label));
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

/// Progress callback that keeps the spinner message current
pub fn spinner_callback(pb: &ProgressBar) -> ProgressCallback {
    let pb = pb.clone();
    Box::new(move |event: ProgressEvent| match &event {
        ProgressEvent::Started { job_id } => {
            pb.set_message(format!("Job {} submitted", job_id));
        }
        ProgressEvent::Polling { job_id, state, .. } => {
            pb.set_message(format!("Job {}: {}", job_id, format_job_state(*state)));
        }
        ProgressEvent::Completed { job_id } => {
            pb.finish_with_message(format!("Job {}: {}", job_id, format_job_state(JobState::Done)));
        }
        ProgressEvent::Failed { job_id, error } => {
            pb.finish_with_message(format!("Job {} failed: {}", job_id, error));
        }
    })
}

/// Job state with a status icon
pub fn format_job_state(state: JobState) -> String {
    match state {
        JobState::Done => format!("\u{2713} {}", state),
        JobState::Running => format!("\u{21bb} {}", state),
        JobState::Pending => state.to_string(),
    }
}

/// Human-readable hint for a job submitted without `--wait`
pub fn print_wait_hint(job_id: &str, output_format: OutputFormat) {
    if !output_format.is_structured() {
        println!("To wait for completion, run: tablectl job wait {}", job_id);
    }
}

/// One-line summary of a terminal status
pub fn describe_status(status: &JobStatus) -> String {
    match status.err() {
        Some(error) => format!("{} with error: {}", status.state, error),
        None => format_job_state(status.state),
    }
}
