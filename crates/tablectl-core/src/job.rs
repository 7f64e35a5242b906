//! Job handles, status snapshots and terminal outcomes
//!
//! A job moves `Pending -> Running -> Done` (or straight from `Pending` to
//! `Done`) and never leaves `Done`. Whether a done job succeeded is carried
//! by [`JobStatus::error_result`], not by the state itself.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Service-assigned job identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for JobId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for JobId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Everything needed to address a job on the service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRef {
    pub project_id: String,
    pub job_id: JobId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl JobRef {
    pub fn new(project_id: impl Into<String>, job_id: impl Into<JobId>) -> Self {
        Self {
            project_id: project_id.into(),
            job_id: job_id.into(),
            location: None,
        }
    }

    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}

/// Coarse lifecycle state reported by the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JobState {
    Pending,
    Running,
    Done,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Done)
    }

    /// Whether a later snapshot may report `next` after `self`
    pub fn can_transition_to(self, next: JobState) -> bool {
        use JobState::*;
        matches!(
            (self, next),
            (Pending, _) | (Running, Running) | (Running, Done) | (Done, Done)
        )
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobState::Pending => write!(f, "PENDING"),
            JobState::Running => write!(f, "RUNNING"),
            JobState::Done => write!(f, "DONE"),
        }
    }
}

/// Failure detail reported by the service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobError {
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl JobError {
    pub fn new(reason: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            message: message.into(),
            location: None,
        }
    }
}

impl fmt::Display for JobError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.reason.is_empty(), self.message.is_empty()) {
            (false, false) => write!(f, "{} ({})", self.message, self.reason),
            (true, false) => f.write_str(&self.message),
            (false, true) => f.write_str(&self.reason),
            (true, true) => f.write_str("unknown error"),
        }
    }
}

/// Result of a finished job
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Success,
    Failed(JobError),
}

/// Snapshot of a job's state at poll time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatus {
    pub state: JobState,
    /// Terminal failure; present only once the job is done and failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_result: Option<JobError>,
    /// Non-fatal errors encountered while running
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<JobError>,
}

impl JobStatus {
    pub fn pending() -> Self {
        Self::with_state(JobState::Pending)
    }

    pub fn running() -> Self {
        Self::with_state(JobState::Running)
    }

    pub fn succeeded() -> Self {
        Self::with_state(JobState::Done)
    }

    pub fn failed(error: JobError) -> Self {
        Self {
            state: JobState::Done,
            error_result: Some(error),
            errors: Vec::new(),
        }
    }

    fn with_state(state: JobState) -> Self {
        Self {
            state,
            error_result: None,
            errors: Vec::new(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// The terminal outcome, or `None` while the job is still in flight
    pub fn outcome(&self) -> Option<JobOutcome> {
        if !self.is_terminal() {
            return None;
        }
        Some(match &self.error_result {
            Some(err) => JobOutcome::Failed(err.clone()),
            None => JobOutcome::Success,
        })
    }

    /// The terminal failure, if any
    pub fn err(&self) -> Option<&JobError> {
        if self.is_terminal() {
            self.error_result.as_ref()
        } else {
            None
        }
    }
}

/// A submitted job and the status the service reported with it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub reference: JobRef,
    pub status: JobStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Job {
    pub fn new(reference: JobRef, status: JobStatus) -> Self {
        Self {
            reference,
            status,
            created_at: None,
        }
    }

    pub fn id(&self) -> &JobId {
        &self.reference.job_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_done_is_terminal() {
        assert!(!JobState::Pending.is_terminal());
        assert!(!JobState::Running.is_terminal());
        assert!(JobState::Done.is_terminal());
    }

    #[test]
    fn test_transitions_are_monotonic() {
        assert!(JobState::Pending.can_transition_to(JobState::Running));
        assert!(JobState::Pending.can_transition_to(JobState::Done));
        assert!(JobState::Running.can_transition_to(JobState::Done));
        assert!(!JobState::Running.can_transition_to(JobState::Pending));
        assert!(!JobState::Done.can_transition_to(JobState::Running));
        assert!(!JobState::Done.can_transition_to(JobState::Pending));
        assert!(JobState::Done.can_transition_to(JobState::Done));
    }

    #[test]
    fn test_outcome_only_when_done() {
        assert_eq!(JobStatus::running().outcome(), None);
        assert_eq!(JobStatus::succeeded().outcome(), Some(JobOutcome::Success));

        let denied = JobError::new("accessDenied", "permission denied");
        let status = JobStatus::failed(denied.clone());
        assert_eq!(status.outcome(), Some(JobOutcome::Failed(denied.clone())));
        assert_eq!(status.err(), Some(&denied));
    }

    #[test]
    fn test_error_result_ignored_while_running() {
        let status = JobStatus {
            state: JobState::Running,
            error_result: Some(JobError::new("backendError", "transient")),
            errors: Vec::new(),
        };
        assert!(status.err().is_none());
        assert!(status.outcome().is_none());
    }

    #[test]
    fn test_status_deserializes_wire_shape() {
        let status: JobStatus = serde_json::from_str(
            r#"{"state":"DONE","errorResult":{"reason":"accessDenied","message":"permission denied"}}"#,
        )
        .unwrap();
        assert_eq!(status.state, JobState::Done);
        assert_eq!(status.err().unwrap().message, "permission denied");
        assert!(status.errors.is_empty());
    }

    #[test]
    fn test_job_error_display() {
        assert_eq!(
            JobError::new("accessDenied", "permission denied").to_string(),
            "permission denied (accessDenied)"
        );
        assert_eq!(JobError::new("", "boom").to_string(), "boom");
        assert_eq!(JobError::new("", "").to_string(), "unknown error");
    }
}
