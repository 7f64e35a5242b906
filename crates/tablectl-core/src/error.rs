//! Unified error handling for tablectl-core
//!
//! [`ServiceError`] describes what went wrong talking to the warehouse service.
//! [`CoreError`] says *where* in a job's life it went wrong: before a job
//! existed, while polling it, or because the job itself reported failure.
//!
//! # Example
//!
//! ```rust
//! use tablectl_core::{CoreError, JobError, JobId, ServiceError};
//!
//! let err = CoreError::JobFailed {
//!     job_id: JobId::from("j1"),
//!     error: JobError::new("accessDenied", "permission denied"),
//! };
//! assert!(err.is_job_failure());
//!
//! let err = CoreError::Poll {
//!     job_id: JobId::from("j1"),
//!     source: ServiceError::Connection("connection reset".to_string()),
//! };
//! assert!(!err.is_job_failure());
//! assert!(err.is_transport());
//! ```

use std::time::Duration;
use thiserror::Error;

use crate::config::ConfigError;
use crate::context::Interrupted;
use crate::job::{JobError, JobId};

/// Errors reported by the warehouse service boundary
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ServiceError {
    /// 400 - malformed request or invalid resource reference
    #[error("Bad request: {message}")]
    BadRequest { message: String },

    /// 401 - missing or expired credentials
    #[error("Authentication failed: {message}")]
    Unauthorized { message: String },

    /// 403 - caller lacks permission on the resource
    #[error("Permission denied: {message}")]
    Forbidden { message: String },

    /// 404
    #[error("Not found: {message}")]
    NotFound { message: String },

    /// 409 - resource already exists
    #[error("Conflict: {message}")]
    Conflict { message: String },

    /// 5xx
    #[error("Server error ({code}): {message}")]
    Server { code: u16, message: String },

    /// Any other non-success status
    #[error("API error ({code}): {message}")]
    Api { code: u16, message: String },

    /// The request never produced an HTTP response
    #[error("Connection error: {0}")]
    Connection(String),

    /// The response body could not be decoded
    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// The call was abandoned because the caller's context fired
    #[error(transparent)]
    Interrupted(#[from] Interrupted),
}

impl ServiceError {
    /// Build an error from an HTTP status code and message
    pub fn from_status(code: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match code {
            400 => ServiceError::BadRequest { message },
            401 => ServiceError::Unauthorized { message },
            403 => ServiceError::Forbidden { message },
            404 => ServiceError::NotFound { message },
            409 => ServiceError::Conflict { message },
            500..=599 => ServiceError::Server { code, message },
            _ => ServiceError::Api { code, message },
        }
    }

    /// HTTP status code, if the error came from a response
    #[must_use]
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ServiceError::BadRequest { .. } => Some(400),
            ServiceError::Unauthorized { .. } => Some(401),
            ServiceError::Forbidden { .. } => Some(403),
            ServiceError::NotFound { .. } => Some(404),
            ServiceError::Conflict { .. } => Some(409),
            ServiceError::Server { code, .. } | ServiceError::Api { code, .. } => Some(*code),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, ServiceError::NotFound { .. })
    }

    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            ServiceError::Unauthorized { .. } | ServiceError::Forbidden { .. }
        )
    }

    #[must_use]
    pub fn is_server_error(&self) -> bool {
        matches!(self, ServiceError::Server { .. })
    }

    /// Returns true if no usable response came back from the service
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            ServiceError::Connection(_) | ServiceError::Decode(_) | ServiceError::Server { .. }
        )
    }
}

/// Core error type for job submission, polling and one-call operations
#[derive(Error, Debug)]
pub enum CoreError {
    /// The service rejected the request before a job existed
    #[error("Job submission rejected: {0}")]
    Submission(ServiceError),

    /// Transport failure while checking a job's status
    #[error("Failed to poll job {job_id}: {source}")]
    Poll {
        job_id: JobId,
        #[source]
        source: ServiceError,
    },

    /// The job reached a terminal state with a failure outcome
    #[error("Job {job_id} failed: {error}")]
    JobFailed { job_id: JobId, error: JobError },

    /// The caller's wait bound elapsed before the job finished
    #[error("Job timed out after {0:?}")]
    TaskTimeout(Duration),

    /// The context deadline passed
    #[error("Context deadline exceeded")]
    DeadlineExceeded,

    /// The context was cancelled
    #[error("Operation cancelled")]
    Cancelled,

    /// Error from a one-call service operation
    #[error("Warehouse API error: {0}")]
    Service(ServiceError),

    /// Validation error (e.g., malformed table reference)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, CoreError>;

impl From<Interrupted> for CoreError {
    fn from(interrupt: Interrupted) -> Self {
        match interrupt {
            Interrupted::Cancelled => CoreError::Cancelled,
            Interrupted::DeadlineExceeded => CoreError::DeadlineExceeded,
        }
    }
}

impl From<ServiceError> for CoreError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Interrupted(interrupt) => interrupt.into(),
            other => CoreError::Service(other),
        }
    }
}

impl CoreError {
    /// Wrap a `create_job` failure, keeping context interruptions distinct
    pub fn submission(err: ServiceError) -> Self {
        match err {
            ServiceError::Interrupted(interrupt) => interrupt.into(),
            other => CoreError::Submission(other),
        }
    }

    /// Wrap a `get_status` failure, keeping context interruptions distinct
    pub fn poll(job_id: &JobId, err: ServiceError) -> Self {
        match err {
            ServiceError::Interrupted(interrupt) => interrupt.into(),
            other => CoreError::Poll {
                job_id: job_id.clone(),
                source: other,
            },
        }
    }

    fn service_error(&self) -> Option<&ServiceError> {
        match self {
            CoreError::Submission(e) | CoreError::Service(e) => Some(e),
            CoreError::Poll { source, .. } => Some(source),
            _ => None,
        }
    }

    /// Returns true if this is a "not found" error (404)
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.service_error().is_some_and(ServiceError::is_not_found)
    }

    /// Returns true if this is an authentication/authorization error (401/403)
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        self.service_error()
            .is_some_and(ServiceError::is_unauthorized)
    }

    /// Returns true if this is a server error (5xx)
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.service_error()
            .is_some_and(ServiceError::is_server_error)
    }

    /// Returns true if the job itself ran and reported failure
    #[must_use]
    pub fn is_job_failure(&self) -> bool {
        matches!(self, CoreError::JobFailed { .. })
    }

    /// Returns true if this is a transport failure while polling
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, CoreError::Poll { .. })
    }

    /// Returns true if a wait bound or deadline elapsed
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, CoreError::TaskTimeout(_) | CoreError::DeadlineExceeded)
    }

    /// Returns true if the caller cancelled the operation
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, CoreError::Cancelled)
    }

    /// Returns true if this is a bad request error (400) or failed local validation
    #[must_use]
    pub fn is_bad_request(&self) -> bool {
        match self {
            CoreError::Validation(_) => true,
            _ => self
                .service_error()
                .is_some_and(|e| matches!(e, ServiceError::BadRequest { .. })),
        }
    }
}
