//! The warehouse service boundary
//!
//! The poller only needs two capabilities from the outside world: create a
//! job and read its status. Keeping them behind a trait lets the same
//! polling code run against [`WarehouseClient`](crate::WarehouseClient) in
//! production and [`ScriptedJobService`](crate::testing::ScriptedJobService)
//! in tests.

use async_trait::async_trait;

use crate::context::Context;
use crate::error::ServiceError;
use crate::job::{Job, JobRef, JobStatus};
use crate::params::JobConfiguration;

/// Result type for service boundary calls
pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

#[async_trait]
pub trait JobService: Send + Sync {
    /// Project that unqualified table references resolve against
    fn project_id(&self) -> &str;

    /// Submit a job; returns the handle and the status reported at creation
    async fn create_job(
        &self,
        ctx: &Context,
        configuration: &JobConfiguration,
    ) -> ServiceResult<Job>;

    /// Fetch a fresh status snapshot for `job`
    async fn get_status(&self, ctx: &Context, job: &JobRef) -> ServiceResult<JobStatus>;
}
