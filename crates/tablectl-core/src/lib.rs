//! # tablectl-core
//!
//! Shared engine behind the `tablectl` CLI. It wraps a BigQuery-style v2
//! REST API with the pieces a caller needs to run long-lived warehouse jobs:
//!
//! - **Jobs** - typed job handles, status snapshots and terminal outcomes
//! - **Service boundary** - the [`JobService`] trait (`create_job`,
//!   `get_status`) so polling logic can run against a fake
//! - **Polling** - [`submit`] and [`await_completion`] with progress callbacks,
//!   a caller timeout and cancellation through an explicit [`Context`]
//! - **Workflows** - compositions such as [`copy_table_and_wait`]
//! - **Config** - TOML profiles with env expansion and keyring references
//!
//! ## Example
//!
//! ```rust,ignore
//! use tablectl_core::{Context, CopySpec, PollOptions, TableRef, WarehouseClient, WriteDisposition};
//! use tablectl_core::copy_table_and_wait;
//!
//! let client = WarehouseClient::builder()
//!     .project_id("my-project")
//!     .access_token(token)
//!     .build()?;
//!
//! let spec = CopySpec::new(
//!     TableRef::parse("sales.orders")?,
//!     TableRef::parse("sales.orders_backup")?,
//! )
//! .write_disposition(WriteDisposition::Truncate);
//!
//! let result = copy_table_and_wait(
//!     &client,
//!     &Context::background(),
//!     &spec,
//!     &PollOptions::default(),
//!     None,
//! )
//! .await?;
//! println!("copied in job {}", result.job_id);
//! ```

pub mod client;
pub mod config;
pub mod context;
pub mod error;
pub mod job;
pub mod params;
pub mod progress;
pub mod service;
pub mod testing;
pub mod workflows;

pub use client::{ClientBuilder, DatasetInfo, WarehouseClient};
pub use config::{Config, ConfigError, PollConfig, Profile};
pub use context::Context;
pub use error::{CoreError, Result, ServiceError};
pub use job::{Job, JobError, JobId, JobOutcome, JobRef, JobState, JobStatus};
pub use params::{CopySpec, JobConfiguration, TableRef, WriteDisposition};
pub use progress::{PollOptions, ProgressCallback, ProgressEvent, await_completion, submit};
pub use service::{JobService, ServiceResult};
pub use workflows::{CopyResult, copy_table_and_wait, wait_for_job};
