//! Wire shapes for the v2 REST API

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::job::{Job, JobRef, JobStatus};
use crate::params::{CopySpec, TableRef};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TableReference<'a> {
    pub project_id: &'a str,
    pub dataset_id: &'a str,
    pub table_id: &'a str,
}

impl<'a> TableReference<'a> {
    /// `table` must already be resolved against a project
    pub fn from_resolved(table: &'a TableRef, default_project: &'a str) -> Self {
        Self {
            project_id: table.project_id.as_deref().unwrap_or(default_project),
            dataset_id: &table.dataset_id,
            table_id: &table.table_id,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CopyConfiguration<'a> {
    pub source_table: TableReference<'a>,
    pub destination_table: TableReference<'a>,
    pub write_disposition: &'static str,
}

impl<'a> CopyConfiguration<'a> {
    pub fn new(spec: &'a CopySpec, default_project: &'a str) -> Self {
        Self {
            source_table: TableReference::from_resolved(&spec.source, default_project),
            destination_table: TableReference::from_resolved(&spec.destination, default_project),
            write_disposition: spec.write_disposition.as_api_str(),
        }
    }
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct JobConfigurationBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub copy: Option<CopyConfiguration<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct JobReferenceBody<'a> {
    pub project_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<&'a str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct InsertJobRequest<'a> {
    pub job_reference: JobReferenceBody<'a>,
    pub configuration: JobConfigurationBody<'a>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct JobReferenceWire {
    pub project_id: String,
    pub job_id: String,
    #[serde(default)]
    pub location: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct JobStatistics {
    /// Milliseconds since the epoch, encoded as a string
    #[serde(default)]
    pub creation_time: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct JobResource {
    pub job_reference: JobReferenceWire,
    #[serde(default)]
    pub status: Option<JobStatus>,
    #[serde(default)]
    pub statistics: Option<JobStatistics>,
}

impl JobResource {
    pub fn into_job(self) -> Job {
        let created_at = self
            .statistics
            .and_then(|s| s.creation_time)
            .and_then(|ms| ms.parse::<i64>().ok())
            .and_then(DateTime::<Utc>::from_timestamp_millis);

        let reference = JobRef {
            project_id: self.job_reference.project_id,
            job_id: self.job_reference.job_id.into(),
            location: self.job_reference.location,
        };

        Job {
            reference,
            status: self.status.unwrap_or_else(JobStatus::pending),
            created_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DatasetReferenceBody<'a> {
    pub project_id: &'a str,
    pub dataset_id: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct InsertDatasetRequest<'a> {
    pub dataset_reference: DatasetReferenceBody<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DatasetReferenceWire {
    pub project_id: String,
    pub dataset_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DatasetResource {
    pub dataset_reference: DatasetReferenceWire,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub friendly_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DatasetList {
    #[serde(default)]
    pub datasets: Vec<DatasetResource>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: Option<String>,
}

/// Dataset summary returned by create and list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetInfo {
    pub project_id: String,
    pub dataset_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub friendly_name: Option<String>,
}

impl From<DatasetResource> for DatasetInfo {
    fn from(resource: DatasetResource) -> Self {
        Self {
            project_id: resource.dataset_reference.project_id,
            dataset_id: resource.dataset_reference.dataset_id,
            location: resource.location,
            friendly_name: resource.friendly_name,
        }
    }
}
