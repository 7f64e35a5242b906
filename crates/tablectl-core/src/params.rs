//! Typed parameters for warehouse jobs
//!
//! These types are the inbound side of a job: which table to read, which
//! to write and how to treat existing destination data.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

const MAX_ID_LEN: usize = 1024;

/// Fully or partially qualified table reference
///
/// Accepts `project:dataset.table`, `project.dataset.table` or
/// `dataset.table`. A missing project is filled in from the client's
/// project when the request is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    pub dataset_id: String,
    pub table_id: String,
}

impl TableRef {
    pub fn new(dataset_id: impl Into<String>, table_id: impl Into<String>) -> Self {
        Self {
            project_id: None,
            dataset_id: dataset_id.into(),
            table_id: table_id.into(),
        }
    }

    pub fn in_project(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }

    /// Parse a textual reference and validate each component
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();

        let (project, rest) = match input.split_once(':') {
            Some((project, rest)) => (Some(project), rest),
            None => (None, input),
        };

        let parts: Vec<&str> = rest.split('.').collect();
        let table = match (project, parts.as_slice()) {
            (Some(project), [dataset, table]) => {
                TableRef::new(*dataset, *table).in_project(project)
            }
            (None, [dataset, table]) => TableRef::new(*dataset, *table),
            (None, [project, dataset, table]) => {
                TableRef::new(*dataset, *table).in_project(*project)
            }
            _ => {
                return Err(CoreError::Validation(format!(
                    "Invalid table reference '{}': expected [project:]dataset.table or project.dataset.table",
                    input
                )));
            }
        };

        table.validate()?;
        Ok(table)
    }

    /// Copy of this reference with the project filled in if it was missing
    pub fn resolve(&self, default_project: &str) -> Self {
        let mut resolved = self.clone();
        if resolved.project_id.is_none() {
            resolved.project_id = Some(default_project.to_string());
        }
        resolved
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(project) = &self.project_id {
            validate_project_id(project)?;
        }
        validate_dataset_id(&self.dataset_id)?;
        validate_table_id(&self.table_id)
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.project_id {
            Some(project) => write!(f, "{}:{}.{}", project, self.dataset_id, self.table_id),
            None => write!(f, "{}.{}", self.dataset_id, self.table_id),
        }
    }
}

impl FromStr for TableRef {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        TableRef::parse(s)
    }
}

/// Project IDs are lowercase letters, digits and hyphens
pub fn validate_project_id(project: &str) -> Result<()> {
    if project.is_empty() {
        return Err(CoreError::Validation("Project ID must not be empty".to_string()));
    }
    if !project
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(CoreError::Validation(format!(
            "Invalid project ID '{}': use lowercase letters, digits and hyphens",
            project
        )));
    }
    Ok(())
}

pub(crate) fn validate_dataset_id(dataset: &str) -> Result<()> {
    if dataset.is_empty() || dataset.len() > MAX_ID_LEN {
        return Err(CoreError::Validation(format!(
            "Dataset ID must be 1-{} characters",
            MAX_ID_LEN
        )));
    }
    if !dataset.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(CoreError::Validation(format!(
            "Invalid dataset ID '{}': use letters, digits and underscores",
            dataset
        )));
    }
    Ok(())
}

pub(crate) fn validate_table_id(table: &str) -> Result<()> {
    if table.is_empty() || table.len() > MAX_ID_LEN {
        return Err(CoreError::Validation(format!(
            "Table ID must be 1-{} characters",
            MAX_ID_LEN
        )));
    }
    if !table
        .chars()
        .all(|c| c.is_alphanumeric() || c == '_' || c == '-' || c == ' ')
    {
        return Err(CoreError::Validation(format!(
            "Invalid table ID '{}'",
            table
        )));
    }
    Ok(())
}

/// How a job treats data already present in the destination
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
pub enum WriteDisposition {
    /// Overwrite the destination
    #[serde(rename = "WRITE_TRUNCATE")]
    Truncate,
    /// Append to the destination
    #[serde(rename = "WRITE_APPEND")]
    Append,
    /// Fail unless the destination is empty
    #[default]
    #[serde(rename = "WRITE_EMPTY")]
    Empty,
}

impl WriteDisposition {
    pub fn as_api_str(self) -> &'static str {
        match self {
            WriteDisposition::Truncate => "WRITE_TRUNCATE",
            WriteDisposition::Append => "WRITE_APPEND",
            WriteDisposition::Empty => "WRITE_EMPTY",
        }
    }
}

impl fmt::Display for WriteDisposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_api_str())
    }
}

/// Copy one table into another
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CopySpec {
    pub source: TableRef,
    pub destination: TableRef,
    #[serde(default)]
    pub write_disposition: WriteDisposition,
}

impl CopySpec {
    pub fn new(source: TableRef, destination: TableRef) -> Self {
        Self {
            source,
            destination,
            write_disposition: WriteDisposition::default(),
        }
    }

    pub fn write_disposition(mut self, disposition: WriteDisposition) -> Self {
        self.write_disposition = disposition;
        self
    }

    /// Fill in missing projects on both sides
    pub fn resolve(&self, default_project: &str) -> Self {
        Self {
            source: self.source.resolve(default_project),
            destination: self.destination.resolve(default_project),
            write_disposition: self.write_disposition,
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.source.validate()?;
        self.destination.validate()?;

        let same_project = self.source.project_id == self.destination.project_id;
        if same_project
            && self.source.dataset_id == self.destination.dataset_id
            && self.source.table_id == self.destination.table_id
        {
            return Err(CoreError::Validation(format!(
                "Source and destination are the same table: {}",
                self.source
            )));
        }
        Ok(())
    }
}

/// Operation a job performs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum JobConfiguration {
    Copy(CopySpec),
}

impl JobConfiguration {
    pub fn kind(&self) -> &'static str {
        match self {
            JobConfiguration::Copy(_) => "copy",
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            JobConfiguration::Copy(spec) => spec.validate(),
        }
    }

    pub fn resolve(&self, default_project: &str) -> Self {
        match self {
            JobConfiguration::Copy(spec) => JobConfiguration::Copy(spec.resolve(default_project)),
        }
    }
}

impl From<CopySpec> for JobConfiguration {
    fn from(spec: CopySpec) -> Self {
        JobConfiguration::Copy(spec)
    }
}
