//! HTTP client for the warehouse v2 REST API
//!
//! [`WarehouseClient`] is the production [`JobService`]. It also carries the
//! one-call operations the CLI exposes directly (datasets, table delete).
//! Every request goes through the caller's [`Context`], so Ctrl-C or a
//! deadline abandons an in-flight request instead of waiting it out.

mod types;

pub use types::DatasetInfo;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, trace, warn};
use url::Url;

use crate::context::Context;
use crate::error::{CoreError, Result, ServiceError};
use crate::job::{Job, JobRef, JobStatus};
use crate::params::{self, JobConfiguration, TableRef};
use crate::service::{JobService, ServiceResult};
use types::{
    CopyConfiguration, DatasetList, DatasetReferenceBody, DatasetResource, ErrorEnvelope,
    InsertDatasetRequest, InsertJobRequest, JobConfigurationBody, JobReferenceBody, JobResource,
};

/// Default API root
pub const DEFAULT_API_URL: &str = "https://bigquery.googleapis.com/bigquery/v2";

/// User agent string for tablectl HTTP requests
const USER_AGENT: &str = concat!("tablectl/", env!("CARGO_PKG_VERSION"));

/// Builder for [`WarehouseClient`]
#[derive(Debug, Clone)]
pub struct ClientBuilder {
    project_id: Option<String>,
    api_url: String,
    access_token: Option<String>,
    location: Option<String>,
    timeout: Option<Duration>,
    user_agent: String,
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self {
            project_id: None,
            api_url: DEFAULT_API_URL.to_string(),
            access_token: None,
            location: None,
            timeout: None,
            user_agent: USER_AGENT.to_string(),
        }
    }
}

impl ClientBuilder {
    pub fn project_id(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }

    pub fn api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    /// Bearer token obtained from an external credential provider
    pub fn access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// Default job location (e.g. `US`, `EU`)
    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Per-request HTTP timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn build(self) -> Result<WarehouseClient> {
        let project_id = self
            .project_id
            .ok_or_else(|| CoreError::Validation("A project ID is required".to_string()))?;
        params::validate_project_id(&project_id)?;

        let base_url = Url::parse(&self.api_url).map_err(|e| {
            CoreError::Validation(format!("Invalid API URL '{}': {}", self.api_url, e))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(CoreError::Validation(format!(
                "Invalid API URL '{}': not a base URL",
                self.api_url
            )));
        }

        let mut http = reqwest::Client::builder().user_agent(self.user_agent);
        if let Some(timeout) = self.timeout {
            http = http.timeout(timeout);
        }
        let http = http
            .build()
            .map_err(|e| CoreError::Service(ServiceError::Connection(e.to_string())))?;

        Ok(WarehouseClient {
            http,
            base_url,
            project_id,
            access_token: self.access_token,
            location: self.location,
        })
    }
}

/// Authenticated client for one project
#[derive(Debug, Clone)]
pub struct WarehouseClient {
    http: reqwest::Client,
    base_url: Url,
    project_id: String,
    access_token: Option<String>,
    location: Option<String>,
}

impl WarehouseClient {
    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    /// Fetch a job resource (reference, status and creation time)
    pub async fn get_job(&self, ctx: &Context, job: &JobRef) -> Result<Job> {
        Ok(self.fetch_job(ctx, job).await?)
    }

    /// Create an empty dataset in the client's project
    pub async fn create_dataset(&self, ctx: &Context, dataset_id: &str) -> Result<DatasetInfo> {
        params::validate_dataset_id(dataset_id)?;

        let body = InsertDatasetRequest {
            dataset_reference: DatasetReferenceBody {
                project_id: &self.project_id,
                dataset_id,
            },
            location: self.location.as_deref(),
        };
        let url = self.endpoint(&["projects", self.project_id.as_str(), "datasets"]);
        let created: DatasetResource = self
            .request_json(ctx, Method::POST, url, Some(&body))
            .await?;

        debug!(dataset_id, "Dataset created");
        Ok(created.into())
    }

    /// List every dataset in the client's project, following page tokens
    pub async fn list_datasets(&self, ctx: &Context) -> Result<Vec<DatasetInfo>> {
        let mut datasets = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut url = self.endpoint(&["projects", self.project_id.as_str(), "datasets"]);
            if let Some(token) = &page_token {
                url.query_pairs_mut().append_pair("pageToken", token);
            }

            let page: DatasetList = self
                .request_json(ctx, Method::GET, url, None::<&()>)
                .await?;
            trace!(count = page.datasets.len(), "Fetched dataset page");
            datasets.extend(page.datasets.into_iter().map(DatasetInfo::from));

            match page.next_page_token {
                Some(token) if page_token.as_deref() == Some(token.as_str()) => {
                    warn!(page_token = %token, "Dataset listing repeated its page token, stopping");
                    break;
                }
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        Ok(datasets)
    }

    /// Delete a table; unqualified references resolve against the client's project
    pub async fn delete_table(&self, ctx: &Context, table: &TableRef) -> Result<()> {
        let table = table.resolve(&self.project_id);
        table.validate()?;

        let project = table.project_id.as_deref().unwrap_or(&self.project_id);
        let url = self.endpoint(&[
            "projects",
            project,
            "datasets",
            table.dataset_id.as_str(),
            "tables",
            table.table_id.as_str(),
        ]);
        self.send(ctx, self.http.delete(url)).await?;

        debug!(table = %table, "Table deleted");
        Ok(())
    }

    async fn fetch_job(&self, ctx: &Context, job: &JobRef) -> ServiceResult<Job> {
        let mut url = self.endpoint(&[
            "projects",
            job.project_id.as_str(),
            "jobs",
            job.job_id.as_str(),
        ]);
        if let Some(location) = job.location.as_deref().or(self.location.as_deref()) {
            url.query_pairs_mut().append_pair("location", location);
        }

        let resource: JobResource = self
            .request_json(ctx, Method::GET, url, None::<&()>)
            .await?;
        Ok(resource.into_job())
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // cannot_be_a_base URLs are rejected in build()
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn request_json<B, T>(
        &self,
        ctx: &Context,
        method: Method,
        url: Url,
        body: Option<&B>,
    ) -> ServiceResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let mut request = self.http.request(method, url);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = self.send(ctx, request).await?;
        let text = ctx
            .run(response.text())
            .await?
            .map_err(|e| ServiceError::Connection(e.to_string()))?;

        serde_json::from_str(&text).map_err(|e| ServiceError::Decode(e.to_string()))
    }

    async fn send(
        &self,
        ctx: &Context,
        request: reqwest::RequestBuilder,
    ) -> ServiceResult<reqwest::Response> {
        let request = match &self.access_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        let response = ctx
            .run(request.send())
            .await?
            .map_err(|e| ServiceError::Connection(e.to_string()))?;

        let status = response.status();
        trace!(status = status.as_u16(), url = %response.url(), "Response received");
        if status.is_success() {
            return Ok(response);
        }

        let body = ctx.run(response.text()).await?.unwrap_or_default();
        Err(error_from_body(status.as_u16(), &body))
    }
}

/// Map an error response to a [`ServiceError`], preferring the API's own message
fn error_from_body(code: u16, body: &str) -> ServiceError {
    let message = match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) if !envelope.error.message.is_empty() => match envelope.error.status {
            Some(status) => format!("{} [{}]", envelope.error.message, status),
            None => envelope.error.message,
        },
        _ if !body.trim().is_empty() => body.trim().to_string(),
        _ => format!("HTTP {}", code),
    };
    ServiceError::from_status(code, message)
}

#[async_trait]
impl JobService for WarehouseClient {
    fn project_id(&self) -> &str {
        &self.project_id
    }

    async fn create_job(
        &self,
        ctx: &Context,
        configuration: &JobConfiguration,
    ) -> ServiceResult<Job> {
        let configuration = configuration.resolve(&self.project_id);
        let body = match &configuration {
            JobConfiguration::Copy(spec) => InsertJobRequest {
                job_reference: JobReferenceBody {
                    project_id: &self.project_id,
                    location: self.location.as_deref(),
                },
                configuration: JobConfigurationBody {
                    copy: Some(CopyConfiguration::new(spec, &self.project_id)),
                },
            },
        };

        let url = self.endpoint(&["projects", self.project_id.as_str(), "jobs"]);
        let resource: JobResource = self
            .request_json(ctx, Method::POST, url, Some(&body))
            .await?;
        Ok(resource.into_job())
    }

    async fn get_status(&self, ctx: &Context, job: &JobRef) -> ServiceResult<JobStatus> {
        Ok(self.fetch_job(ctx, job).await?.status)
    }
}
