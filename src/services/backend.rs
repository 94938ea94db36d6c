use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Url};
use std::time::Duration;

use crate::models::clip::ResultSet;
use crate::models::job::{JobId, JobStatus, StatusResponse, UploadResponse};
use crate::models::options::UploadRequest;
use crate::services::poller::PollError;
use crate::services::results::ResultsFetchError;
use crate::services::uploader::UploadError;

/// The three backend operations the job lifecycle depends on.
#[async_trait]
pub trait JobsApi: Send + Sync {
    /// `POST /upload`
    async fn submit(&self, request: UploadRequest) -> Result<JobId, UploadError>;

    /// `GET /jobs/{job_id}/status`
    async fn status(&self, job_id: &JobId) -> Result<JobStatus, PollError>;

    /// `GET /jobs/{job_id}/results`
    async fn results(&self, job_id: &JobId) -> Result<ResultSet, ResultsFetchError>;
}

/// HTTP client for the ClippyIO processing backend.
pub struct BackendClient {
    http: Client,
    base_url: Url,
}

impl BackendClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, BackendError> {
        let parsed = Url::parse(base_url)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| BackendError::InvalidBaseUrl(base_url.to_string()))?;

        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: parsed,
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    /// Base URL with `segments` appended, each percent-encoded as one path segment.
    fn endpoint<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Url {
        let mut url = self.base_url.clone();
        // Always Ok: `new` rejects cannot-be-a-base URLs.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn job_url(&self, job_id: &JobId, resource: &str) -> Url {
        self.endpoint(["jobs", job_id.as_str(), resource])
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("Invalid backend URL: {0}")]
    InvalidBaseUrl(String),

    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

#[async_trait]
impl JobsApi for BackendClient {
    async fn submit(&self, request: UploadRequest) -> Result<JobId, UploadError> {
        let mime = request.mime_type();
        let part = Part::bytes(request.bytes)
            .file_name(request.file_name)
            .mime_str(mime)?;

        let form = request
            .options
            .form_fields()
            .into_iter()
            .fold(Form::new().part("file", part), |form, (name, value)| {
                form.text(name, value)
            });

        let response = self
            .http
            .post(self.endpoint(["upload"]))
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UploadError::Status { status, body });
        }

        let body: UploadResponse = response.json().await?;
        Ok(body.job_id)
    }

    async fn status(&self, job_id: &JobId) -> Result<JobStatus, PollError> {
        let response = self.http.get(self.job_url(job_id, "status")).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(PollError::Status(status));
        }

        let body: StatusResponse = response.json().await?;
        Ok(body.status)
    }

    async fn results(&self, job_id: &JobId) -> Result<ResultSet, ResultsFetchError> {
        let response = self.http.get(self.job_url(job_id, "results")).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ResultsFetchError::Status(status));
        }

        Ok(response.json().await?)
    }
}
