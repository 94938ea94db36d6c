use garde::Validate;
use reqwest::StatusCode;
use std::sync::Arc;

use crate::models::job::JobId;
use crate::models::options::UploadRequest;
use crate::services::backend::JobsApi;
use crate::telemetry;

/// Submits videos for processing. Never retries on its own.
pub struct Uploader {
    api: Arc<dyn JobsApi>,
}

impl Uploader {
    pub fn new(api: Arc<dyn JobsApi>) -> Self {
        Self { api }
    }

    /// Validate and submit an upload, returning the server-issued job id.
    pub async fn submit(&self, request: UploadRequest) -> Result<JobId, UploadError> {
        if let Err(report) = request.validate() {
            metrics::counter!(telemetry::UPLOAD_FAILURES_TOTAL).increment(1);
            return Err(UploadError::Invalid(report));
        }

        let file_name = request.file_name.clone();
        let size_bytes = request.bytes.len();
        let options = request.options;

        tracing::info!(
            file_name = %file_name,
            size_bytes,
            summary = options.summary,
            video_caption = options.video_caption,
            captions = options.captions,
            "Submitting video for processing"
        );

        match self.api.submit(request).await {
            Ok(job_id) => {
                metrics::counter!(telemetry::UPLOADS_TOTAL).increment(1);
                tracing::info!(job_id = %job_id, file_name = %file_name, "Upload accepted");
                Ok(job_id)
            }
            Err(e) => {
                metrics::counter!(telemetry::UPLOAD_FAILURES_TOTAL).increment(1);
                tracing::warn!(file_name = %file_name, error = %e, "Upload failed");
                Err(e)
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("Invalid upload: {0}")]
    Invalid(garde::Report),

    #[error("Upload request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Upload rejected with status {status}: {body}")]
    Status { status: StatusCode, body: String },
}
