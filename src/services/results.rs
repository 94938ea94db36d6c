use reqwest::StatusCode;
use std::sync::Arc;

use crate::models::clip::ResultSet;
use crate::models::job::JobId;
use crate::services::backend::JobsApi;
use crate::telemetry;

/// Fetches the results of a finished job. Failures are returned as-is; no retry.
pub struct ResultsFetcher {
    api: Arc<dyn JobsApi>,
}

impl ResultsFetcher {
    pub fn new(api: Arc<dyn JobsApi>) -> Self {
        Self { api }
    }

    pub async fn fetch(&self, job_id: &JobId) -> Result<ResultSet, ResultsFetchError> {
        tracing::debug!(job_id = %job_id, "Fetching job results");

        match self.api.results(job_id).await {
            Ok(results) => {
                tracing::info!(
                    job_id = %job_id,
                    clips = results.clips.len(),
                    has_summary = results.summary.is_some(),
                    has_caption = results.caption.is_some(),
                    "Results fetched"
                );
                Ok(results)
            }
            Err(e) => {
                metrics::counter!(telemetry::RESULTS_FETCH_FAILURES_TOTAL).increment(1);
                tracing::warn!(job_id = %job_id, error = %e, "Results fetch failed");
                Err(e)
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ResultsFetchError {
    #[error("Results request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Results request returned status {0}")]
    Status(StatusCode),
}
