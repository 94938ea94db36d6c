use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::json;
use std::sync::Arc;

use crate::models::clip::ResultSet;
use crate::models::job::{JobId, JobStatus, StatusResponse, UploadResponse};
use crate::models::options::ProcessingOptions;
use crate::stub::StubState;

/// Error responses in the backend's `{"detail": ...}` shape.
#[derive(Debug)]
pub enum StubError {
    BadRequest(&'static str),
    JobNotFound,
    ResultsNotReady,
}

impl IntoResponse for StubError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            StubError::BadRequest(detail) => (StatusCode::BAD_REQUEST, detail),
            StubError::JobNotFound => (StatusCode::NOT_FOUND, "Job not found"),
            StubError::ResultsNotReady => (StatusCode::NOT_FOUND, "Results not ready"),
        };
        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

/// GET /: liveness check.
pub async fn health_check() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// POST /upload: accept a video and queue a job.
pub async fn upload_video(
    State(state): State<StubState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, StubError> {
    let mut file: Option<(String, usize)> = None;
    let mut options = ProcessingOptions::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| StubError::BadRequest("Malformed multipart body"))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|_| StubError::BadRequest("Unreadable file part"))?;
                file = Some((file_name, data.len()));
            }
            "summary" | "video_caption" | "captions" => {
                let text = field
                    .text()
                    .await
                    .map_err(|_| StubError::BadRequest("Unreadable option field"))?;
                let enabled = parse_flag(&text).ok_or(StubError::BadRequest(
                    "Options must be \"true\" or \"false\"",
                ))?;
                match name.as_str() {
                    "summary" => options.summary = enabled,
                    "video_caption" => options.video_caption = enabled,
                    _ => options.captions = enabled,
                }
            }
            _ => {}
        }
    }

    let (file_name, size_bytes) = file.ok_or(StubError::BadRequest("Missing file part"))?;
    if size_bytes == 0 {
        return Err(StubError::BadRequest("Empty file"));
    }

    let job_id = state.insert(file_name.clone(), size_bytes, options).await;
    tracing::info!(job_id = %job_id, file_name = %file_name, size_bytes, "Stub job queued");

    Ok(Json(UploadResponse {
        job_id,
        status: Some(JobStatus::Queued),
    }))
}

fn parse_flag(text: &str) -> Option<bool> {
    match text.trim() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

/// GET /jobs/{job_id}/status
pub async fn job_status(
    State(state): State<StubState>,
    Path(job_id): Path<String>,
) -> Result<Json<StatusResponse>, StubError> {
    let status = state
        .poll(&JobId::new(job_id))
        .await
        .ok_or(StubError::JobNotFound)?;
    Ok(Json(StatusResponse { status }))
}

/// GET /jobs/{job_id}/results
pub async fn job_results(
    State(state): State<StubState>,
    Path(job_id): Path<String>,
) -> Result<Json<ResultSet>, StubError> {
    state
        .results(&JobId::new(job_id))
        .await
        .map(Json)
        .ok_or(StubError::ResultsNotReady)
}

/// Prometheus metrics scrape endpoint.
pub async fn prometheus_metrics(State(handle): State<Arc<PrometheusHandle>>) -> impl IntoResponse {
    handle.render()
}
