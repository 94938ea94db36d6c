//! In-memory stand-in for the ClippyIO processing backend.
//!
//! Jobs advance one stage per status poll: the first poll reports `queued`,
//! later polls `processing`, and the poll numbered `polls_until_done` reports
//! the terminal status. Uploads whose file name starts with `fail` end in
//! `failed`; all others end in `done` with synthetic clips.

pub mod routes;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::models::clip::{Clip, ResultSet};
use crate::models::job::{JobId, JobStatus};
use crate::models::options::ProcessingOptions;

/// Length of the synthetic source timeline, in seconds.
const TIMELINE_SECS: f64 = 90.0;
/// Spacing between synthetic clips, in seconds.
const SEGMENT_SECS: f64 = 30.0;
/// Length of each synthetic clip, in seconds.
const CLIP_SECS: f64 = 20.0;

const MAX_UPLOAD_BYTES: usize = 512 * 1024 * 1024;

/// A job held by the stub.
#[derive(Debug, Clone)]
pub struct StubJob {
    pub file_name: String,
    pub size_bytes: usize,
    pub options: ProcessingOptions,
    pub polls: u32,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    /// Set when the job reaches `done` or `failed`.
    pub settled_at: Option<DateTime<Utc>>,
}

impl StubJob {
    fn will_fail(&self) -> bool {
        self.file_name.starts_with("fail")
    }
}

/// Shared state of the stub server.
#[derive(Clone)]
pub struct StubState {
    jobs: Arc<RwLock<HashMap<JobId, StubJob>>>,
    polls_until_done: u32,
    public_base: String,
}

impl StubState {
    pub fn new(polls_until_done: u32, public_base: &str) -> Self {
        Self {
            jobs: Arc::new(RwLock::new(HashMap::new())),
            polls_until_done: polls_until_done.max(1),
            public_base: public_base.trim_end_matches('/').to_string(),
        }
    }

    pub async fn insert(
        &self,
        file_name: String,
        size_bytes: usize,
        options: ProcessingOptions,
    ) -> JobId {
        let job_id = JobId::new(uuid::Uuid::new_v4().to_string());
        let job = StubJob {
            file_name,
            size_bytes,
            options,
            polls: 0,
            status: JobStatus::Queued,
            created_at: Utc::now(),
            settled_at: None,
        };
        self.jobs.write().await.insert(job_id.clone(), job);
        job_id
    }

    /// Record one status poll and return the status it reports.
    pub async fn poll(&self, job_id: &JobId) -> Option<JobStatus> {
        let mut jobs = self.jobs.write().await;
        let job = jobs.get_mut(job_id)?;

        if !job.status.is_terminal() {
            job.polls += 1;
            job.status = if job.polls >= self.polls_until_done {
                if job.will_fail() {
                    JobStatus::Failed
                } else {
                    JobStatus::Done
                }
            } else if job.polls == 1 {
                JobStatus::Queued
            } else {
                JobStatus::Processing
            };

            if job.status.is_terminal() {
                let settled_at = Utc::now();
                job.settled_at = Some(settled_at);
                tracing::info!(
                    job_id = %job_id,
                    status = %job.status,
                    created_at = %job.created_at,
                    elapsed_ms = (settled_at - job.created_at).num_milliseconds(),
                    "Stub job settled"
                );
            }
        }

        Some(job.status)
    }

    pub async fn job(&self, job_id: &JobId) -> Option<StubJob> {
        self.jobs.read().await.get(job_id).cloned()
    }

    /// Synthetic results for a job that is done.
    pub async fn results(&self, job_id: &JobId) -> Option<ResultSet> {
        let job = self.job(job_id).await?;
        if job.status != JobStatus::Done {
            return None;
        }

        let clip_suffix = if job.options.captions { "_captioned" } else { "" };
        let mut clips = Vec::new();
        let mut start = 0.0;
        while start + CLIP_SECS <= TIMELINE_SECS {
            let index = clips.len();
            clips.push(Clip {
                start,
                end: start + CLIP_SECS,
                duration: CLIP_SECS,
                url: format!(
                    "{}/media/{}/clip_{}{}.mp4",
                    self.public_base, job_id, index, clip_suffix
                ),
            });
            start += SEGMENT_SECS;
        }

        Some(ResultSet {
            job_id: job_id.clone(),
            summary: job
                .options
                .summary
                .then(|| format!("Summary of {} ({} bytes).", job.file_name, job.size_bytes)),
            caption: job
                .options
                .video_caption
                .then(|| format!("Highlights from {}", job.file_name)),
            clips,
        })
    }
}

/// Router serving the backend contract on top of `state`.
pub fn router(state: StubState) -> Router {
    Router::new()
        .route("/", get(routes::health_check))
        .route("/upload", post(routes::upload_video))
        .route("/jobs/{job_id}/status", get(routes::job_status))
        .route("/jobs/{job_id}/results", get(routes::job_results))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(MAX_UPLOAD_BYTES))
}
