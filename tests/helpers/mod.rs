//! Test helper utilities: a scripted backend and an in-process stub server
#![allow(dead_code)]

use async_trait::async_trait;
use reqwest::StatusCode;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use clippyio_client::app_state::AppState;
use clippyio_client::models::clip::ResultSet;
use clippyio_client::models::job::{JobId, JobStatus};
use clippyio_client::models::options::UploadRequest;
use clippyio_client::services::backend::JobsApi;
use clippyio_client::services::poller::PollError;
use clippyio_client::services::results::ResultsFetchError;
use clippyio_client::services::uploader::UploadError;
use clippyio_client::stub::{self, StubState};

/// Poll interval used by tests running on a paused clock.
pub const POLL_INTERVAL: Duration = Duration::from_millis(2500);

/// One scripted answer to a status poll.
#[derive(Debug, Clone, Copy)]
pub enum Poll {
    Status(JobStatus),
    TransientError,
}

/// Backend double that answers from a script and counts every call.
///
/// Once the status script runs out the job keeps reporting `processing`.
/// A missing results payload makes the results request fail with 500.
pub struct ScriptedApi {
    job_id: JobId,
    polls: Mutex<VecDeque<Poll>>,
    results: Option<ResultSet>,
    submit_calls: AtomicUsize,
    status_calls: AtomicUsize,
    results_calls: AtomicUsize,
}

impl ScriptedApi {
    pub fn new(job_id: &str, polls: Vec<Poll>, results: Option<ResultSet>) -> Arc<Self> {
        Arc::new(Self {
            job_id: JobId::new(job_id),
            polls: Mutex::new(polls.into()),
            results,
            submit_calls: AtomicUsize::new(0),
            status_calls: AtomicUsize::new(0),
            results_calls: AtomicUsize::new(0),
        })
    }

    pub fn submit_calls(&self) -> usize {
        self.submit_calls.load(Ordering::SeqCst)
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub fn results_calls(&self) -> usize {
        self.results_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl JobsApi for ScriptedApi {
    async fn submit(&self, _request: UploadRequest) -> Result<JobId, UploadError> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.job_id.clone())
    }

    async fn status(&self, job_id: &JobId) -> Result<JobStatus, PollError> {
        assert_eq!(job_id, &self.job_id, "polled an unexpected job");
        self.status_calls.fetch_add(1, Ordering::SeqCst);

        let next = self.polls.lock().unwrap().pop_front();
        match next {
            Some(Poll::Status(status)) => Ok(status),
            Some(Poll::TransientError) => Err(PollError::Status(StatusCode::BAD_GATEWAY)),
            None => Ok(JobStatus::Processing),
        }
    }

    async fn results(&self, job_id: &JobId) -> Result<ResultSet, ResultsFetchError> {
        assert_eq!(job_id, &self.job_id, "fetched results of an unexpected job");
        self.results_calls.fetch_add(1, Ordering::SeqCst);

        self.results
            .clone()
            .ok_or(ResultsFetchError::Status(StatusCode::INTERNAL_SERVER_ERROR))
    }
}

/// Client state wired to a scripted backend.
pub fn scripted_state(api: Arc<ScriptedApi>) -> AppState {
    AppState::new(api, POLL_INTERVAL)
}

/// Start the stub backend on an ephemeral port and return its base URL.
pub async fn spawn_stub(polls_until_done: u32) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind stub listener");
    let base_url = format!("http://{}", listener.local_addr().unwrap());

    let app = stub::router(StubState::new(polls_until_done, &base_url));
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Stub server error");
    });

    base_url
}
