//! Job status polling.
//!
//! A poller instance runs one background task per job. The task issues a
//! status request immediately and then once per interval. Requests are tagged
//! with an increasing sequence number; a response older than the latest one
//! already applied is dropped, so an overlapping slow response can never roll
//! the observed status back.
//!
//! Individual poll failures are swallowed and simply retried on the next tick.
//! The task ends on its own after delivering `done` or `failed`, and issues no
//! further requests afterwards.

use futures::stream::{FuturesUnordered, StreamExt};
use reqwest::StatusCode;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::models::job::{JobId, JobStatus};
use crate::services::backend::JobsApi;
use crate::telemetry;

/// Floor for the poll interval; `tokio::time::interval` rejects a zero period.
const MIN_INTERVAL: Duration = Duration::from_millis(1);

type StatusSink = Box<dyn FnMut(JobStatus) + Send>;
type StatusFuture = Pin<Box<dyn Future<Output = (u64, Result<JobStatus, PollError>)> + Send>>;

/// Spawns status polling tasks against a backend.
#[derive(Clone)]
pub struct JobStatusPoller {
    api: Arc<dyn JobsApi>,
    interval: Duration,
}

impl JobStatusPoller {
    pub fn new(api: Arc<dyn JobsApi>, interval: Duration) -> Self {
        if interval < MIN_INTERVAL {
            tracing::warn!(
                interval_ms = interval.as_millis() as u64,
                "Poll interval too small, using 1ms"
            );
        }
        Self {
            api,
            interval: interval.max(MIN_INTERVAL),
        }
    }

    /// Start polling `job_id`, calling `on_status` with every applied status.
    ///
    /// `on_status` runs on the polling task while teardown is excluded, so it
    /// must not call [`PollHandle::stop`] on its own handle.
    pub fn start<F>(&self, job_id: JobId, on_status: F) -> PollHandle
    where
        F: FnMut(JobStatus) + Send + 'static,
    {
        let cancel = CancellationToken::new();
        let sink: Arc<Mutex<Option<StatusSink>>> = Arc::new(Mutex::new(Some(Box::new(on_status))));

        tracing::debug!(
            job_id = %job_id,
            interval_ms = self.interval.as_millis() as u64,
            "Starting status poller"
        );

        let task = tokio::spawn(run(
            Arc::clone(&self.api),
            job_id,
            self.interval,
            cancel.clone(),
            Arc::clone(&sink),
        ));

        PollHandle { cancel, sink, task }
    }

    /// Stop a poller. Equivalent to [`PollHandle::stop`].
    pub fn stop(&self, handle: &PollHandle) {
        handle.stop();
    }
}

/// Owner of a running poll task. Dropping the handle stops polling.
pub struct PollHandle {
    cancel: CancellationToken,
    sink: Arc<Mutex<Option<StatusSink>>>,
    task: JoinHandle<()>,
}

impl PollHandle {
    /// Stop polling. After this returns no scheduled poll fires and the
    /// status callback is never invoked again. Idempotent.
    pub fn stop(&self) {
        self.cancel.cancel();
        lock(&self.sink).take();
        self.task.abort();
    }

    /// True once the poller stopped, either on a terminal status or via `stop`.
    pub fn is_stopped(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

fn lock(sink: &Mutex<Option<StatusSink>>) -> MutexGuard<'_, Option<StatusSink>> {
    sink.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Hand a status to the consumer. Returns false if the poller was stopped.
fn deliver(sink: &Mutex<Option<StatusSink>>, status: JobStatus) -> bool {
    match lock(sink).as_mut() {
        Some(on_status) => {
            on_status(status);
            true
        }
        None => false,
    }
}

async fn run(
    api: Arc<dyn JobsApi>,
    job_id: JobId,
    interval: Duration,
    cancel: CancellationToken,
    sink: Arc<Mutex<Option<StatusSink>>>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut in_flight: FuturesUnordered<StatusFuture> = FuturesUnordered::new();
    let mut next_seq: u64 = 0;
    let mut applied_seq: Option<u64> = None;

    loop {
        tokio::select! {
            biased;

            _ = cancel.cancelled() => {
                tracing::debug!(job_id = %job_id, "Status poller stopped");
                break;
            }

            Some((seq, outcome)) = in_flight.next(), if !in_flight.is_empty() => {
                let status = match outcome {
                    Ok(status) => status,
                    Err(e) => {
                        metrics::counter!(telemetry::POLL_ERRORS_TOTAL).increment(1);
                        tracing::debug!(
                            job_id = %job_id,
                            seq,
                            error = %e,
                            "Status poll failed, retrying on next tick"
                        );
                        continue;
                    }
                };

                if applied_seq.is_some_and(|applied| seq < applied) {
                    metrics::counter!(telemetry::STALE_POLL_RESPONSES_TOTAL).increment(1);
                    tracing::debug!(
                        job_id = %job_id,
                        seq,
                        %status,
                        "Discarding stale status response"
                    );
                    continue;
                }
                applied_seq = Some(seq);

                tracing::trace!(job_id = %job_id, seq, %status, "Status observed");

                if !deliver(&sink, status) {
                    break;
                }

                if status.is_terminal() {
                    tracing::info!(job_id = %job_id, %status, "Job reached terminal status");
                    break;
                }
            }

            _ = ticker.tick() => {
                next_seq += 1;
                let seq = next_seq;
                metrics::counter!(telemetry::POLLS_TOTAL).increment(1);

                let api = Arc::clone(&api);
                let job_id = job_id.clone();
                in_flight.push(Box::pin(async move { (seq, api.status(&job_id).await) }));
            }
        }
    }

    // Outstanding requests are dropped with `in_flight`.
    cancel.cancel();
    lock(&sink).take();
}

/// A single failed status poll. Never surfaced past the poller.
#[derive(Debug, thiserror::Error)]
pub enum PollError {
    #[error("Status request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Status request returned status {0}")]
    Status(StatusCode),
}
