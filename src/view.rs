//! Job view: the state machine tying polling, result fetching and clip
//! navigation together for a single job.
//!
//! ```text
//! Queued/Processing --(poll: done)----> AwaitingResults --(fetch ok)--> Viewing
//! Queued/Processing --(poll: failed)--> Failed
//! AwaitingResults   --(fetch error)---> Failed
//! ```
//!
//! [`JobViewState`] holds the pure transitions. [`JobView`] drives them from a
//! [`JobStatusPoller`] and a [`ResultsFetcher`] on the tokio runtime.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;
use tokio::sync::watch;

use crate::app_state::AppState;
use crate::models::clip::{Clip, ResultSet};
use crate::models::job::{JobId, JobStatus};
use crate::services::navigator::{ClipNavigator, NavigationError};
use crate::services::poller::PollHandle;
use crate::services::results::{ResultsFetchError, ResultsFetcher};
use crate::telemetry;

/// Where a job view currently is in its lifecycle.
#[derive(Debug, Clone, PartialEq)]
pub enum JobPhase {
    Queued,
    Processing,
    AwaitingResults,
    Viewing {
        results: ResultSet,
        navigator: ClipNavigator,
    },
    /// Reported by the backend or caused by a failed results fetch.
    Failed,
}

/// Phase without its payload, cheap to copy and broadcast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewStatus {
    Queued,
    Processing,
    AwaitingResults,
    Viewing,
    Failed,
}

impl ViewStatus {
    /// Viewing and Failed are final for a job view.
    pub fn is_settled(&self) -> bool {
        matches!(self, ViewStatus::Viewing | ViewStatus::Failed)
    }
}

/// Work the driver has to carry out after a transition.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    None,
    FetchResults,
}

/// User actions available in the current phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewAction {
    PrevClip,
    NextClip,
    /// Leave this job and start over from upload.
    NewUpload,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JobViewState {
    job_id: JobId,
    phase: JobPhase,
}

impl JobViewState {
    pub fn new(job_id: JobId) -> Self {
        Self {
            job_id,
            phase: JobPhase::Queued,
        }
    }

    pub fn job_id(&self) -> &JobId {
        &self.job_id
    }

    pub fn phase(&self) -> &JobPhase {
        &self.phase
    }

    pub fn view_status(&self) -> ViewStatus {
        match self.phase {
            JobPhase::Queued => ViewStatus::Queued,
            JobPhase::Processing => ViewStatus::Processing,
            JobPhase::AwaitingResults => ViewStatus::AwaitingResults,
            JobPhase::Viewing { .. } => ViewStatus::Viewing,
            JobPhase::Failed => ViewStatus::Failed,
        }
    }

    /// Job status as the user sees it. A failed results fetch reads as `failed`.
    pub fn job_status(&self) -> JobStatus {
        match self.phase {
            JobPhase::Queued => JobStatus::Queued,
            JobPhase::Processing => JobStatus::Processing,
            JobPhase::AwaitingResults | JobPhase::Viewing { .. } => JobStatus::Done,
            JobPhase::Failed => JobStatus::Failed,
        }
    }

    /// Apply a polled status. Returns [`Effect::FetchResults`] exactly once,
    /// on the first `done`. Regressions and anything after a terminal status
    /// are ignored.
    pub fn on_status(&mut self, status: JobStatus) -> Effect {
        let current = self.job_status();
        if !current.can_advance_to(status) {
            if current != status {
                tracing::debug!(
                    job_id = %self.job_id,
                    from = %current,
                    to = %status,
                    "Ignoring status that does not advance the job"
                );
            }
            return Effect::None;
        }

        tracing::info!(job_id = %self.job_id, from = %current, to = %status, "Job status changed");

        match status {
            JobStatus::Queued => Effect::None,
            JobStatus::Processing => {
                self.phase = JobPhase::Processing;
                Effect::None
            }
            JobStatus::Done => {
                self.phase = JobPhase::AwaitingResults;
                Effect::FetchResults
            }
            JobStatus::Failed => {
                self.phase = JobPhase::Failed;
                Effect::None
            }
        }
    }

    /// Apply the outcome of the results fetch. Only meaningful while awaiting results.
    pub fn on_results(&mut self, outcome: Result<ResultSet, ResultsFetchError>) {
        if self.phase != JobPhase::AwaitingResults {
            tracing::warn!(
                job_id = %self.job_id,
                phase = ?self.view_status(),
                "Ignoring results outside AwaitingResults"
            );
            return;
        }

        self.phase = match outcome {
            Ok(results) => JobPhase::Viewing {
                results,
                navigator: ClipNavigator::new(),
            },
            Err(e) => {
                tracing::warn!(
                    job_id = %self.job_id,
                    error = %e,
                    "Results unavailable, marking job failed"
                );
                JobPhase::Failed
            }
        };
    }

    pub fn results(&self) -> Option<&ResultSet> {
        match &self.phase {
            JobPhase::Viewing { results, .. } => Some(results),
            _ => None,
        }
    }

    pub fn cursor(&self) -> Option<usize> {
        match &self.phase {
            JobPhase::Viewing { results, navigator } if !results.clips.is_empty() => {
                Some(navigator.cursor())
            }
            _ => None,
        }
    }

    pub fn next_clip(&mut self) {
        if let JobPhase::Viewing { results, navigator } = &mut self.phase {
            navigator.next(&results.clips);
        }
    }

    pub fn prev_clip(&mut self) {
        if let JobPhase::Viewing { navigator, .. } = &mut self.phase {
            navigator.prev();
        }
    }

    pub fn current_clip(&self) -> Result<&Clip, NavigationError> {
        match &self.phase {
            JobPhase::Viewing { results, navigator } => navigator.current(&results.clips),
            _ => Err(NavigationError::NotViewing),
        }
    }

    /// The way out of a settled view: a new upload. `None` while the job is running.
    /// Settled views are never retried in place.
    pub fn restart(&self) -> Option<ViewAction> {
        self.view_status()
            .is_settled()
            .then_some(ViewAction::NewUpload)
    }

    /// 1-based `(position, total)` of the current clip.
    pub fn clip_position(&self) -> Option<(usize, usize)> {
        match &self.phase {
            JobPhase::Viewing { results, navigator } => navigator.position(&results.clips),
            _ => None,
        }
    }

    /// Actions that are enabled right now. Empty while the job is still running;
    /// `Failed` only offers a new upload.
    pub fn available_actions(&self) -> Vec<ViewAction> {
        match &self.phase {
            JobPhase::Viewing { results, navigator } => {
                let mut actions = Vec::with_capacity(3);
                if !results.clips.is_empty() {
                    if !navigator.is_first() {
                        actions.push(ViewAction::PrevClip);
                    }
                    if !navigator.is_last(&results.clips) {
                        actions.push(ViewAction::NextClip);
                    }
                }
                actions.push(ViewAction::NewUpload);
                actions
            }
            JobPhase::Failed => vec![ViewAction::NewUpload],
            _ => Vec::new(),
        }
    }
}

struct Shared {
    state: Mutex<JobViewState>,
    changes: watch::Sender<ViewStatus>,
}

impl Shared {
    fn state(&self) -> MutexGuard<'_, JobViewState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn publish(&self, status: ViewStatus) {
        self.changes.send_if_modified(|current| {
            let changed = *current != status;
            *current = status;
            changed
        });
    }
}

/// A live view of one job. Polling stops when the view is detached or dropped.
///
/// The results fetch, once started, is not cancelled by detaching.
pub struct JobView {
    shared: Arc<Shared>,
    changes: watch::Receiver<ViewStatus>,
    poller: PollHandle,
}

impl JobView {
    /// Start tracking `job_id` with a fresh state and a fresh poller.
    pub fn attach(app: &AppState, job_id: JobId) -> Self {
        let (changes_tx, changes) = watch::channel(ViewStatus::Queued);
        let shared = Arc::new(Shared {
            state: Mutex::new(JobViewState::new(job_id.clone())),
            changes: changes_tx,
        });

        let fetcher = Arc::clone(&app.fetcher);
        let attached_at = Instant::now();
        let on_status = {
            let shared = Arc::clone(&shared);
            let job_id = job_id.clone();
            move |status: JobStatus| {
                let (effect, view_status) = {
                    let mut state = shared.state();
                    let effect = state.on_status(status);
                    let view_status = state.view_status();
                    shared.publish(view_status);
                    (effect, view_status)
                };

                if view_status == ViewStatus::Failed {
                    metrics::histogram!(telemetry::JOB_WAIT_SECONDS)
                        .record(attached_at.elapsed().as_secs_f64());
                }

                if effect == Effect::FetchResults {
                    tokio::spawn(fetch_results(
                        Arc::clone(&shared),
                        Arc::clone(&fetcher),
                        job_id.clone(),
                        attached_at,
                    ));
                }
            }
        };

        tracing::info!(job_id = %job_id, "Attaching job view");
        let poller = app.poller().start(job_id, on_status);

        Self {
            shared,
            changes,
            poller,
        }
    }

    pub fn view_status(&self) -> ViewStatus {
        *self.changes.borrow()
    }

    /// Wait for the next phase change and return the new phase.
    /// Returns the current phase immediately once the view has settled.
    pub async fn changed(&mut self) -> ViewStatus {
        if !self.view_status().is_settled() {
            // The sender lives in `shared`, which this view keeps alive.
            let _ = self.changes.changed().await;
        }
        *self.changes.borrow_and_update()
    }

    /// Wait until the view reaches Viewing or Failed.
    pub async fn settled(&mut self) -> ViewStatus {
        let settled = self
            .changes
            .wait_for(ViewStatus::is_settled)
            .await
            .map(|status| *status);
        settled.unwrap_or_else(|_| self.view_status())
    }

    /// Read or mutate the state, e.g. to step through clips.
    pub fn with_state<R>(&self, f: impl FnOnce(&mut JobViewState) -> R) -> R {
        f(&mut self.shared.state())
    }

    /// Clone of the current state.
    pub fn snapshot(&self) -> JobViewState {
        self.shared.state().clone()
    }

    /// Stop polling and leave the view.
    pub fn detach(self) {
        tracing::debug!(job_id = %self.shared.state().job_id(), "Detaching job view");
        self.poller.stop();
    }
}

async fn fetch_results(
    shared: Arc<Shared>,
    fetcher: Arc<ResultsFetcher>,
    job_id: JobId,
    attached_at: Instant,
) {
    let outcome = fetcher.fetch(&job_id).await;

    {
        let mut state = shared.state();
        state.on_results(outcome);
        shared.publish(state.view_status());
    }

    metrics::histogram!(telemetry::JOB_WAIT_SECONDS).record(attached_at.elapsed().as_secs_f64());
}
