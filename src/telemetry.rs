//! Metric names recorded by the client, with their descriptions.

pub const UPLOADS_TOTAL: &str = "clippyio_uploads_total";
pub const UPLOAD_FAILURES_TOTAL: &str = "clippyio_upload_failures_total";
pub const POLLS_TOTAL: &str = "clippyio_polls_total";
pub const POLL_ERRORS_TOTAL: &str = "clippyio_poll_errors_total";
pub const STALE_POLL_RESPONSES_TOTAL: &str = "clippyio_stale_poll_responses_total";
pub const RESULTS_FETCH_FAILURES_TOTAL: &str = "clippyio_results_fetch_failures_total";
pub const JOB_WAIT_SECONDS: &str = "clippyio_job_wait_seconds";

/// Register descriptions with the installed recorder.
pub fn describe() {
    metrics::describe_counter!(UPLOADS_TOTAL, "Total videos submitted for processing");
    metrics::describe_counter!(UPLOAD_FAILURES_TOTAL, "Uploads rejected or failed in transport");
    metrics::describe_counter!(POLLS_TOTAL, "Job status requests issued");
    metrics::describe_counter!(
        POLL_ERRORS_TOTAL,
        "Job status requests that failed and were retried on the next tick"
    );
    metrics::describe_counter!(
        STALE_POLL_RESPONSES_TOTAL,
        "Status responses discarded because a newer one was already applied"
    );
    metrics::describe_counter!(
        RESULTS_FETCH_FAILURES_TOTAL,
        "Results fetches that failed and forced the job view to failed"
    );
    metrics::describe_histogram!(
        JOB_WAIT_SECONDS,
        "Time from attaching a job view until it settled on results or failure"
    );
}
