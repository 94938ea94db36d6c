use std::sync::Arc;
use std::time::Duration;

use crate::config::ClientConfig;
use crate::services::{
    backend::{BackendClient, BackendError, JobsApi},
    poller::JobStatusPoller,
    results::ResultsFetcher,
    uploader::Uploader,
};

/// Shared client state handed to every job view and command.
#[derive(Clone)]
pub struct AppState {
    pub api: Arc<dyn JobsApi>,
    pub uploader: Arc<Uploader>,
    pub fetcher: Arc<ResultsFetcher>,
    pub poll_interval: Duration,
}

impl AppState {
    pub fn new(api: Arc<dyn JobsApi>, poll_interval: Duration) -> Self {
        Self {
            uploader: Arc::new(Uploader::new(Arc::clone(&api))),
            fetcher: Arc::new(ResultsFetcher::new(Arc::clone(&api))),
            api,
            poll_interval,
        }
    }

    /// Build the HTTP-backed state from configuration.
    pub fn from_config(config: &ClientConfig) -> Result<Self, BackendError> {
        let backend = BackendClient::new(&config.api_base, config.request_timeout())?;
        Ok(Self::new(Arc::new(backend), config.poll_interval()))
    }

    /// A poller for a new job view. Each view gets its own instance.
    pub fn poller(&self) -> JobStatusPoller {
        JobStatusPoller::new(Arc::clone(&self.api), self.poll_interval)
    }
}
