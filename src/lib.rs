//! ClippyIO job-lifecycle client
//!
//! This library submits videos to the ClippyIO processing backend, tracks the
//! resulting job through its status lifecycle by polling, fetches the clip
//! results once, and exposes a clamped clip navigator over them. It also ships
//! an in-memory stub of the backend for local runs and tests.

pub mod app_state;
pub mod config;
pub mod models;
pub mod services;
pub mod stub;
pub mod telemetry;
pub mod view;
