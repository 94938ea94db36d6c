pub mod access;
pub mod backend;
pub mod navigator;
pub mod poller;
pub mod results;
pub mod uploader;
