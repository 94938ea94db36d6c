pub mod clip;
pub mod job;
pub mod options;
