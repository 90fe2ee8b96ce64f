//! Core data types for the job-extraction pipeline.

pub mod batch;
pub mod config;
pub mod options;
pub mod record;
