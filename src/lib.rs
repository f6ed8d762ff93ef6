//! Reorganizes a Canvas course's Welcome module into an ordered Student
//! Resources module.
//!
//! - [`canvas`]: the remote API seam and its HTTP client
//! - [`reorganize`]: the staged migration pipeline
//! - [`report`]: per-course progress sinks and run reports
//! - [`config`]: connection settings and run policy

pub mod canvas;
pub mod config;
pub mod models;
pub mod reorganize;
pub mod report;
